use crate::data::{Dataset, DistrictColumn};

/// Sentinel shown in the category selector meaning "no filtering".
pub const ALL_CATEGORIES: &str = "전체";

/// Row filter derived from the category selector.
#[derive(Clone, Debug, PartialEq)]
pub enum CategoryFilter {
    All,
    Only(String),
}

impl CategoryFilter {
    /// Map the selector value to a filter; the sentinel means all rows.
    pub fn from_selection(selection: &str) -> Self {
        if selection == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(selection.to_string())
        }
    }

    fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => category == wanted,
        }
    }
}

/// One aggregated row: district name (region prefix stripped) and the
/// summed count over the filtered record set.
#[derive(Clone, Debug, PartialEq)]
pub struct DistrictTotal {
    pub name: String,
    pub total: f64,
}

/// Per-district totals, one entry per district column in the dataset.
/// Ordering is insignificant; the table view re-sorts for display.
pub type DistrictSummary = Vec<DistrictTotal>;

/// Strip the parent-region prefix from a column header to get the join
/// key used against boundary polygon names. Pure string operation; a
/// header without the prefix passes through unchanged.
pub fn strip_district_prefix<'a>(column: &'a str, prefix: &str) -> &'a str {
    column.strip_prefix(prefix).unwrap_or(column)
}

/// A cell that does not parse as a number counts as zero, never an error.
fn coerce_count(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(0.0)
}

/// Filter rows by category, coerce district cells to numbers, sum per
/// column, and strip the region prefix from each column name.
///
/// Zero matching rows yields all-zero totals; the summary always has one
/// entry per input district column.
pub fn aggregate(
    dataset: &Dataset,
    filter: &CategoryFilter,
    category_index: usize,
    columns: &[DistrictColumn],
    prefix: &str,
) -> DistrictSummary {
    let mut totals = vec![0.0_f64; columns.len()];

    for row in dataset.rows() {
        let category = row.get(category_index).map(String::as_str).unwrap_or("");
        if !filter.matches(category) {
            continue;
        }
        for (slot, column) in totals.iter_mut().zip(columns) {
            if let Some(cell) = row.get(column.index) {
                *slot += coerce_count(cell);
            }
        }
    }

    columns
        .iter()
        .zip(totals)
        .map(|(column, total)| DistrictTotal {
            name: strip_district_prefix(&column.column, prefix).to_string(),
            total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DISTRICT_PREFIX;

    fn dataset() -> Dataset {
        Dataset::from_parts(
            vec![
                "범죄대분류".into(),
                "범죄중분류".into(),
                "서울종로구".into(),
                "서울중구".into(),
            ],
            vec![
                vec!["강력범죄".into(), "살인".into(), "10".into(), "5".into()],
                vec!["강력범죄".into(), "강도".into(), "20".into(), "".into()],
                vec!["지능범죄".into(), "사기".into(), "90".into(), "40".into()],
            ],
        )
    }

    fn columns() -> Vec<DistrictColumn> {
        vec![
            DistrictColumn {
                index: 2,
                column: "서울종로구".into(),
            },
            DistrictColumn {
                index: 3,
                column: "서울중구".into(),
            },
        ]
    }

    #[test]
    fn all_sentinel_sums_every_row() {
        let summary = aggregate(
            &dataset(),
            &CategoryFilter::from_selection(ALL_CATEGORIES),
            0,
            &columns(),
            DISTRICT_PREFIX,
        );
        assert_eq!(
            summary,
            vec![
                DistrictTotal { name: "종로구".into(), total: 120.0 },
                DistrictTotal { name: "중구".into(), total: 45.0 },
            ]
        );
    }

    #[test]
    fn filter_keeps_only_matching_category() {
        let summary = aggregate(
            &dataset(),
            &CategoryFilter::Only("강력범죄".into()),
            0,
            &columns(),
            DISTRICT_PREFIX,
        );
        assert_eq!(summary[0].total, 30.0);
        assert_eq!(summary[1].total, 5.0);
    }

    #[test]
    fn zero_matching_rows_yield_zero_totals() {
        let summary = aggregate(
            &dataset(),
            &CategoryFilter::Only("교통범죄".into()),
            0,
            &columns(),
            DISTRICT_PREFIX,
        );
        assert_eq!(summary.len(), 2);
        assert!(summary.iter().all(|d| d.total == 0.0));
    }

    #[test]
    fn non_numeric_cells_coerce_to_zero() {
        let dataset = Dataset::from_parts(
            vec!["범죄대분류".into(), "서울종로구".into()],
            vec![
                vec!["강력범죄".into(), "-".into()],
                vec!["강력범죄".into(), " 12 ".into()],
                vec!["강력범죄".into(), "abc".into()],
            ],
        );
        let columns = vec![DistrictColumn {
            index: 1,
            column: "서울종로구".into(),
        }];
        let summary = aggregate(
            &dataset,
            &CategoryFilter::All,
            0,
            &columns,
            DISTRICT_PREFIX,
        );
        assert_eq!(summary[0].total, 12.0);
    }

    #[test]
    fn coercion_is_idempotent_over_text_round_trip() {
        let values = [3.0, 17.5, 0.0, 240.0];
        let direct: f64 = values.iter().sum();
        let round_tripped: f64 = values.iter().map(|v| coerce_count(&v.to_string())).sum();
        assert_eq!(direct, round_tripped);
    }

    #[test]
    fn prefix_strip_is_pure() {
        for name in ["종로구", "중구", "강남구"] {
            let column = format!("{DISTRICT_PREFIX}{name}");
            assert_eq!(strip_district_prefix(&column, DISTRICT_PREFIX), name);
        }
        // No prefix: pass through unchanged.
        assert_eq!(strip_district_prefix("부산중구", DISTRICT_PREFIX), "부산중구");
    }

    #[test]
    fn sentinel_maps_to_all() {
        assert_eq!(CategoryFilter::from_selection("전체"), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_selection("강력범죄"),
            CategoryFilter::Only("강력범죄".into())
        );
    }
}
