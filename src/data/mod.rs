use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

/// Expected dataset location, relative to the working directory.
pub const DATASET_FILE: &str = "crime_statistics.csv";

/// Column naming contract of the source dataset: the crime-category
/// column has a fixed name, district count columns share a fixed prefix.
pub const CATEGORY_COLUMN: &str = "범죄대분류";
pub const DISTRICT_PREFIX: &str = "서울";

/// In-memory copy of the tabular crime dataset.
#[derive(Debug)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A count column identified by the district naming convention.
/// `column` is the full header name including the region prefix.
#[derive(Clone, Debug, PartialEq)]
pub struct DistrictColumn {
    pub index: usize,
    pub column: String,
}

/// Fatal loading conditions. Anything here aborts before the UI starts.
#[derive(Debug)]
pub enum DataError {
    /// Dataset file does not exist at the expected path.
    NotFound(String),
    /// File exists but is not readable or not valid CSV.
    Malformed(String),
    /// Header row has no column named `CATEGORY_COLUMN`.
    MissingCategoryColumn,
    /// Header row has no columns starting with `DISTRICT_PREFIX`.
    NoDistrictColumns,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::NotFound(path) => {
                write!(f, "`{path}` 파일을 찾을 수 없습니다. 파일을 프로젝트 루트에 두었는지 확인해주세요.")
            }
            DataError::Malformed(msg) => write!(f, "CSV 파일을 읽을 수 없습니다: {msg}"),
            DataError::MissingCategoryColumn => {
                write!(f, "CSV 파일에 '{CATEGORY_COLUMN}' 컬럼이 없습니다. 컬럼명을 확인해주세요.")
            }
            DataError::NoDistrictColumns => {
                write!(f, "CSV 파일에 '{DISTRICT_PREFIX}'(으)로 시작하는 지역 컬럼이 없습니다. 컬럼명을 확인해주세요.")
            }
        }
    }
}

impl std::error::Error for DataError {}

/// Load the crime dataset from a CSV file. A missing file is fatal to the
/// whole render cycle; there is no partial UI without the dataset.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        let display = path.display().to_string();
        if e.kind() == io::ErrorKind::NotFound {
            DataError::NotFound(display)
        } else {
            DataError::Malformed(format!("{display}: {e}"))
        }
    })?;

    let mut reader = csv::Reader::from_reader(file);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DataError::Malformed(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Malformed(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Dataset { headers, rows })
}

impl Dataset {
    #[cfg(test)]
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of the fixed-name category column.
    pub fn category_index(&self) -> Result<usize, DataError> {
        self.headers
            .iter()
            .position(|h| h == CATEGORY_COLUMN)
            .ok_or(DataError::MissingCategoryColumn)
    }

    /// All count columns whose header carries the district prefix.
    /// Zero matches means the naming convention does not hold, which is
    /// the one validation gate before aggregation.
    pub fn district_columns(&self) -> Result<Vec<DistrictColumn>, DataError> {
        let columns: Vec<DistrictColumn> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with(DISTRICT_PREFIX))
            .map(|(index, h)| DistrictColumn {
                index,
                column: h.clone(),
            })
            .collect();

        if columns.is_empty() {
            return Err(DataError::NoDistrictColumns);
        }
        Ok(columns)
    }

    /// Distinct category values in first-appearance order.
    pub fn categories(&self) -> Result<Vec<String>, DataError> {
        let idx = self.category_index()?;
        let mut seen = Vec::new();
        for row in &self.rows {
            if let Some(value) = row.get(idx) {
                if !seen.iter().any(|s| s == value) {
                    seen.push(value.clone());
                }
            }
        }
        Ok(seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_csv() -> &'static str {
        "범죄대분류,범죄중분류,서울종로구,서울중구\n\
         강력범죄,살인,10,5\n\
         강력범죄,강도,20,15\n\
         지능범죄,사기,30,25\n"
    }

    #[test]
    fn loads_headers_and_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_csv().as_bytes()).unwrap();

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.headers().len(), 4);
        assert_eq!(dataset.rows().len(), 3);
        assert_eq!(dataset.rows()[2][0], "지능범죄");
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_dataset("no_such_directory/crime_statistics.csv").unwrap_err();
        assert!(matches!(err, DataError::NotFound(_)));
    }

    #[test]
    fn district_columns_follow_prefix_convention() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_csv().as_bytes()).unwrap();

        let dataset = load_dataset(file.path()).unwrap();
        let columns = dataset.district_columns().unwrap();
        assert_eq!(
            columns,
            vec![
                DistrictColumn {
                    index: 2,
                    column: "서울종로구".into()
                },
                DistrictColumn {
                    index: 3,
                    column: "서울중구".into()
                },
            ]
        );
    }

    #[test]
    fn no_prefixed_columns_is_fatal() {
        let dataset = Dataset::from_parts(
            vec!["범죄대분류".into(), "부산해운대구".into()],
            vec![],
        );
        let err = dataset.district_columns().unwrap_err();
        assert!(matches!(err, DataError::NoDistrictColumns));
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_csv().as_bytes()).unwrap();

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.categories().unwrap(), vec!["강력범죄", "지능범죄"]);
    }
}
