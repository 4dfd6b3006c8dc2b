use crate::boundary::BoundarySet;
use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_line, fill_polygon};
use crate::map::projection::Viewport;
use crate::stats::DistrictSummary;

/// Number of choropleth classes. Each class renders as one canvas layer
/// painted in one ramp color by the ui.
pub const CLASS_COUNT: usize = 5;

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_fills: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_fills: true,
            show_labels: true,
        }
    }
}

/// Rendered map output: one fill canvas per choropleth class (index 0 =
/// lowest totals), the district outlines on top, and text labels in
/// character coordinates.
pub struct MapLayers {
    pub fills: Vec<BrailleCanvas>,
    pub outlines: BrailleCanvas,
    pub labels: Vec<(u16, u16, String)>,
}

/// Choropleth renderer over the district boundary polygons.
pub struct MapRenderer {
    boundaries: BoundarySet,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new(boundaries: BoundarySet) -> Self {
        Self {
            boundaries,
            settings: DisplaySettings::default(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.boundaries.polygons.is_empty()
    }

    pub fn boundaries(&self) -> &BoundarySet {
        &self.boundaries
    }

    pub fn toggle_fills(&mut self) {
        self.settings.show_fills = !self.settings.show_fills;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    /// Render the choropleth for the given summary. Polygons whose name
    /// has no summary entry are outlined but never filled; the mismatch
    /// is silent by design.
    pub fn render(
        &self,
        char_width: usize,
        char_height: usize,
        viewport: &Viewport,
        summary: &DistrictSummary,
    ) -> MapLayers {
        let mut fills: Vec<BrailleCanvas> = (0..CLASS_COUNT)
            .map(|_| BrailleCanvas::new(char_width, char_height))
            .collect();
        let mut outlines = BrailleCanvas::new(char_width, char_height);
        let mut labels = Vec::new();

        let max_total = summary.iter().map(|d| d.total).fold(0.0_f64, f64::max);
        let height_px = (char_height * 4) as i32;

        for polygon in &self.boundaries.polygons {
            // Exact, case-sensitive join on the district name.
            let total = summary
                .iter()
                .find(|d| d.name == polygon.name)
                .map(|d| d.total);

            for ring in &polygon.rings {
                let projected: Vec<(i32, i32)> =
                    ring.iter().map(|&(lon, lat)| viewport.project(lon, lat)).collect();

                if self.settings.show_fills {
                    if let Some(total) = total {
                        let class = class_index(total, max_total);
                        fill_polygon(&mut fills[class], &projected, height_px);
                    }
                }
                draw_ring(&mut outlines, &projected, viewport);
            }

            if self.settings.show_labels {
                if let Some((lon, lat)) = ring_centroid(polygon.rings.first()) {
                    let (px, py) = viewport.project(lon, lat);
                    if px >= 0 && py >= 0 && px < (char_width * 2) as i32 && py < height_px {
                        let text = match total {
                            Some(total) => format!("{} {}", polygon.name, format_total(total)),
                            None => polygon.name.clone(),
                        };
                        labels.push(((px / 2) as u16, (py / 4) as u16, text));
                    }
                }
            }
        }

        MapLayers {
            fills,
            outlines,
            labels,
        }
    }
}

/// Map a total onto one of `CLASS_COUNT` classes with a linear ramp over
/// [0, max]. Everything collapses to class 0 when the maximum is zero.
pub fn class_index(total: f64, max_total: f64) -> usize {
    if max_total <= 0.0 || total <= 0.0 {
        return 0;
    }
    let ratio = (total / max_total).clamp(0.0, 1.0);
    ((ratio * CLASS_COUNT as f64).ceil() as usize)
        .saturating_sub(1)
        .min(CLASS_COUNT - 1)
}

/// Upper bound of each class for the legend.
pub fn class_thresholds(max_total: f64) -> [f64; CLASS_COUNT] {
    let mut bounds = [0.0; CLASS_COUNT];
    for (i, bound) in bounds.iter_mut().enumerate() {
        *bound = max_total * (i + 1) as f64 / CLASS_COUNT as f64;
    }
    bounds
}

/// Integral totals print without a decimal point.
pub fn format_total(total: f64) -> String {
    if total.fract() == 0.0 {
        format!("{}", total as i64)
    } else {
        format!("{total:.1}")
    }
}

fn draw_ring(canvas: &mut BrailleCanvas, projected: &[(i32, i32)], viewport: &Viewport) {
    if projected.len() < 2 {
        return;
    }
    let mut prev: Option<(i32, i32)> = None;
    for &(px, py) in projected {
        if let Some((prev_x, prev_y)) = prev {
            if viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}

/// Vertex average of the exterior ring; close enough for label placement.
fn ring_centroid(ring: Option<&Vec<(f64, f64)>>) -> Option<(f64, f64)> {
    let ring = ring?;
    if ring.is_empty() {
        return None;
    }
    let n = ring.len() as f64;
    let (sum_lon, sum_lat) = ring
        .iter()
        .fold((0.0, 0.0), |(slon, slat), &(lon, lat)| (slon + lon, slat + lat));
    Some((sum_lon / n, sum_lat / n))
}
