use crate::boundary::BoundarySet;
use crate::data::{DataError, Dataset, DistrictColumn, DISTRICT_PREFIX};
use crate::map::{MapRenderer, Viewport};
use crate::stats::{aggregate, CategoryFilter, DistrictSummary, DistrictTotal, ALL_CATEGORIES};

/// Application state. One category selection triggers one full summary
/// recompute and one redraw; nothing is carried across recomputes.
pub struct App {
    pub viewport: Viewport,
    /// Present only when boundary data loaded; otherwise table-only mode.
    pub map_renderer: Option<MapRenderer>,
    dataset: Dataset,
    category_column: usize,
    district_columns: Vec<DistrictColumn>,
    /// Selector options: the "전체" sentinel plus distinct categories in
    /// dataset order.
    pub categories: Vec<String>,
    pub selected: usize,
    pub summary: DistrictSummary,
    pub sort_descending: bool,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Terminal size, kept to locate the map pane for mouse events
    term_width: usize,
    term_height: usize,
}

/// Braille pixel dimensions of the map canvas for a terminal size.
fn map_canvas_pixels(width: usize, height: usize) -> (usize, usize) {
    let (_, _, w, h) = crate::ui::map_canvas_area(width as u16, height as u16);
    (w as usize * 2, h as usize * 4)
}

impl App {
    /// Build the app from a loaded dataset and optional boundary data.
    /// Fails on the naming-convention gates; those abort before the TUI.
    pub fn new(
        dataset: Dataset,
        boundaries: Option<BoundarySet>,
        width: usize,
        height: usize,
    ) -> Result<Self, DataError> {
        let category_column = dataset.category_index()?;
        let district_columns = dataset.district_columns()?;

        let mut categories = vec![ALL_CATEGORIES.to_string()];
        categories.extend(dataset.categories()?);

        // Braille gives 2x4 resolution per character of the map pane
        let (pixel_width, pixel_height) = map_canvas_pixels(width, height);
        let mut viewport = Viewport::seoul(pixel_width, pixel_height);

        let map_renderer = boundaries.map(|set| {
            if let Some((min_lon, min_lat, max_lon, max_lat)) = set.bbox() {
                viewport.fit_bbox(min_lon, min_lat, max_lon, max_lat);
            }
            MapRenderer::new(set)
        });

        let mut app = Self {
            viewport,
            map_renderer,
            dataset,
            category_column,
            district_columns,
            categories,
            selected: 0,
            summary: Vec::new(),
            sort_descending: true,
            should_quit: false,
            last_mouse: None,
            term_width: width,
            term_height: height,
        };
        app.recompute();
        Ok(app)
    }

    /// Currently selected selector option.
    pub fn selected_category(&self) -> &str {
        &self.categories[self.selected]
    }

    /// Recompute the per-district summary for the current selection.
    pub fn recompute(&mut self) {
        let filter = CategoryFilter::from_selection(self.selected_category());
        self.summary = aggregate(
            &self.dataset,
            &filter,
            self.category_column,
            &self.district_columns,
            DISTRICT_PREFIX,
        );
    }

    pub fn next_category(&mut self) {
        self.selected = (self.selected + 1) % self.categories.len();
        self.recompute();
    }

    pub fn prev_category(&mut self) {
        self.selected = (self.selected + self.categories.len() - 1) % self.categories.len();
        self.recompute();
    }

    /// Summary rows in display order (descending by total unless the
    /// sort was toggled). The underlying summary stays column-ordered.
    pub fn table_rows(&self) -> Vec<&DistrictTotal> {
        let mut rows: Vec<&DistrictTotal> = self.summary.iter().collect();
        rows.sort_by(|a, b| a.total.total_cmp(&b.total));
        if self.sort_descending {
            rows.reverse();
        }
        rows
    }

    pub fn toggle_sort(&mut self) {
        self.sort_descending = !self.sort_descending;
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        self.term_width = width;
        self.term_height = height;
        let (pixel_width, pixel_height) = map_canvas_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Convert an absolute terminal position to braille pixels within
    /// the map canvas. `None` when the pointer is outside the map pane;
    /// each terminal cell is 2 braille pixels wide, 4 tall.
    fn mouse_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let (x, y, width, height) =
            crate::ui::map_canvas_area(self.term_width as u16, self.term_height as u16);
        if col < x || row < y || col >= x + width || row >= y + height {
            return None;
        }
        Some((((col - x) as i32) * 2, ((row - y) as i32) * 4))
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.mouse_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.mouse_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Handle mouse drag panning
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            self.pan(dx * 2, dy * 2);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Re-center the view on the boundary extents.
    pub fn reset_view(&mut self) {
        if let Some(bbox) = self
            .map_renderer
            .as_ref()
            .and_then(|r| r.boundaries().bbox())
        {
            self.viewport.fit_bbox(bbox.0, bbox.1, bbox.2, bbox.3);
        } else {
            let width = self.viewport.width;
            let height = self.viewport.height;
            self.viewport = Viewport::seoul(width, height);
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.0}x", self.viewport.zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::DistrictPolygon;

    fn dataset() -> Dataset {
        Dataset::from_parts(
            vec![
                "범죄대분류".into(),
                "범죄중분류".into(),
                "서울종로구".into(),
                "서울중구".into(),
            ],
            vec![
                vec!["강력범죄".into(), "살인".into(), "100".into(), "5".into()],
                vec!["지능범죄".into(), "사기".into(), "20".into(), "40".into()],
            ],
        )
    }

    /// Fixed in-memory boundary set standing in for the fetch capability.
    fn boundaries() -> BoundarySet {
        BoundarySet {
            polygons: vec![DistrictPolygon {
                name: "종로구".into(),
                rings: vec![vec![
                    (126.95, 37.55),
                    (126.98, 37.55),
                    (126.98, 37.58),
                    (126.95, 37.58),
                    (126.95, 37.55),
                ]],
            }],
        }
    }

    #[test]
    fn starts_on_the_all_sentinel_with_full_totals() {
        let app = App::new(dataset(), Some(boundaries()), 120, 40).unwrap();
        assert_eq!(app.selected_category(), ALL_CATEGORIES);
        assert_eq!(app.summary[0].total, 120.0);
        assert_eq!(app.summary[1].total, 45.0);
    }

    #[test]
    fn category_cycling_recomputes_summary() {
        let mut app = App::new(dataset(), None, 120, 40).unwrap();
        app.next_category();
        assert_eq!(app.selected_category(), "강력범죄");
        assert_eq!(app.summary[0].total, 100.0);
        assert_eq!(app.summary[1].total, 5.0);

        app.prev_category();
        assert_eq!(app.selected_category(), ALL_CATEGORIES);
        assert_eq!(app.summary[0].total, 120.0);
    }

    #[test]
    fn cycling_wraps_around() {
        let mut app = App::new(dataset(), None, 120, 40).unwrap();
        for _ in 0..app.categories.len() {
            app.next_category();
        }
        assert_eq!(app.selected_category(), ALL_CATEGORIES);
    }

    #[test]
    fn table_sorts_descending_by_default() {
        let mut app = App::new(dataset(), None, 120, 40).unwrap();
        let rows = app.table_rows();
        assert_eq!(rows[0].name, "종로구");
        assert_eq!(rows[1].name, "중구");

        app.toggle_sort();
        let rows = app.table_rows();
        assert_eq!(rows[0].name, "중구");
    }

    #[test]
    fn missing_boundaries_mean_table_only_mode() {
        let app = App::new(dataset(), None, 120, 40).unwrap();
        assert!(app.map_renderer.is_none());
        // Totals are unaffected by the absent map.
        assert_eq!(app.summary[0].total, 120.0);
    }

    #[test]
    fn boundary_bbox_recenters_viewport() {
        let app = App::new(dataset(), Some(boundaries()), 120, 40).unwrap();
        assert!((app.viewport.center_lon - 126.965).abs() < 1e-9);
        assert!((app.viewport.center_lat - 37.565).abs() < 1e-9);
    }

    #[test]
    fn viewport_is_sized_from_the_map_pane() {
        let mut app = App::new(dataset(), Some(boundaries()), 120, 40).unwrap();
        let (_, _, pane_width, pane_height) = crate::ui::map_canvas_area(120, 40);
        assert_eq!(app.viewport.width, pane_width as usize * 2);
        assert_eq!(app.viewport.height, pane_height as usize * 4);

        app.resize(100, 30);
        let (_, _, pane_width, pane_height) = crate::ui::map_canvas_area(100, 30);
        assert_eq!(app.viewport.width, pane_width as usize * 2);
        assert_eq!(app.viewport.height, pane_height as usize * 4);
    }

    #[test]
    fn mouse_zoom_anchors_to_the_pane_not_the_terminal() {
        let mut app = App::new(dataset(), Some(boundaries()), 120, 40).unwrap();
        let before_lon = app.viewport.center_lon;
        let before_zoom = app.viewport.zoom;

        // Scroll at the center of the map pane: zoom changes, the point
        // under the pointer (the view center) stays put.
        let (x, y, width, height) = crate::ui::map_canvas_area(120, 40);
        app.zoom_in_at(x + width / 2, y + height / 2);
        assert!(app.viewport.zoom > before_zoom);
        assert!((app.viewport.center_lon - before_lon).abs() < 0.01);
    }

    #[test]
    fn mouse_zoom_outside_the_pane_is_ignored() {
        let mut app = App::new(dataset(), Some(boundaries()), 120, 40).unwrap();
        let before_zoom = app.viewport.zoom;

        // Over the selector/table column
        app.zoom_in_at(10, 10);
        assert_eq!(app.viewport.zoom, before_zoom);

        // On the status bar
        app.zoom_out_at(60, 39);
        assert_eq!(app.viewport.zoom, before_zoom);
    }
}
