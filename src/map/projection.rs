use std::f64::consts::PI;

/// Default view center: Seoul city hall.
pub const SEOUL_CENTER: (f64, f64) = (126.978, 37.5665);

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 100_000.0;

/// Normalized Web Mercator y for a latitude in degrees (0 at the north
/// clamp, 1 at the south clamp).
fn mercator_y(lat: f64) -> f64 {
    let rad = lat * PI / 180.0;
    (1.0 - (rad.tan() + 1.0 / rad.cos()).ln() / PI) / 2.0
}

/// Viewport representing the visible map area and zoom level.
/// Web Mercator; zoom 1.0 fits the whole world across the canvas width.
#[derive(Clone)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-90 to 90)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// City view centered on Seoul. Used until boundary data arrives;
    /// `fit_bbox` refines it once polygon extents are known.
    pub fn seoul(width: usize, height: usize) -> Self {
        Self::new(SEOUL_CENTER.0, SEOUL_CENTER.1, 1500.0, width, height)
    }

    /// Fit the viewport to a geographic bounding box with a ~10% margin.
    pub fn fit_bbox(&mut self, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) {
        self.center_lon = (min_lon + max_lon) / 2.0;
        self.center_lat = (min_lat + max_lat) / 2.0;

        // Normalized Mercator extents of the box.
        let dx = ((max_lon - min_lon) / 360.0).max(1e-9);
        let dy = (mercator_y(min_lat) - mercator_y(max_lat)).max(1e-9);

        let zoom_for_lon = 0.9 / dx;
        let zoom_for_lat = 0.9 * self.height as f64 / (dy * self.width as f64);
        self.zoom = zoom_for_lon.min(zoom_for_lat).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5; // Mercator distortion

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        // Clamp latitude
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor towards a specific pixel location
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        // Get the geographic coordinates under the cursor
        let (lon, lat) = self.unproject(px, py);

        // Apply the zoom
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        // Calculate where that point would now project to
        let (new_px, new_py) = self.project(lon, lat);

        // Pan to bring it back under the cursor
        let dx = new_px - px;
        let dy = new_py - py;
        self.pan(dx, dy);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.zoom * self.width as f64;

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;

        // Inverse Mercator for latitude
        let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
        let lat = lat_rad * 180.0 / PI;

        (lon, lat)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon + 180.0) / 360.0;
        let y = mercator_y(lat);

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let scale = self.zoom * self.width as f64;

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;

        (px, py)
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
