mod geometry;
mod projection;
mod renderer;

pub use projection::Viewport;
pub use renderer::{class_index, class_thresholds, format_total, MapLayers, MapRenderer, CLASS_COUNT};
