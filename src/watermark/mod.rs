// Watermark engine - placement, drag constraints, and rendering onto a drawing surface
mod drag;
mod error;
mod format;
mod geometry;
mod presets;
mod raster;
mod render;
mod surface;
mod types;

pub use drag::DragState;
pub use error::{RenderError, SurfaceError};
pub use format::{DEFAULT_JPEG_QUALITY, JPEG_OPACITY_THRESHOLD, OutputFormat};
pub use geometry::{
    EDGE_PADDING, constrain_offset, hit_test, resolve_geometry, resolve_geometry_scaled,
};
pub use presets::{PRESETS, PresetDefinition, PresetId, apply_preset};
pub use raster::{RasterSurface, load_font};
pub use render::{
    ExportTarget, ExportedImage, RenderOutcome, render_export, render_preview, text_style,
};
pub use surface::{DrawingSurface, Shadow, TextStyle};
pub use types::{
    Anchor, Color, ImageSource, MAX_FONT_SIZE, MIN_FONT_SIZE, Offset, Point, Rect, TextMetrics,
    WatermarkConfig, WatermarkGeometry, WatermarkMode,
};

#[cfg(test)]
mod tests {
    mod geometry_tests;
    mod raster_tests;
    mod render_tests;
}
