use image::{DynamicImage, Rgba};

use super::error::SurfaceError;
use super::format::OutputFormat;
use super::types::{Color, Point, TextMetrics};

/// Soft drop shadow drawn under the watermark text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Rgba<u8>,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Shadow {
    /// rgba(0, 0, 0, 0.3), 2px blur, offset (1, 1) at preview scale
    pub fn preview() -> Self {
        Self {
            color: Rgba([0, 0, 0, 77]),
            blur: 2.0,
            offset_x: 1.0,
            offset_y: 1.0,
        }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            color: self.color,
            blur: self.blur * factor,
            offset_x: self.offset_x * factor,
            offset_y: self.offset_y * factor,
        }
    }
}

/// Everything needed to paint one line of watermark text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: Color,
    pub opacity: f32,
    pub shadow: Shadow,
}

/// Minimal 2D canvas contract the renderer draws through.
pub trait DrawingSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reset every pixel to transparent
    fn clear(&mut self);

    /// Blit `image` scaled to `width` x `height` at the origin
    fn draw_image(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<(), SurfaceError>;

    fn measure_text(&self, text: &str, font_size: f32) -> Result<TextMetrics, SurfaceError>;

    /// Draw `text` centred on `center`
    fn fill_text(
        &mut self,
        text: &str,
        center: Point,
        style: &TextStyle,
    ) -> Result<(), SurfaceError>;

    fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, SurfaceError>;
}
