use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, warn};

use super::error::{RenderError, SurfaceError};
use super::format::{DEFAULT_JPEG_QUALITY, OutputFormat};
use super::geometry::resolve_geometry_scaled;
use super::surface::{DrawingSurface, Shadow, TextStyle};
use super::types::{ImageSource, WatermarkConfig, WatermarkGeometry};

/// Result of one paint pass
#[derive(Debug)]
pub struct RenderOutcome {
    /// Geometry actually drawn; empty when the watermark was skipped
    pub geometry: WatermarkGeometry,
    pub style: TextStyle,
    /// Set when measuring or drawing the text failed and only the base image was painted
    pub watermark_error: Option<SurfaceError>,
}

/// Where and how to export the composited image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportTarget {
    pub width: u32,
    pub height: u32,
    /// Width of the preview canvas the configuration was authored against
    pub preview_width: u32,
    pub source_format: Option<ImageFormat>,
    pub jpeg_quality: u8,
}

impl ExportTarget {
    /// Export at the source's original resolution
    pub fn original_size(source: &ImageSource) -> Self {
        Self {
            width: source.original_width,
            height: source.original_height,
            preview_width: source.display_width,
            source_format: source.format,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn scale_factor(&self) -> f32 {
        self.width as f32 / self.preview_width as f32
    }
}

#[derive(Debug)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f32,
    /// Font size used for drawing, after scaling
    pub font_size: f32,
    pub geometry: WatermarkGeometry,
    pub watermark_error: Option<SurfaceError>,
}

/// Text style for `config` drawn on a canvas `scale` times the preview size.
///
/// Font size and opacity are clamped to their valid ranges before scaling.
pub fn text_style(config: &WatermarkConfig, scale: f32) -> TextStyle {
    TextStyle {
        font_size: config.clamped_font_size() as f32 * scale,
        color: config.color,
        opacity: config.clamped_opacity(),
        shadow: Shadow::preview().scaled(scale),
    }
}

/// Paint the preview: the image scaled to the canvas, then the watermark.
///
/// The returned geometry is what the caller should hit-test against. Only a failure to
/// draw the base image is an error; a failed watermark leaves the base image in place.
pub fn render_preview<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    image: &DynamicImage,
    config: &WatermarkConfig,
    canvas_width: u32,
    canvas_height: u32,
) -> Result<RenderOutcome, RenderError> {
    paint(surface, image, config, canvas_width, canvas_height, 1.0)
}

/// Paint at export resolution and encode.
///
/// Every size in `config` is in preview pixels, so font size, shadow, padding and any
/// drag offset are multiplied by `target.width / target.preview_width`.
pub fn render_export<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    image: &DynamicImage,
    config: &WatermarkConfig,
    target: &ExportTarget,
) -> Result<ExportedImage, RenderError> {
    if target.preview_width == 0 {
        return Err(RenderError::InvalidCanvas {
            width: target.preview_width,
            height: 0,
        });
    }

    let scale_factor = target.scale_factor();
    let outcome = paint(
        surface,
        image,
        config,
        target.width,
        target.height,
        scale_factor,
    )?;

    let format = OutputFormat::for_export(
        target.source_format,
        config.clamped_opacity(),
        target.jpeg_quality,
    );
    let bytes = surface.encode(format)?;

    info!(
        "Exported {}x{} {} ({} bytes, scale {:.3}, font {}px)",
        target.width,
        target.height,
        format.extension(),
        bytes.len(),
        scale_factor,
        outcome.style.font_size
    );

    Ok(ExportedImage {
        bytes,
        format,
        width: target.width,
        height: target.height,
        scale_factor,
        font_size: outcome.style.font_size,
        geometry: outcome.geometry,
        watermark_error: outcome.watermark_error,
    })
}

fn paint<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    image: &DynamicImage,
    config: &WatermarkConfig,
    width: u32,
    height: u32,
    scale: f32,
) -> Result<RenderOutcome, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidCanvas { width, height });
    }

    surface.clear();
    surface.draw_image(image, width, height)?;

    let style = text_style(config, scale);
    match draw_watermark(surface, config, width, height, &style, scale) {
        Ok(geometry) => Ok(RenderOutcome {
            geometry,
            style,
            watermark_error: None,
        }),
        Err(e) => {
            warn!("Failed to draw watermark, keeping base image: {}", e);
            surface.clear();
            surface.draw_image(image, width, height)?;
            Ok(RenderOutcome {
                geometry: WatermarkGeometry::EMPTY,
                style,
                watermark_error: Some(e),
            })
        }
    }
}

fn draw_watermark<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    config: &WatermarkConfig,
    width: u32,
    height: u32,
    style: &TextStyle,
    scale: f32,
) -> Result<WatermarkGeometry, SurfaceError> {
    let text = config.text.trim();
    if text.is_empty() {
        debug!("Watermark text is empty, skipping");
        return Ok(WatermarkGeometry::EMPTY);
    }

    let metrics = surface.measure_text(text, style.font_size)?;
    let geometry = resolve_geometry_scaled(width, height, config, metrics, scale);
    if geometry.is_empty() {
        return Ok(geometry);
    }

    surface.fill_text(text, geometry.anchor_point, style)?;
    debug!("Watermark bounds: {:?}", geometry.bounding_box);
    Ok(geometry)
}
