use ab_glyph::{Font, FontVec, GlyphId, PxScale};
use image::codecs::{jpeg::JpegEncoder, png::PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageEncoder, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::filter::gaussian_blur_f32;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::error::SurfaceError;
use super::format::OutputFormat;
use super::surface::{DrawingSurface, TextStyle};
use super::types::{Point, TextMetrics};

/// Load a TrueType/OpenType font from disk
pub fn load_font(path: &Path) -> Result<FontVec, SurfaceError> {
    let font_data = std::fs::read(path)?;
    FontVec::try_from_vec(font_data).map_err(|e| SurfaceError::Font(e.to_string()))
}

/// In-memory RGBA canvas. Without a font it can still blit and encode, but text
/// measurement fails, which the renderer treats as "no watermark".
pub struct RasterSurface {
    canvas: RgbaImage,
    font: Option<Arc<FontVec>>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, font: Option<Arc<FontVec>>) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::Unavailable(format!(
                "cannot allocate a {}x{} canvas",
                width, height
            )));
        }
        Ok(Self {
            canvas: RgbaImage::new(width, height),
            font,
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    fn font(&self) -> Result<&FontVec, SurfaceError> {
        self.font.as_deref().ok_or(SurfaceError::NoFont)
    }
}

impl DrawingSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_image(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<(), SurfaceError> {
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            return Err(SurfaceError::Unavailable(format!(
                "cannot draw a {}x{} image at {}x{}",
                image.width(),
                image.height(),
                width,
                height
            )));
        }

        let scaled = if image.width() == width && image.height() == height {
            image.to_rgba8()
        } else {
            image.resize_exact(width, height, FilterType::Triangle).to_rgba8()
        };
        imageops::overlay(&mut self.canvas, &scaled, 0, 0);
        Ok(())
    }

    fn measure_text(&self, text: &str, font_size: f32) -> Result<TextMetrics, SurfaceError> {
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(SurfaceError::InvalidText(format!(
                "font size {} is not drawable",
                font_size
            )));
        }
        let font = self.font()?;
        // A missing glyph would otherwise render as a .notdef box and still report success
        if let Some(missing) = text
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .find(|&c| font.glyph_id(c) == GlyphId(0))
        {
            return Err(SurfaceError::InvalidText(format!(
                "font has no glyph for {:?} (U+{:04X})",
                missing, missing as u32
            )));
        }
        let (width, _) = text_size(PxScale::from(font_size), font, text);
        // Line height is the font size, matching how the box is hit-tested.
        Ok(TextMetrics::new(width as f32, font_size))
    }

    fn fill_text(
        &mut self,
        text: &str,
        center: Point,
        style: &TextStyle,
    ) -> Result<(), SurfaceError> {
        let metrics = self.measure_text(text, style.font_size)?;
        let font = self.font()?;
        let scale = PxScale::from(style.font_size);
        let left = (center.x - metrics.width / 2.0).round() as i32;
        let top = (center.y - metrics.height / 2.0).round() as i32;

        let shadow = style.shadow;
        let sigma = shadow.blur / 2.0;
        let shadow_dx = shadow.offset_x.round() as i32;
        let shadow_dy = shadow.offset_y.round() as i32;

        // Masks only cover the text box plus room for blur, shadow offset and glyph overhang
        let margin = (3.0 * sigma.max(0.0)).ceil() as i32
            + shadow_dx.abs().max(shadow_dy.abs())
            + (style.font_size * 0.25).ceil() as i32
            + 2;
        let (canvas_width, canvas_height) = self.canvas.dimensions();
        let x0 = (left - margin).max(0);
        let y0 = (top - margin).max(0);
        let x1 = (left + metrics.width.ceil() as i32 + margin).min(canvas_width as i32);
        let y1 = (top + metrics.height.ceil() as i32 + margin).min(canvas_height as i32);
        if x1 <= x0 || y1 <= y0 {
            debug!("Text region for '{}' is off the canvas, nothing drawn", text);
            return Ok(());
        }
        let (region_width, region_height) = ((x1 - x0) as u32, (y1 - y0) as u32);
        let (local_left, local_top) = (left - x0, top - y0);

        let mut shadow_mask = GrayImage::new(region_width, region_height);
        draw_text_mut(
            &mut shadow_mask,
            Luma([255u8]),
            local_left + shadow_dx,
            local_top + shadow_dy,
            scale,
            font,
            text,
        );
        if sigma > 0.0 {
            shadow_mask = gaussian_blur_f32(&shadow_mask, sigma);
        }

        let mut text_mask = GrayImage::new(region_width, region_height);
        draw_text_mut(
            &mut text_mask,
            Luma([255u8]),
            local_left,
            local_top,
            scale,
            font,
            text,
        );

        let origin = (x0 as u32, y0 as u32);
        blend_mask(
            &mut self.canvas,
            &shadow_mask,
            origin,
            shadow.color,
            style.opacity,
        );
        blend_mask(
            &mut self.canvas,
            &text_mask,
            origin,
            style.color.with_alpha(1.0),
            style.opacity,
        );

        debug!(
            "Drew '{}' at ({}, {}) size {}px opacity {} within {}x{} region",
            text, left, top, style.font_size, style.opacity, region_width, region_height
        );
        Ok(())
    }

    fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, SurfaceError> {
        let mut bytes = Vec::new();
        match format {
            OutputFormat::Jpeg { quality } => {
                // JPEG doesn't support alpha channel, so convert to RGB
                let rgb_image = DynamicImage::ImageRgba8(self.canvas.clone()).to_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
                encoder.write_image(
                    &rgb_image,
                    rgb_image.width(),
                    rgb_image.height(),
                    image::ExtendedColorType::Rgb8,
                )?;
            }
            OutputFormat::Png => {
                let encoder = PngEncoder::new(&mut bytes);
                encoder.write_image(
                    &self.canvas,
                    self.canvas.width(),
                    self.canvas.height(),
                    image::ExtendedColorType::Rgba8,
                )?;
            }
        }
        Ok(bytes)
    }
}

/// Source-over composite of `color` through a coverage mask placed at `origin`, with
/// global opacity. Mask pixels past the canvas edge are ignored.
fn blend_mask(
    canvas: &mut RgbaImage,
    mask: &GrayImage,
    origin: (u32, u32),
    color: Rgba<u8>,
    opacity: f32,
) {
    let opacity = opacity.clamp(0.0, 1.0);
    let color_alpha = color[3] as f32 / 255.0;
    let (canvas_width, canvas_height) = canvas.dimensions();

    for (mx, my, coverage) in mask.enumerate_pixels() {
        let (x, y) = (origin.0 + mx, origin.1 + my);
        if x >= canvas_width || y >= canvas_height {
            continue;
        }
        let src_a = coverage[0] as f32 / 255.0 * color_alpha * opacity;
        if src_a <= 0.0 {
            continue;
        }
        let dst = canvas.get_pixel_mut(x, y);
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        for channel in 0..3 {
            let src_c = color[channel] as f32;
            let dst_c = dst[channel] as f32;
            let out_c = (src_c * src_a + dst_c * dst_a * (1.0 - src_a)) / out_a;
            dst[channel] = out_c.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_mask_full_coverage_opaque() {
        let mut canvas = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 255, 255]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([255]));

        blend_mask(&mut canvas, &mask, (0, 0), Rgba([255, 0, 0, 255]), 1.0);

        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(1, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_blend_mask_half_opacity_mixes() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let mask = GrayImage::from_pixel(1, 1, Luma([255]));

        blend_mask(&mut canvas, &mask, (0, 0), Rgba([200, 100, 50, 255]), 0.5);

        assert_eq!(canvas.get_pixel(0, 0), &Rgba([100, 50, 25, 255]));
    }

    #[test]
    fn test_blend_mask_zero_opacity_is_noop() {
        let mut canvas = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let mask = GrayImage::from_pixel(1, 1, Luma([255]));

        blend_mask(&mut canvas, &mask, (0, 0), Rgba([255, 255, 255, 255]), 0.0);

        assert_eq!(canvas.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_blend_mask_at_origin_only_touches_region() {
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let mask = GrayImage::from_pixel(2, 2, Luma([255]));

        blend_mask(&mut canvas, &mask, (3, 1), Rgba([255, 255, 255, 255]), 1.0);

        assert_eq!(canvas.get_pixel(3, 1), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(3, 2), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(2, 1), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(3, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(3, 3), &Rgba([0, 0, 0, 255]));
    }
}
