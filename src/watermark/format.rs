use image::ImageFormat;

/// Sources at or above this opacity gain nothing from lossless export
pub const JPEG_OPACITY_THRESHOLD: f32 = 0.9;
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    /// JPEG in, nearly opaque watermark: stay JPEG. Anything else goes out as PNG.
    pub fn for_export(source_format: Option<ImageFormat>, opacity: f32, jpeg_quality: u8) -> Self {
        match source_format {
            Some(ImageFormat::Jpeg) if opacity >= JPEG_OPACITY_THRESHOLD => OutputFormat::Jpeg {
                quality: jpeg_quality,
            },
            _ => OutputFormat::Png,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg { .. } => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_jpeg_stays_jpeg() {
        let format = OutputFormat::for_export(Some(ImageFormat::Jpeg), 0.9, 95);
        assert_eq!(format, OutputFormat::Jpeg { quality: 95 });
        assert_eq!(format.extension(), "jpg");
        assert_eq!(format.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_translucent_jpeg_goes_png() {
        assert_eq!(
            OutputFormat::for_export(Some(ImageFormat::Jpeg), 0.5, 95),
            OutputFormat::Png
        );
    }

    #[test]
    fn test_non_jpeg_sources_go_png() {
        assert_eq!(
            OutputFormat::for_export(Some(ImageFormat::Png), 1.0, 95),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormat::for_export(Some(ImageFormat::Gif), 1.0, 95),
            OutputFormat::Png
        );
        assert_eq!(OutputFormat::for_export(None, 1.0, 95), OutputFormat::Png);
    }
}
