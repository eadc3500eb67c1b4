use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::watermark::ImageSource;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_DECODE_TIMEOUT_SECS: u64 = 30;
pub const ACCEPTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type: {0} (expected JPG, PNG or GIF)")]
    UnsupportedType(String),

    #[error("File is {size} bytes, limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Decoding did not finish within {0} seconds")]
    DecodeTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode task failed: {0}")]
    TaskFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub decode_timeout: Duration,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            decode_timeout: Duration::from_secs(DEFAULT_DECODE_TIMEOUT_SECS),
        }
    }
}

/// MIME type guessed from the file name
pub fn mime_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Reject files by type and size before anything is decoded
pub fn validate_upload(mime_type: &str, size: u64, limits: &UploadLimits) -> Result<(), UploadError> {
    if !ACCEPTED_MIME_TYPES.contains(&mime_type) {
        return Err(UploadError::UnsupportedType(mime_type.to_string()));
    }
    if size == 0 {
        return Err(UploadError::Empty);
    }
    if size > limits.max_file_size {
        return Err(UploadError::TooLarge {
            size,
            max: limits.max_file_size,
        });
    }
    Ok(())
}

/// Decode image bytes, sniffing the format from the content
pub fn decode_image(bytes: &[u8]) -> Result<(DynamicImage, Option<ImageFormat>), UploadError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format();
    let image = reader.decode()?;
    debug!(
        "Decoded {:?} image: {}x{}",
        format,
        image.width(),
        image.height()
    );
    Ok((image, format))
}

/// Largest size within `max_width` x `max_height` with the original aspect ratio.
/// Never upscales.
pub fn fit_display_size(
    original_width: u32,
    original_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    if original_width == 0 || original_height == 0 || max_width == 0 || max_height == 0 {
        return (original_width.max(1), original_height.max(1));
    }

    let aspect_ratio = original_width as f64 / original_height as f64;
    let (width, height) = if max_width as f64 / max_height as f64 > aspect_ratio {
        let height = max_height.min(original_height) as f64;
        (height * aspect_ratio, height)
    } else {
        let width = max_width.min(original_width) as f64;
        (width, width / aspect_ratio)
    };

    (
        (width.round() as u32).max(1),
        (height.round() as u32).max(1),
    )
}

/// Validate and decode a file into an [`ImageSource`] sized for a preview area
pub async fn load_image_file(
    path: &Path,
    limits: &UploadLimits,
    max_display_width: u32,
    max_display_height: u32,
) -> Result<ImageSource, UploadError> {
    let mime_type = mime_type_for(path);
    let size = tokio::fs::metadata(path).await?.len();
    validate_upload(&mime_type, size, limits)?;

    let bytes = tokio::fs::read(path).await?;
    let decode = tokio::task::spawn_blocking(move || decode_image(&bytes));
    let (image, format) = match tokio::time::timeout(limits.decode_timeout, decode).await {
        Ok(joined) => joined.map_err(|e| UploadError::TaskFailed(e.to_string()))??,
        Err(_) => return Err(UploadError::DecodeTimeout(limits.decode_timeout.as_secs())),
    };

    let (display_width, display_height) = fit_display_size(
        image.width(),
        image.height(),
        max_display_width,
        max_display_height,
    );
    let source = ImageSource::new(image, format, display_width, display_height);

    info!(
        "Loaded {:?}: {}x{} shown at {}x{} (scale {:.3})",
        path,
        source.original_width,
        source.original_height,
        source.display_width,
        source.display_height,
        source.scale_factor
    );
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(mime_type_for(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("scan.png")), "image/png");
        assert_eq!(mime_type_for(Path::new("anim.gif")), "image/gif");
        assert_eq!(mime_type_for(Path::new("notes.txt")), "text/plain");
    }

    #[test]
    fn test_validate_upload_rules() {
        let limits = UploadLimits::default();
        assert!(validate_upload("image/png", 1024, &limits).is_ok());
        assert!(validate_upload("image/jpg", 1024, &limits).is_ok());
        assert!(matches!(
            validate_upload("image/webp", 1024, &limits),
            Err(UploadError::UnsupportedType(_))
        ));
        assert!(matches!(
            validate_upload("image/png", 0, &limits),
            Err(UploadError::Empty)
        ));
        assert!(matches!(
            validate_upload("image/png", DEFAULT_MAX_FILE_SIZE + 1, &limits),
            Err(UploadError::TooLarge { .. })
        ));
        assert!(validate_upload("image/png", DEFAULT_MAX_FILE_SIZE, &limits).is_ok());
    }

    #[test]
    fn test_fit_display_size() {
        assert_eq!(fit_display_size(1600, 1200, 800, 600), (800, 600));
        assert_eq!(fit_display_size(4000, 1000, 800, 600), (800, 200));
        assert_eq!(fit_display_size(1000, 4000, 800, 600), (150, 600));
        // Small images are not upscaled
        assert_eq!(fit_display_size(320, 240, 800, 600), (320, 240));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[tokio::test]
    async fn test_load_image_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.png");
        RgbImage::from_pixel(1600, 1200, Rgb([200, 100, 50]))
            .save(&path)
            .unwrap();

        let source = load_image_file(&path, &UploadLimits::default(), 800, 600)
            .await
            .unwrap();

        assert_eq!(source.format, Some(ImageFormat::Png));
        assert_eq!((source.original_width, source.original_height), (1600, 1200));
        assert_eq!((source.display_width, source.display_height), (800, 600));
        assert_eq!(source.scale_factor, 0.5);
    }

    #[tokio::test]
    async fn test_load_rejects_before_decoding() {
        let temp_dir = TempDir::new().unwrap();

        let empty = temp_dir.path().join("empty.png");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            load_image_file(&empty, &UploadLimits::default(), 800, 600).await,
            Err(UploadError::Empty)
        ));

        let text = temp_dir.path().join("readme.txt");
        std::fs::write(&text, b"hello").unwrap();
        assert!(matches!(
            load_image_file(&text, &UploadLimits::default(), 800, 600).await,
            Err(UploadError::UnsupportedType(_))
        ));

        let corrupt = temp_dir.path().join("corrupt.jpg");
        std::fs::write(&corrupt, b"\xff\xd8\xff garbage").unwrap();
        assert!(load_image_file(&corrupt, &UploadLimits::default(), 800, 600)
            .await
            .is_err());
    }
}
