use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Drawing surface unavailable: {0}")]
    Unavailable(String),

    #[error("No font loaded")]
    NoFont,

    #[error("Font error: {0}")]
    Font(String),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid text: {0}")]
    InvalidText(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Surface capability failure: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
}
