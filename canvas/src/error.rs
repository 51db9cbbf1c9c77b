use thiserror::Error;

/// Errors raised by the off-screen canvas.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("font error: {0}")]
    Font(String),

    #[error("no font available for text rendering")]
    NoFont,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("pixel data does not match a {width}x{height} RGBA image")]
    InvalidImageData { width: u32, height: u32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CanvasError> = std::result::Result<T, E>;
