//! Error types for the espframe image pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing a frame.
#[derive(Error, Debug)]
pub enum Error {
    /// The selected data could not be decoded as an image.
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The image decoded but has no pixels to draw.
    #[error("Image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Canvas pixels could not be allocated or read back.
    #[error("Canvas read-back failed: {0}")]
    ReadBack(String),

    /// Pixel buffer size mismatch.
    #[error("Pixel buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Reading the source file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Preview encoding failed.
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

impl Error {
    /// Returns true for the failures that mean "this is not a usable image".
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::EmptyImage { .. } | Error::ReadBack(_)
        )
    }
}
