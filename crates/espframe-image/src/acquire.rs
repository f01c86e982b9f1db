//! Image acquisition: turns a user selection into a decoded image.
//!
//! No format allow-list is applied. Anything the `image` crate can sniff and
//! decode is accepted; everything else is a decode failure.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageReader, RgbaImage};
use tracing::debug;

use crate::{Error, Result};

/// A file chosen by the user, as received from a picker or upload form.
#[derive(Debug, Clone, Default)]
pub struct SelectedFile {
    /// Original file name, if the client sent one.
    pub name: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Creates a selection from raw bytes.
    pub fn new(name: Option<String>, bytes: Vec<u8>) -> Self {
        Self { name, bytes }
    }

    /// Browsers submit an empty part when the file input has no selection.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A decoded image of arbitrary, non-zero dimensions.
pub struct SourceImage {
    image: DynamicImage,
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}

impl SourceImage {
    /// Decodes an image from memory, guessing the format from its contents.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        debug!("Decoding {} bytes as {:?}", bytes.len(), reader.format());
        let image = reader.decode()?;
        Self::from_dynamic(image)
    }

    /// Reads and decodes an image file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::decode(&bytes)
    }

    /// Wraps an already decoded image, rejecting zero-area images.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }
        Ok(Self { image })
    }

    /// Returns the intrinsic width.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Returns the intrinsic height.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consumes the image, returning straight-alpha RGBA8 pixels.
    pub fn into_rgba8(self) -> RgbaImage {
        self.image.into_rgba8()
    }
}

/// Decodes the user's selection.
///
/// Returns `Ok(None)` when nothing was chosen. The selection's bytes are
/// dropped before returning, so nothing outlives the decode.
pub fn acquire(selection: Option<SelectedFile>) -> Result<Option<SourceImage>> {
    let Some(file) = selection.filter(|f| !f.is_empty()) else {
        debug!("No file selected");
        return Ok(None);
    };

    let image = SourceImage::decode(&file.bytes)?;
    debug!(
        "Decoded {} ({}x{})",
        file.name.as_deref().unwrap_or("<unnamed>"),
        image.width(),
        image.height()
    );
    Ok(Some(image))
}
