//! Rasterize + encode in one step.

use tracing::info;

use crate::acquire::SourceImage;
use crate::bitmap::Bitmap565;
use crate::raster::CanvasSurface;
use crate::Result;

/// Draws `image` onto `surface` and encodes the result as a fresh frame.
///
/// The surface keeps the drawn image afterwards so it can serve as a preview.
pub fn convert(image: SourceImage, surface: &mut CanvasSurface) -> Result<Bitmap565> {
    surface.draw(image)?;
    let rgba = surface.read_rgba()?;
    let bitmap = Bitmap565::from_rgba8(&rgba)?;
    info!("Bitmap ready: {} pixels", bitmap.len());
    Ok(bitmap)
}
