//! Fixed-size staging canvas the source image is stretched onto.

use image::RgbaImage;
use tiny_skia::{Color, ColorU8, FilterQuality, IntSize, Pixmap, PixmapPaint, Transform};
use tracing::debug;

use crate::acquire::SourceImage;
use crate::{Error, Result, DISPLAY_HEIGHT, DISPLAY_WIDTH, PIXEL_COUNT};

/// The 240x240 RGBA surface every selection is drawn onto.
///
/// The surface is reused across selections and always cleared before a new
/// image is drawn. Its dimensions never change.
pub struct CanvasSurface {
    pixmap: Pixmap,
}

impl Default for CanvasSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasSurface {
    /// Creates a new transparent canvas.
    pub fn new() -> Self {
        let pixmap =
            Pixmap::new(DISPLAY_WIDTH, DISPLAY_HEIGHT).expect("Failed to create pixmap");
        Self { pixmap }
    }

    /// Returns the canvas dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Clears the canvas to transparent black.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Draws `image` stretched to exactly fill the canvas.
    ///
    /// Both axes are scaled independently, so the aspect ratio is not kept.
    /// The canvas is left untouched if the image cannot be staged.
    pub fn draw(&mut self, image: SourceImage) -> Result<()> {
        let source = premultiplied_pixmap(image.into_rgba8())?;
        let sx = DISPLAY_WIDTH as f32 / source.width() as f32;
        let sy = DISPLAY_HEIGHT as f32 / source.height() as f32;

        self.clear();

        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &paint,
            Transform::from_scale(sx, sy),
            None,
        );

        debug!(
            "Drew {}x{} image onto {}x{} canvas (scale {:.3}x{:.3})",
            source.width(),
            source.height(),
            DISPLAY_WIDTH,
            DISPLAY_HEIGHT,
            sx,
            sy
        );
        Ok(())
    }

    /// Reads back the canvas as straight-alpha RGBA8, row-major.
    pub fn read_rgba(&self) -> Result<Vec<u8>> {
        let mut rgba = Vec::with_capacity(PIXEL_COUNT * 4);
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        if rgba.len() != PIXEL_COUNT * 4 {
            return Err(Error::ReadBack(format!(
                "expected {} bytes, read {}",
                PIXEL_COUNT * 4,
                rgba.len()
            )));
        }
        Ok(rgba)
    }

    /// Encodes the canvas as PNG for the live preview.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let rgba = self.read_rgba()?;
        let (width, height) = self.dimensions();

        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&rgba)?;
        }

        Ok(png_data)
    }
}

/// Copies straight-alpha pixels into a premultiplied pixmap for drawing.
fn premultiplied_pixmap(rgba: RgbaImage) -> Result<Pixmap> {
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height).ok_or(Error::EmptyImage { width, height })?;

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        px.copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    Pixmap::from_vec(data, size)
        .ok_or_else(|| Error::ReadBack(format!("cannot stage {}x{} image", width, height)))
}
