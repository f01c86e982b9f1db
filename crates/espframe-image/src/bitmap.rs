//! RGB565 bitmap for the 240x240 display.

use crate::{Error, Result, DISPLAY_HEIGHT, DISPLAY_WIDTH, FRAME_BYTES, PIXEL_COUNT};

/// A complete 240x240 frame of RGB565 pixels, row-major from the top-left.
///
/// The pixel data is only ever built whole; there is no way to edit a frame
/// after construction, so a new selection always produces a new bitmap.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap565 {
    data: Vec<u16>,
}

impl std::fmt::Debug for Bitmap565 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap565")
            .field("width", &DISPLAY_WIDTH)
            .field("height", &DISPLAY_HEIGHT)
            .field("pixels", &self.data.len())
            .finish()
    }
}

impl Bitmap565 {
    /// Creates a frame filled with a single RGB565 colour.
    pub fn solid(color: u16) -> Self {
        Self {
            data: vec![color; PIXEL_COUNT],
        }
    }

    /// Converts straight-alpha RGBA8 pixels to RGB565.
    ///
    /// Alpha is ignored. Each channel is truncated to its top bits, never
    /// rounded, so the output matches the display firmware bit for bit.
    pub fn from_rgba8(rgba: &[u8]) -> Result<Self> {
        let expected_len = PIXEL_COUNT * 4;
        if rgba.len() != expected_len {
            return Err(Error::BufferSize {
                expected: expected_len,
                actual: rgba.len(),
            });
        }

        let data = rgba
            .chunks_exact(4)
            .map(|px| rgb888_to_rgb565(px[0], px[1], px[2]))
            .collect();
        Ok(Self { data })
    }

    /// Parses a serialized frame (little-endian, 2 bytes per pixel).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FRAME_BYTES {
            return Err(Error::BufferSize {
                expected: FRAME_BYTES,
                actual: bytes.len(),
            });
        }

        let data = bytes
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        Ok(Self { data })
    }

    /// Serializes the frame as the upload body: 115,200 little-endian bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * 2);
        for &pixel in &self.data {
            bytes.extend_from_slice(&pixel.to_le_bytes());
        }
        bytes
    }

    /// Returns the raw pixel data.
    pub fn pixels(&self) -> &[u16] {
        &self.data
    }

    /// Number of pixels in the frame. Always [`PIXEL_COUNT`].
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// A frame is never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Converts RGB888 to RGB565.
#[inline]
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r >> 3) as u16;
    let g6 = (g >> 2) as u16;
    let b5 = (b >> 3) as u16;
    (r5 << 11) | (g6 << 5) | b5
}

/// Converts RGB565 to RGB888.
#[inline]
pub fn rgb565_to_rgb888(pixel: u16) -> (u8, u8, u8) {
    let r = ((pixel >> 11) & 0x1F) as u8;
    let g = ((pixel >> 5) & 0x3F) as u8;
    let b = (pixel & 0x1F) as u8;
    // Expand to 8-bit
    let r8 = (r << 3) | (r >> 2);
    let g8 = (g << 2) | (g >> 4);
    let b8 = (b << 3) | (b >> 2);
    (r8, g8, b8)
}

/// Parses a hex color string to RGB565.
pub fn parse_hex_color(hex: &str) -> Option<u16> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(rgb888_to_rgb565(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_frame(r: u8, g: u8, b: u8, a: u8) -> Vec<u8> {
        [r, g, b, a].repeat(PIXEL_COUNT)
    }

    #[test]
    fn test_rgb565_conversion() {
        assert_eq!(rgb888_to_rgb565(255, 0, 0), 0xF800);
        assert_eq!(rgb888_to_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(rgb888_to_rgb565(0, 0, 255), 0x001F);
        assert_eq!(rgb888_to_rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb888_to_rgb565(0, 0, 0), 0x0000);
    }

    #[test]
    fn test_truncates_instead_of_rounding() {
        // 0x18 = 0b0001_1000, top five bits 00011
        assert_eq!(rgb888_to_rgb565(0x18, 0, 0) >> 11, 0b00011);
        // 0x1F would round up to 4 but must truncate to 3
        assert_eq!(rgb888_to_rgb565(0x1F, 0, 0) >> 11, 0b00011);
        // 0x07 loses everything below the top six green bits
        assert_eq!(rgb888_to_rgb565(0, 0x07, 0), 0x0020);
        assert_eq!(rgb888_to_rgb565(0, 0, 0x07), 0x0000);
    }

    #[test]
    fn test_from_rgba8_ignores_alpha() {
        let opaque = Bitmap565::from_rgba8(&rgba_frame(0x12, 0x34, 0x56, 255)).unwrap();
        let clear = Bitmap565::from_rgba8(&rgba_frame(0x12, 0x34, 0x56, 0)).unwrap();
        assert_eq!(opaque, clear);
        assert_eq!(opaque.len(), PIXEL_COUNT);
        assert!(opaque
            .pixels()
            .iter()
            .all(|&p| p == rgb888_to_rgb565(0x12, 0x34, 0x56)));
    }

    #[test]
    fn test_from_rgba8_is_row_major() {
        let mut rgba = rgba_frame(0, 0, 0, 255);
        // Pixel (1, 0) white, pixel (0, 1) pure blue
        rgba[4..8].copy_from_slice(&[255, 255, 255, 255]);
        let second_row = DISPLAY_WIDTH as usize * 4;
        rgba[second_row..second_row + 4].copy_from_slice(&[0, 0, 255, 255]);

        let bitmap = Bitmap565::from_rgba8(&rgba).unwrap();
        let pixels = bitmap.pixels();
        assert_eq!(pixels[0], 0x0000);
        assert_eq!(pixels[1], 0xFFFF);
        assert_eq!(pixels[DISPLAY_WIDTH as usize], 0x001F);
    }

    #[test]
    fn test_from_rgba8_rejects_wrong_length() {
        let short = vec![0u8; PIXEL_COUNT * 4 - 4];
        match Bitmap565::from_rgba8(&short) {
            Err(Error::BufferSize { expected, actual }) => {
                assert_eq!(expected, 230_400);
                assert_eq!(actual, 230_396);
            }
            other => panic!("expected size error, got {:?}", other),
        }
        assert!(Bitmap565::from_rgba8(&[]).is_err());
    }

    #[test]
    fn test_from_rgba8_is_deterministic() {
        let rgba: Vec<u8> = (0..PIXEL_COUNT * 4).map(|i| (i * 7 % 251) as u8).collect();
        let a = Bitmap565::from_rgba8(&rgba).unwrap();
        let b = Bitmap565::from_rgba8(&rgba).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_bytes_framing() {
        let bitmap = Bitmap565::solid(0xF800);
        let bytes = bitmap.to_bytes();
        assert_eq!(bytes.len(), FRAME_BYTES);
        assert_eq!(bytes.len(), 2 * bitmap.len());
        // Little-endian: low byte first
        assert_eq!(&bytes[0..2], &[0x00, 0xF8]);

        let parsed = Bitmap565::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, bitmap);
        assert!(Bitmap565::from_bytes(&bytes[1..]).is_err());
    }

    #[test]
    fn test_rgb565_expands_back() {
        assert_eq!(rgb565_to_rgb888(0xFFFF), (255, 255, 255));
        assert_eq!(rgb565_to_rgb888(0xF800), (255, 0, 0));
        assert_eq!(rgb565_to_rgb888(0x07E0), (0, 255, 0));
        assert_eq!(rgb565_to_rgb888(0x0000), (0, 0, 0));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), Some(0xF800));
        assert_eq!(parse_hex_color("00FF00"), Some(0x07E0));
        assert_eq!(parse_hex_color("#000000"), Some(0x0000));
        assert_eq!(parse_hex_color("#FFFFFF"), Some(0xFFFF));
        assert_eq!(parse_hex_color("invalid"), None);
    }
}
