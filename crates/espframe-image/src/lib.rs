//! espframe image pipeline
//!
//! Turns an arbitrary image into the 240x240 RGB565 frame consumed by the
//! ESP32 display firmware: decode, stretch onto a fixed canvas, reduce to
//! 16-bit colour and serialize.

pub mod acquire;
pub mod bitmap;
pub mod error;
pub mod raster;

mod pipeline;

pub use acquire::{acquire, SelectedFile, SourceImage};
pub use bitmap::{parse_hex_color, rgb565_to_rgb888, rgb888_to_rgb565, Bitmap565};
pub use error::{Error, Result};
pub use pipeline::convert;
pub use raster::CanvasSurface;

/// Display dimensions
pub const DISPLAY_WIDTH: u32 = 240;
pub const DISPLAY_HEIGHT: u32 = 240;

/// Total pixel count for the display.
pub const PIXEL_COUNT: usize = DISPLAY_WIDTH as usize * DISPLAY_HEIGHT as usize;

/// Size of the serialized frame (2 bytes per pixel).
pub const FRAME_BYTES: usize = PIXEL_COUNT * 2;
