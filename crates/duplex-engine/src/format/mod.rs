//! Pixel formats and format conversion.
//!
//! Packed pixels are stored little-endian: an `Argb8888` pixel occupies bytes
//! `[B, G, R, A]` in memory.

mod convert;
mod pixel_format;

pub use convert::convert_pixels;
pub use pixel_format::{Masks, PixelFormat};
