use crate::coords::Color8;

/// Channel masks of a packed pixel format.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Masks {
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub a: u32,
}

/// Pixel formats known to the backend.
///
/// `Index8` is listed so palettized requests can be recognized and rejected; it has no
/// channel masks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    Argb8888,
    Xrgb8888,
    Abgr8888,
    Rgba8888,
    Rgb565,
    Argb1555,
    Index8,
}

impl PixelFormat {
    /// Significant bits per pixel (padding bits excluded).
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Argb8888 | PixelFormat::Abgr8888 | PixelFormat::Rgba8888 => 32,
            PixelFormat::Xrgb8888 => 24,
            PixelFormat::Rgb565 => 16,
            PixelFormat::Argb1555 => 16,
            PixelFormat::Index8 => 8,
        }
    }

    /// Storage size of one pixel.
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Argb8888
            | PixelFormat::Xrgb8888
            | PixelFormat::Abgr8888
            | PixelFormat::Rgba8888 => 4,
            PixelFormat::Rgb565 | PixelFormat::Argb1555 => 2,
            PixelFormat::Index8 => 1,
        }
    }

    /// Channel masks, or `None` for formats that are not direct-color.
    pub const fn masks(self) -> Option<Masks> {
        let m = match self {
            PixelFormat::Argb8888 => Masks { r: 0x00FF_0000, g: 0x0000_FF00, b: 0x0000_00FF, a: 0xFF00_0000 },
            PixelFormat::Xrgb8888 => Masks { r: 0x00FF_0000, g: 0x0000_FF00, b: 0x0000_00FF, a: 0 },
            PixelFormat::Abgr8888 => Masks { r: 0x0000_00FF, g: 0x0000_FF00, b: 0x00FF_0000, a: 0xFF00_0000 },
            PixelFormat::Rgba8888 => Masks { r: 0xFF00_0000, g: 0x00FF_0000, b: 0x0000_FF00, a: 0x0000_00FF },
            PixelFormat::Rgb565 => Masks { r: 0xF800, g: 0x07E0, b: 0x001F, a: 0 },
            PixelFormat::Argb1555 => Masks { r: 0x7C00, g: 0x03E0, b: 0x001F, a: 0x8000 },
            PixelFormat::Index8 => return None,
        };
        Some(m)
    }

    /// Packs a color into this format. Channels without a mask are dropped.
    ///
    /// Non-direct-color formats map every color to `0`.
    pub fn map_rgba(self, c: Color8) -> u32 {
        let Some(m) = self.masks() else { return 0 };
        pack_channel(c.r, m.r) | pack_channel(c.g, m.g) | pack_channel(c.b, m.b) | pack_channel(c.a, m.a)
    }

    /// Unpacks a pixel. A format without an alpha mask yields opaque colors.
    pub fn unpack(self, px: u32) -> Color8 {
        let Some(m) = self.masks() else { return Color8::black() };
        Color8 {
            r: unpack_channel(px, m.r),
            g: unpack_channel(px, m.g),
            b: unpack_channel(px, m.b),
            a: if m.a == 0 { 255 } else { unpack_channel(px, m.a) },
        }
    }

    /// Reads one little-endian pixel from the front of `bytes`.
    #[inline]
    pub fn read(self, bytes: &[u8]) -> u32 {
        match self.bytes_per_pixel() {
            4 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            2 => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
            _ => bytes[0] as u32,
        }
    }

    /// Writes one little-endian pixel to the front of `bytes`.
    #[inline]
    pub fn write(self, bytes: &mut [u8], px: u32) {
        match self.bytes_per_pixel() {
            4 => bytes[..4].copy_from_slice(&px.to_le_bytes()),
            2 => bytes[..2].copy_from_slice(&(px as u16).to_le_bytes()),
            _ => bytes[0] = px as u8,
        }
    }
}

fn pack_channel(v: u8, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let bits = mask.count_ones();
    ((v as u32) >> (8 - bits.min(8))) << shift & mask
}

fn unpack_channel(px: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let bits = mask.count_ones();
    let v = (px & mask) >> shift;
    let max = (1u32 << bits) - 1;
    ((v * 255 + max / 2) / max) as u8
}
