/// Straight-alpha RGBA color with 8-bit channels.
///
/// This is the host's draw color; it is packed into a concrete pixel format with
/// [`PixelFormat::map_rgba`](crate::format::PixelFormat::map_rgba).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Color8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color8 {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}
