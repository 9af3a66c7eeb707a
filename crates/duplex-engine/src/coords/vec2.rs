use super::PixelPoint;

/// 2D point in pixels, as supplied by the host.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Translates by an integral viewport offset and truncates toward zero.
    ///
    /// The offset is added in floating point before truncation, so `(-0.5, 0.5)`
    /// shifted by `(1, 0)` lands on `(0, 0)`.
    #[inline]
    pub fn to_pixel(self, offset: PixelPoint) -> PixelPoint {
        PixelPoint::new(
            (offset.x as f32 + self.x) as i32,
            (offset.y as f32 + self.y) as i32,
        )
    }
}
