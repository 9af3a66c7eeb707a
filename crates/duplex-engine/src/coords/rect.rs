use super::{PixelPoint, PixelRect, Vec2};

/// Axis-aligned rectangle in pixels (top-left origin), as supplied by the host.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// False when any coordinate is NaN or infinite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Moves the origin by the viewport offset and truncates to pixels.
    ///
    /// Only the origin is translated; the size is truncated as-is.
    #[inline]
    pub fn to_pixel(self, offset: PixelPoint) -> PixelRect {
        let origin = self.origin.to_pixel(offset);
        PixelRect::new(origin.x, origin.y, self.size.x as i32, self.size.y as i32)
    }

    /// Like [`to_pixel`](Self::to_pixel), but never produces a dimension below 1.
    ///
    /// Fill-style callers rely on this so a sub-pixel rectangle still covers a pixel.
    #[inline]
    pub fn to_pixel_min1(self, offset: PixelPoint) -> PixelRect {
        let r = self.to_pixel(offset);
        PixelRect::new(r.x, r.y, r.w.max(1), r.h.max(1))
    }
}
