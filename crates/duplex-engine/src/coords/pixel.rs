/// Integral point in display-buffer pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

}

/// Integral rectangle in display-buffer pixels.
///
/// Width and height are signed so host input can be carried unmodified until it is
/// validated; an empty rectangle has `w <= 0 || h <= 0`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin covering `width × height`.
    #[inline]
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    #[inline]
    pub fn origin(self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    #[inline]
    pub fn right(self) -> i32 {
        self.x.saturating_add(self.w)
    }

    #[inline]
    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.h)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Translates the origin, saturating at the `i32` range.
    #[inline]
    pub fn offset(self, by: PixelPoint) -> Self {
        Self::new(self.x.saturating_add(by.x), self.y.saturating_add(by.y), self.w, self.h)
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: PixelPoint) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.right() && p.y < self.bottom()
    }

    /// True when `other` lies entirely inside `self`.
    ///
    /// Empty rectangles are contained as long as their origin edges are in range, which
    /// matches how read-back bounds are checked (`x >= 0 && x + w <= width`).
    #[inline]
    pub fn contains_rect(self, other: PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    #[inline]
    pub fn intersect(self, other: PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());

        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }
}
