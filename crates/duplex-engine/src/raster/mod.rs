//! CPU-side primitive drawing into the active display buffer.
//!
//! The transfer engine only copies; points, lines and rectangle fills are drawn by a
//! [`Rasterizer`] working directly on the mapped buffer memory.

mod soft;

pub use soft::SoftRasterizer;

use crate::coords::{Color8, PixelPoint, PixelRect};
use crate::error::Result;
use crate::format::PixelFormat;

/// How a drawn color combines with the pixel underneath.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BlendMode {
    /// `dst = src`
    #[default]
    None,
    /// `dst.rgb = src.rgb * src.a + dst.rgb * (1 - src.a)`, `dst.a = src.a + dst.a * (1 - src.a)`
    Blend,
    /// `dst.rgb = src.rgb * src.a + dst.rgb`, alpha untouched
    Add,
    /// `dst.rgb = src.rgb * dst.rgb`, alpha untouched
    Mod,
}

/// Mapped pixel memory plus the region drawing is confined to.
#[derive(Debug)]
pub struct SurfaceMut<'a> {
    pub pixels: &'a mut [u8],
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub format: PixelFormat,
    /// Drawing outside this rectangle is discarded. Always within the surface bounds.
    pub clip: PixelRect,
}

impl<'a> SurfaceMut<'a> {
    /// Wraps `pixels`, clipping to the whole surface.
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32, pitch: u32, format: PixelFormat) -> Self {
        Self {
            pixels,
            width,
            height,
            pitch,
            format,
            clip: PixelRect::sized(width, height),
        }
    }

    /// Narrows the clip rectangle to `clip ∩ bounds`. An empty intersection discards everything.
    pub fn with_clip(mut self, clip: PixelRect) -> Self {
        self.clip = PixelRect::sized(self.width, self.height)
            .intersect(clip)
            .unwrap_or(PixelRect::new(0, 0, 0, 0));
        self
    }
}

/// Draws primitives in surface pixel coordinates.
pub trait Rasterizer {
    fn draw_points(
        &mut self,
        surface: &mut SurfaceMut<'_>,
        points: &[PixelPoint],
        color: Color8,
        blend: BlendMode,
    ) -> Result<()>;

    /// Draws a connected polyline through `points`.
    fn draw_lines(
        &mut self,
        surface: &mut SurfaceMut<'_>,
        points: &[PixelPoint],
        color: Color8,
        blend: BlendMode,
    ) -> Result<()>;

    fn fill_rects(
        &mut self,
        surface: &mut SurfaceMut<'_>,
        rects: &[PixelRect],
        color: Color8,
        blend: BlendMode,
    ) -> Result<()>;
}
