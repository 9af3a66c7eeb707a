//! Host-facing renderer interface.
//!
//! A host drives any backend through [`Renderer`]; [`crate::FlipRenderer`] is the
//! double-buffered hardware implementation.

use std::fmt;

use bitflags::bitflags;

use crate::coords::{Color8, PixelRect, Rect, Vec2, WindowSize};
use crate::error::Result;
use crate::format::PixelFormat;
use crate::raster::BlendMode;
use crate::texture::TextureLock;

bitflags! {
    /// Capabilities advertised in [`RendererInfo`].
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct RendererFlags: u32 {
        const SOFTWARE = 1 << 0;
        const ACCELERATED = 1 << 1;
        const PRESENT_VSYNC = 1 << 2;
        const TARGET_TEXTURE = 1 << 3;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererInfo {
    pub name: &'static str,
    pub flags: RendererFlags,
    pub texture_formats: Vec<PixelFormat>,
    /// `0` means unlimited.
    pub max_texture_width: u32,
    pub max_texture_height: u32,
}

/// Handle to a texture owned by a renderer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) u32);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// Drawing operations a backend exposes to its host.
///
/// Coordinates of draw calls are relative to the current viewport. Every draw call targets
/// the buffer that will be shown by the next [`present`](Renderer::present).
pub trait Renderer {
    fn info(&self) -> &RendererInfo;

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&mut self, format: PixelFormat, width: u32, height: u32) -> Result<TextureId>;

    /// Copies `pixels` (rows `pitch` bytes apart) into `rect` of the texture.
    fn update_texture(&mut self, id: TextureId, rect: PixelRect, pixels: &[u8], pitch: u32) -> Result<()>;

    /// Maps `rect` of the texture for writing. Dropping the lock unlocks it.
    fn lock_texture(&mut self, id: TextureId, rect: PixelRect) -> Result<TextureLock<'_>>;

    fn set_texture_color_mod(&mut self, id: TextureId, r: u8, g: u8, b: u8) -> Result<()>;
    fn set_texture_alpha_mod(&mut self, id: TextureId, alpha: u8) -> Result<()>;
    fn set_texture_blend_mode(&mut self, id: TextureId, mode: BlendMode) -> Result<()>;

    fn destroy_texture(&mut self, id: TextureId) -> Result<()>;

    // ── draw state ────────────────────────────────────────────────────────

    fn set_draw_color(&mut self, color: Color8);
    fn set_draw_blend_mode(&mut self, mode: BlendMode);

    /// Sets the viewport and returns the effective one (see [`crate::coords::centered_viewport`]).
    fn update_viewport(&mut self, viewport: PixelRect, window: Option<WindowSize>) -> PixelRect;

    // ── drawing ───────────────────────────────────────────────────────────

    /// Fills the whole drawable with the draw color, ignoring the viewport.
    fn clear(&mut self) -> Result<()>;
    fn draw_points(&mut self, points: &[Vec2]) -> Result<()>;
    fn draw_lines(&mut self, points: &[Vec2]) -> Result<()>;
    fn fill_rects(&mut self, rects: &[Rect]) -> Result<()>;

    /// Copies `src` of a texture to `dst`, scaling as needed.
    fn copy(&mut self, texture: TextureId, src: PixelRect, dst: Rect) -> Result<()>;

    /// Reads `rect` of the drawable (viewport-relative) into `pixels` as `format`.
    fn read_pixels(&mut self, rect: PixelRect, format: PixelFormat, pixels: &mut [u8], pitch: u32) -> Result<()>;

    fn present(&mut self) -> Result<()>;
}
