//! Client textures: GPU-resident blit sources.

use crate::coords::{Color8, PixelRect};
use crate::device::{GpuAllocator, GpuBlock, GpuDevice};
use crate::error::{RenderError, Result};
use crate::format::PixelFormat;
use crate::raster::BlendMode;

/// A pixel surface in GPU memory, owned by the backend on the client's behalf.
///
/// Rows are tightly packed (`pitch = width × bytes_per_pixel`).
#[derive(Debug, Clone)]
pub struct Texture {
    pub block: GpuBlock,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,

    /// RGB modulation; alpha is ignored.
    pub color_mod: Color8,
    pub alpha_mod: u8,
    pub blend_mode: BlendMode,
}

/// Writable view of a locked texture region.
///
/// `pixels` starts at the first pixel of the region and runs to the end of the texture;
/// row `n` of the region begins at `n * pitch`. Dropping the lock unlocks it.
#[derive(Debug)]
pub struct TextureLock<'a> {
    pub pixels: &'a mut [u8],
    pub pitch: u32,
}

impl Texture {
    /// Allocates a zeroed texture.
    pub fn create<D: GpuDevice + ?Sized>(
        dev: &mut D,
        alloc: &GpuAllocator,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        if format.masks().is_none() {
            return Err(RenderError::UnsupportedFormat {
                format,
                reason: "textures require a direct-color format",
            });
        }
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidRect(PixelRect::sized(width, height)));
        }

        let too_large = || RenderError::InvalidRect(PixelRect::sized(width, height));
        let pitch = width.checked_mul(format.bytes_per_pixel()).ok_or_else(too_large)?;
        let len = (pitch as usize).checked_mul(height as usize).ok_or_else(too_large)?;
        let block = alloc.alloc_zeroed(dev, len)?;

        Ok(Self {
            block,
            format,
            width,
            height,
            pitch,
            color_mod: Color8::white(),
            alpha_mod: 255,
            blend_mode: BlendMode::None,
        })
    }

    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::sized(self.width, self.height)
    }

    /// True when color or alpha modulation would alter the copied pixels.
    pub fn is_modulated(&self) -> bool {
        let c = self.color_mod;
        (c.r, c.g, c.b) != (255, 255, 255) || self.alpha_mod != 255
    }

    fn check_region(&self, rect: PixelRect) -> Result<()> {
        if rect.is_empty() {
            return Err(RenderError::InvalidRect(rect));
        }
        if !self.bounds().contains_rect(rect) {
            return Err(RenderError::OutOfBounds { rect, bounds: self.bounds() });
        }
        Ok(())
    }

    fn region_start(&self, rect: PixelRect) -> usize {
        rect.y as usize * self.pitch as usize + rect.x as usize * self.format.bytes_per_pixel() as usize
    }

    /// Copies `rect.h` rows of `pixels` (rows `pitch` bytes apart) into `rect`.
    pub fn update<D: GpuDevice + ?Sized>(
        &self,
        dev: &mut D,
        rect: PixelRect,
        pixels: &[u8],
        pitch: u32,
    ) -> Result<()> {
        self.check_region(rect)?;

        let row_len = rect.w as usize * self.format.bytes_per_pixel() as usize;
        let needed = pitch as usize * (rect.h as usize - 1) + row_len;
        if pixels.len() < needed || (pitch as usize) < row_len {
            return Err(RenderError::BufferTooSmall { needed, actual: pixels.len() });
        }

        let start = self.region_start(rect);
        let dst = dev.bytes_mut(self.block.addr(), self.block.len())?;
        for row in 0..rect.h as usize {
            let s = &pixels[row * pitch as usize..][..row_len];
            let d = &mut dst[start + row * self.pitch as usize..][..row_len];
            d.copy_from_slice(s);
        }
        Ok(())
    }

    /// Maps `rect` for direct CPU writes.
    pub fn lock<'a, D: GpuDevice + ?Sized>(
        &self,
        dev: &'a mut D,
        rect: PixelRect,
    ) -> Result<TextureLock<'a>> {
        self.check_region(rect)?;

        let start = self.region_start(rect);
        let bytes = dev.bytes_mut(self.block.addr(), self.block.len())?;
        Ok(TextureLock {
            pixels: &mut bytes[start..],
            pitch: self.pitch,
        })
    }

    pub fn destroy<D: GpuDevice + ?Sized>(self, dev: &mut D, alloc: &GpuAllocator) {
        alloc.free(dev, self.block);
    }
}
