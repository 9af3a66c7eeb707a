//! Display buffers and the presentation state machine.

use crate::config::DisplayMode;
use crate::coords::{PixelRect, WindowSize};
use crate::device::{GpuAllocator, GpuBlock, GpuDevice};
use crate::error::{RenderError, Result};
use crate::format::PixelFormat;

use super::{BufferIndex, FlipSync, PresentationState};

/// One of the two alternating scan-out surfaces.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayBuffer {
    pub block: GpuBlock,
    pub width: u32,
    pub height: u32,
    /// Bytes per row; at least `width × bytes_per_pixel`.
    pub pitch: u32,
    pub format: PixelFormat,
}

impl DisplayBuffer {
    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::sized(self.width, self.height)
    }

    #[inline]
    pub fn size(&self) -> WindowSize {
        WindowSize::new(self.width, self.height)
    }
}

/// Depth attachment bound alongside the color buffer. Only ever cleared.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DepthBuffer {
    pub block: GpuBlock,
    pub pitch: u32,
}

/// Owns both display buffers, the depth buffer, and the presentation state.
///
/// Drawing goes through [`acquire_drawable`](Self::acquire_drawable), which blocks on an
/// outstanding flip before handing out the current buffer, so no buffer is drawn into
/// while the display may still be reading it.
#[derive(Debug)]
pub struct DoubleBuffer {
    buffers: [DisplayBuffer; 2],
    depth: DepthBuffer,
    state: PresentationState,
    released: bool,
}

impl DoubleBuffer {
    /// Allocates and registers both display buffers plus the depth buffer.
    ///
    /// On failure everything allocated so far is freed before the error is returned.
    pub fn create<D: GpuDevice + ?Sized>(
        dev: &mut D,
        alloc: &GpuAllocator,
        mode: DisplayMode,
        pitch_alignment: u32,
    ) -> Result<Self> {
        if mode.format.masks().is_none() || mode.format.bytes_per_pixel() != 4 {
            return Err(RenderError::UnsupportedFormat {
                format: mode.format,
                reason: "display buffers require a 32-bit direct-color format",
            });
        }
        if mode.width == 0 || mode.height == 0 {
            return Err(RenderError::InvalidRect(PixelRect::sized(mode.width, mode.height)));
        }

        let too_large = || RenderError::InvalidRect(PixelRect::sized(mode.width, mode.height));
        let row = mode.width.checked_mul(mode.format.bytes_per_pixel()).ok_or_else(too_large)?;
        let pitch = row.checked_next_multiple_of(pitch_alignment.max(1)).ok_or_else(too_large)?;
        let len = (pitch as usize).checked_mul(mode.height as usize).ok_or_else(too_large)?;
        // Depth is one 32-bit word per pixel, packed.
        let depth = (row, (row as usize).checked_mul(mode.height as usize).ok_or_else(too_large)?);

        let mut blocks: Vec<GpuBlock> = Vec::with_capacity(3);
        let built = Self::allocate(dev, alloc, mode, (pitch, len), depth, &mut blocks);

        match built {
            Ok(chain) => {
                log::debug!(
                    "double buffer {}x{} {:?} pitch {pitch} created",
                    mode.width,
                    mode.height,
                    mode.format
                );
                Ok(chain)
            }
            Err(e) => {
                log::debug!("double buffer creation failed: {e}; unwinding {} blocks", blocks.len());
                for block in blocks {
                    alloc.free(dev, block);
                }
                Err(e)
            }
        }
    }

    fn allocate<D: GpuDevice + ?Sized>(
        dev: &mut D,
        alloc: &GpuAllocator,
        mode: DisplayMode,
        (pitch, len): (u32, usize),
        (depth_pitch, depth_len): (u32, usize),
        blocks: &mut Vec<GpuBlock>,
    ) -> Result<Self> {
        let mut buffers = Vec::with_capacity(2);

        for index in BufferIndex::ALL {
            let block = alloc.alloc_zeroed(dev, len)?;
            blocks.push(block);

            let offset = alloc.offset_of(dev, &block)?;
            dev.set_display_buffer(index.get(), offset, pitch, mode.width, mode.height)?;

            buffers.push(DisplayBuffer {
                block,
                width: mode.width,
                height: mode.height,
                pitch,
                format: mode.format,
            });
        }

        let depth_block = alloc.alloc_zeroed(dev, depth_len)?;
        blocks.push(depth_block);

        Ok(Self {
            buffers: [buffers[0], buffers[1]],
            depth: DepthBuffer { block: depth_block, pitch: depth_pitch },
            state: PresentationState::default(),
            released: false,
        })
    }

    /// Returns the buffer to draw into, first waiting out any flip still in flight.
    pub fn acquire_drawable<D: GpuDevice + ?Sized>(
        &mut self,
        dev: &mut D,
        flip: &FlipSync,
    ) -> Result<DisplayBuffer> {
        if self.state.flip_in_flight() {
            flip.wait_for_completion(dev)?;
            self.state.mark_flip_retired();
        }
        Ok(self.buffers[self.state.current().as_usize()])
    }

    /// Moves drawing to the other buffer.
    pub fn advance(&mut self) {
        self.state.advance();
    }

    /// Buffer at the current index, without waiting.
    pub fn current(&self) -> &DisplayBuffer {
        &self.buffers[self.state.current().as_usize()]
    }

    pub fn buffer(&self, index: BufferIndex) -> &DisplayBuffer {
        &self.buffers[index.as_usize()]
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PresentationState {
        &mut self.state
    }

    /// Frees all buffer memory, waiting first for an in-flight flip to retire.
    ///
    /// Idempotent; later calls do nothing.
    pub fn release<D: GpuDevice + ?Sized>(&mut self, dev: &mut D, alloc: &GpuAllocator, flip: &FlipSync) {
        if self.released {
            return;
        }

        if self.state.flip_in_flight() {
            log::debug!("waiting for in-flight flip before releasing display buffers");
            flip.wait_unbounded(dev);
            self.state.mark_flip_retired();
        }

        for buffer in self.buffers {
            alloc.free(dev, buffer.block);
        }
        alloc.free(dev, self.depth.block);
        self.released = true;
    }
}
