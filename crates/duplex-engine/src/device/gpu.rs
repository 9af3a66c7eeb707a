use std::fmt;

use super::{
    ClearMask, DeviceError, SurfaceBinding, TransferKind, TransferMode, TransferScale,
    TransferSurface,
};

/// CPU-visible address of GPU-addressable memory.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GpuAddr(pub u64);

impl fmt::Display for GpuAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Hardware flip-status latch as seen by a poll.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FlipStatus {
    /// No flip has completed since the latch was last reset.
    Pending,
    /// A flip completed; the latch stays set until [`GpuDevice::reset_flip_status`].
    Retired,
}

/// The GPU command context the backend drives.
///
/// Commands are executed by the GPU in submission order, asynchronously to the caller.
/// A flip only reaches the hardware once the command buffer is flushed.
pub trait GpuDevice {
    /// Allocates `size` bytes of local memory aligned to `align`.
    fn alloc(&mut self, size: usize, align: u32) -> Result<GpuAddr, DeviceError>;

    /// Releases an allocation. Unknown addresses are ignored.
    fn free(&mut self, addr: GpuAddr);

    /// Translates a CPU-visible address into the offset the command stream expects.
    fn address_to_offset(&self, addr: GpuAddr) -> Result<u32, DeviceError>;

    /// CPU view of `len` bytes starting at `addr`.
    fn bytes(&self, addr: GpuAddr, len: usize) -> Result<&[u8], DeviceError>;

    /// Mutable CPU view of `len` bytes starting at `addr`.
    fn bytes_mut(&mut self, addr: GpuAddr, len: usize) -> Result<&mut [u8], DeviceError>;

    /// Registers scan-out buffer `index` with the display controller.
    fn set_display_buffer(
        &mut self,
        index: u8,
        offset: u32,
        pitch: u32,
        width: u32,
        height: u32,
    ) -> Result<(), DeviceError>;

    fn set_surface(&mut self, binding: &SurfaceBinding);

    fn set_clear_color(&mut self, color: u32);

    fn clear_surface(&mut self, mask: ClearMask);

    fn set_transfer_scale_mode(&mut self, mode: TransferMode, kind: TransferKind);

    fn set_transfer_scale_surface(&mut self, scale: &TransferScale, surface: &TransferSurface);

    /// Queues a flip to scan-out buffer `index`.
    fn set_flip(&mut self, index: u8);

    /// Dispatches queued commands to the hardware.
    fn flush(&mut self);

    /// Makes subsequent commands wait until the queued flip has been taken.
    fn set_wait_flip(&mut self);

    /// Polls the flip-status latch.
    fn flip_status(&mut self) -> FlipStatus;

    /// Clears the flip-status latch.
    fn reset_flip_status(&mut self);

    /// Blocks until every dispatched drawing command has executed.
    fn finish(&mut self);
}

impl<D: GpuDevice + ?Sized> GpuDevice for &mut D {
    fn alloc(&mut self, size: usize, align: u32) -> Result<GpuAddr, DeviceError> {
        (**self).alloc(size, align)
    }

    fn free(&mut self, addr: GpuAddr) {
        (**self).free(addr)
    }

    fn address_to_offset(&self, addr: GpuAddr) -> Result<u32, DeviceError> {
        (**self).address_to_offset(addr)
    }

    fn bytes(&self, addr: GpuAddr, len: usize) -> Result<&[u8], DeviceError> {
        (**self).bytes(addr, len)
    }

    fn bytes_mut(&mut self, addr: GpuAddr, len: usize) -> Result<&mut [u8], DeviceError> {
        (**self).bytes_mut(addr, len)
    }

    fn set_display_buffer(
        &mut self,
        index: u8,
        offset: u32,
        pitch: u32,
        width: u32,
        height: u32,
    ) -> Result<(), DeviceError> {
        (**self).set_display_buffer(index, offset, pitch, width, height)
    }

    fn set_surface(&mut self, binding: &SurfaceBinding) {
        (**self).set_surface(binding)
    }

    fn set_clear_color(&mut self, color: u32) {
        (**self).set_clear_color(color)
    }

    fn clear_surface(&mut self, mask: ClearMask) {
        (**self).clear_surface(mask)
    }

    fn set_transfer_scale_mode(&mut self, mode: TransferMode, kind: TransferKind) {
        (**self).set_transfer_scale_mode(mode, kind)
    }

    fn set_transfer_scale_surface(&mut self, scale: &TransferScale, surface: &TransferSurface) {
        (**self).set_transfer_scale_surface(scale, surface)
    }

    fn set_flip(&mut self, index: u8) {
        (**self).set_flip(index)
    }

    fn flush(&mut self) {
        (**self).flush()
    }

    fn set_wait_flip(&mut self) {
        (**self).set_wait_flip()
    }

    fn flip_status(&mut self) -> FlipStatus {
        (**self).flip_status()
    }

    fn reset_flip_status(&mut self) {
        (**self).reset_flip_status()
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}
