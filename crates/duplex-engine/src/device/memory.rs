use crate::error::{RenderError, Result};

use super::{DeviceError, GpuAddr, GpuDevice};

/// A live allocation in GPU local memory.
///
/// Blocks are plain handles: the owner must hand them back through
/// [`GpuAllocator::free`] exactly once.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GpuBlock {
    addr: GpuAddr,
    len: usize,
}

impl GpuBlock {
    #[inline]
    pub fn addr(&self) -> GpuAddr {
        self.addr
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Aligned GPU memory allocation and address translation on top of a [`GpuDevice`].
///
/// Device failures are lifted into the host-facing taxonomy: exhaustion becomes
/// [`RenderError::OutOfMemory`], a failed translation [`RenderError::AddressTranslation`].
#[derive(Debug, Copy, Clone)]
pub struct GpuAllocator {
    align: u32,
}

impl GpuAllocator {
    pub fn new(align: u32) -> Self {
        Self { align: align.max(1).next_power_of_two() }
    }

    pub fn align(&self) -> u32 {
        self.align
    }

    /// Allocates `len` bytes and zeroes them.
    pub fn alloc_zeroed<D: GpuDevice + ?Sized>(&self, dev: &mut D, len: usize) -> Result<GpuBlock> {
        let addr = dev.alloc(len, self.align).map_err(|e| match e {
            DeviceError::OutOfMemory { requested } => RenderError::OutOfMemory { requested },
            other => RenderError::Device(other),
        })?;
        let block = GpuBlock { addr, len };

        match dev.bytes_mut(addr, len) {
            Ok(bytes) => bytes.fill(0),
            Err(e) => {
                dev.free(addr);
                return Err(e.into());
            }
        }

        log::debug!("gpu alloc {len} bytes at {addr}");
        Ok(block)
    }

    pub fn free<D: GpuDevice + ?Sized>(&self, dev: &mut D, block: GpuBlock) {
        log::debug!("gpu free {} bytes at {}", block.len, block.addr);
        dev.free(block.addr);
    }

    /// Translates the start of `block` into a command-stream offset.
    pub fn offset_of<D: GpuDevice + ?Sized>(&self, dev: &D, block: &GpuBlock) -> Result<u32> {
        dev.address_to_offset(block.addr)
            .map_err(|_| RenderError::AddressTranslation(block.addr))
    }
}
