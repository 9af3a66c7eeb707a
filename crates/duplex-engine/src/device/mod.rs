//! GPU command layer.
//!
//! This module is responsible for:
//! - the [`GpuDevice`] contract the backend drives (allocation, address translation,
//!   command submission, flip control)
//! - the command descriptors submitted through it ([`SurfaceBinding`], [`TransferScale`])
//! - GPU memory allocation on top of the device ([`GpuAllocator`])
//! - a software device ([`SimGpu`]) that executes the command stream in host memory

mod cmd;
mod error;
mod gpu;
mod memory;
mod sim;

pub use cmd::{
    AntiAlias, ClearMask, ColorFormat, ColorTarget, Conversion, DepthFormat, Interpolation,
    Location, SurfaceBinding, SurfaceType, TransferKind, TransferMode, TransferOperation,
    TransferOrigin, TransferScale, TransferScaleFormat, TransferSurface, TransferSurfaceFormat,
    COLOR_SLOTS,
};
pub use error::DeviceError;
pub use gpu::{FlipStatus, GpuAddr, GpuDevice};
pub use memory::{GpuAllocator, GpuBlock};
pub use sim::{ScanoutView, SimEvent, SimGpu};
