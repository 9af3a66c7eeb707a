//! Host-facing error taxonomy.

use std::time::Duration;

use crate::coords::PixelRect;
use crate::device::{DeviceError, GpuAddr};
use crate::format::PixelFormat;
use crate::renderer::TextureId;

/// Errors reported by the backend to its host.
///
/// Allocation, translation and format failures abort a construction in progress and
/// unwind whatever was already allocated. Draw-call errors leave the backend usable.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// GPU memory is exhausted.
    #[error("out of GPU memory ({requested} bytes requested)")]
    OutOfMemory { requested: usize },

    /// A CPU-visible address could not be translated into a GPU offset.
    #[error("address {0} is not GPU-resident")]
    AddressTranslation(GpuAddr),

    /// The pixel format cannot back a display buffer or texture on this path.
    #[error("unsupported pixel format {format:?}: {reason}")]
    UnsupportedFormat {
        format: PixelFormat,
        reason: &'static str,
    },

    /// A read or update touched pixels outside the surface.
    #[error("tried to access {rect:?} outside of surface bounds {bounds:?}")]
    OutOfBounds { rect: PixelRect, bounds: PixelRect },

    /// A rectangle argument is degenerate where a positive size is required.
    #[error("invalid rectangle {0:?}")]
    InvalidRect(PixelRect),

    /// A caller-supplied pixel buffer is shorter than the region it describes.
    #[error("pixel buffer too small: {needed} bytes needed, {actual} available")]
    BufferTooSmall { needed: usize, actual: usize },

    /// The fixed-point scale ratio does not fit the 32-bit hardware field.
    #[error("scale ratio overflows the transfer descriptor ({src} -> {dst})")]
    RatioOverflow { src: i32, dst: i32 },

    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),

    /// The hardware did not report flip completion before the configured deadline.
    #[error("flip did not retire within {0:?}")]
    FlipTimeout(Duration),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
