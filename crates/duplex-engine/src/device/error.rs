use super::GpuAddr;

/// Failures reported by the GPU command layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DeviceError {
    /// Local memory cannot satisfy the request.
    #[error("GPU local memory exhausted ({requested} bytes requested)")]
    OutOfMemory { requested: usize },

    /// The address (or range) is not inside GPU-addressable memory.
    #[error("address {0} is not inside GPU local memory")]
    NotResident(GpuAddr),

    /// The display controller refused a scan-out buffer registration.
    #[error("display buffer {index} rejected")]
    DisplayBufferRejected { index: u8 },
}
