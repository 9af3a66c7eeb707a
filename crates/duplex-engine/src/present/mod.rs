//! Double-buffered presentation.
//!
//! Leaf-first:
//! - [`scale`]: fixed-point scale ratios for the transfer engine
//! - [`target`]: render-target binding for the active display buffer
//! - [`flip`]: flip submission and completion wait
//! - [`buffers`]: the two display buffers, the depth buffer and the presentation state
//! - [`blit`]: hardware scaled copy into the active buffer

pub mod blit;
pub mod buffers;
pub mod flip;
pub mod scale;
pub mod target;

mod state;

pub use blit::{transfer_descriptor, BlitRequest};
pub use buffers::{DepthBuffer, DisplayBuffer, DoubleBuffer};
pub use flip::FlipSync;
pub use scale::{scale_ratio, ScaleRatio, SCALE_SHIFT};
pub use state::{BufferIndex, PresentationState};
