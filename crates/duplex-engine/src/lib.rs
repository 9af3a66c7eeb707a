//! Duplex engine crate.
//!
//! Double-buffered presentation backend for a GPU with a command-stream interface:
//! two alternating display buffers, flip synchronization, render-target binding and
//! hardware scaled blits. The GPU itself sits behind [`device::GpuDevice`]; a software
//! implementation ([`device::SimGpu`]) is provided for tests and headless hosts.

pub mod backend;
pub mod config;
pub mod coords;
pub mod device;
pub mod error;
pub mod format;
pub mod logging;
pub mod present;
pub mod raster;
pub mod renderer;
pub mod texture;

pub use backend::FlipRenderer;
pub use config::{BackendInit, DisplayMode, PollConfig};
pub use error::{RenderError, Result};
pub use renderer::{Renderer, RendererFlags, RendererInfo};
