//! Coordinate and geometry types shared by the backend and its host.
//!
//! Canonical space:
//! - Physical pixels of the display buffer
//! - Origin top-left
//! - +X right, +Y down
//!
//! Host draw calls arrive in `f32` ([`Vec2`], [`Rect`]); everything that reaches the GPU
//! or the software rasterizer is integral ([`PixelPoint`], [`PixelRect`]).

mod color;
mod pixel;
mod rect;
mod vec2;
mod viewport;

pub use color::Color8;
pub use pixel::{PixelPoint, PixelRect};
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::{centered_viewport, WindowSize};
