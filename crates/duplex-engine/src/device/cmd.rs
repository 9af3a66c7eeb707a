//! Command descriptors submitted to the GPU.
//!
//! These mirror the hardware's surface-binding and transfer-scale structures field for
//! field; the backend fills them and the device interprets them.

use bitflags::bitflags;

use crate::coords::PixelRect;

/// Number of color attachment slots in a surface binding.
pub const COLOR_SLOTS: usize = 4;

/// Memory a surface or transfer refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Location {
    /// GPU local memory.
    Local,
    /// Host memory mapped into the GPU address space.
    Main,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorFormat {
    X8R8G8B8,
    A8R8G8B8,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DepthFormat {
    Z16,
    Z24S8,
}

/// Which color slots receive output.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorTarget {
    None,
    Target0,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceType {
    Linear,
    Swizzle,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AntiAlias {
    /// One sample at the pixel center.
    Center1,
}

/// Render-target binding: where color and depth output go.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SurfaceBinding {
    pub color_format: ColorFormat,
    pub color_target: ColorTarget,
    pub color_location: [Location; COLOR_SLOTS],
    pub color_offset: [u32; COLOR_SLOTS],
    pub color_pitch: [u32; COLOR_SLOTS],

    pub depth_format: DepthFormat,
    pub depth_location: Location,
    pub depth_offset: u32,
    pub depth_pitch: u32,

    pub surface_type: SurfaceType,
    pub anti_alias: AntiAlias,

    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

bitflags! {
    /// Channels touched by a surface clear.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct ClearMask: u32 {
        const Z = 1 << 0;
        const S = 1 << 1;
        const R = 1 << 4;
        const G = 1 << 5;
        const B = 1 << 6;
        const A = 1 << 7;
        const COLOR = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

/// Source/destination memory of a transfer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransferMode {
    LocalToLocal,
    MainToLocal,
    LocalToMain,
}

/// Destination layout of a transfer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransferKind {
    Surface,
    Swizzle,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Conversion {
    Truncate,
    Dither,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransferScaleFormat {
    A8R8G8B8,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransferOperation {
    SrcCopy,
}

/// Where the sampling grid is anchored inside a source pixel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransferOrigin {
    Center,
    Corner,
}

/// Sampling filter of the transfer engine.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Interpolation {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransferSurfaceFormat {
    A8R8G8B8,
}

/// Scaled transfer descriptor.
///
/// `ratio_x`/`ratio_y` are source-per-destination step sizes in 12.20 fixed point.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransferScale {
    pub conversion: Conversion,
    pub format: TransferScaleFormat,
    pub operation: TransferOperation,
    pub clip: PixelRect,
    pub out: PixelRect,
    pub ratio_x: u32,
    pub ratio_y: u32,
    pub input: PixelRect,
    pub offset: u32,
    pub pitch: u32,
    pub origin: TransferOrigin,
    pub interp: Interpolation,
}

/// Destination surface of a transfer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransferSurface {
    pub format: TransferSurfaceFormat,
    pub pitch: u32,
    pub offset: u32,
}
