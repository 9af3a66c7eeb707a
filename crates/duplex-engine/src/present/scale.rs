//! Fixed-point scale ratios.
//!
//! The transfer engine steps through the source in 12.20 fixed point: one destination
//! pixel advances the source by `(src << 20) / dst`. The shift is part of the hardware
//! contract.

use crate::coords::PixelRect;
use crate::error::{RenderError, Result};

/// Fractional bits of a transfer scale ratio.
pub const SCALE_SHIFT: u32 = 20;

/// Horizontal and vertical source-per-destination step.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScaleRatio {
    pub x: u32,
    pub y: u32,
}

impl ScaleRatio {
    /// 1:1 copy.
    pub const IDENTITY: ScaleRatio = ScaleRatio { x: 1 << SCALE_SHIFT, y: 1 << SCALE_SHIFT };
}

/// Computes the ratio mapping `src` onto `dst`.
///
/// `dst` must have a positive size; `src` must not be negative in either dimension.
pub fn scale_ratio(src: PixelRect, dst: PixelRect) -> Result<ScaleRatio> {
    if dst.w <= 0 || dst.h <= 0 {
        return Err(RenderError::InvalidRect(dst));
    }
    if src.w < 0 || src.h < 0 {
        return Err(RenderError::InvalidRect(src));
    }

    Ok(ScaleRatio {
        x: axis_ratio(src.w, dst.w)?,
        y: axis_ratio(src.h, dst.h)?,
    })
}

fn axis_ratio(src: i32, dst: i32) -> Result<u32> {
    let ratio = ((src as u64) << SCALE_SHIFT) / dst as u64;
    u32::try_from(ratio).map_err(|_| RenderError::RatioOverflow { src, dst })
}
