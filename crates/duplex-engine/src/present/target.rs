//! Render-target binding.
//!
//! The GPU renders into a physical buffer, not into "the current one", so the binding is
//! rebuilt and resubmitted whenever the drawn buffer changes: once at creation and after
//! every flip.

use crate::device::{
    AntiAlias, ColorFormat, ColorTarget, DepthFormat, GpuAllocator, GpuDevice, Location,
    SurfaceBinding, SurfaceType, COLOR_SLOTS,
};
use crate::error::Result;

use super::{DepthBuffer, DisplayBuffer};

/// Pitch programmed into unused color slots.
const UNUSED_SLOT_PITCH: u32 = 64;

/// Builds the binding for `buffer` given already-translated offsets.
///
/// Color goes to slot 0 only; slots 1.. are parked at offset 0 with a minimal pitch.
pub fn build_binding(
    buffer: &DisplayBuffer,
    color_offset: u32,
    depth: &DepthBuffer,
    depth_offset: u32,
) -> SurfaceBinding {
    let mut color_offsets = [0u32; COLOR_SLOTS];
    let mut color_pitches = [UNUSED_SLOT_PITCH; COLOR_SLOTS];
    color_offsets[0] = color_offset;
    color_pitches[0] = buffer.pitch;

    SurfaceBinding {
        color_format: ColorFormat::X8R8G8B8,
        color_target: ColorTarget::Target0,
        color_location: [Location::Local; COLOR_SLOTS],
        color_offset: color_offsets,
        color_pitch: color_pitches,

        depth_format: DepthFormat::Z16,
        depth_location: Location::Local,
        depth_offset,
        depth_pitch: depth.pitch,

        surface_type: SurfaceType::Linear,
        anti_alias: AntiAlias::Center1,

        width: buffer.width,
        height: buffer.height,
        x: 0,
        y: 0,
    }
}

/// Translates both buffers to GPU offsets and submits the binding.
///
/// A translation failure means the buffer is not GPU-resident; nothing is submitted.
pub fn bind<D: GpuDevice + ?Sized>(
    dev: &mut D,
    alloc: &GpuAllocator,
    buffer: &DisplayBuffer,
    depth: &DepthBuffer,
) -> Result<SurfaceBinding> {
    let color_offset = alloc.offset_of(dev, &buffer.block)?;
    let depth_offset = alloc.offset_of(dev, &depth.block)?;

    let binding = build_binding(buffer, color_offset, depth, depth_offset);
    dev.set_surface(&binding);
    Ok(binding)
}
