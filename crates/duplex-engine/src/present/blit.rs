//! Hardware scaled copy.
//!
//! A blit is a single local-to-local transfer: the source texture and the destination
//! buffer both live in GPU memory and no pixel passes through the CPU. The call only
//! enqueues the transfer; later commands on the same target are ordered behind it by the
//! GPU's in-order execution.
//!
//! This path is a straight copy. Blend modes, color/alpha modulation and clipping are not
//! applied.

use crate::coords::{PixelPoint, PixelRect, Rect};
use crate::device::{
    Conversion, GpuAllocator, GpuDevice, Interpolation, TransferKind, TransferMode,
    TransferOperation, TransferOrigin, TransferScale, TransferScaleFormat, TransferSurface,
    TransferSurfaceFormat,
};
use crate::error::{RenderError, Result};
use crate::texture::Texture;

use super::{scale_ratio, DisplayBuffer};

/// One scaled copy as requested by the host.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlitRequest {
    /// Region of the source texture.
    pub src: PixelRect,
    /// Destination region, relative to the viewport.
    pub dst: Rect,
    /// Viewport origin; added to `dst`'s origin only.
    pub viewport_offset: PixelPoint,
    pub interp: Interpolation,
}

/// Builds the transfer descriptor for `req` reading from `source_offset`/`source_pitch`.
pub fn transfer_descriptor(req: &BlitRequest, source_offset: u32, source_pitch: u32) -> Result<TransferScale> {
    let out = req.dst.to_pixel(req.viewport_offset);
    let ratio = scale_ratio(req.src, out)?;

    Ok(TransferScale {
        conversion: Conversion::Truncate,
        format: TransferScaleFormat::A8R8G8B8,
        operation: TransferOperation::SrcCopy,
        clip: out,
        out,
        ratio_x: ratio.x,
        ratio_y: ratio.y,
        input: req.src,
        offset: source_offset,
        pitch: source_pitch,
        origin: TransferOrigin::Corner,
        interp: req.interp,
    })
}

/// Enqueues a scaled copy of `source` into `dest` and returns the submitted descriptor.
pub fn blit<D: GpuDevice + ?Sized>(
    dev: &mut D,
    alloc: &GpuAllocator,
    source: &Texture,
    dest: &DisplayBuffer,
    req: &BlitRequest,
) -> Result<TransferScale> {
    if source.format.bytes_per_pixel() != 4 {
        return Err(RenderError::UnsupportedFormat {
            format: source.format,
            reason: "the transfer engine copies 32-bit pixels only",
        });
    }
    if req.src.is_empty() {
        return Err(RenderError::InvalidRect(req.src));
    }
    if !source.bounds().contains_rect(req.src) {
        return Err(RenderError::OutOfBounds { rect: req.src, bounds: source.bounds() });
    }

    let src_offset = alloc.offset_of(dev, &source.block)?;
    let dst_offset = alloc.offset_of(dev, &dest.block)?;

    let scale = transfer_descriptor(req, src_offset, source.pitch)?;
    let surface = TransferSurface {
        format: TransferSurfaceFormat::A8R8G8B8,
        pitch: dest.pitch,
        offset: dst_offset,
    };

    dev.set_transfer_scale_mode(TransferMode::LocalToLocal, TransferKind::Surface);
    dev.set_transfer_scale_surface(&scale, &surface);
    Ok(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayMode;
    use crate::device::{SimEvent, SimGpu};
    use crate::format::PixelFormat;
    use crate::present::DoubleBuffer;

    fn request(src: PixelRect, dst: Rect, offset: PixelPoint) -> BlitRequest {
        BlitRequest { src, dst, viewport_offset: offset, interp: Interpolation::Nearest }
    }

    // ── descriptor ────────────────────────────────────────────────────────

    #[test]
    fn viewport_offset_moves_origin_not_size() {
        let req = request(
            PixelRect::new(0, 0, 10, 10),
            Rect::new(0.0, 0.0, 20.0, 20.0),
            PixelPoint::new(5, 5),
        );
        let t = transfer_descriptor(&req, 0, 40).unwrap();

        assert_eq!(t.out, PixelRect::new(5, 5, 20, 20));
        assert_eq!(t.clip, t.out);
        assert_eq!(t.ratio_x, 1 << 19);
        assert_eq!(t.ratio_y, 1 << 19);
        assert_eq!(t.input, PixelRect::new(0, 0, 10, 10));
    }

    #[test]
    fn identity_copy_has_unit_ratio() {
        let req = request(
            PixelRect::new(3, 4, 17, 9),
            Rect::new(1.0, 2.0, 17.0, 9.0),
            PixelPoint::zero(),
        );
        let t = transfer_descriptor(&req, 128, 68).unwrap();
        assert_eq!((t.ratio_x, t.ratio_y), (1 << 20, 1 << 20));
        assert_eq!((t.offset, t.pitch), (128, 68));
        assert_eq!(t.origin, TransferOrigin::Corner);
    }

    #[test]
    fn zero_sized_destination_is_rejected() {
        let req = request(PixelRect::new(0, 0, 4, 4), Rect::new(0.0, 0.0, 0.5, 4.0), PixelPoint::zero());
        assert!(matches!(transfer_descriptor(&req, 0, 16), Err(RenderError::InvalidRect(_))));
    }

    // ── submission ────────────────────────────────────────────────────────

    #[test]
    fn blit_enqueues_local_transfer_and_scales() {
        let mut gpu = SimGpu::new(1 << 16);
        let alloc = GpuAllocator::new(64);
        let chain = DoubleBuffer::create(&mut gpu, &alloc, DisplayMode::new(16, 16, PixelFormat::Argb8888), 64)
            .unwrap();
        let tex = Texture::create(&mut gpu, &alloc, PixelFormat::Argb8888, 2, 2).unwrap();
        tex.update(&mut gpu, tex.bounds(), &[0x11u8; 16], 8).unwrap();
        gpu.take_history();

        let req = request(PixelRect::new(0, 0, 2, 2), Rect::new(0.0, 0.0, 4.0, 4.0), PixelPoint::new(5, 5));
        let dest = *chain.current();
        blit(&mut gpu, &alloc, &tex, &dest, &req).unwrap();

        assert_eq!(
            gpu.history()[0],
            SimEvent::TransferMode(TransferMode::LocalToLocal, TransferKind::Surface)
        );

        let bytes = gpu.bytes(dest.block.addr(), dest.block.len()).unwrap();
        let px = |x: usize, y: usize| &bytes[y * dest.pitch as usize + x * 4..][..4];
        assert_eq!(px(5, 5), &[0x11; 4]);
        assert_eq!(px(8, 8), &[0x11; 4]);
        assert_eq!(px(9, 9), &[0; 4]);
        assert_eq!(px(4, 5), &[0; 4]);
    }

    #[test]
    fn blit_rejects_16_bit_source() {
        let mut gpu = SimGpu::new(1 << 16);
        let alloc = GpuAllocator::new(64);
        let chain = DoubleBuffer::create(&mut gpu, &alloc, DisplayMode::new(8, 8, PixelFormat::Argb8888), 64)
            .unwrap();
        let tex = Texture::create(&mut gpu, &alloc, PixelFormat::Rgb565, 2, 2).unwrap();

        let req = request(tex.bounds(), Rect::new(0.0, 0.0, 2.0, 2.0), PixelPoint::zero());
        let err = blit(&mut gpu, &alloc, &tex, chain.current(), &req).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat { .. }));
    }
}
