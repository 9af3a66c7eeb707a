//! The double-buffered hardware backend.
//!
//! [`FlipRenderer`] owns the display buffers and drives the GPU through a [`GpuDevice`].
//! Frame lifecycle:
//!
//! 1. Draw calls obtain the current drawable, which waits out a flip still in flight.
//! 2. Clears and blits are GPU commands; points, lines and fills are rasterized on the CPU
//!    into the mapped buffer.
//! 3. [`present`](Renderer::present) queues the flip, dispatches it, advances to the other
//!    buffer and rebinds the render target without waiting.

use std::collections::HashMap;

use crate::config::{scale_quality, BackendInit, DisplayMode};
use crate::coords::{centered_viewport, Color8, PixelPoint, PixelRect, Rect, Vec2, WindowSize};
use crate::device::{ClearMask, GpuAllocator, GpuDevice, Interpolation};
use crate::error::{RenderError, Result};
use crate::format::{convert_pixels, PixelFormat};
use crate::present::{blit, target, BlitRequest, DisplayBuffer, DoubleBuffer, FlipSync, PresentationState};
use crate::raster::{BlendMode, Rasterizer, SoftRasterizer, SurfaceMut};
use crate::renderer::{Renderer, RendererFlags, RendererInfo, TextureId};
use crate::texture::{Texture, TextureLock};

/// Name reported through [`RendererInfo`].
pub const RENDERER_NAME: &str = "duplex-flip";

pub struct FlipRenderer<D: GpuDevice, R: Rasterizer = SoftRasterizer> {
    device: D,
    raster: R,
    allocator: GpuAllocator,
    chain: DoubleBuffer,
    flip: FlipSync,

    textures: HashMap<TextureId, Texture>,
    next_texture: u32,

    draw_color: Color8,
    draw_blend: BlendMode,
    viewport: PixelRect,
    scale_hint: Option<String>,

    info: RendererInfo,
    warned_blit_features: bool,
}

impl<D: GpuDevice> FlipRenderer<D> {
    /// Creates the backend with the built-in software rasterizer.
    pub fn new(device: D, mode: DisplayMode, init: BackendInit) -> Result<Self> {
        Self::with_rasterizer(device, SoftRasterizer::new(), mode, init)
    }
}

impl<D: GpuDevice, R: Rasterizer> FlipRenderer<D, R> {
    /// Allocates both display buffers and the depth buffer and binds buffer 0.
    ///
    /// Any failure frees whatever was already allocated.
    pub fn with_rasterizer(mut device: D, raster: R, mode: DisplayMode, init: BackendInit) -> Result<Self> {
        let allocator = GpuAllocator::new(init.memory_alignment);
        let chain = DoubleBuffer::create(&mut device, &allocator, mode, init.pitch_alignment)?;
        let viewport = centered_viewport(PixelRect::default(), chain.current().size(), None);

        let mut renderer = Self {
            device,
            raster,
            allocator,
            chain,
            flip: FlipSync::new(init.poll),
            textures: HashMap::new(),
            next_texture: 1,
            draw_color: Color8::white(),
            draw_blend: BlendMode::None,
            viewport,
            scale_hint: init.scale_quality_hint,
            info: RendererInfo {
                name: RENDERER_NAME,
                flags: RendererFlags::ACCELERATED | RendererFlags::PRESENT_VSYNC,
                texture_formats: vec![PixelFormat::Argb8888],
                max_texture_width: 0,
                max_texture_height: 0,
            },
            warned_blit_features: false,
        };

        // On error `renderer` drops here and releases the chain.
        renderer.rebind()?;

        log::debug!(
            "{RENDERER_NAME}: {}x{} {:?} ready",
            mode.width,
            mode.height,
            mode.format
        );
        Ok(renderer)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn presentation_state(&self) -> &PresentationState {
        self.chain.state()
    }

    /// Buffer the next draw call targets. Does not wait for an in-flight flip.
    pub fn current_buffer(&self) -> &DisplayBuffer {
        self.chain.current()
    }

    pub fn viewport(&self) -> PixelRect {
        self.viewport
    }

    pub fn draw_color(&self) -> Color8 {
        self.draw_color
    }

    /// Replaces the scale-quality hint; consulted on every [`copy`](Renderer::copy).
    pub fn set_scale_quality_hint(&mut self, hint: Option<String>) {
        self.scale_hint = hint;
    }

    pub fn scale_quality(&self) -> Interpolation {
        scale_quality(self.scale_hint.as_deref())
    }

    fn rebind(&mut self) -> Result<()> {
        target::bind(&mut self.device, &self.allocator, self.chain.current(), self.chain.depth())?;
        Ok(())
    }

    fn texture_mut(&mut self, id: TextureId) -> Result<&mut Texture> {
        self.textures.get_mut(&id).ok_or(RenderError::UnknownTexture(id))
    }

    /// Runs `draw` on the mapped current drawable, clipped to the viewport.
    fn rasterize<F>(&mut self, draw: F) -> Result<()>
    where
        F: FnOnce(&mut R, &mut SurfaceMut<'_>, Color8, BlendMode) -> Result<()>,
    {
        let buffer = self.chain.acquire_drawable(&mut self.device, &self.flip)?;
        let pixels = self.device.bytes_mut(buffer.block.addr(), buffer.block.len())?;
        let mut surface = SurfaceMut::new(pixels, buffer.width, buffer.height, buffer.pitch, buffer.format)
            .with_clip(self.viewport);

        draw(&mut self.raster, &mut surface, self.draw_color, self.draw_blend)
    }

    fn to_pixels(&self, points: &[Vec2]) -> Vec<PixelPoint> {
        let offset = self.viewport.origin();
        points.iter().map(|p| p.to_pixel(offset)).collect()
    }

}

/// Texture state and placement the hardware copy path cannot honor.
fn ignored_blit_features(texture: &Texture, viewport: PixelRect, out: PixelRect) -> Vec<&'static str> {
    let mut ignored = Vec::new();
    if texture.blend_mode != BlendMode::None {
        ignored.push("blend mode");
    }
    if texture.is_modulated() {
        ignored.push("color/alpha modulation");
    }
    if !viewport.contains_rect(out) {
        ignored.push("viewport clipping");
    }
    ignored
}

/// Rejects NaN or infinite host rectangles before they are truncated to pixels.
fn ensure_finite(rect: Rect, offset: PixelPoint) -> Result<()> {
    if rect.is_finite() {
        Ok(())
    } else {
        Err(RenderError::InvalidRect(rect.to_pixel(offset)))
    }
}

impl<D: GpuDevice, R: Rasterizer> Renderer for FlipRenderer<D, R> {
    fn info(&self) -> &RendererInfo {
        &self.info
    }

    fn create_texture(&mut self, format: PixelFormat, width: u32, height: u32) -> Result<TextureId> {
        let texture = Texture::create(&mut self.device, &self.allocator, format, width, height)?;
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, texture);
        log::debug!("{id} created: {width}x{height} {format:?}");
        Ok(id)
    }

    fn update_texture(&mut self, id: TextureId, rect: PixelRect, pixels: &[u8], pitch: u32) -> Result<()> {
        let texture = self.textures.get(&id).ok_or(RenderError::UnknownTexture(id))?;
        texture.update(&mut self.device, rect, pixels, pitch)
    }

    fn lock_texture(&mut self, id: TextureId, rect: PixelRect) -> Result<TextureLock<'_>> {
        let texture = self.textures.get(&id).ok_or(RenderError::UnknownTexture(id))?;
        texture.lock(&mut self.device, rect)
    }

    fn set_texture_color_mod(&mut self, id: TextureId, r: u8, g: u8, b: u8) -> Result<()> {
        let texture = self.texture_mut(id)?;
        texture.color_mod = Color8::new(r, g, b, 255);
        Ok(())
    }

    fn set_texture_alpha_mod(&mut self, id: TextureId, alpha: u8) -> Result<()> {
        self.texture_mut(id)?.alpha_mod = alpha;
        Ok(())
    }

    fn set_texture_blend_mode(&mut self, id: TextureId, mode: BlendMode) -> Result<()> {
        self.texture_mut(id)?.blend_mode = mode;
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) -> Result<()> {
        let texture = self.textures.remove(&id).ok_or(RenderError::UnknownTexture(id))?;

        // Queued transfers may still read from it.
        self.device.flush();
        self.device.finish();

        texture.destroy(&mut self.device, &self.allocator);
        log::debug!("{id} destroyed");
        Ok(())
    }

    fn set_draw_color(&mut self, color: Color8) {
        self.draw_color = color;
    }

    fn set_draw_blend_mode(&mut self, mode: BlendMode) {
        self.draw_blend = mode;
    }

    fn update_viewport(&mut self, viewport: PixelRect, window: Option<WindowSize>) -> PixelRect {
        self.viewport = centered_viewport(viewport, self.chain.current().size(), window);
        self.viewport
    }

    fn clear(&mut self) -> Result<()> {
        let buffer = self.chain.acquire_drawable(&mut self.device, &self.flip)?;
        let color = buffer.format.map_rgba(self.draw_color);

        self.device.set_clear_color(color);
        self.device.clear_surface(ClearMask::COLOR);
        Ok(())
    }

    fn draw_points(&mut self, points: &[Vec2]) -> Result<()> {
        let points = self.to_pixels(points);
        self.rasterize(|raster, surface, color, blend| raster.draw_points(surface, &points, color, blend))
    }

    fn draw_lines(&mut self, points: &[Vec2]) -> Result<()> {
        let points = self.to_pixels(points);
        self.rasterize(|raster, surface, color, blend| raster.draw_lines(surface, &points, color, blend))
    }

    fn fill_rects(&mut self, rects: &[Rect]) -> Result<()> {
        let offset = self.viewport.origin();
        let rects = rects
            .iter()
            .map(|&r| ensure_finite(r, offset).map(|()| r.to_pixel_min1(offset)))
            .collect::<Result<Vec<PixelRect>>>()?;
        self.rasterize(|raster, surface, color, blend| raster.fill_rects(surface, &rects, color, blend))
    }

    fn copy(&mut self, texture: TextureId, src: PixelRect, dst: Rect) -> Result<()> {
        let viewport_offset = self.viewport.origin();
        ensure_finite(dst, viewport_offset)?;

        let buffer = self.chain.acquire_drawable(&mut self.device, &self.flip)?;
        let req = BlitRequest {
            src,
            dst,
            viewport_offset,
            interp: self.scale_quality(),
        };

        let source = self.textures.get(&texture).ok_or(RenderError::UnknownTexture(texture))?;
        if !self.warned_blit_features {
            let ignored = ignored_blit_features(source, self.viewport, dst.to_pixel(viewport_offset));
            if !ignored.is_empty() {
                log::warn!(
                    "{RENDERER_NAME}: hardware copy ignores {}; copying unblended and unclipped",
                    ignored.join(", ")
                );
                self.warned_blit_features = true;
            }
        }

        blit::blit(&mut self.device, &self.allocator, source, &buffer, &req)?;
        Ok(())
    }

    fn read_pixels(&mut self, rect: PixelRect, format: PixelFormat, pixels: &mut [u8], pitch: u32) -> Result<()> {
        let buffer = self.chain.acquire_drawable(&mut self.device, &self.flip)?;
        let rect = rect.offset(self.viewport.origin());

        if rect.w < 0 || rect.h < 0 {
            return Err(RenderError::InvalidRect(rect));
        }
        let bounds = buffer.bounds();
        if rect.x < 0 || rect.y < 0 || rect.right() > bounds.right() || rect.bottom() > bounds.bottom() {
            return Err(RenderError::OutOfBounds { rect, bounds });
        }

        // Earlier clears and blits must land before the CPU reads.
        self.device.flush();
        self.device.finish();

        let bytes = self.device.bytes(buffer.block.addr(), buffer.block.len())?;
        let start = rect.y as usize * buffer.pitch as usize
            + rect.x as usize * buffer.format.bytes_per_pixel() as usize;

        convert_pixels(
            rect.w as u32,
            rect.h as u32,
            buffer.format,
            &bytes[start..],
            buffer.pitch,
            format,
            pixels,
            pitch,
        )
    }

    fn present(&mut self) -> Result<()> {
        // Waits out the previous flip; presenting twice must not queue two flips.
        self.chain.acquire_drawable(&mut self.device, &self.flip)?;

        self.flip.submit(&mut self.device, self.chain.state_mut());
        self.chain.advance();
        self.rebind()?;

        log::trace!("presented; now drawing buffer {}", self.chain.state().current().get());
        Ok(())
    }
}

impl<D: GpuDevice, R: Rasterizer> Drop for FlipRenderer<D, R> {
    fn drop(&mut self) {
        self.device.flush();
        self.device.finish();

        for (_, texture) in self.textures.drain() {
            texture.destroy(&mut self.device, &self.allocator);
        }
        self.chain.release(&mut self.device, &self.allocator, &self.flip);

        log::debug!("{RENDERER_NAME}: released");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::PollConfig;
    use crate::device::{SimEvent, SimGpu};
    use crate::present::BufferIndex;

    const RED: Color8 = Color8::new(255, 0, 0, 255);
    const BLUE: Color8 = Color8::new(0, 0, 255, 255);

    fn fast_init() -> BackendInit {
        BackendInit {
            poll: PollConfig { interval: Duration::ZERO, deadline: None },
            ..BackendInit::default()
        }
    }

    fn mode(w: u32, h: u32) -> DisplayMode {
        DisplayMode::new(w, h, PixelFormat::Argb8888)
    }

    fn read_one(r: &mut impl Renderer, x: i32, y: i32) -> u32 {
        let mut px = [0u8; 4];
        r.read_pixels(PixelRect::new(x, y, 1, 1), PixelFormat::Argb8888, &mut px, 4).unwrap();
        u32::from_le_bytes(px)
    }

    // ── construction / teardown ───────────────────────────────────────────

    #[test]
    fn creation_binds_first_buffer() {
        let mut gpu = SimGpu::default();
        let r = FlipRenderer::new(&mut gpu, mode(64, 32), fast_init()).unwrap();

        assert_eq!(r.presentation_state().current(), BufferIndex::FIRST);
        assert!(!r.presentation_state().flip_in_flight());
        assert_eq!(r.viewport(), PixelRect::new(0, 0, 64, 32));

        let bound = r.device().surface().copied().unwrap();
        let offset = r.device().address_to_offset(r.current_buffer().block.addr()).unwrap();
        assert_eq!(bound.color_offset[0], offset);
        assert_eq!(bound.width, 64);
    }

    #[test]
    fn out_of_memory_unwinds_everything() {
        // Room for one display buffer only.
        let mut gpu = SimGpu::new(800 * 4 * 600 + 4096);
        let err = FlipRenderer::new(&mut gpu, mode(800, 600), fast_init()).err().unwrap();

        assert!(matches!(err, RenderError::OutOfMemory { .. }));
        assert_eq!(gpu.live_allocations(), 0);
    }

    #[test]
    fn unsupported_display_format_is_rejected() {
        let mut gpu = SimGpu::default();
        let err = FlipRenderer::new(&mut gpu, DisplayMode::new(8, 8, PixelFormat::Rgb565), fast_init())
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::UnsupportedFormat { .. }));
        assert_eq!(gpu.live_allocations(), 0);
    }

    #[test]
    fn teardown_waits_for_in_flight_flip() {
        let mut gpu = SimGpu::default().with_flip_latency(5);
        {
            let mut r = FlipRenderer::new(&mut gpu, mode(16, 16), fast_init()).unwrap();
            r.present().unwrap();
            assert!(r.presentation_state().flip_in_flight());
        }

        let history = gpu.history();
        let retired = history.iter().position(|e| *e == SimEvent::FlipRetired(0)).unwrap();
        let first_free = history.iter().position(|e| matches!(e, SimEvent::Free(_))).unwrap();
        assert!(retired < first_free);
        assert_eq!(gpu.live_allocations(), 0);
    }

    #[test]
    fn teardown_frees_textures() {
        let mut gpu = SimGpu::default();
        {
            let mut r = FlipRenderer::new(&mut gpu, mode(16, 16), fast_init()).unwrap();
            r.create_texture(PixelFormat::Argb8888, 4, 4).unwrap();
            r.create_texture(PixelFormat::Argb8888, 8, 8).unwrap();
        }
        assert_eq!(gpu.live_allocations(), 0);
    }

    // ── presentation ──────────────────────────────────────────────────────

    #[test]
    fn present_alternates_buffers() {
        let mut gpu = SimGpu::default().with_flip_latency(2);
        let mut r = FlipRenderer::new(&mut gpu, mode(16, 16), fast_init()).unwrap();

        for frame in 0..6u8 {
            let drawn = r.presentation_state().current();
            assert_eq!(drawn.get(), frame % 2);

            r.present().unwrap();

            let state = r.presentation_state();
            assert!(state.flip_in_flight());
            assert_eq!(state.current(), drawn.other());
            assert_eq!(r.device().history().iter().rev().find_map(|e| match e {
                SimEvent::FlipQueued(i) => Some(*i),
                _ => None,
            }), Some(drawn.get()));
        }
    }

    #[test]
    fn present_rebinds_to_new_buffer_without_waiting() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(16, 16), fast_init()).unwrap();
        r.device_mut().take_history();

        r.present().unwrap();

        let events = r.device().history().to_vec();
        assert_eq!(events[0], SimEvent::FlipQueued(0));
        assert_eq!(events[1], SimEvent::Flush);
        assert_eq!(events[2], SimEvent::WaitFlip);
        assert!(matches!(events[3], SimEvent::Surface(_)));
        assert_eq!(events.len(), 4);

        let second = r.device().address_to_offset(r.current_buffer().block.addr()).unwrap();
        assert_eq!(r.device().surface().unwrap().color_offset[0], second);
    }

    #[test]
    fn acquire_twice_waits_once() {
        let mut gpu = SimGpu::default().with_flip_latency(3);
        let mut r = FlipRenderer::new(&mut gpu, mode(16, 16), fast_init()).unwrap();
        r.present().unwrap();

        r.clear().unwrap();
        let polls = r.device().status_polls();
        assert!(polls > 0);
        assert!(!r.presentation_state().flip_in_flight());

        r.clear().unwrap();
        assert_eq!(r.device().status_polls(), polls);
        assert_eq!(r.presentation_state().current(), BufferIndex::SECOND);
    }

    #[test]
    fn presented_frame_reaches_scanout() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();

        r.set_draw_color(RED);
        r.clear().unwrap();
        r.present().unwrap();
        r.set_draw_color(BLUE);
        r.clear().unwrap();

        let view = r.device().scanout().unwrap();
        assert_eq!(view.index, 0);
        assert_eq!(&view.pixels[..4], &0xFFFF_0000u32.to_le_bytes());
        assert_eq!(read_one(&mut r, 0, 0), 0xFF00_00FF);
    }

    #[test]
    fn flip_deadline_reports_timeout() {
        let init = BackendInit {
            poll: PollConfig { interval: Duration::ZERO, deadline: Some(Duration::from_millis(5)) },
            ..BackendInit::default()
        };
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), init).unwrap();

        r.device_mut().set_never_retire(true);
        r.present().unwrap();
        assert!(matches!(r.clear(), Err(RenderError::FlipTimeout(_))));
        assert!(r.presentation_state().flip_in_flight());

        r.device_mut().set_never_retire(false);
        r.clear().unwrap();
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn fill_respects_viewport_offset() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(32, 32), fast_init()).unwrap();
        r.update_viewport(PixelRect::new(10, 10, 8, 8), None);

        r.set_draw_color(RED);
        r.fill_rects(&[Rect::new(0.0, 0.0, 2.0, 0.2)]).unwrap();

        r.update_viewport(PixelRect::default(), None);
        assert_eq!(read_one(&mut r, 10, 10), 0xFFFF_0000);
        assert_eq!(read_one(&mut r, 11, 10), 0xFFFF_0000);
        assert_eq!(read_one(&mut r, 10, 11), 0);
        assert_eq!(read_one(&mut r, 9, 10), 0);
    }

    #[test]
    fn primitives_are_clipped_to_viewport() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(32, 32), fast_init()).unwrap();
        r.update_viewport(PixelRect::new(4, 4, 4, 4), None);

        r.draw_lines(&[Vec2::new(-10.0, 0.0), Vec2::new(20.0, 0.0)]).unwrap();

        r.update_viewport(PixelRect::default(), None);
        assert_ne!(read_one(&mut r, 4, 4), 0);
        assert_ne!(read_one(&mut r, 7, 4), 0);
        assert_eq!(read_one(&mut r, 8, 4), 0);
        assert_eq!(read_one(&mut r, 3, 4), 0);
    }

    #[test]
    fn viewport_centering_does_not_accumulate() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(100, 80), fast_init()).unwrap();
        let window = Some(WindowSize::new(60, 60));

        let first = r.update_viewport(PixelRect::default(), window);
        let second = r.update_viewport(PixelRect::default(), window);
        assert_eq!(first, PixelRect::new(20, 10, 100, 80));
        assert_eq!(first, second);
    }

    #[test]
    fn fill_with_non_finite_rect_draws_nothing() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();

        r.set_draw_color(RED);
        let err = r
            .fill_rects(&[Rect::new(0.0, 0.0, 2.0, 2.0), Rect::new(f32::NAN, 0.0, 2.0, 2.0)])
            .unwrap_err();

        assert!(matches!(err, RenderError::InvalidRect(_)));
        assert_eq!(read_one(&mut r, 0, 0), 0);
    }

    // ── copy ──────────────────────────────────────────────────────────────

    #[test]
    fn copy_scales_texture_into_viewport() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(32, 32), fast_init()).unwrap();
        let tex = r.create_texture(PixelFormat::Argb8888, 2, 1).unwrap();

        let mut src = Vec::new();
        src.extend_from_slice(&0xFFFF_0000u32.to_le_bytes());
        src.extend_from_slice(&0xFF00_FF00u32.to_le_bytes());
        r.update_texture(tex, PixelRect::new(0, 0, 2, 1), &src, 8).unwrap();

        r.update_viewport(PixelRect::new(5, 5, 20, 20), None);
        r.copy(tex, PixelRect::new(0, 0, 2, 1), Rect::new(0.0, 0.0, 4.0, 2.0)).unwrap();
        r.update_viewport(PixelRect::default(), None);

        assert_eq!(read_one(&mut r, 5, 5), 0xFFFF_0000);
        assert_eq!(read_one(&mut r, 6, 6), 0xFFFF_0000);
        assert_eq!(read_one(&mut r, 7, 5), 0xFF00_FF00);
        assert_eq!(read_one(&mut r, 8, 6), 0xFF00_FF00);
        assert_eq!(read_one(&mut r, 9, 5), 0);
    }

    #[test]
    fn copy_uses_scale_quality_hint() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(16, 16), fast_init()).unwrap();
        let tex = r.create_texture(PixelFormat::Argb8888, 4, 4).unwrap();

        r.set_scale_quality_hint(Some("linear".into()));
        r.copy(tex, PixelRect::new(0, 0, 4, 4), Rect::new(0.0, 0.0, 8.0, 8.0)).unwrap();

        let interp = r.device().history().iter().rev().find_map(|e| match e {
            SimEvent::Transfer(scale, _) => Some(scale.interp),
            _ => None,
        });
        assert_eq!(interp, Some(Interpolation::Linear));
    }

    #[test]
    fn copy_with_blend_mode_still_copies() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();
        let tex = r.create_texture(PixelFormat::Argb8888, 1, 1).unwrap();
        r.update_texture(tex, PixelRect::new(0, 0, 1, 1), &0x80FF_FFFFu32.to_le_bytes(), 4).unwrap();
        r.set_texture_blend_mode(tex, BlendMode::Blend).unwrap();
        r.set_texture_alpha_mod(tex, 10).unwrap();

        r.copy(tex, PixelRect::new(0, 0, 1, 1), Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        r.copy(tex, PixelRect::new(0, 0, 1, 1), Rect::new(1.0, 0.0, 1.0, 1.0)).unwrap();

        assert!(r.warned_blit_features);
        assert_eq!(read_one(&mut r, 0, 0), 0x80FF_FFFF);
        assert_eq!(read_one(&mut r, 1, 0), 0x80FF_FFFF);
    }

    #[test]
    fn copy_unknown_texture_fails() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();
        let err = r
            .copy(TextureId(99), PixelRect::new(0, 0, 1, 1), Rect::new(0.0, 0.0, 1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownTexture(TextureId(99))));
    }

    #[test]
    fn copy_with_infinite_destination_fails() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();
        let tex = r.create_texture(PixelFormat::Argb8888, 2, 2).unwrap();

        let err = r
            .copy(tex, PixelRect::new(0, 0, 2, 2), Rect::new(0.0, 0.0, f32::INFINITY, 2.0))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidRect(_)));
    }

    // ── textures ──────────────────────────────────────────────────────────

    #[test]
    fn create_texture_with_overflowing_width_fails() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();
        let live = r.device().live_allocations();

        let err = r.create_texture(PixelFormat::Argb8888, 1 << 30, 1).unwrap_err();

        assert!(matches!(err, RenderError::InvalidRect(_)));
        assert_eq!(r.device().live_allocations(), live);
    }

    #[test]
    fn destroy_texture_finishes_before_free() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();
        let tex = r.create_texture(PixelFormat::Argb8888, 4, 4).unwrap();
        let live = r.device().live_allocations();
        r.device_mut().take_history();

        r.destroy_texture(tex).unwrap();

        let events = r.device().history().to_vec();
        let finish = events.iter().position(|e| *e == SimEvent::Finish).unwrap();
        let free = events.iter().position(|e| matches!(e, SimEvent::Free(_))).unwrap();
        assert!(finish < free);
        assert_eq!(r.device().live_allocations(), live - 1);
        assert!(matches!(r.destroy_texture(tex), Err(RenderError::UnknownTexture(_))));
    }

    #[test]
    fn locked_texture_writes_are_visible_to_copy() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();
        let tex = r.create_texture(PixelFormat::Argb8888, 2, 2).unwrap();
        {
            let lock = r.lock_texture(tex, PixelRect::new(1, 1, 1, 1)).unwrap();
            lock.pixels[..4].copy_from_slice(&0xFF12_3456u32.to_le_bytes());
        }

        r.copy(tex, PixelRect::new(0, 0, 2, 2), Rect::new(0.0, 0.0, 2.0, 2.0)).unwrap();
        assert_eq!(read_one(&mut r, 1, 1), 0xFF12_3456);
        assert_eq!(read_one(&mut r, 0, 0), 0);
    }

    // ── read_pixels ───────────────────────────────────────────────────────

    #[test]
    fn read_near_i32_max_with_offset_viewport_is_out_of_bounds() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(100, 80), fast_init()).unwrap();
        let viewport = r.update_viewport(PixelRect::default(), Some(WindowSize::new(60, 60)));
        assert_eq!(viewport.origin(), PixelPoint::new(20, 10));

        let mut out = [0u8; 4];
        let err = r
            .read_pixels(PixelRect::new(i32::MAX - 5, 0, 1, 1), PixelFormat::Argb8888, &mut out, 4)
            .unwrap_err();
        assert!(matches!(err, RenderError::OutOfBounds { .. }));
    }

    #[test]
    fn read_outside_bounds_touches_nothing() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(800, 600), fast_init()).unwrap();
        r.device_mut().take_history();

        let mut out = vec![0xABu8; 50 * 4];
        let err = r
            .read_pixels(PixelRect::new(790, 0, 50, 1), PixelFormat::Argb8888, &mut out, 200)
            .unwrap_err();

        assert!(matches!(err, RenderError::OutOfBounds { .. }));
        assert!(out.iter().all(|&b| b == 0xAB));
        assert!(r.device().history().is_empty());
    }

    #[test]
    fn read_converts_format() {
        let mut gpu = SimGpu::default();
        let mut r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();
        r.set_draw_color(RED);
        r.clear().unwrap();

        let mut out = [0u8; 4];
        r.read_pixels(PixelRect::new(2, 2, 1, 1), PixelFormat::Abgr8888, &mut out, 4).unwrap();
        assert_eq!(u32::from_le_bytes(out), 0xFF00_00FF);
    }

    #[test]
    fn info_advertises_accelerated_vsync() {
        let mut gpu = SimGpu::default();
        let r = FlipRenderer::new(&mut gpu, mode(8, 8), fast_init()).unwrap();
        let info = r.info();
        assert_eq!(info.name, RENDERER_NAME);
        assert!(info.flags.contains(RendererFlags::ACCELERATED | RendererFlags::PRESENT_VSYNC));
        assert_eq!(info.texture_formats, vec![PixelFormat::Argb8888]);
    }
}
