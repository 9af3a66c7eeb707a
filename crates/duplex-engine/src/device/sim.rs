use std::collections::{BTreeMap, VecDeque};

use crate::coords::PixelRect;

use super::{
    ClearMask, ColorTarget, DepthFormat, DeviceError, FlipStatus, GpuAddr, GpuDevice,
    Interpolation, SurfaceBinding, TransferKind, TransferMode, TransferOrigin, TransferScale,
    TransferSurface,
};

/// CPU address at which simulated local memory is mapped.
const LOCAL_BASE: u64 = 0xC000_0000;

const DEFAULT_LOCAL_MEMORY: usize = 64 << 20;

const MAX_DISPLAY_BUFFERS: usize = 8;

const FIXED_ONE: u64 = 1 << 20;

/// Everything the simulated GPU observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Alloc { addr: GpuAddr, len: usize },
    Free(GpuAddr),
    DisplayBuffer { index: u8, offset: u32 },
    Surface(SurfaceBinding),
    ClearColor(u32),
    Clear(ClearMask),
    TransferMode(TransferMode, TransferKind),
    Transfer(TransferScale, TransferSurface),
    FlipQueued(u8),
    Flush,
    WaitFlip,
    FlipRetired(u8),
    FlipStatusReset,
    Finish,
}

/// The scan-out buffer currently shown by the simulated display.
#[derive(Debug)]
pub struct ScanoutView<'a> {
    pub index: u8,
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
}

#[derive(Debug, Copy, Clone)]
struct DisplayReg {
    offset: u32,
    pitch: u32,
    width: u32,
    height: u32,
}

/// Software GPU executing the command stream against host memory.
///
/// Drawing commands (clears, transfers) take effect as soon as they are submitted,
/// as if the GPU were infinitely fast. Flips are different: they sit in the command
/// buffer until [`flush`](GpuDevice::flush), and a dispatched flip retires only after
/// `flip_latency` further status polls. [`set_never_retire`](Self::set_never_retire)
/// simulates a hung display engine.
pub struct SimGpu {
    memory: Vec<u8>,
    allocations: BTreeMap<u32, usize>,
    display: [Option<DisplayReg>; MAX_DISPLAY_BUFFERS],

    surface: Option<SurfaceBinding>,
    clear_color: u32,

    queued_flips: Vec<u8>,
    dispatched_flips: VecDeque<u8>,
    polls_left: u32,
    flip_latency: u32,
    never_retire: bool,
    flip_latched: bool,
    displayed: Option<u8>,

    status_polls: u64,
    history: Vec<SimEvent>,
}

impl Default for SimGpu {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_MEMORY)
    }
}

impl SimGpu {
    /// Creates a device with `local_memory` bytes of GPU memory.
    pub fn new(local_memory: usize) -> Self {
        Self {
            memory: vec![0; local_memory.min(u32::MAX as usize)],
            allocations: BTreeMap::new(),
            display: [None; MAX_DISPLAY_BUFFERS],
            surface: None,
            clear_color: 0,
            queued_flips: Vec::new(),
            dispatched_flips: VecDeque::new(),
            polls_left: 1,
            flip_latency: 1,
            never_retire: false,
            flip_latched: false,
            displayed: None,
            status_polls: 0,
            history: Vec::new(),
        }
    }

    /// Number of status polls a dispatched flip stays pending.
    pub fn with_flip_latency(mut self, polls: u32) -> Self {
        self.flip_latency = polls;
        self.polls_left = polls;
        self
    }

    /// When set, dispatched flips never retire.
    pub fn set_never_retire(&mut self, never: bool) {
        self.never_retire = never;
    }

    pub fn history(&self) -> &[SimEvent] {
        &self.history
    }

    pub fn take_history(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.history)
    }

    /// Total number of flip-status polls observed.
    pub fn status_polls(&self) -> u64 {
        self.status_polls
    }

    pub fn live_allocations(&self) -> usize {
        self.allocations.len()
    }

    /// Buffer index of the oldest flip that has been queued or dispatched but not retired.
    pub fn in_flight_flip(&self) -> Option<u8> {
        self.dispatched_flips
            .front()
            .or_else(|| self.queued_flips.first())
            .copied()
    }

    /// Index of the buffer the display is scanning out.
    pub fn displayed(&self) -> Option<u8> {
        self.displayed
    }

    /// Current render-target binding.
    pub fn surface(&self) -> Option<&SurfaceBinding> {
        self.surface.as_ref()
    }

    /// Pixels of the displayed buffer.
    pub fn scanout(&self) -> Option<ScanoutView<'_>> {
        let index = self.displayed?;
        let reg = self.display[index as usize]?;
        let len = (reg.pitch * reg.height) as usize;
        let start = reg.offset as usize;
        Some(ScanoutView {
            index,
            pixels: self.memory.get(start..start + len)?,
            width: reg.width,
            height: reg.height,
            pitch: reg.pitch,
        })
    }

    /// Finds the allocation holding `offset` and returns its `(start, len)`.
    fn allocation_at(&self, offset: usize) -> Option<(usize, usize)> {
        let (&start, &len) = self.allocations.range(..=offset as u32).next_back()?;
        let start = start as usize;
        (offset < start + len).then_some((start, len))
    }

    /// True when `[offset, offset + len)` lies inside one live allocation.
    fn range_live(&self, offset: usize, len: usize) -> bool {
        self.allocation_at(offset)
            .is_some_and(|(start, alloc_len)| offset + len <= start + alloc_len)
    }

    fn resolve(&self, addr: GpuAddr, len: usize) -> Result<usize, DeviceError> {
        let offset = addr
            .0
            .checked_sub(LOCAL_BASE)
            .filter(|off| *off < self.memory.len() as u64)
            .ok_or(DeviceError::NotResident(addr))? as usize;

        if self.range_live(offset, len.max(1)) {
            Ok(offset)
        } else {
            Err(DeviceError::NotResident(addr))
        }
    }

    fn read_u32(&self, offset: usize) -> Option<u32> {
        if !self.range_live(offset, 4) {
            return None;
        }
        let b = &self.memory[offset..offset + 4];
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn write_u32(&mut self, offset: usize, px: u32) {
        if self.range_live(offset, 4) {
            self.memory[offset..offset + 4].copy_from_slice(&px.to_le_bytes());
        }
    }

    fn execute_clear(&mut self, mask: ClearMask) {
        let Some(sf) = self.surface else { return };

        let color_bits = channel_bits(mask);
        if color_bits != 0 && sf.color_target != ColorTarget::None {
            for y in 0..sf.height as usize {
                let row = sf.color_offset[0] as usize + (sf.y as usize + y) * sf.color_pitch[0] as usize;
                for x in 0..sf.width as usize {
                    let off = row + (sf.x as usize + x) * 4;
                    if let Some(old) = self.read_u32(off) {
                        self.write_u32(off, (old & !color_bits) | (self.clear_color & color_bits));
                    }
                }
            }
        }

        if mask.contains(ClearMask::Z) {
            let bpp = match sf.depth_format {
                DepthFormat::Z16 => 2,
                DepthFormat::Z24S8 => 4,
            };
            for y in 0..sf.height as usize {
                let row = sf.depth_offset as usize + y * sf.depth_pitch as usize;
                let len = sf.width as usize * bpp;
                if self.range_live(row, len) {
                    self.memory[row..row + len].fill(0xFF);
                }
            }
        }
    }

    fn execute_transfer(&mut self, scale: &TransferScale, surface: &TransferSurface) {
        if scale.input.is_empty() || scale.ratio_x == 0 || scale.ratio_y == 0 {
            return;
        }
        let Some(region) = scale.out.intersect(scale.clip) else { return };

        for oy in region.y.max(0)..region.bottom() {
            let dy = (oy - scale.out.y) as u64;
            for ox in region.x.max(0)..region.right() {
                let dx = (ox - scale.out.x) as u64;
                let Some(px) = self.sample(scale, dx, dy) else { continue };
                let dst = surface.offset as usize + oy as usize * surface.pitch as usize + ox as usize * 4;
                self.write_u32(dst, px);
            }
        }
    }

    fn source_pixel(&self, scale: &TransferScale, u: u32, v: u32) -> Option<u32> {
        let x = scale.input.x as usize + u as usize;
        let y = scale.input.y as usize + v as usize;
        self.read_u32(scale.offset as usize + y * scale.pitch as usize + x * 4)
    }

    fn sample(&self, scale: &TransferScale, dx: u64, dy: u64) -> Option<u32> {
        let input = scale.input;
        let center = scale.origin == TransferOrigin::Center;

        match scale.interp {
            Interpolation::Nearest => {
                let u = nearest(dx, scale.ratio_x, center, input.w);
                let v = nearest(dy, scale.ratio_y, center, input.h);
                self.source_pixel(scale, u, v)
            }
            Interpolation::Linear => {
                let (u0, u1, fx) = linear(dx, scale.ratio_x, center, input.w);
                let (v0, v1, fy) = linear(dy, scale.ratio_y, center, input.h);
                let p00 = self.source_pixel(scale, u0, v0)?;
                let p10 = self.source_pixel(scale, u1, v0)?;
                let p01 = self.source_pixel(scale, u0, v1)?;
                let p11 = self.source_pixel(scale, u1, v1)?;
                Some(bilerp(p00, p10, p01, p11, fx, fy))
            }
        }
    }
}

/// Color bits of an X8R8G8B8/A8R8G8B8 pixel selected by a clear mask.
fn channel_bits(mask: ClearMask) -> u32 {
    let mut bits = 0;
    if mask.contains(ClearMask::A) {
        bits |= 0xFF00_0000;
    }
    if mask.contains(ClearMask::R) {
        bits |= 0x00FF_0000;
    }
    if mask.contains(ClearMask::G) {
        bits |= 0x0000_FF00;
    }
    if mask.contains(ClearMask::B) {
        bits |= 0x0000_00FF;
    }
    bits
}

fn sample_pos(d: u64, ratio: u32, center: bool) -> u64 {
    let pos = d * ratio as u64;
    if center {
        (pos + (ratio as u64 >> 1)).saturating_sub(FIXED_ONE >> 1)
    } else {
        pos
    }
}

fn nearest(d: u64, ratio: u32, center: bool, len: i32) -> u32 {
    let pos = d * ratio as u64 + if center { ratio as u64 >> 1 } else { 0 };
    ((pos >> 20) as u32).min(len as u32 - 1)
}

/// Returns the two source taps and the 8-bit weight of the second one.
fn linear(d: u64, ratio: u32, center: bool, len: i32) -> (u32, u32, u32) {
    let pos = sample_pos(d, ratio, center);
    let last = len as u32 - 1;
    let i0 = ((pos >> 20) as u32).min(last);
    let i1 = (i0 + 1).min(last);
    let frac = ((pos >> 12) & 0xFF) as u32;
    (i0, i1, frac)
}

fn bilerp(p00: u32, p10: u32, p01: u32, p11: u32, fx: u32, fy: u32) -> u32 {
    let mut out = 0;
    for shift in [0, 8, 16, 24] {
        let c = |p: u32| (p >> shift) & 0xFF;
        let top = c(p00) * (256 - fx) + c(p10) * fx;
        let bottom = c(p01) * (256 - fx) + c(p11) * fx;
        let v = (top * (256 - fy) + bottom * fy + (1 << 15)) >> 16;
        out |= v.min(0xFF) << shift;
    }
    out
}

fn align_up(v: usize, align: usize) -> usize {
    v.div_ceil(align) * align
}

impl GpuDevice for SimGpu {
    fn alloc(&mut self, size: usize, align: u32) -> Result<GpuAddr, DeviceError> {
        let size = size.max(1);
        let align = align.max(1) as usize;

        let mut cursor = 0usize;
        let mut found = None;
        for (&start, &len) in &self.allocations {
            let candidate = align_up(cursor, align);
            if candidate + size <= start as usize {
                found = Some(candidate);
                break;
            }
            cursor = start as usize + len;
        }

        let start = match found {
            Some(start) => start,
            None => {
                let candidate = align_up(cursor, align);
                if candidate + size > self.memory.len() {
                    return Err(DeviceError::OutOfMemory { requested: size });
                }
                candidate
            }
        };

        self.allocations.insert(start as u32, size);
        let addr = GpuAddr(LOCAL_BASE + start as u64);
        self.history.push(SimEvent::Alloc { addr, len: size });
        Ok(addr)
    }

    fn free(&mut self, addr: GpuAddr) {
        let removed = addr
            .0
            .checked_sub(LOCAL_BASE)
            .and_then(|off| u32::try_from(off).ok())
            .and_then(|off| self.allocations.remove(&off));

        if removed.is_some() {
            self.history.push(SimEvent::Free(addr));
        } else {
            log::warn!("sim gpu: free of unknown address {addr}");
        }
    }

    fn address_to_offset(&self, addr: GpuAddr) -> Result<u32, DeviceError> {
        self.resolve(addr, 1).map(|off| off as u32)
    }

    fn bytes(&self, addr: GpuAddr, len: usize) -> Result<&[u8], DeviceError> {
        let off = self.resolve(addr, len)?;
        Ok(&self.memory[off..off + len])
    }

    fn bytes_mut(&mut self, addr: GpuAddr, len: usize) -> Result<&mut [u8], DeviceError> {
        let off = self.resolve(addr, len)?;
        Ok(&mut self.memory[off..off + len])
    }

    fn set_display_buffer(
        &mut self,
        index: u8,
        offset: u32,
        pitch: u32,
        width: u32,
        height: u32,
    ) -> Result<(), DeviceError> {
        let fits = self.range_live(offset as usize, pitch as usize * height as usize);
        if index as usize >= MAX_DISPLAY_BUFFERS || !fits || pitch < width * 4 {
            return Err(DeviceError::DisplayBufferRejected { index });
        }

        self.display[index as usize] = Some(DisplayReg { offset, pitch, width, height });
        self.history.push(SimEvent::DisplayBuffer { index, offset });
        Ok(())
    }

    fn set_surface(&mut self, binding: &SurfaceBinding) {
        self.surface = Some(*binding);
        self.history.push(SimEvent::Surface(*binding));
    }

    fn set_clear_color(&mut self, color: u32) {
        self.clear_color = color;
        self.history.push(SimEvent::ClearColor(color));
    }

    fn clear_surface(&mut self, mask: ClearMask) {
        self.history.push(SimEvent::Clear(mask));
        self.execute_clear(mask);
    }

    fn set_transfer_scale_mode(&mut self, mode: TransferMode, kind: TransferKind) {
        self.history.push(SimEvent::TransferMode(mode, kind));
    }

    fn set_transfer_scale_surface(&mut self, scale: &TransferScale, surface: &TransferSurface) {
        self.history.push(SimEvent::Transfer(*scale, *surface));
        self.execute_transfer(scale, surface);
    }

    fn set_flip(&mut self, index: u8) {
        self.queued_flips.push(index);
        self.history.push(SimEvent::FlipQueued(index));
    }

    fn flush(&mut self) {
        if self.dispatched_flips.is_empty() {
            self.polls_left = self.flip_latency;
        }
        self.dispatched_flips.extend(self.queued_flips.drain(..));
        self.history.push(SimEvent::Flush);
    }

    fn set_wait_flip(&mut self) {
        self.history.push(SimEvent::WaitFlip);
    }

    fn flip_status(&mut self) -> FlipStatus {
        self.status_polls += 1;

        if self.flip_latched {
            return FlipStatus::Retired;
        }
        if self.never_retire || self.dispatched_flips.is_empty() {
            return FlipStatus::Pending;
        }
        if self.polls_left > 0 {
            self.polls_left -= 1;
            return FlipStatus::Pending;
        }

        let Some(index) = self.dispatched_flips.pop_front() else {
            return FlipStatus::Pending;
        };
        self.displayed = Some(index);
        self.flip_latched = true;
        self.polls_left = self.flip_latency;
        self.history.push(SimEvent::FlipRetired(index));
        FlipStatus::Retired
    }

    fn reset_flip_status(&mut self) {
        self.flip_latched = false;
        self.history.push(SimEvent::FlipStatusReset);
    }

    fn finish(&mut self) {
        self.history.push(SimEvent::Finish);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{
        Conversion, TransferOperation, TransferScaleFormat, TransferSurfaceFormat,
    };

    fn put(gpu: &mut SimGpu, addr: GpuAddr, pixels: &[u32]) {
        let bytes = gpu.bytes_mut(addr, pixels.len() * 4).unwrap();
        for (chunk, px) in bytes.chunks_exact_mut(4).zip(pixels) {
            chunk.copy_from_slice(&px.to_le_bytes());
        }
    }

    fn get(gpu: &SimGpu, addr: GpuAddr, count: usize) -> Vec<u32> {
        gpu.bytes(addr, count * 4)
            .unwrap()
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn transfer(src_off: u32, src_pitch: u32, input: PixelRect, out: PixelRect, ratio: (u32, u32)) -> TransferScale {
        TransferScale {
            conversion: Conversion::Truncate,
            format: TransferScaleFormat::A8R8G8B8,
            operation: TransferOperation::SrcCopy,
            clip: out,
            out,
            ratio_x: ratio.0,
            ratio_y: ratio.1,
            input,
            offset: src_off,
            pitch: src_pitch,
            origin: TransferOrigin::Corner,
            interp: Interpolation::Nearest,
        }
    }

    // ── allocation ────────────────────────────────────────────────────────

    #[test]
    fn alloc_respects_alignment() {
        let mut gpu = SimGpu::new(4096);
        let a = gpu.alloc(10, 64).unwrap();
        let b = gpu.alloc(10, 64).unwrap();
        assert_eq!((a.0 - LOCAL_BASE) % 64, 0);
        assert_eq!((b.0 - LOCAL_BASE) % 64, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn alloc_reuses_freed_gap() {
        let mut gpu = SimGpu::new(256);
        let a = gpu.alloc(128, 64).unwrap();
        let _b = gpu.alloc(128, 64).unwrap();
        assert!(gpu.alloc(64, 64).is_err());
        gpu.free(a);
        assert_eq!(gpu.alloc(64, 64).unwrap(), a);
    }

    #[test]
    fn alloc_exhaustion_reports_requested_size() {
        let mut gpu = SimGpu::new(100);
        assert_eq!(gpu.alloc(200, 1), Err(DeviceError::OutOfMemory { requested: 200 }));
    }

    // ── translation ───────────────────────────────────────────────────────

    #[test]
    fn translation_fails_for_freed_memory() {
        let mut gpu = SimGpu::new(1024);
        let a = gpu.alloc(64, 64).unwrap();
        assert_eq!(gpu.address_to_offset(a), Ok(0));
        gpu.free(a);
        assert_eq!(gpu.address_to_offset(a), Err(DeviceError::NotResident(a)));
    }

    #[test]
    fn translation_fails_outside_local_memory() {
        let gpu = SimGpu::new(1024);
        assert!(gpu.address_to_offset(GpuAddr(0x1000)).is_err());
    }

    // ── flips ─────────────────────────────────────────────────────────────

    #[test]
    fn flip_waits_for_flush_then_latency() {
        let mut gpu = SimGpu::new(1024).with_flip_latency(2);
        gpu.set_flip(1);
        assert_eq!(gpu.flip_status(), FlipStatus::Pending);
        gpu.flush();
        assert_eq!(gpu.flip_status(), FlipStatus::Pending);
        assert_eq!(gpu.flip_status(), FlipStatus::Pending);
        assert_eq!(gpu.flip_status(), FlipStatus::Retired);
        assert_eq!(gpu.displayed(), Some(1));
        assert_eq!(gpu.flip_status(), FlipStatus::Retired);
        gpu.reset_flip_status();
        assert_eq!(gpu.flip_status(), FlipStatus::Pending);
    }

    #[test]
    fn hung_display_never_retires() {
        let mut gpu = SimGpu::new(1024).with_flip_latency(0);
        gpu.set_never_retire(true);
        gpu.set_flip(0);
        gpu.flush();
        for _ in 0..100 {
            assert_eq!(gpu.flip_status(), FlipStatus::Pending);
        }
        assert_eq!(gpu.in_flight_flip(), Some(0));
    }

    // ── transfers ─────────────────────────────────────────────────────────

    #[test]
    fn identity_transfer_copies_pixels() {
        let mut gpu = SimGpu::new(4096);
        let src = gpu.alloc(16, 64).unwrap();
        let dst = gpu.alloc(16, 64).unwrap();
        put(&mut gpu, src, &[1, 2, 3, 4]);

        let t = transfer(
            gpu.address_to_offset(src).unwrap(),
            8,
            PixelRect::new(0, 0, 2, 2),
            PixelRect::new(0, 0, 2, 2),
            (1 << 20, 1 << 20),
        );
        let s = TransferSurface {
            format: TransferSurfaceFormat::A8R8G8B8,
            pitch: 8,
            offset: gpu.address_to_offset(dst).unwrap(),
        };
        gpu.set_transfer_scale_surface(&t, &s);

        assert_eq!(get(&gpu, dst, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn upscale_nearest_duplicates_pixels() {
        let mut gpu = SimGpu::new(4096);
        let src = gpu.alloc(8, 64).unwrap();
        let dst = gpu.alloc(16, 64).unwrap();
        put(&mut gpu, src, &[7, 9]);

        let t = transfer(
            gpu.address_to_offset(src).unwrap(),
            8,
            PixelRect::new(0, 0, 2, 1),
            PixelRect::new(0, 0, 4, 1),
            (1 << 19, 1 << 20),
        );
        let s = TransferSurface {
            format: TransferSurfaceFormat::A8R8G8B8,
            pitch: 16,
            offset: gpu.address_to_offset(dst).unwrap(),
        };
        gpu.set_transfer_scale_surface(&t, &s);

        assert_eq!(get(&gpu, dst, 4), vec![7, 7, 9, 9]);
    }

    #[test]
    fn bilerp_midpoint_averages_channels() {
        let px = bilerp(0x0000_0000, 0xFF00_FF00, 0x0000_0000, 0xFF00_FF00, 128, 0);
        assert_eq!(px, 0x8000_8000);
    }
}
