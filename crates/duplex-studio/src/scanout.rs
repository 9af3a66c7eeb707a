//! Shows the simulated display on a real window.
//!
//! Each frame the scanned-out buffer is uploaded into a staging texture and copied onto
//! the swapchain image. No shaders are involved.

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use duplex_engine::device::ScanoutView;
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Initialization parameters for the scan-out window.
#[derive(Debug, Clone)]
pub struct ScanoutInit {
    /// FIFO mirrors the backend's vsync-locked flips.
    pub present_mode: wgpu::PresentMode,
    pub required_limits: wgpu::Limits,
    pub desired_maximum_frame_latency: u32,
}

impl Default for ScanoutInit {
    fn default() -> Self {
        Self {
            present_mode: wgpu::PresentMode::Fifo,
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    Reconfigured,
    SkipFrame,
    Fatal,
}

/// ARGB8888 as stored in memory (little-endian).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Bgra8 {
    b: u8,
    g: u8,
    r: u8,
    a: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Rgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl From<Bgra8> for Rgba8 {
    fn from(p: Bgra8) -> Self {
        Self { r: p.r, g: p.g, b: p.b, a: p.a }
    }
}

/// Window surface plus the staging texture the display buffer is uploaded into.
pub struct Scanout<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,

    staging: Option<Staging>,
    swizzle: Vec<Rgba8>,
}

struct Staging {
    texture: wgpu::Texture,
    width: u32,
    height: u32,
}

impl<'w> Scanout<'w> {
    pub async fn new(window: &'w Window, init: ScanoutInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("duplex-studio scanout"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        anyhow::ensure!(
            caps.usages.contains(wgpu::TextureUsages::COPY_DST),
            "surface does not accept copies"
        );
        let format = choose_surface_format(&caps).context("no 8-bit unorm surface format")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_DST,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        log::debug!("scanout surface {}x{} {format:?}", size.width, size.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            staging: None,
            swizzle: Vec::new(),
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface; a zero size defers configuration.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Uploads `view` and presents it, anchored top-left and cropped to the window.
    pub fn show(&mut self, view: &ScanoutView<'_>) -> std::result::Result<(), SurfaceError> {
        if self.size.width == 0 || self.size.height == 0 {
            return Ok(());
        }

        self.upload(view);
        let Some(staging) = &self.staging else { return Ok(()) };

        let frame = self.surface.get_current_texture()?;
        let extent = wgpu::Extent3d {
            width: staging.width.min(self.config.width),
            height: staging.height.min(self.config.height),
            depth_or_array_layers: 1,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("duplex scanout copy"),
            });
        encoder.copy_texture_to_texture(
            staging.texture.as_image_copy(),
            frame.texture.as_image_copy(),
            extent,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn upload(&mut self, view: &ScanoutView<'_>) {
        let stale = self
            .staging
            .as_ref()
            .is_none_or(|s| s.width != view.width || s.height != view.height);
        if stale {
            self.staging = Some(self.create_staging(view.width, view.height));
        }
        let Some(staging) = &self.staging else { return };

        let rows = view.height as usize;
        let row_len = view.width as usize * 4;

        let data: &[u8] = match self.config.format {
            wgpu::TextureFormat::Bgra8Unorm => view.pixels,
            _ => {
                self.swizzle.clear();
                for row in view.pixels.chunks(view.pitch as usize).take(rows) {
                    let px: &[Bgra8] = bytemuck::cast_slice(&row[..row_len]);
                    self.swizzle.extend(px.iter().copied().map(Rgba8::from));
                }
                bytemuck::cast_slice(&self.swizzle)
            }
        };
        let bytes_per_row = match self.config.format {
            wgpu::TextureFormat::Bgra8Unorm => view.pitch,
            _ => view.width * 4,
        };

        self.queue.write_texture(
            staging.texture.as_image_copy(),
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(view.height),
            },
            wgpu::Extent3d {
                width: view.width,
                height: view.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_staging(&self, width: u32, height: u32) -> Staging {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("duplex scanout staging"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.config.format,
            usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        Staging { texture, width, height }
    }

    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(&self.device, &self.config);
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

/// Copies need an exact format match, so only plain (non-sRGB) 8-bit formats qualify.
fn choose_surface_format(caps: &wgpu::SurfaceCapabilities) -> Option<wgpu::TextureFormat> {
    [wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm]
        .into_iter()
        .find(|f| caps.formats.contains(f))
}
