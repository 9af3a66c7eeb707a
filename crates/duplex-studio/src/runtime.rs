use anyhow::{Context, Result};
use ouroboros::self_referencing;

use duplex_engine::config::{BackendInit, DisplayMode};
use duplex_engine::coords::{PixelRect, WindowSize};
use duplex_engine::device::SimGpu;
use duplex_engine::renderer::Renderer;
use duplex_engine::FlipRenderer;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::scanout::{Scanout, ScanoutInit, SurfaceErrorAction};
use crate::scene::DemoScene;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub title: String,
    pub mode: DisplayMode,
    pub backend: BackendInit,
    pub scanout: ScanoutInit,
}

/// Entry point for the studio.
pub struct Runtime;

impl Runtime {
    pub fn run(config: StudioConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

        let renderer = FlipRenderer::new(SimGpu::default(), config.mode, config.backend.clone())
            .context("failed to create flip renderer")?;
        log::info!(
            "{} {}x{}, scale quality {:?}",
            renderer.info().name,
            config.mode.width,
            config.mode.height,
            renderer.scale_quality()
        );

        let mut state = AppState {
            config,
            renderer,
            scene: DemoScene::new(),
            window: None,
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        log::info!("{} frames presented", state.scene.frame());
        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    scanout: Scanout<'this>,
}

struct AppState {
    config: StudioConfig,
    renderer: FlipRenderer<SimGpu>,
    scene: DemoScene,

    window: Option<WindowEntry>,
    exit_requested: bool,
}

impl AppState {
    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mode = self.config.mode;
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(mode.width, mode.height));

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let init = self.config.scanout.clone();
        let entry = WindowEntryTryBuilder {
            window,
            scanout_builder: |w| pollster::block_on(Scanout::new(w, init)),
        }
        .try_build()
        .context("scanout initialization failed")?;

        let size = entry.borrow_scanout().size();
        self.recenter(size);

        self.window = Some(entry);
        Ok(())
    }

    /// Keeps the drawn region centered when the window is smaller than the display.
    fn recenter(&mut self, size: PhysicalSize<u32>) {
        let viewport = self
            .renderer
            .update_viewport(PixelRect::default(), Some(WindowSize::new(size.width, size.height)));
        log::debug!("viewport {viewport:?}");
    }

    fn toggle_scale_quality(&mut self) {
        let linear = self.renderer.scale_quality() == duplex_engine::device::Interpolation::Nearest;
        let hint = if linear { "linear" } else { "nearest" };
        self.renderer.set_scale_quality_hint(Some(hint.to_string()));
        log::info!("scale quality: {hint}");
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let viewport = self.renderer.viewport();
        let (w, h) = (viewport.w as f32, viewport.h as f32);

        let drawn = self
            .scene
            .draw(&mut self.renderer, w, h)
            .and_then(|()| self.renderer.present());
        if let Err(e) = drawn {
            log::error!("frame failed: {e}");
            self.request_exit(event_loop);
            return;
        }

        let Some(entry) = self.window.as_mut() else { return };
        let Some(view) = self.renderer.device().scanout() else { return };

        let result = entry.with_scanout_mut(|s| s.show(&view).map_err(|e| s.handle_surface_error(e)));
        match result {
            Ok(()) | Err(SurfaceErrorAction::Reconfigured) | Err(SurfaceErrorAction::SkipFrame) => {}
            Err(SurfaceErrorAction::Fatal) => {
                log::error!("surface out of memory");
                self.request_exit(event_loop);
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.request_exit(event_loop);
            return;
        }

        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // The flip wait paces the loop; keep redrawing.
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.window = None;
                self.request_exit(event_loop);
            }

            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
                ..
            } => match code {
                KeyCode::Escape => self.request_exit(event_loop),
                KeyCode::KeyL => self.toggle_scale_quality(),
                _ => {}
            },

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_scanout_mut(|s| s.resize(new_size));
                }
                self.recenter(new_size);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
