//! Application window and event loop management.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pollster::FutureExt;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glimmer_core::state::{with_context_mut, Context};
use glimmer_core::{FrameReport, RenderMode};
use glimmer_render::RenderEngine;

/// Runs one frame of the global scene on `engine`.
///
/// Keeps the engine's glow-chain resolution in step with the options before
/// handing the frame to the frame loop.
pub(crate) fn render_frame(engine: &mut RenderEngine, dt: f32) -> Option<FrameReport> {
    with_context_mut(|ctx| {
        engine.set_bloom_divisor(ctx.options.bloom_resolution_divisor);
        let Context {
            scene,
            options,
            frame_loop,
            ..
        } = ctx;
        frame_loop.tick(dt, scene, options, engine)
    })
}

/// The glimmer viewer state.
pub struct App {
    window: Option<Arc<Window>>,
    engine: Option<RenderEngine>,
    close_requested: bool,
    last_frame_time: Option<Instant>,
}

impl App {
    /// Creates a new application.
    pub fn new() -> Self {
        Self {
            window: None,
            engine: None,
            close_requested: false,
            last_frame_time: None,
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let mode = match code {
            KeyCode::Digit1 => Some(RenderMode::SceneWithGlow),
            KeyCode::Digit2 => Some(RenderMode::GlowOnly),
            KeyCode::Digit3 => Some(RenderMode::SceneOnly),
            KeyCode::Space => {
                let started = with_context_mut(Context::spin_targets_now);
                log::info!("spinning {started} object(s)");
                None
            }
            KeyCode::Escape => {
                self.close_requested = true;
                None
            }
            _ => None,
        };
        if let Some(mode) = mode {
            with_context_mut(|ctx| ctx.options.render_mode = mode);
            log::info!("render mode: {mode}");
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = self
            .last_frame_time
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_frame_time = Some(now);

        if let Some(engine) = &mut self.engine {
            render_frame(engine, dt);
        }
    }

    /// Earliest time the next frame may start under the frame-rate cap.
    fn next_frame_deadline(&self) -> Option<Instant> {
        let max_fps = glimmer_core::state::try_with_context(|ctx| ctx.options.max_fps)?;
        if max_fps == 0 {
            return None;
        }
        let last = self.last_frame_time?;
        Some(last + Duration::from_secs_f64(1.0 / f64::from(max_fps)))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("glimmer")
            .with_inner_size(LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let engine = match RenderEngine::new_windowed(window.clone()).block_on() {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("failed to create render engine: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        with_context_mut(|ctx| ctx.frame_loop.request_resize(size.width, size.height));

        self.window = Some(window);
        self.engine = Some(engine);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                with_context_mut(|ctx| ctx.frame_loop.request_resize(size.width, size.height));
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.handle_key(code);
                    }
                }
            }
            _ => {}
        }

        if self.close_requested {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        match self.next_frame_deadline() {
            Some(deadline) if deadline > Instant::now() => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
            _ => {
                event_loop.set_control_flow(ControlFlow::Poll);
                window.request_redraw();
            }
        }
    }
}

/// Runs the glimmer viewer until the window closes.
pub fn run_app() {
    let event_loop = EventLoop::new().expect("failed to create event loop");
    let mut app = App::new();

    event_loop.run_app(&mut app).expect("event loop error");
}
