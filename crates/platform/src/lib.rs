//! Platform layer: windowing, event loop and input feeding.
//!
//! Owns the winit loop. Keyboard/mouse events are folded into an
//! [`InputState`], resizes go to both the GPU surface and the scene, and every
//! redraw runs update -> caller hook -> render.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use corelib::{InputSource, InputState, Key, Vec2};
use renderer::{GpuState, RenderError, Scene};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

pub type GpuScene = Scene<GpuState>;

/// Builds the scene once the GPU is up (meshes need the device).
pub type SceneBuilder = Box<dyn FnOnce(&GpuState) -> Result<GpuScene>>;

/// Per-frame hook after camera input, before rendering. Receives `dt` in seconds.
pub type FrameHook = Box<dyn FnMut(&mut GpuScene, f32)>;

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub title: String,
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            title: "Entity Viewer".to_owned(),
            backends: wgpu::Backends::all(),
            show_fps: false,
            width: 1280,
            height: 720,
        }
    }
}

/// Default physical bindings.
pub fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::KeyW => Key::Forward,
        KeyCode::KeyS => Key::Back,
        KeyCode::KeyA => Key::StrafeLeft,
        KeyCode::KeyD => Key::StrafeRight,
        KeyCode::Space => Key::Up,
        KeyCode::KeyX => Key::Down,
        KeyCode::ShiftLeft => Key::LookModifier,
        KeyCode::Escape => Key::Quit,
        _ => return None,
    })
}

/// Number row picks the active camera: `1` is the first camera.
pub fn camera_slot(code: KeyCode) -> Option<usize> {
    Some(match code {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        KeyCode::Digit8 => 7,
        KeyCode::Digit9 => 8,
        _ => return None,
    })
}

/// Run the window until it is closed or Quit is pressed.
pub fn run_with_renderer(
    options: RunOptions,
    build_scene: SceneBuilder,
    on_frame: FrameHook,
) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        options,
        build_scene: Some(build_scene),
        on_frame,
        running: None,
        input: InputState::new(),
        fps: FpsCounter::default(),
        failure: None,
    };
    event_loop
        .run_app(&mut app)
        .context("Event loop error")?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    gpu: GpuState,
    scene: GpuScene,
    last_frame: Instant,
}

struct App {
    options: RunOptions,
    build_scene: Option<SceneBuilder>,
    on_frame: FrameHook,
    running: Option<Running>,
    input: InputState,
    fps: FpsCounter,
    failure: Option<anyhow::Error>,
}

impl App {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let attrs = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let gpu = GpuState::new_blocking(window.clone(), self.options.backends)?;
        let build = self
            .build_scene
            .take()
            .context("Scene builder already consumed")?;
        let mut scene = build(&gpu)?;
        let (w, h) = gpu.size();
        scene.resize(w, h);
        log::info!("Scene ready:\n{}", scene.summary().trim_end());

        Ok(Running {
            window,
            gpu,
            scene,
            last_frame: Instant::now(),
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if self.input.key_down(Key::Quit) {
            log::info!("Quit key pressed. Exiting event loop.");
            event_loop.exit();
            return;
        }

        let now = Instant::now();
        let dt = now.duration_since(running.last_frame).as_secs_f32();
        running.last_frame = now;

        running.scene.update(dt, &self.input);
        (self.on_frame)(&mut running.scene, dt);

        match running.scene.render_frame(&mut running.gpu) {
            Ok(stats) => {
                log::trace!("Frame: drawn={} skipped={}", stats.drawn, stats.skipped);
                if self.options.show_fps {
                    if let Some(fps) = self.fps.tick(now) {
                        log::info!("FPS: {:.1}", fps);
                    }
                }
            }
            Err(RenderError::Surface(err)) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface {err}; reconfiguring");
                running.gpu.recreate_surface();
            }
            Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface acquire timed out; skipping frame");
            }
            Err(err) => {
                log::error!("Frame failed: {err}");
            }
        }

        self.input.end_frame();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(err) => {
                log::error!("Startup failed: {err:#}");
                self.failure = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::info!("Resized: {}x{}", size.width, size.height);
                if let Some(running) = self.running.as_mut() {
                    running.gpu.resize(size.width, size.height);
                    let (w, h) = running.gpu.size();
                    running.scene.resize(w, h);
                }
            }
            WindowEvent::Focused(false) => self.input.clear(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = map_key(code) {
                        self.input.set_key(key, event.state.is_pressed());
                    }
                    if event.state.is_pressed() && !event.repeat {
                        let slot = camera_slot(code);
                        if let (Some(slot), Some(running)) = (slot, self.running.as_mut()) {
                            match running.scene.try_set_active_camera(slot) {
                                Ok(()) => log::info!("Camera {} in use", slot + 1),
                                Err(err) => log::warn!("Camera switch ignored: {err}"),
                            }
                        }
                    }
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.input.set_look_held(state.is_pressed()),
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.as_ref() {
            running.window.request_redraw();
        }
    }
}

/// Frames counted over one-second windows.
#[derive(Default)]
struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
}

impl FpsCounter {
    fn tick(&mut self, now: Instant) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now.duration_since(start);
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames as f32 / elapsed.as_secs_f32();
            self.window_start = Some(now);
            self.frames = 0;
            Some(fps)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        assert_eq!(map_key(KeyCode::KeyW), Some(Key::Forward));
        assert_eq!(map_key(KeyCode::KeyX), Some(Key::Down));
        assert_eq!(map_key(KeyCode::Space), Some(Key::Up));
        assert_eq!(map_key(KeyCode::Escape), Some(Key::Quit));
        assert_eq!(map_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn number_row_selects_cameras() {
        assert_eq!(camera_slot(KeyCode::Digit1), Some(0));
        assert_eq!(camera_slot(KeyCode::Digit4), Some(3));
        assert_eq!(camera_slot(KeyCode::Digit9), Some(8));
        assert_eq!(camera_slot(KeyCode::Digit0), None);
        assert_eq!(camera_slot(KeyCode::KeyW), None);
        // Camera keys never reach the navigation state.
        for code in [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4] {
            assert_eq!(map_key(code), None);
        }
    }

    #[test]
    fn fps_counter_reports_once_per_second() {
        let mut fps = FpsCounter::default();
        let t0 = Instant::now();
        assert_eq!(fps.tick(t0), None);
        for i in 1..60 {
            assert_eq!(fps.tick(t0 + Duration::from_millis(i * 16)), None);
        }
        let report = fps.tick(t0 + Duration::from_secs(1)).expect("report after 1s");
        assert!((report - 61.0).abs() < 1e-3);
    }
}
