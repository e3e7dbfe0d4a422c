use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use grid_raycaster::input::{Action, InputState};
use grid_raycaster::renderer::render_scene;
use grid_raycaster::scaler::{ScaleLut, blit_nearest, build_scale_lut};
use grid_raycaster::{Controller, EngineConfig, Grid, MovementPolicy, Pose, RayMarcher, StepMode};

const POLICIES: [(&str, fn() -> MovementPolicy); 3] = [
    ("free look", MovementPolicy::free_look),
    ("cardinal turn", MovementPolicy::cardinal_turn),
    ("grid step", MovementPolicy::grid_step),
];

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    grid: Grid,
    config: EngineConfig,
    controller: Controller,
    policy_idx: usize,
    show_minimap: bool,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    // Internal fixed-size buffer, stretched to the window
    fb: Vec<u32>,
    scale_lut: ScaleLut,

    input: InputState,
    last_tick: Instant,
}

impl App {
    fn new(grid: Grid, config: EngineConfig) -> Self {
        let controller = Controller::new(config.start, config.policy);
        let fb = vec![0; config.viewport_width * config.viewport_height];
        Self {
            window: None,
            surface: None,
            grid,
            show_minimap: config.show_minimap,
            controller,
            config,
            policy_idx: 0,

            frame_counter: 0,
            last_fps_print: Instant::now(),

            fb,
            scale_lut: ScaleLut::empty(),

            input: InputState::default(),
            last_tick: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("Grid Raycaster")
            .with_inner_size(LogicalSize::new(
                self.config.viewport_width as f64,
                self.config.viewport_height as f64,
            ));

        let window = match event_loop.create_window(attributes) {
            Ok(w) => Rc::new(w),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(s) => s,
            Err(e) => {
                error!("failed to create softbuffer surface: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.scale_lut = build_scale_lut(
            size.width as usize,
            size.height as usize,
            self.config.viewport_width,
            self.config.viewport_height,
        );

        window.request_redraw();
        self.surface = Some(surface);
        self.window = Some(window);
        self.last_tick = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(action) = Action::from_key(code) {
                    match state {
                        ElementState::Pressed => self.input.press(action),
                        ElementState::Released => self.input.release(action),
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                self.tick();

                let (window, surface) = match (&self.window, &mut self.surface) {
                    (Some(w), Some(s)) if w.id() == id => (w, s),
                    _ => return,
                };

                let size = window.inner_size();
                let (Some(dw), Some(dh)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                else {
                    return; // Minimized window, skip drawing
                };

                let marcher = match RayMarcher::new(&self.grid, self.config.march) {
                    Ok(m) => m,
                    Err(e) => {
                        error!("invalid march configuration: {e}");
                        event_loop.exit();
                        return;
                    }
                };

                if let Err(e) = render_scene(
                    &mut self.fb,
                    &self.config,
                    &marcher,
                    &self.grid,
                    self.controller.pose(),
                    self.show_minimap,
                ) {
                    error!("frame aborted: {e}");
                    event_loop.exit();
                    return;
                }

                if let Err(e) = surface.resize(dw, dh) {
                    warn!("surface resize failed, skipping frame: {e}");
                    return;
                }
                let mut buf = match surface.buffer_mut() {
                    Ok(b) => b,
                    Err(e) => {
                        warn!("no surface buffer, skipping frame: {e}");
                        return;
                    }
                };
                blit_nearest(&mut buf, dw.get() as usize, &self.fb, &self.scale_lut);
                if let Err(e) = buf.present() {
                    warn!("present failed: {e}");
                }

                // Log FPS
                self.frame_counter += 1;
                let now = Instant::now();
                let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
                if elapsed >= 1.0 {
                    info!("FPS: {:.1}", self.frame_counter as f32 / elapsed);
                    self.frame_counter = 0;
                    self.last_fps_print = now;
                }

                window.request_redraw();
            }

            WindowEvent::Resized(new_size) => {
                self.scale_lut = build_scale_lut(
                    new_size.width as usize,
                    new_size.height as usize,
                    self.config.viewport_width,
                    self.config.viewport_height,
                );
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl App {
    fn tick(&mut self) {
        // Compute dt with cap to avoid huge jumps if the app was paused
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;

        if self.input.was_pressed(Action::ToggleMap) {
            self.show_minimap = !self.show_minimap;
            info!(show_minimap = self.show_minimap, "minimap toggled");
        }
        if self.input.was_pressed(Action::CyclePolicy) {
            self.cycle_policy();
        }

        self.input
            .apply(&mut self.controller, &self.grid, dt.as_secs_f32());
        self.input.end_frame();
    }

    /// Switch to the next movement preset. The eye stays where it is: discrete
    /// policies store the cell corner, continuous ones store the eye directly.
    fn cycle_policy(&mut self) {
        self.policy_idx = (self.policy_idx + 1) % POLICIES.len();
        let (name, make) = POLICIES[self.policy_idx];
        let policy = make();

        let pose = *self.controller.pose();
        let offset = self.config.march.eye_offset;
        let eye = [pose.pos[0] + offset[0], pose.pos[1] + offset[1]];

        let mut config = EngineConfig::for_policy(policy);
        config.show_minimap = self.config.show_minimap;
        let pos = match policy.step_mode {
            StepMode::Continuous => eye,
            StepMode::Discrete => [eye[0].floor(), eye[1].floor()],
        };

        self.controller = Controller::new(Pose::new(pos, pose.angle), policy);
        self.config = config;
        info!(policy = name, pose = ?self.controller.pose(), "movement policy changed");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::default();
    config.validate().context("invalid engine configuration")?;
    let grid = Grid::reference().context("failed to build reference map")?;

    info!(
        width = grid.width(),
        height = grid.height(),
        viewport = ?(config.viewport_width, config.viewport_height),
        fov = config.fov,
        policy = POLICIES[0].0,
        "starting raycaster"
    );

    let event_loop =
        EventLoop::new().map_err(|e| anyhow!("failed to create event loop: {e}"))?;
    // Redraw continuously, this is a game loop
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(grid, config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("event loop failed: {e}"))?;
    Ok(())
}
