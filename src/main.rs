use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use rover_drive::camera::Camera;
use rover_drive::cli::Cli;
use rover_drive::core::{InputPlayback, InputRecorder, InputRecording, KeyboardInput, LoopStatus};
use rover_drive::frame::{FrameInfo, FrameIterator, RecordedFrames};
use rover_drive::loaders::{load_model_async, ModelAsset};
use rover_drive::renderer::GpuRenderer;
use rover_drive::scene::{Scene, VehicleEntity};
use rover_drive::traits::FrameSource;
use rover_drive::{
    ControlInput, MotionIntegrator, RenderLoop, StopHandle, TuningConstants, VehicleState,
};

const INITIAL_WINDOW_WIDTH: u32 = 1024;
const INITIAL_WINDOW_HEIGHT: u32 = 768;

/// Wall clock for live driving, recorded deltas for a replay
enum DriveClock {
    Live(FrameIterator),
    Replay(RecordedFrames),
}

impl DriveClock {
    fn reset(&mut self) {
        if let DriveClock::Live(frames) = self {
            frames.reset();
        }
    }
}

impl Iterator for DriveClock {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        match self {
            DriveClock::Live(frames) => frames.next(),
            DriveClock::Replay(frames) => frames.next(),
        }
    }
}

impl FrameSource for DriveClock {
    fn delta_time(&self) -> f32 {
        match self {
            DriveClock::Live(frames) => frames.delta_time(),
            DriveClock::Replay(frames) => frames.delta_time(),
        }
    }

    fn frame_count(&self) -> u64 {
        match self {
            DriveClock::Live(frames) => frames.frame_count(),
            DriveClock::Replay(frames) => frames.frame_count(),
        }
    }
}

struct App {
    cli: Cli,
    window: Option<Arc<Window>>,
    renderer: Option<GpuRenderer>,
    scene: Scene,
    camera: Camera,
    render_loop: RenderLoop<DriveClock>,
    stop: StopHandle,
    keyboard: KeyboardInput,
    input: ControlInput,
    playback: Option<InputPlayback>,
}

impl App {
    fn new(
        cli: Cli,
        scene: Scene,
        render_loop: RenderLoop<DriveClock>,
        playback: Option<InputPlayback>,
    ) -> Self {
        let aspect = INITIAL_WINDOW_WIDTH as f32 / INITIAL_WINDOW_HEIGHT as f32;
        let camera = if cli.follow_camera {
            Camera::new(aspect).with_follow()
        } else {
            Camera::new(aspect)
        };
        let stop = render_loop.stop_handle();

        Self {
            cli,
            window: None,
            renderer: None,
            scene,
            camera,
            render_loop,
            stop,
            keyboard: KeyboardInput::default(),
            input: ControlInput::default(),
            playback,
        }
    }

    fn shutdown(&self, event_loop: &ActiveEventLoop) {
        self.stop.stop();
        event_loop.exit();
    }

    /// Input for the coming frame, or `None` once a replay has run out
    fn next_input(&mut self) -> Option<ControlInput> {
        match self.playback.as_mut() {
            Some(playback) => playback.next_input(),
            None => Some(self.input),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_none() {
            return;
        }
        // Playback inputs and the replay clock advance in lockstep
        let Some(input) = self.next_input() else {
            log::info!("Replay finished");
            self.shutdown(event_loop);
            return;
        };

        let (Some(renderer), Some(window)) = (self.renderer.as_mut(), &self.window) else {
            return;
        };

        match self
            .render_loop
            .run_frame(&mut self.scene, &mut self.camera, &input, renderer)
        {
            Ok(LoopStatus::Continue) => window.request_redraw(),
            Ok(LoopStatus::Stopped) => event_loop.exit(),
            Err(e) => {
                log::error!("Render error: {}", e);
                self.shutdown(event_loop);
            }
        }
    }

    /// Persist the final state and the input log, if requested
    fn finish(mut self) -> Result<()> {
        let state = self.scene.vehicle.state;
        log::info!(
            "Final state: pos=({:.3}, {:.3}) heading={:.3} velocity={:.4}",
            state.position.x,
            state.position.z,
            state.heading,
            state.velocity
        );

        if let Some(path) = &self.cli.save_state {
            let json = state.to_json().context("Failed to serialize vehicle state")?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write vehicle state: {:?}", path))?;
            log::info!("Vehicle state saved to {:?}", path);
        }

        if let (Some(path), Some(recorder)) = (&self.cli.record, self.render_loop.take_recorder())
        {
            let recording = recorder.finish();
            recording.save(path)?;
            log::info!("Recorded {} frames to {:?}", recording.len(), path);
        }

        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Rover Drive")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                self.shutdown(event_loop);
                return;
            }
        };

        let max_speed = self.render_loop.integrator().tuning().max_speed;
        let renderer = match pollster::block_on(GpuRenderer::new(
            window.clone(),
            &self.scene,
            max_speed,
            !self.cli.no_ui,
        )) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Failed to initialize renderer: {:#}", e);
                self.shutdown(event_loop);
                return;
            }
        };

        let size = window.inner_size();
        self.camera.set_viewport(size.width, size.height);
        // Don't count GPU setup as the first frame's delta
        self.render_loop.frames_mut().reset();

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first
        if let Some(renderer) = self.renderer.as_mut() {
            if renderer.handle_event(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::Resized(_) => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            other => {
                if self.playback.is_none() {
                    self.keyboard.process_event(&other, &mut self.input);
                }
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let recording = cli
        .replay
        .as_deref()
        .map(InputRecording::load)
        .transpose()?;

    // A replay carries its own tuning and start state
    let (tuning, initial) = match &recording {
        Some(recording) => {
            log::info!("Replaying {} recorded frames", recording.len());
            (recording.tuning, recording.initial)
        }
        None => {
            let tuning = match &cli.tuning {
                Some(path) => TuningConstants::load(path)
                    .with_context(|| format!("Invalid tuning file: {:?}", path))?,
                None => TuningConstants::default(),
            };
            let initial = match &cli.load_state {
                Some(path) => VehicleState::load(path, &tuning)?,
                None => VehicleState::default(),
            };
            (tuning, initial)
        }
    };
    log::info!("Tuning: {:?}", tuning);

    let model = match &cli.model {
        Some(path) => pollster::block_on(load_model_async(path.clone()))
            .with_context(|| format!("Failed to load model: {:?}", path))?,
        None => {
            log::info!("No model given, using placeholder rover");
            ModelAsset::placeholder()
        }
    };
    let scene = Scene::new(VehicleEntity::new(model, initial));

    let clock = match &recording {
        Some(recording) => DriveClock::Replay(recording.frame_source()),
        None => DriveClock::Live(FrameIterator::new()),
    };
    let mut render_loop = RenderLoop::new(clock, MotionIntegrator::new(tuning));
    if cli.record.is_some() {
        render_loop = render_loop.with_recorder(InputRecorder::new(initial, tuning));
    }
    let playback = recording.as_ref().map(InputPlayback::new);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(cli, scene, render_loop, playback);

    log::info!("Rover Drive - Controls: WASD to drive, Escape to quit");
    event_loop.run_app(&mut app)?;

    app.finish()
}
