//! Spectrasphere - audio-reactive spectrum icosphere visualizer
//!
//! Plays a WAV file, deforms a wireframe icosphere to its spectrum, and can
//! record the rendered frames into a video file.

mod audio;
mod bands;
mod capture;
mod cli;
mod error;
mod params;
mod rendering;
mod sphere;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use glam::{Mat4, Vec3};
use tracing::{info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use audio::AudioSystem;
use bands::BandFeatures;
use capture::{CaptureSession, CaptureSink, CaptureStep};
use cli::Args;
use error::VizError;
use params::{
    AnalyserConfig, CaptureConfig, ExportStrategy, RecordingConfig, RenderConfig, TranscodeConfig,
};
use rendering::{RenderSystem, Uniforms};
use sphere::SphereSystem;

/// Main application state: the session object owning the audio source, the
/// mesh, and the capture sink for its lifetime.
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation systems
    sphere: SphereSystem,
    audio: Option<AudioSystem>,

    // Capture state machine
    sink: CaptureSink,

    // Configuration
    args: Args,
    render_config: RenderConfig,

    // Time tracking
    start_time: Instant,

    // Fatal failure carried out of the event loop in batch mode
    exit_error: Option<String>,
}

impl App {
    fn new(args: Args) -> Self {
        let render_config = args.render_config();
        let sphere = SphereSystem::new(args.sphere_geometry(), Default::default());

        Self {
            window: None,
            render_system: None,
            sphere,
            audio: None,
            sink: CaptureSink::NoCapture,
            args,
            render_config,
            start_time: Instant::now(),
            exit_error: None,
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Spectrasphere")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let render_system =
            pollster::block_on(RenderSystem::new(Arc::clone(&window), &self.sphere.mesh)).unwrap();

        let audio = AudioSystem::new(&self.args.audio, AnalyserConfig::default()).unwrap();
        audio.play();
        self.start_time = Instant::now();

        println!("\nSpectrasphere is running!");
        println!("Space = play/pause, R = record, ESC = quit\n");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.audio = Some(audio);

        if self.args.record {
            self.start_capture(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => {
                    if let Some(audio) = &self.audio {
                        audio.toggle();
                    }
                }
                KeyCode::KeyR => self.start_capture(event_loop),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                self.tick(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    /// Run one render-loop tick: aggregate, deform, draw, capture.
    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        if self.render_system.is_none() || self.audio.is_none() {
            return;
        }

        // Capture transitions at top of tick: a finished clip or a spent
        // frame budget finalizes the export; pausing cancels it outright.
        match self.capture_step() {
            CaptureStep::Finalize => {
                self.finish_capture(event_loop);
                return;
            }
            CaptureStep::Cancel => {
                warn!("recording interrupted, discarding capture");
                self.abort_capture();
                return;
            }
            CaptureStep::Continue => {}
        }

        let features = self.current_features();

        // While recording, frame N always shows the scene at N / fps so the
        // exported timeline is independent of the display refresh rate.
        let time_ms = match &self.sink {
            CaptureSink::FrameCapture(session) => session.timeline_ms(),
            CaptureSink::NoCapture => self.start_time.elapsed().as_secs_f32() * 1000.0,
        };
        self.sphere.update(time_ms, &features);

        let view_proj = self.view_proj_matrix();
        let model = self.sphere.model_matrix();
        let recording = self.sink.is_recording();

        let Some(ref render_system) = self.render_system else {
            return;
        };
        render_system.update_vertices(&self.sphere.mesh.vertices);
        render_system.update_uniforms(&Uniforms {
            mvp: (view_proj * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            time: time_ms / 1000.0,
            _padding: [0.0; 3],
        });

        let (width, height) = render_system.window_size();
        let push_result = match render_system.render(recording) {
            Ok(Some(frame)) => {
                if let CaptureSink::FrameCapture(session) = &mut self.sink {
                    session.push_frame(&frame, width, height)
                } else {
                    Ok(())
                }
            }
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::error!("render error: {e:?}");
                Ok(())
            }
        };

        if let Err(e) = push_result {
            warn!("capture failed, discarding session: {e}");
            self.abort_capture();
        }
    }

    /// Capture transition demanded by the current audio state.
    fn capture_step(&self) -> CaptureStep {
        match &self.audio {
            Some(audio) => self.sink.step(audio.ended(), audio.is_playing()),
            None => CaptureStep::Continue,
        }
    }

    /// Band features for this tick, recomputed from the current spectrum
    /// frame. Before the analyser publishes, the sphere idles at rest.
    fn current_features(&mut self) -> BandFeatures {
        let spectrum = match &self.audio {
            Some(audio) => audio.spectrum(),
            None => return BandFeatures::default(),
        };

        match spectrum {
            Ok(bins) => match BandFeatures::from_bins(&bins) {
                Ok(features) => features,
                Err(e) => {
                    warn!("degenerate spectrum frame, discarding capture: {e}");
                    self.abort_capture();
                    BandFeatures::default()
                }
            },
            Err(VizError::SourceNotReady) => BandFeatures::default(),
            Err(e) => {
                warn!("spectrum unavailable: {e}");
                BandFeatures::default()
            }
        }
    }

    fn view_proj_matrix(&self) -> Mat4 {
        let c = &self.render_config;
        let projection = Mat4::perspective_rh(
            c.fov_degrees.to_radians(),
            c.aspect_ratio(),
            c.near_plane,
            c.far_plane,
        );
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, c.camera_z), Vec3::ZERO, Vec3::Y);
        projection * view
    }

    /// Transition Live -> Capture on the explicit render request.
    fn start_capture(&mut self, event_loop: &ActiveEventLoop) {
        if self.sink.is_recording() {
            return;
        }
        let Some(audio) = &self.audio else {
            return;
        };
        let Some(render_system) = &self.render_system else {
            return;
        };

        audio.play();

        let strategy = ExportStrategy::from(self.args.strategy);
        let capture_config = CaptureConfig::for_strategy(strategy, self.args.fps);
        let out_path = self.args.output_path(&capture_config);
        let remaining_s = (audio.duration_s() - audio.position_s()).max(0.0);
        let recording = RecordingConfig::new(remaining_s, capture_config.framerate);
        let (width, height) = render_system.window_size();

        let session = match strategy {
            ExportStrategy::Stream => CaptureSession::stream(capture_config, recording, out_path),
            ExportStrategy::Transcode => CaptureSession::transcode(
                capture_config,
                recording,
                &TranscodeConfig::default(),
                &self.args.audio,
                out_path,
                width,
                height,
            ),
        };

        match session {
            Ok(session) => self.sink = CaptureSink::FrameCapture(session),
            Err(e) => {
                warn!("could not start capture: {e}");
                if self.fail_batch(format!("could not start capture: {e}")) {
                    event_loop.exit();
                }
            }
        }
    }

    /// Transition Capture -> terminal: finalize the export, stop capturing.
    fn finish_capture(&mut self, event_loop: &ActiveEventLoop) {
        let sink = std::mem::replace(&mut self.sink, CaptureSink::NoCapture);
        if let CaptureSink::FrameCapture(session) = sink {
            match session.finish() {
                Ok(path) => info!("export complete: {}", path.display()),
                Err(e) => {
                    warn!("export failed: {e}");
                    self.fail_batch(format!("export failed: {e}"));
                }
            }
        }
        // Batch mode has nothing left to do once the clip is exported.
        if self.args.record {
            event_loop.exit();
        }
    }

    /// Record a fatal batch-mode failure; returns whether the loop should
    /// exit. Interactive sessions shrug the failure off and keep previewing.
    fn fail_batch(&mut self, message: String) -> bool {
        if self.args.record {
            self.exit_error = Some(message);
            true
        } else {
            false
        }
    }

    /// Error path: discard the partial capture buffer, back to live preview.
    fn abort_capture(&mut self) {
        let sink = std::mem::replace(&mut self.sink, CaptureSink::NoCapture);
        if let CaptureSink::FrameCapture(session) = sink {
            session.discard();
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    println!("Spectrasphere - audio-reactive spectrum visualizer");

    let mut app = App::new(args);
    let event_loop = EventLoop::new().context("create event loop")?;
    event_loop.run_app(&mut app).context("run event loop")?;

    if let Some(err) = app.exit_error {
        anyhow::bail!(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_failure_sets_exit_error() {
        let mut app = App::new(Args::parse_from(["spectrasphere", "t.wav", "--record"]));
        assert!(app.fail_batch("encoder unavailable".to_string()));
        assert_eq!(app.exit_error.as_deref(), Some("encoder unavailable"));
    }

    #[test]
    fn test_interactive_failure_keeps_previewing() {
        let mut app = App::new(Args::parse_from(["spectrasphere", "t.wav"]));
        assert!(!app.fail_batch("encoder unavailable".to_string()));
        assert!(app.exit_error.is_none());
    }
}
