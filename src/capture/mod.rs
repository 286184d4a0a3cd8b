//! Capture pipeline: sink state machine, frame buffer, and export sequencing.
//!
//! The render loop is parameterized by [`CaptureSink`]: `NoCapture` is live
//! preview, `FrameCapture` records every rendered frame into a session. One
//! loop, two states, no duplicated code paths.

mod export;

pub use export::{concat_chunks, encode_png_chunk, write_stream_export, FrameEncoder};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, VizError};
use crate::params::{CaptureConfig, RecordingConfig, TranscodeConfig};

/// Render-loop capture state.
pub enum CaptureSink {
    /// Live preview: draw only.
    NoCapture,
    /// Recording: every rendered frame is handed to the session.
    FrameCapture(CaptureSession),
}

/// Transition the render loop applies at the top of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStep {
    /// Nothing to do: keep previewing or keep capturing.
    Continue,
    /// Finalize the export: the clip ended or the frame budget is spent.
    Finalize,
    /// Discard the session: playback was interrupted before completion.
    Cancel,
}

impl CaptureSink {
    pub fn is_recording(&self) -> bool {
        matches!(self, CaptureSink::FrameCapture(_))
    }

    /// Decide the capture transition for the current audio state.
    ///
    /// Pausing cancels rather than finalizes: an interrupted capture yields
    /// no output file.
    pub fn step(&self, audio_ended: bool, audio_playing: bool) -> CaptureStep {
        let CaptureSink::FrameCapture(session) = self else {
            return CaptureStep::Continue;
        };
        if audio_ended || session.is_complete() {
            CaptureStep::Finalize
        } else if !audio_playing {
            CaptureStep::Cancel
        } else {
            CaptureStep::Continue
        }
    }
}

enum Backend {
    /// Strategy A: buffer encoded chunks, concatenate on completion.
    Stream { chunks: Vec<Vec<u8>> },
    /// Strategy B: stream raw frames into a transcoder child process.
    Transcode { encoder: FrameEncoder },
}

/// One recording pass: owns the capture buffer for its lifetime.
pub struct CaptureSession {
    config: CaptureConfig,
    recording: RecordingConfig,
    out_path: PathBuf,
    backend: Backend,
    frames_captured: usize,
}

impl CaptureSession {
    /// Start a stream-capture session (Strategy A).
    ///
    /// Refuses a zero-frame budget; finalizing one would write an empty
    /// output file.
    pub fn stream(
        config: CaptureConfig,
        recording: RecordingConfig,
        out_path: PathBuf,
    ) -> Result<Self> {
        check_budget(&recording)?;
        info!(
            frames = recording.total_frames(),
            fps = recording.fps,
            out = %out_path.display(),
            "capture started (stream)"
        );
        Ok(Self {
            config,
            recording,
            out_path,
            backend: Backend::Stream { chunks: Vec::new() },
            frames_captured: 0,
        })
    }

    /// Start a transcode session (Strategy B): spawns ffmpeg up front.
    pub fn transcode(
        config: CaptureConfig,
        recording: RecordingConfig,
        transcode: &TranscodeConfig,
        audio_path: &Path,
        out_path: PathBuf,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        check_budget(&recording)?;
        let encoder = FrameEncoder::spawn(
            transcode,
            audio_path,
            &out_path,
            width,
            height,
            recording.fps,
        )?;
        info!(
            frames = recording.total_frames(),
            fps = recording.fps,
            codec = transcode.video_codec,
            out = %out_path.display(),
            "capture started (transcode)"
        );
        Ok(Self {
            config,
            recording,
            out_path,
            backend: Backend::Transcode { encoder },
            frames_captured: 0,
        })
    }

    /// Hand one rendered RGBA frame to the session.
    ///
    /// Rejects frames past the budget so a stuck terminal check cannot leak
    /// extra frames into the output.
    pub fn push_frame(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<()> {
        if self.is_complete() {
            return Err(VizError::Capture(format!(
                "frame budget exhausted ({} frames)",
                self.recording.total_frames()
            )));
        }

        match &mut self.backend {
            Backend::Stream { chunks } => {
                chunks.push(encode_png_chunk(rgba, width, height)?);
            }
            Backend::Transcode { encoder } => {
                encoder.write_frame(rgba)?;
            }
        }

        self.frames_captured += 1;
        if self.config.verbose {
            debug!(
                frame = self.frames_captured,
                total = self.recording.total_frames(),
                "frame captured"
            );
        }
        Ok(())
    }

    /// True once `ceil(duration * fps)` frames have been captured.
    pub fn is_complete(&self) -> bool {
        self.frames_captured >= self.recording.total_frames()
    }

    pub fn frames_captured(&self) -> usize {
        self.frames_captured
    }

    /// Recording timeline position for the next frame (milliseconds).
    ///
    /// Fixed timestep: frame N sits at N / fps no matter how fast the display
    /// hands frames over, so the exported timeline is independent of the
    /// refresh rate.
    pub fn timeline_ms(&self) -> f32 {
        self.frames_captured as f32 / self.recording.fps as f32 * 1000.0
    }

    /// Finalize the export and return the output path.
    ///
    /// Stream sessions concatenate and write the buffer; transcode sessions
    /// close the encoder and wait for it. The capture buffer is consumed
    /// either way.
    pub fn finish(self) -> Result<PathBuf> {
        info!(frames = self.frames_captured, "finalizing export");
        match self.backend {
            Backend::Stream { chunks } => {
                write_stream_export(&chunks, &self.out_path)?;
                Ok(self.out_path)
            }
            Backend::Transcode { encoder } => encoder.finish(),
        }
    }

    /// Drop the session without producing output (error path).
    pub fn discard(self) {
        if let Backend::Transcode { encoder } = self.backend {
            encoder.abort();
        }
        // Stream chunks are simply dropped.
    }
}

fn check_budget(recording: &RecordingConfig) -> Result<()> {
    if recording.total_frames() == 0 {
        return Err(VizError::Capture(
            "nothing to record (frame budget is zero)".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{CaptureConfig, RecordingConfig};

    fn stream_session(duration_secs: f32, fps: u32) -> CaptureSession {
        let out = std::env::temp_dir().join("spectrasphere_session_test.pngs");
        CaptureSession::stream(
            CaptureConfig::default(),
            RecordingConfig::new(duration_secs, fps),
            out,
        )
        .unwrap()
    }

    fn frame(width: u32, height: u32) -> Vec<u8> {
        vec![128u8; (width * height * 4) as usize]
    }

    #[test]
    fn test_frame_budget_matches_duration() {
        // 0.05s at 60 fps -> ceil(3.0) = 3 frames.
        let mut session = stream_session(0.05, 60);
        let rgba = frame(2, 2);

        for _ in 0..3 {
            assert!(!session.is_complete());
            session.push_frame(&rgba, 2, 2).unwrap();
        }
        assert!(session.is_complete());
        assert_eq!(session.frames_captured(), 3);

        // Terminal state admits no further frames.
        assert!(matches!(
            session.push_frame(&rgba, 2, 2),
            Err(VizError::Capture(_))
        ));
        assert_eq!(session.frames_captured(), 3);
    }

    #[test]
    fn test_five_second_clip_budget() {
        let session = stream_session(5.0, 60);
        assert_eq!(session.recording.total_frames(), 300);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_stream_finish_writes_concatenated_chunks() {
        let out = std::env::temp_dir().join("spectrasphere_finish_test.pngs");
        let mut session = CaptureSession::stream(
            CaptureConfig::default(),
            RecordingConfig::new(0.034, 60), // 3 frames
            out.clone(),
        )
        .unwrap();
        let rgba = frame(4, 4);

        let mut expected = 0u64;
        for _ in 0..3 {
            session.push_frame(&rgba, 4, 4).unwrap();
        }
        if let Backend::Stream { chunks } = &session.backend {
            expected = chunks.iter().map(|c| c.len() as u64).sum();
        }

        let path = session.finish().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), expected);

        std::fs::remove_file(&out).ok();
    }

    #[test]
    fn test_discard_produces_no_output() {
        let out = std::env::temp_dir().join("spectrasphere_discard_test.pngs");
        std::fs::remove_file(&out).ok();

        let mut session = CaptureSession::stream(
            CaptureConfig::default(),
            RecordingConfig::new(1.0, 60),
            out.clone(),
        )
        .unwrap();
        session.push_frame(&frame(2, 2), 2, 2).unwrap();
        session.discard();

        assert!(!out.exists());
    }

    #[test]
    fn test_sink_state_tags() {
        assert!(!CaptureSink::NoCapture.is_recording());
        let sink = CaptureSink::FrameCapture(stream_session(1.0, 60));
        assert!(sink.is_recording());
    }

    #[test]
    fn test_pause_cancels_while_completion_finalizes() {
        let sink = CaptureSink::FrameCapture(stream_session(1.0, 60));
        assert_eq!(sink.step(false, true), CaptureStep::Continue);
        // Pausing mid-recording interrupts: discard, never export.
        assert_eq!(sink.step(false, false), CaptureStep::Cancel);
        assert_eq!(sink.step(true, false), CaptureStep::Finalize);
        assert_eq!(
            CaptureSink::NoCapture.step(false, false),
            CaptureStep::Continue
        );
    }

    #[test]
    fn test_spent_budget_finalizes_even_while_playing() {
        let mut session = stream_session(0.034, 60); // 3 frames
        let rgba = frame(2, 2);
        for _ in 0..3 {
            session.push_frame(&rgba, 2, 2).unwrap();
        }
        let sink = CaptureSink::FrameCapture(session);
        assert_eq!(sink.step(false, true), CaptureStep::Finalize);
    }

    #[test]
    fn test_zero_budget_session_is_refused() {
        let out = std::env::temp_dir().join("spectrasphere_zero_budget.pngs");
        assert!(matches!(
            CaptureSession::stream(
                CaptureConfig::default(),
                RecordingConfig::new(0.0, 60),
                out,
            ),
            Err(VizError::Capture(_))
        ));
    }

    #[test]
    fn test_timeline_is_fixed_timestep() {
        let mut session = stream_session(1.0, 60);
        assert_eq!(session.timeline_ms(), 0.0);

        let rgba = frame(2, 2);
        session.push_frame(&rgba, 2, 2).unwrap();
        session.push_frame(&rgba, 2, 2).unwrap();
        assert!((session.timeline_ms() - 2000.0 / 60.0).abs() < 1e-3);
    }
}
