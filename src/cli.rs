//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::params::{CaptureConfig, ExportStrategy, RenderConfig, SphereGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Buffer PNG-encoded frames, concatenate on completion (no transcode;
    /// writes a raw PNG frame sequence, not a video container)
    Stream,
    /// Pipe raw frames through ffmpeg into a WebM container (requires ffmpeg)
    Transcode,
}

impl From<StrategyArg> for ExportStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Stream => ExportStrategy::Stream,
            StrategyArg::Transcode => ExportStrategy::Transcode,
        }
    }
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "spectrasphere")]
#[command(about = "Audio-reactive spectrum icosphere visualizer", long_about = None)]
pub struct Args {
    /// WAV file to visualize
    #[arg(value_name = "AUDIO")]
    pub audio: PathBuf,

    /// Window width (pixels)
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Capture frame rate
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Export strategy used when recording
    #[arg(long, value_enum, default_value_t = StrategyArg::Transcode)]
    pub strategy: StrategyArg,

    /// Output file (defaults to spectrum.webm, or spectrum.pngs with
    /// --strategy stream)
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Start recording immediately and exit when the clip ends
    #[arg(long, default_value_t = false)]
    pub record: bool,

    /// Noise field seed
    #[arg(long, default_value_t = 42)]
    pub seed: u32,
}

impl Args {
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..Default::default()
        }
    }

    pub fn sphere_geometry(&self) -> SphereGeometry {
        SphereGeometry {
            noise_seed: self.seed,
            ..Default::default()
        }
    }

    /// Explicit output path, falling back to the deterministic default.
    pub fn output_path(&self, capture: &CaptureConfig) -> PathBuf {
        self.out.clone().unwrap_or_else(|| capture.output_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let args = Args::parse_from(["spectrasphere", "track.wav"]);
        let config = CaptureConfig::for_strategy(ExportStrategy::from(args.strategy), args.fps);
        assert_eq!(args.output_path(&config), PathBuf::from("spectrum.webm"));
    }

    #[test]
    fn test_stream_strategy_gets_honest_extension() {
        let args = Args::parse_from(["spectrasphere", "track.wav", "--strategy", "stream"]);
        let config = CaptureConfig::for_strategy(ExportStrategy::from(args.strategy), args.fps);
        assert_eq!(args.output_path(&config), PathBuf::from("spectrum.pngs"));
    }

    #[test]
    fn test_out_flag_overrides_default() {
        let args = Args::parse_from(["spectrasphere", "track.wav", "--out", "take2.webm"]);
        let path = args.output_path(&CaptureConfig::default());
        assert_eq!(path, PathBuf::from("take2.webm"));
    }

    #[test]
    fn test_strategy_parsing() {
        let args = Args::parse_from(["spectrasphere", "track.wav", "--strategy", "transcode"]);
        assert_eq!(ExportStrategy::from(args.strategy), ExportStrategy::Transcode);
    }
}
