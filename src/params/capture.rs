//! Capture and export configuration.
//!
//! All values are fixed constants in the reference visualizer; they are
//! modeled as explicit structs so the capture pipeline has no magic strings.

use std::path::PathBuf;

/// Which export pipeline a capture session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    /// Buffer encoded frame chunks in memory, concatenate on completion.
    /// No transcoding.
    Stream,

    /// Pipe raw frames into an ffmpeg child process configured by
    /// [`TranscodeConfig`].
    Transcode,
}

impl ExportStrategy {
    /// File extension matching what the strategy actually writes: a WebM
    /// container from the transcoder, or a concatenated PNG frame sequence
    /// (readable with ffmpeg's `image2pipe`) from stream capture.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportStrategy::Stream => "pngs",
            ExportStrategy::Transcode => "webm",
        }
    }
}

/// Frame capturer settings (container, cadence, naming).
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Output container extension
    /// reference value: "webm"
    pub format: &'static str,

    /// Capture frame rate (FPS)
    /// reference value: 60
    pub framerate: u32,

    /// Output base name (extension appended from `format`)
    /// reference value: "spectrum"
    pub name: String,

    /// Capture quality hint, 0-100
    /// reference value: 100
    pub quality: u8,

    /// Per-frame progress logging
    pub verbose: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: "webm",
            framerate: 60,
            name: "spectrum".to_string(),
            quality: 100,
            verbose: false,
        }
    }
}

impl CaptureConfig {
    /// Capture settings for one strategy at the given frame rate, with the
    /// extension the strategy's output format warrants.
    pub fn for_strategy(strategy: ExportStrategy, framerate: u32) -> Self {
        Self {
            format: strategy.extension(),
            framerate,
            ..Default::default()
        }
    }

    /// Deterministic output path, e.g. `spectrum.webm`
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.name, self.format))
    }
}

/// Transcoder settings handed to ffmpeg (Strategy B).
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// Video codec
    /// reference value: libvpx
    pub video_codec: &'static str,

    /// Target video bitrate
    /// reference value: 1M
    pub video_bitrate: &'static str,

    /// Output pixel format
    /// reference value: yuv420p
    pub pixel_format: &'static str,

    /// Encoder thread count
    /// reference value: 8
    pub threads: u32,

    /// VPX encoder speed preset (higher = faster, lower quality)
    /// reference value: 4
    pub speed: u32,

    /// Audio codec
    /// reference value: libvorbis
    pub audio_codec: &'static str,

    /// Audio bitrate
    /// reference value: 128k
    pub audio_bitrate: &'static str,

    /// Output container format
    /// reference value: webm
    pub container: &'static str,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            video_codec: "libvpx",
            video_bitrate: "1M",
            pixel_format: "yuv420p",
            threads: 8,
            speed: 4,
            audio_codec: "libvorbis",
            audio_bitrate: "128k",
            container: "webm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_is_deterministic() {
        let config = CaptureConfig::default();
        assert_eq!(config.output_path(), PathBuf::from("spectrum.webm"));
    }

    #[test]
    fn test_extension_matches_strategy_output() {
        // Only the transcoder produces a real WebM container; stream capture
        // writes a PNG frame sequence and must not claim otherwise.
        assert_eq!(ExportStrategy::Transcode.extension(), "webm");
        assert_eq!(ExportStrategy::Stream.extension(), "pngs");

        let config = CaptureConfig::for_strategy(ExportStrategy::Stream, 30);
        assert_eq!(config.framerate, 30);
        assert_eq!(config.output_path(), PathBuf::from("spectrum.pngs"));
    }
}
