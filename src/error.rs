//! Error types for Spectrasphere

use thiserror::Error;

/// Main error type for the visualizer.
///
/// Every capture-path error is terminal for the current session: the caller
/// logs it, discards the partial capture buffer, and returns to live preview.
/// Nothing is retried.
#[derive(Error, Debug)]
pub enum VizError {
    #[error("spectrum requested before audio playback was analyzed")]
    SourceNotReady,

    #[error("spectrum frame too short for band split ({0} bins)")]
    EmptySpectrum(usize),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("export I/O failed: {0}")]
    ExportIo(#[from] std::io::Error),

    #[error("audio device error: {0}")]
    Audio(String),

    #[error("WAV decode error: {0}")]
    Decode(#[from] hound::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for visualizer operations
pub type Result<T> = std::result::Result<T, VizError>;
