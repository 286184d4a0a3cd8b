//! Parameter definitions with documented units and semantics.
//!
//! All magic numbers from the reference visualizer are extracted here with:
//! - Units (bins, radians, dB, pixels, frames per second)
//! - Documented ranges and meanings
//! - `Default` impls carrying the reference values

mod audio;
mod capture;
mod render;
mod sphere;

// Re-export all types
pub use audio::AnalyserConfig;
pub use capture::{CaptureConfig, ExportStrategy, TranscodeConfig};
pub use render::{RecordingConfig, RenderConfig};
pub use sphere::{DeformationMapping, SphereGeometry};
