//! Spectrasphere library - audio-reactive icosphere visualizer

pub mod audio;
pub mod bands;
pub mod capture;
pub mod cli;
pub mod error;
pub mod params;
pub mod rendering;
pub mod sphere;

pub use error::{Result, VizError};
