//! Spectrum analyser configuration.

use crate::error::{Result, VizError};

/// Spectrum analyser configuration.
///
/// Defaults reproduce the reference analyser: a 512-point FFT yielding 256
/// byte-valued frequency bins, with the standard Web-Audio smoothing and
/// decibel window.
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT window size in samples (must be a power of two >= 4)
    /// reference value: 512
    pub fft_size: usize,

    /// Exponential smoothing constant applied to bin magnitudes per pass,
    /// 0 = no memory, 1 = frozen
    /// reference value: 0.8
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    /// reference value: -100
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    /// reference value: -30
    pub max_decibels: f32,

    /// Analysis thread poll interval (milliseconds)
    pub update_interval_ms: u64,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            update_interval_ms: 8,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins per published spectrum frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be a power of two, etc.)
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 4 {
            return Err(VizError::Config(format!(
                "fft_size must be a power of two >= 4, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(VizError::Config(format!(
                "smoothing_time_constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(VizError::Config(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 256);
    }

    #[test]
    fn test_validate_rejects_bad_fft_size() {
        let config = AnalyserConfig {
            fft_size: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyserConfig {
            fft_size: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_db_window() {
        let config = AnalyserConfig {
            min_decibels: -30.0,
            max_decibels: -100.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
