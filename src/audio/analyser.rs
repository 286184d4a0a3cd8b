//! Spectrum analysis thread: FFT of the playback tap into byte-valued bins.
//!
//! Reproduces the byte-spectrum contract of the reference analyser: magnitudes
//! are smoothed over time, converted to decibels, and mapped into `u8` across
//! a fixed dB window. One frame of `fft_size / 2` bins is published per pass,
//! overwritten in place.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::params::AnalyserConfig;

/// Shared analyser output: the current spectrum frame plus a published flag
/// that flips once the first frame exists.
pub struct SpectrumShared {
    pub bins: Mutex<Vec<u8>>,
    pub published: AtomicBool,
}

impl SpectrumShared {
    pub fn new(bin_count: usize) -> Self {
        Self {
            bins: Mutex::new(vec![0u8; bin_count]),
            published: AtomicBool::new(false),
        }
    }
}

/// Spawn the analysis thread.
///
/// Consumes mono samples from `tap`, runs a Hann-windowed forward FFT, and
/// publishes byte magnitudes into `shared`. The tap is trimmed to the newest
/// window before each pass so analysis tracks the playhead; when the feed
/// keeps pace, consecutive windows overlap by 50%.
pub fn spawn_analyser_thread(
    config: AnalyserConfig,
    tap: Arc<Mutex<Vec<f32>>>,
    shared: Arc<SpectrumShared>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let mut fft_buf = vec![Complex::new(0.0f32, 0.0); config.fft_size];
        let mut smoothed = vec![0.0f32; config.bin_count()];

        loop {
            thread::sleep(Duration::from_millis(config.update_interval_ms));

            let mut samples = tap.lock().unwrap();
            if samples.len() < config.fft_size {
                continue;
            }

            // Trim the tap to the newest window before analyzing. Anything
            // older is already behind the playhead; keeping it would let the
            // tap grow without bound while the spectrum drifts further behind
            // the audio every pass.
            let excess = samples.len() - config.fft_size;
            samples.drain(0..excess);

            for i in 0..config.fft_size {
                let window = hann_window(i, config.fft_size);
                fft_buf[i] = Complex::new(samples[i] * window, 0.0);
            }
            samples.drain(0..config.fft_size / 2);
            drop(samples);

            fft.process(&mut fft_buf);

            let mut bins = shared.bins.lock().unwrap();
            let s = config.smoothing_time_constant;
            for (i, out) in bins.iter_mut().enumerate() {
                let magnitude = fft_buf[i].norm() / config.fft_size as f32;
                smoothed[i] = s * smoothed[i] + (1.0 - s) * magnitude;
                *out = magnitude_to_byte(smoothed[i], &config);
            }
            drop(bins);

            shared.published.store(true, Ordering::Release);
        }
    })
}

/// Map a smoothed linear magnitude into the configured dB window as a byte.
pub fn magnitude_to_byte(magnitude: f32, config: &AnalyserConfig) -> u8 {
    let db = 20.0 * magnitude.max(1e-12).log10();
    let span = config.max_decibels - config.min_decibels;
    let scaled = (db - config.min_decibels) / span * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window() {
        let size = 512;
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_magnitude_to_byte_bounds() {
        let config = AnalyserConfig::default();
        // Silence sits far below the -100 dB floor.
        assert_eq!(magnitude_to_byte(0.0, &config), 0);
        // Full-scale magnitude (0 dB) sits above the -30 dB ceiling.
        assert_eq!(magnitude_to_byte(1.0, &config), 255);
    }

    #[test]
    fn test_magnitude_to_byte_midpoint() {
        let config = AnalyserConfig::default();
        // -65 dB is the center of the [-100, -30] window.
        let mid = 10.0f32.powf(-65.0 / 20.0);
        let byte = magnitude_to_byte(mid, &config);
        assert!((126..=129).contains(&byte), "midpoint byte {byte}");
    }

    #[test]
    fn test_tap_backlog_stays_bounded() {
        let config = AnalyserConfig::default();
        let tap = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::new(SpectrumShared::new(config.bin_count()));
        spawn_analyser_thread(config, Arc::clone(&tap), Arc::clone(&shared));

        // Feed faster than real time (88.2k samples/s); the thread must keep
        // the tap near one window regardless of the feed rate.
        for _ in 0..20 {
            tap.lock()
                .unwrap()
                .extend(std::iter::repeat(0.25f32).take(2205));
            thread::sleep(Duration::from_millis(25));
        }

        let backlog = tap.lock().unwrap().len();
        assert!(backlog < 8192, "tap backlog grew to {backlog}");
        assert!(shared.published.load(Ordering::Acquire));
    }

    #[test]
    fn test_spectrum_shared_starts_unpublished() {
        let shared = SpectrumShared::new(256);
        assert!(!shared.published.load(Ordering::Acquire));
        assert_eq!(shared.bins.lock().unwrap().len(), 256);
    }
}
