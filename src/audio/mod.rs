//! Audio system: WAV file playback through cpal with a live spectrum tap.
//!
//! The output callback owns the playback cursor; the analysis thread owns the
//! FFT. They meet at a shared sample tap. Pausing or reaching the end of the
//! clip is the only cancellation signal the rest of the pipeline observes.

mod analyser;

pub use analyser::{magnitude_to_byte, SpectrumShared};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::info;

use crate::error::{Result, VizError};
use crate::params::AnalyserConfig;

/// Transport state shared with the real-time output callback.
struct Transport {
    playing: AtomicBool,
    ended: AtomicBool,
    /// Playback cursor in file frames, stored as `f64` bits
    cursor_bits: AtomicU64,
}

impl Transport {
    fn cursor(&self) -> f64 {
        f64::from_bits(self.cursor_bits.load(Ordering::Acquire))
    }

    fn set_cursor(&self, cursor: f64) {
        self.cursor_bits.store(cursor.to_bits(), Ordering::Release);
    }
}

/// Audio system owning the decoded clip, the output stream, and the analyser.
pub struct AudioSystem {
    transport: Arc<Transport>,
    spectrum: Arc<SpectrumShared>,
    sample_rate_hz: u32,
    sample_count: usize,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    /// Analysis thread handle (detached; runs for the process lifetime)
    _analyser_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Decode the WAV at `path` and open the default output device.
    ///
    /// Playback starts paused; call [`AudioSystem::play`]. The analyser thread
    /// starts immediately but publishes nothing until audio has flowed.
    pub fn new(path: &Path, config: AnalyserConfig) -> Result<Self> {
        config.validate()?;

        let (sample_rate_hz, samples) = decode_wav_mono(path)?;
        if samples.is_empty() {
            return Err(VizError::Audio("WAV contained no samples".to_string()));
        }
        let sample_count = samples.len();
        info!(
            rate = sample_rate_hz,
            frames = sample_count,
            "decoded audio clip ({:.2}s)",
            sample_count as f32 / sample_rate_hz as f32
        );

        let transport = Arc::new(Transport {
            playing: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            cursor_bits: AtomicU64::new(0f64.to_bits()),
        });
        let transport_cb = Arc::clone(&transport);

        let tap = Arc::new(Mutex::new(Vec::<f32>::new()));
        let tap_cb = Arc::clone(&tap);

        let spectrum = Arc::new(SpectrumShared::new(config.bin_count()));
        let spectrum_analyser = Arc::clone(&spectrum);

        // Setup audio output device
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| VizError::Audio("no audio output device found".to_string()))?;
        let device_config = device
            .default_output_config()
            .map_err(|e| VizError::Audio(format!("failed to get audio config: {e}")))?;

        let device_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;
        // Nearest-sample rate conversion between file and device clocks
        let step = sample_rate_hz as f64 / device_rate as f64;
        info!(
            device = device.name().unwrap_or_else(|_| "unknown".to_string()),
            rate = device_rate,
            channels,
            "audio output opened"
        );

        let stream = device
            .build_output_stream(
                &device_config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !transport_cb.playing.load(Ordering::Acquire) {
                        data.fill(0.0);
                        return;
                    }

                    let mut cursor = transport_cb.cursor();
                    let mut tap_buf = tap_cb.lock().unwrap();

                    for frame in data.chunks_mut(channels) {
                        let index = cursor as usize;
                        let sample = if index < samples.len() {
                            samples[index]
                        } else {
                            0.0
                        };

                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                        tap_buf.push(sample);
                        cursor += step;
                    }
                    drop(tap_buf);

                    if cursor as usize >= samples.len() {
                        transport_cb.ended.store(true, Ordering::Release);
                        transport_cb.playing.store(false, Ordering::Release);
                    }
                    transport_cb.set_cursor(cursor);
                },
                |err| tracing::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| VizError::Audio(format!("failed to build audio stream: {e}")))?;

        stream
            .play()
            .map_err(|e| VizError::Audio(format!("failed to start audio stream: {e}")))?;

        let analyser_thread = analyser::spawn_analyser_thread(config, tap, spectrum_analyser);

        Ok(Self {
            transport,
            spectrum,
            sample_rate_hz,
            sample_count,
            _stream: stream,
            _analyser_thread: Some(analyser_thread),
        })
    }

    /// Current spectrum frame (byte magnitudes, one per frequency bin).
    ///
    /// Errors until the analyser has published its first frame, which
    /// requires playback to have started.
    pub fn spectrum(&self) -> Result<Vec<u8>> {
        if !self.spectrum.published.load(Ordering::Acquire) {
            return Err(VizError::SourceNotReady);
        }
        Ok(self.spectrum.bins.lock().unwrap().clone())
    }

    pub fn play(&self) {
        if !self.ended() {
            self.transport.playing.store(true, Ordering::Release);
        }
    }

    pub fn pause(&self) {
        self.transport.playing.store(false, Ordering::Release);
    }

    pub fn toggle(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.transport.playing.load(Ordering::Acquire)
    }

    pub fn ended(&self) -> bool {
        self.transport.ended.load(Ordering::Acquire)
    }

    /// Clip duration in seconds
    pub fn duration_s(&self) -> f32 {
        self.sample_count as f32 / self.sample_rate_hz as f32
    }

    /// Playback position in seconds
    pub fn position_s(&self) -> f32 {
        (self.transport.cursor() / self.sample_rate_hz as f64) as f32
    }
}

/// Decode a WAV file to mono f32 samples at its native rate.
///
/// PCM16 and Float32 sources are supported; multi-channel audio is averaged
/// down to mono, matching what the analyser consumes.
pub fn decode_wav_mono(path: &Path) -> Result<(u32, Vec<f32>)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((spec.sample_rate, mono))
}
