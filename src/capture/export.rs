//! Export backends: chunk concatenation (stream) and ffmpeg transcode.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::info;

use crate::error::{Result, VizError};
use crate::params::TranscodeConfig;

/// Concatenate capture-buffer chunks into one output blob.
///
/// Output length is exactly the sum of the chunk lengths; no transcoding.
pub fn concat_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
    let total = chunks.iter().map(|c| c.len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

/// Write the concatenated capture buffer to `path`.
pub fn write_stream_export(chunks: &[Vec<u8>], path: &Path) -> Result<u64> {
    let blob = concat_chunks(chunks);
    fs::write(path, &blob)?;
    info!(path = %path.display(), bytes = blob.len(), "stream export written");
    Ok(blob.len() as u64)
}

/// Encode one RGBA frame as an in-memory PNG chunk.
pub fn encode_png_chunk(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut chunk = Vec::new();
    PngEncoder::new(&mut chunk)
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| VizError::Capture(format!("PNG encode failed: {e}")))?;
    Ok(chunk)
}

/// ffmpeg child process consuming raw RGBA frames on stdin.
///
/// The source WAV is mapped in as the audio track so the final container
/// carries both streams.
pub struct FrameEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    out_path: PathBuf,
}

impl FrameEncoder {
    /// Spawn ffmpeg with the configured codec parameters.
    pub fn spawn(
        config: &TranscodeConfig,
        audio_path: &Path,
        out_path: &Path,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self> {
        ensure_ffmpeg_available()?;

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgba")
            .arg("-video_size")
            .arg(format!("{width}x{height}"))
            .arg("-framerate")
            .arg(fps.to_string())
            .arg("-i")
            .arg("-")
            .arg("-i")
            .arg(audio_path)
            .arg("-map")
            .arg("0:v:0")
            .arg("-map")
            .arg("1:a:0")
            .arg("-c:v")
            .arg(config.video_codec)
            .arg("-b:v")
            .arg(config.video_bitrate)
            .arg("-pix_fmt")
            .arg(config.pixel_format)
            .arg("-threads")
            .arg(config.threads.to_string())
            .arg("-speed")
            .arg(config.speed.to_string())
            .arg("-c:a")
            .arg(config.audio_codec)
            .arg("-b:a")
            .arg(config.audio_bitrate)
            .arg("-f")
            .arg(config.container)
            .arg("-shortest")
            .arg(out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = cmd
            .spawn()
            .map_err(|e| VizError::Capture(format!("failed to spawn ffmpeg: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VizError::Capture("failed to open ffmpeg stdin".to_string()))?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            out_path: out_path.to_path_buf(),
        })
    }

    /// Pipe one raw RGBA frame.
    pub fn write_frame(&mut self, rgba: &[u8]) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| VizError::Capture("encoder already finished".to_string()))?;
        stdin.write_all(rgba)?;
        Ok(())
    }

    /// Close stdin and wait for ffmpeg to finish the container.
    pub fn finish(mut self) -> Result<PathBuf> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| VizError::Capture(format!("wait for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(VizError::Capture(format!(
                "ffmpeg exited with status {status}"
            )));
        }
        info!(path = %self.out_path.display(), "transcode export written");
        Ok(self.out_path)
    }

    /// Abandon the encode; partial output is discarded.
    pub fn abort(mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = fs::remove_file(&self.out_path);
    }
}

fn ensure_ffmpeg_available() -> Result<()> {
    match Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(VizError::Capture(
            "ffmpeg not found in PATH (install ffmpeg and retry)".to_string(),
        )),
        Err(err) => Err(VizError::Capture(format!("failed to run ffmpeg: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_length_is_sum_of_chunks() {
        let chunks = vec![vec![1u8; 10], vec![2u8; 25], vec![3u8; 7]];
        let blob = concat_chunks(&chunks);
        assert_eq!(blob.len(), 42);
        assert_eq!(&blob[..10], &[1u8; 10]);
        assert_eq!(&blob[10..35], &[2u8; 25]);
        assert_eq!(&blob[35..], &[3u8; 7]);
    }

    #[test]
    fn test_concat_empty_buffer() {
        assert!(concat_chunks(&[]).is_empty());
    }

    #[test]
    fn test_write_stream_export_byte_count() {
        let chunks = vec![vec![0xAAu8; 16], vec![0xBBu8; 16]];
        let path = std::env::temp_dir().join("spectrasphere_stream_test.webm");

        let written = write_stream_export(&chunks, &path).unwrap();
        assert_eq!(written, 32);
        assert_eq!(fs::metadata(&path).unwrap().len(), 32);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_png_chunk_has_signature() {
        let rgba = vec![255u8; 2 * 2 * 4];
        let chunk = encode_png_chunk(&rgba, 2, 2).unwrap();
        assert_eq!(&chunk[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_png_chunk_rejects_short_buffer() {
        let rgba = vec![0u8; 3];
        assert!(encode_png_chunk(&rgba, 2, 2).is_err());
    }
}
