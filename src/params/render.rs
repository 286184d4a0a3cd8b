//! Rendering and recording configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Field of view (degrees)
    /// reference value: 75
    pub fov_degrees: f32,

    /// Near clipping plane
    /// reference value: 0.1
    pub near_plane: f32,

    /// Far clipping plane
    /// reference value: 1000
    pub far_plane: f32,

    /// Fixed camera distance from the mesh center along +Z
    /// reference value: 100
    pub camera_z: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 75.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            camera_z: 100.0,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds); normally the audio clip length
    pub duration_secs: f32,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32, fps: u32) -> Self {
        Self { duration_secs, fps }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_frames_rounds_up() {
        assert_eq!(RecordingConfig::new(5.0, 60).total_frames(), 300);
        assert_eq!(RecordingConfig::new(5.01, 60).total_frames(), 301);
        assert_eq!(RecordingConfig::new(0.016, 60).total_frames(), 1);
    }
}
