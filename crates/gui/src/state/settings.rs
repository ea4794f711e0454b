//! Application settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::SettlePolicy;

/// Largest capture edge in pixels
pub const MAX_CAPTURE_SIZE: u32 = 8192;

/// How the capture sequencer decides the camera has finished resetting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    /// Wait a fixed delay after the reset command
    #[default]
    FixedDelay,
    /// Proceed once the camera reports it has settled, bounded by a timeout
    UntilSettled,
}

/// Snapshot export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub settle_mode: SettleMode,
    /// Grace period after a camera reset (fixed-delay mode)
    pub settle_delay_ms: u64,
    /// Upper bound on the wait in until-settled mode
    pub max_wait_ms: u64,
    /// Output directory; the user's picture directory when unset
    pub output_dir: Option<PathBuf>,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            settle_mode: SettleMode::FixedDelay,
            settle_delay_ms: 1500,
            max_wait_ms: 3000,
            output_dir: None,
            file_name: "screenshot.png".to_string(),
            width: 1024,
            height: 1024,
        }
    }
}

impl CaptureSettings {
    pub fn settle_policy(&self) -> SettlePolicy {
        match self.settle_mode {
            SettleMode::FixedDelay => {
                SettlePolicy::FixedDelay(Duration::from_millis(self.settle_delay_ms))
            }
            SettleMode::UntilSettled => SettlePolicy::UntilSettled {
                max_wait: Duration::from_millis(self.max_wait_ms),
            },
        }
    }

    /// Keep capture dimensions within what the rasterizer will allocate
    pub fn clamp_size(&mut self) {
        let (width, height) = (self.width, self.height);
        self.width = width.min(MAX_CAPTURE_SIZE);
        self.height = height.min(MAX_CAPTURE_SIZE);
        if (width, height) != (self.width, self.height) {
            tracing::warn!(
                "Capture size {width}x{height} clamped to {}x{}",
                self.width,
                self.height
            );
        }
    }

    /// Directory snapshots are written to
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        directories::UserDirs::new()
            .and_then(|dirs| dirs.picture_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Viewport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Background color RGB
    pub background_color: [u8; 3],
    /// Gentle rocking of the model while idle
    pub float_animation: bool,
    /// Ambient light share (0.0 - 1.0)
    pub ambient: f32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            background_color: [255, 255, 255],
            float_animation: true,
            ambient: 0.7,
        }
    }
}

/// Camera home pose
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Distance from the model in the home pose
    pub distance: f32,
    /// Home distance for narrow windows (below 500 px)
    pub narrow_distance: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 3.25,
            narrow_distance: 4.25,
            fov_degrees: 45.0,
        }
    }
}

impl CameraSettings {
    pub fn home_distance(&self, viewport_width: f32) -> f32 {
        if viewport_width < 500.0 {
            self.narrow_distance
        } else {
            self.distance
        }
    }
}

/// All application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub viewport: ViewportSettings,
    #[serde(default)]
    pub camera: CameraSettings,
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "customizer", "customizer")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(&json) {
            Ok(mut settings) => {
                settings.capture.clamp_size();
                settings
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                tracing::warn!("Failed to save settings: {e}");
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capture_matches_source_timing() {
        let s = AppSettings::default();
        assert_eq!(
            s.capture.settle_policy(),
            SettlePolicy::FixedDelay(Duration::from_millis(1500))
        );
        assert_eq!(s.capture.file_name, "screenshot.png");
    }

    #[test]
    fn test_until_settled_policy() {
        let capture = CaptureSettings {
            settle_mode: SettleMode::UntilSettled,
            max_wait_ms: 2000,
            ..Default::default()
        };
        assert_eq!(
            capture.settle_policy(),
            SettlePolicy::UntilSettled {
                max_wait: Duration::from_millis(2000)
            }
        );
    }

    #[test]
    fn test_narrow_window_uses_far_camera() {
        let c = CameraSettings::default();
        assert_eq!(c.home_distance(400.0), 4.25);
        assert_eq!(c.home_distance(1200.0), 3.25);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: AppSettings =
            serde_json::from_str(r#"{"capture": {"settle_delay_ms": 900}}"#).unwrap();
        assert_eq!(s.capture.settle_delay_ms, 900);
        assert_eq!(s.capture.width, 1024);
        assert!(s.viewport.float_animation);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut s = AppSettings::default();
        s.capture.output_dir = Some(dir.path().to_path_buf());
        s.viewport.background_color = [10, 20, 30];
        s.save_to(&path).unwrap();

        let loaded = AppSettings::load_from(&path);
        assert_eq!(loaded.viewport.background_color, [10, 20, 30]);
        assert_eq!(loaded.capture.output_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_oversized_capture_is_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"capture": {"width": 4000000000, "height": 512}}"#).unwrap();

        let loaded = AppSettings::load_from(&path);
        assert_eq!(loaded.capture.width, MAX_CAPTURE_SIZE);
        assert_eq!(loaded.capture.height, 512);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppSettings::load_from(&path).capture.settle_delay_ms, 1500);
    }
}
