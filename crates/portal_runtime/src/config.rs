//! Portal Configuration
//!
//! Everything the `portal` binary needs before it builds the app: video
//! placement, the layers switch, the XR device to drive and the shape of
//! the demo run.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variable: `PORTAL_CONFIG=/path/to/portal.toml`
//! 2. Config file: `portal.toml` in the working directory
//! 3. Built-in defaults
//!
//! `PORTAL_LAYERS=0|1` overrides `xr.enable_layers` after the file is read.
//!
//! # Example Config File
//!
//! ```toml
//! [video]
//! video_width = 2064
//! video_height = 2208
//! video_depth_z = -2.5
//! refresh_hz = 24
//!
//! [xr]
//! enable_layers = true
//! force_emulation = false
//!
//! [emulator]
//! profile = "meta-quest-3"
//! supports_layers = true
//! compositor_binding = true
//! completion_latency = 2
//!
//! [demo]
//! frame_rate = 72
//! xr_frames = 144
//! end_via_gesture = true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use portal_video::VideoLayerConfig;
use portal_xr::EmulatorSettings;

/// XR session options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XrConfig {
    /// Try compositor layers before the plain WebGL path
    pub enable_layers: bool,
    /// Skip the configured device and install the stock emulator
    pub force_emulation: bool,
}

impl Default for XrConfig {
    fn default() -> Self {
        Self {
            enable_layers: true,
            force_emulation: false,
        }
    }
}

/// Shape of the headless demo run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulated display refresh rate
    pub frame_rate: u32,
    /// Frames rendered before the entry button is pressed
    pub preview_frames: u32,
    /// Frames rendered inside the session
    pub xr_frames: u32,
    /// Frames rendered after the session ends
    pub post_session_frames: u32,
    /// End the session with the controller B/A gesture instead of directly
    pub end_via_gesture: bool,
    pub video_url: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frame_rate: 72,
            preview_frames: 30,
            xr_frames: 144,
            post_session_frames: 30,
            end_via_gesture: true,
            video_url: "assets/videos/Lake_Champlain.webm".to_string(),
        }
    }
}

impl DemoConfig {
    /// Timestamp of frame `n` on the simulated display
    pub fn timestamp(&self, frame: u64) -> Duration {
        Duration::from_secs_f64(frame as f64 / self.frame_rate.max(1) as f64)
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub video: VideoLayerConfig,
    pub xr: XrConfig,
    /// The XR device the demo drives
    pub emulator: EmulatorSettings,
    pub demo: DemoConfig,
    /// Where the config was loaded from
    #[serde(skip)]
    pub config_path: Option<String>,
}

impl PortalConfig {
    /// Load from the configured sources
    pub fn load() -> Self {
        let mut config = Self::default();

        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("PORTAL_CONFIG") {
            if !path.is_empty() {
                paths.push(path);
            }
        }
        paths.push("portal.toml".to_string());

        for path in &paths {
            if !Path::new(path).exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(loaded) => {
                    config = loaded;
                    config.config_path = Some(path.clone());
                    log::info!("Loaded portal config from {}", path);
                    break;
                }
                Err(e) => log::warn!("Ignoring config {}: {}", path, e),
            }
        }

        if let Ok(layers) = std::env::var("PORTAL_LAYERS") {
            config.apply_layers_override(&layers);
        }

        config
    }

    fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&content)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply a `PORTAL_LAYERS` value; anything unrecognised is ignored
    pub fn apply_layers_override(&mut self, value: &str) {
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "on" => self.xr.enable_layers = true,
            "0" | "false" | "off" => self.xr.enable_layers = false,
            other => {
                log::warn!("Unrecognised PORTAL_LAYERS value '{}'", other);
                return;
            }
        }
        log::info!("Compositor layers from env: {}", self.xr.enable_layers);
    }

    pub fn print_summary(&self) {
        log::info!("=== Portal Configuration ===");
        log::info!("  Source: {}", self.config_path.as_deref().unwrap_or("defaults"));
        log::info!(
            "  Video: {}x{} at z={} ({} Hz refresh)",
            self.video.video_width,
            self.video.video_height,
            self.video.video_depth_z,
            self.video.refresh_hz
        );
        log::info!("  Layers: {}", self.xr.enable_layers);
        log::info!(
            "  Device: {}{}",
            self.emulator.profile,
            if self.xr.force_emulation { " (forced emulation)" } else { "" }
        );
        log::info!(
            "  Demo: {} preview / {} XR / {} post frames at {} Hz",
            self.demo.preview_frames,
            self.demo.xr_frames,
            self.demo.post_session_frames,
            self.demo.frame_rate
        );
        log::info!("============================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert!(config.xr.enable_layers);
        assert!(!config.xr.force_emulation);
        assert_eq!(config.video.video_width, 2064);
        assert_eq!(config.emulator.completion_latency, 2);
        assert_eq!(config.demo.frame_rate, 72);
    }

    #[test]
    fn test_partial_toml() {
        let config = PortalConfig::from_toml(
            r#"
            [xr]
            enable_layers = false

            [emulator]
            compositor_binding = false

            [demo]
            xr_frames = 10
            "#,
        )
        .unwrap();

        assert!(!config.xr.enable_layers);
        assert!(!config.emulator.compositor_binding);
        assert!(config.emulator.supports_layers);
        assert_eq!(config.demo.xr_frames, 10);
        assert_eq!(config.demo.preview_frames, 30);
        assert_eq!(config.video, VideoLayerConfig::default());
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(PortalConfig::from_toml("[demo]\nframe_rate = \"fast\"").is_err());
    }

    #[test]
    fn test_layers_override() {
        let mut config = PortalConfig::default();
        config.apply_layers_override("0");
        assert!(!config.xr.enable_layers);
        config.apply_layers_override("maybe");
        assert!(!config.xr.enable_layers);
        config.apply_layers_override("TRUE");
        assert!(config.xr.enable_layers);
    }

    #[test]
    fn test_frame_timestamps() {
        let demo = DemoConfig {
            frame_rate: 50,
            ..DemoConfig::default()
        };
        assert_eq!(demo.timestamp(0), Duration::ZERO);
        assert_eq!(demo.timestamp(50), Duration::from_secs(1));
    }
}
