//! Video layer configuration

use serde::{Deserialize, Serialize};

use portal_xr::StereoLayout;

use crate::{VideoLayerError, VideoLayerResult};

/// Placement and sizing of the stereo video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoLayerConfig {
    /// Intrinsic width of the packed stereo frame (pixels)
    pub video_width: u32,
    /// Intrinsic height of the packed stereo frame (pixels)
    pub video_height: u32,
    /// Lateral offset of each eye's plane from the center (scene units)
    pub video_reducer: f32,
    pub video_center_x: f32,
    pub video_center_y: f32,
    pub video_depth_z: f32,
    /// Width of each WebGL plane (scene units)
    pub mesh_width: f32,
    /// Texture refresh rate
    pub refresh_hz: u32,
    /// Scene units per video pixel for the compositor quad
    pub compositor_scale: f32,
    pub layout: StereoLayout,
}

impl Default for VideoLayerConfig {
    fn default() -> Self {
        Self {
            video_width: 2064,
            video_height: 2208,
            video_reducer: 0.090_579_71,
            video_center_x: 0.0,
            video_center_y: 0.0,
            video_depth_z: -2.5,
            mesh_width: 5.0,
            refresh_hz: 24,
            compositor_scale: 0.000_905_797_1,
            layout: StereoLayout::StereoLeftRight,
        }
    }
}

impl VideoLayerConfig {
    /// Plane height preserving the frame's aspect ratio
    pub fn mesh_height(&self) -> f32 {
        self.video_height as f32 / self.video_width as f32 * self.mesh_width
    }

    /// Compositor quad size (scene units)
    pub fn quad_size(&self) -> (f32, f32) {
        (
            self.video_width as f32 * self.compositor_scale,
            self.video_height as f32 * self.compositor_scale,
        )
    }

    pub fn validate(&self) -> VideoLayerResult<()> {
        if self.video_width == 0 || self.video_height == 0 {
            return Err(VideoLayerError::InvalidConfig(format!(
                "video size must be non-zero, got {}x{}",
                self.video_width, self.video_height
            )));
        }
        if !(self.mesh_width > 0.0) {
            return Err(VideoLayerError::InvalidConfig(format!(
                "mesh_width must be positive, got {}",
                self.mesh_width
            )));
        }
        if !(self.compositor_scale > 0.0) {
            return Err(VideoLayerError::InvalidConfig(format!(
                "compositor_scale must be positive, got {}",
                self.compositor_scale
            )));
        }
        if self.refresh_hz == 0 {
            return Err(VideoLayerError::InvalidConfig(
                "refresh_hz must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
