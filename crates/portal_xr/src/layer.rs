//! Compositor layer descriptors

use serde::{Deserialize, Serialize};

use crate::{Pose, ReferenceSpaceId};

/// How a single texture packs the per-eye images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StereoLayout {
    Mono,
    /// Left eye in the left half, right eye in the right half
    StereoLeftRight,
    /// Left eye in the top half, right eye in the bottom half
    StereoTopBottom,
}

impl Default for StereoLayout {
    fn default() -> Self {
        Self::StereoLeftRight
    }
}

impl StereoLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::StereoLeftRight => "stereo-left-right",
            Self::StereoTopBottom => "stereo-top-bottom",
        }
    }

    /// Pixel size of one eye's view within a packed frame
    pub fn view_pixels(&self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::Mono => (width, height),
            Self::StereoLeftRight => (width / 2, height),
            Self::StereoTopBottom => (width, height / 2),
        }
    }
}

/// Parameters for creating a quad layer
#[derive(Debug, Clone, PartialEq)]
pub struct QuadLayerInit {
    /// Space the transform is expressed in
    pub space: ReferenceSpaceId,
    pub layout: StereoLayout,
    /// Width in scene units (meters)
    pub width: f32,
    /// Height in scene units (meters)
    pub height: f32,
    pub transform: Pose,
    /// Backing texture size; media layers take it from the media element
    pub view_pixel_width: Option<u32>,
    pub view_pixel_height: Option<u32>,
}

impl QuadLayerInit {
    pub fn new(space: ReferenceSpaceId, width: f32, height: f32, transform: Pose) -> Self {
        Self {
            space,
            layout: StereoLayout::Mono,
            width,
            height,
            transform,
            view_pixel_width: None,
            view_pixel_height: None,
        }
    }

    pub fn with_layout(mut self, layout: StereoLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_view_pixels(mut self, width: u32, height: u32) -> Self {
        self.view_pixel_width = Some(width);
        self.view_pixel_height = Some(height);
        self
    }
}
