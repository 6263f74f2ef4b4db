//! Compositor representation: a stereo quad layer bound to the media element

use glam::Vec3;

use portal_xr::{
    LayerId, MediaSourceId, Pose, QuadLayerInit, ReferenceSpaceId, SessionId, XrPlatform, XrResult,
};

use crate::VideoLayerConfig;

/// Handle to a media quad layer owned by one session
#[derive(Debug, Clone, PartialEq)]
pub struct CompositorQuadLayer {
    pub layer: LayerId,
    pub session: SessionId,
    pub init: QuadLayerInit,
}

impl CompositorQuadLayer {
    /// Quad descriptor: sized from the video's pixel dimensions, bottom
    /// edge resting at the space origin height, pushed out to `video_depth_z`
    pub fn descriptor(config: &VideoLayerConfig, space: ReferenceSpaceId) -> QuadLayerInit {
        let (width, height) = config.quad_size();
        let transform = Pose::from_position(Vec3::new(
            config.video_center_x,
            height / 2.0,
            config.video_depth_z,
        ));
        QuadLayerInit::new(space, width, height, transform).with_layout(config.layout)
    }

    pub fn create(
        platform: &mut dyn XrPlatform,
        session: SessionId,
        space: ReferenceSpaceId,
        media: MediaSourceId,
        config: &VideoLayerConfig,
    ) -> XrResult<Self> {
        let init = Self::descriptor(config, space);
        log::info!("Create quad layer with media binding ({})", init.layout.as_str());
        let layer = platform.create_media_quad_layer(session, media, &init)?;
        Ok(Self {
            layer,
            session,
            init,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_xr::StereoLayout;

    #[test]
    fn test_descriptor_geometry() {
        let config = VideoLayerConfig::default();
        let init = CompositorQuadLayer::descriptor(&config, ReferenceSpaceId::next());
        assert_eq!(init.layout, StereoLayout::StereoLeftRight);
        assert!((init.height - 2.0).abs() < 1e-4);
        assert!((init.transform.position.y - init.height / 2.0).abs() < 1e-6);
        assert_eq!(init.transform.position.z, -2.5);
    }
}
