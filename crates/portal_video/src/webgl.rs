//! WebGL fallback representation: two eye-tagged planes

use glam::Vec3;

use portal_render::{CameraLayers, GroupId, MeshDesc, MeshId, PlaneGeometry, RenderEngine, TextureId, UvRect};

use crate::{VideoLayerConfig, VideoLayerResult};

/// Left and right planes sharing one video texture.
///
/// Each plane samples its half of the side-by-side frame and is offset
/// laterally by `video_reducer` so the eyes converge on the video.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoMeshPair {
    pub group: GroupId,
    pub left: MeshId,
    pub right: MeshId,
    pub texture: TextureId,
}

impl StereoMeshPair {
    /// Create both planes and group them, without attaching the group
    pub fn build(
        engine: &mut dyn RenderEngine,
        texture: TextureId,
        config: &VideoLayerConfig,
    ) -> VideoLayerResult<Self> {
        let height = config.mesh_height();
        let left_geometry = PlaneGeometry::new(config.mesh_width, height)
            .translated(Vec3::new(
                config.video_center_x + config.video_reducer,
                config.video_center_y,
                config.video_depth_z,
            ))
            .with_uv(UvRect::LEFT_HALF);
        let right_geometry = PlaneGeometry::new(config.mesh_width, height)
            .translated(Vec3::new(
                config.video_center_x - config.video_reducer,
                config.video_center_y,
                config.video_depth_z,
            ))
            .with_uv(UvRect::RIGHT_HALF);

        let left = engine.create_mesh(
            MeshDesc::new("video-left", left_geometry, texture).on_layer(CameraLayers::LEFT_EYE),
        )?;
        let right = match engine.create_mesh(
            MeshDesc::new("video-right", right_geometry, texture).on_layer(CameraLayers::RIGHT_EYE),
        ) {
            Ok(mesh) => mesh,
            Err(e) => {
                engine.destroy_mesh(left);
                return Err(e.into());
            }
        };

        let group = engine.create_group();
        let grouped = engine
            .add_to_group(group, left)
            .and_then(|_| engine.add_to_group(group, right));
        if let Err(e) = grouped {
            engine.destroy_group(group);
            engine.destroy_mesh(left);
            engine.destroy_mesh(right);
            return Err(e.into());
        }

        Ok(Self {
            group,
            left,
            right,
            texture,
        })
    }

    pub fn attach(&self, engine: &mut dyn RenderEngine) -> VideoLayerResult<()> {
        engine.attach(self.group)?;
        Ok(())
    }

    /// Detach from the scene and free both meshes
    pub fn destroy(self, engine: &mut dyn RenderEngine) {
        engine.detach(self.group);
        engine.destroy_group(self.group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_render::{HeadlessEngine, TextureSource};
    use portal_xr::MediaSourceId;

    #[test]
    fn test_planes_offset_symmetrically() {
        let mut engine = HeadlessEngine::new();
        let texture = engine
            .create_texture(TextureSource::Media(MediaSourceId::next()))
            .unwrap();
        let config = VideoLayerConfig {
            video_center_x: 0.25,
            ..Default::default()
        };
        let pair = StereoMeshPair::build(&mut engine, texture, &config).unwrap();

        let left = engine.mesh(pair.left).unwrap();
        let right = engine.mesh(pair.right).unwrap();
        assert!((left.geometry.translation.x - (0.25 + config.video_reducer)).abs() < 1e-6);
        assert!((right.geometry.translation.x - (0.25 - config.video_reducer)).abs() < 1e-6);
        assert_eq!(left.geometry.translation.z, right.geometry.translation.z);
        assert_eq!(left.geometry.uv, UvRect::LEFT_HALF);
        assert_eq!(right.geometry.uv, UvRect::RIGHT_HALF);
        assert!(!engine.is_attached(pair.group));
    }

    #[test]
    fn test_destroy_frees_meshes() {
        let mut engine = HeadlessEngine::new();
        let texture = engine
            .create_texture(TextureSource::Media(MediaSourceId::next()))
            .unwrap();
        let pair = StereoMeshPair::build(&mut engine, texture, &VideoLayerConfig::default()).unwrap();
        pair.attach(&mut engine).unwrap();
        assert_eq!(engine.attached_meshes().len(), 2);

        pair.destroy(&mut engine);
        assert!(engine.attached_meshes().is_empty());
        assert_eq!(engine.mesh_count(), 0);
    }
}
