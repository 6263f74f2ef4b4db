//! GUI overlay panel
//!
//! A small raster panel (frame stats) that is drawn as a plain mesh in the
//! scene and, once a layers-capable session binds a compositor quad for it,
//! also uploaded into that quad whenever it changes or the runtime asks for
//! a redraw.

use glam::{Quat, Vec3};

use portal_render::{GroupId, MeshDesc, PlaneGeometry, RenderEngine, RenderResult, TextureId, TextureSource};
use portal_xr::{LayerId, Pose, QuadLayerInit, ReferenceSpaceId, StereoLayout, XrPlatform, XrResult};

/// Raster panel shown beside the video
#[derive(Debug, Clone)]
pub struct GuiOverlay {
    /// Size in scene units
    pub width: f32,
    pub height: f32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pose: Pose,
    raster: Vec<u8>,
    texture: Option<TextureId>,
    group: Option<GroupId>,
    layer: Option<LayerId>,
    layer_dirty: bool,
    last_fps: Option<u32>,
}

impl Default for GuiOverlay {
    fn default() -> Self {
        let pose = Pose::new(
            Vec3::new(-1.0, 1.5, -1.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_4),
        );
        Self::new(0.16, 0.096, 80, 48, pose)
    }
}

impl GuiOverlay {
    pub fn new(width: f32, height: f32, pixel_width: u32, pixel_height: u32, pose: Pose) -> Self {
        Self {
            width,
            height,
            pixel_width,
            pixel_height,
            pose,
            raster: vec![0; pixel_width as usize * pixel_height as usize * 4],
            texture: None,
            group: None,
            layer: None,
            layer_dirty: false,
            last_fps: None,
        }
    }

    pub fn raster(&self) -> &[u8] {
        &self.raster
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    pub fn is_layer_dirty(&self) -> bool {
        self.layer_dirty
    }

    /// Add the panel mesh to the scene. Safe to call again after a context
    /// restore; an existing mesh is replaced.
    pub fn attach_to_scene(&mut self, engine: &mut dyn RenderEngine) -> RenderResult<GroupId> {
        if let Some(group) = self.group.take() {
            engine.destroy_group(group);
        }
        let texture = engine.create_texture(TextureSource::Raster {
            width: self.pixel_width,
            height: self.pixel_height,
        })?;
        let mesh = engine.create_mesh(
            MeshDesc::new("gui-overlay", PlaneGeometry::new(self.width, self.height), texture)
                .placed(self.pose.position, self.pose.orientation),
        )?;
        let group = engine.create_group();
        engine.add_to_group(group, mesh)?;
        engine.attach(group)?;
        engine.mark_texture_dirty(texture)?;

        self.texture = Some(texture);
        self.group = Some(group);
        Ok(group)
    }

    /// Quad descriptor matching the panel mesh
    pub fn quad_descriptor(&self, space: ReferenceSpaceId) -> QuadLayerInit {
        QuadLayerInit::new(space, self.width, self.height, self.pose)
            .with_layout(StereoLayout::Mono)
            .with_view_pixels(self.pixel_width, self.pixel_height)
    }

    pub fn bind_layer(&mut self, layer: LayerId) {
        self.layer = Some(layer);
        self.layer_dirty = true;
    }

    /// Forget the compositor quad; the runtime frees it with its session
    pub fn unbind_layer(&mut self) {
        self.layer = None;
        self.layer_dirty = false;
    }

    /// Redraw the stats readout. Only a change in the shown value dirties
    /// the panel.
    pub fn update_stats(&mut self, engine: &mut dyn RenderEngine, delta: f32) -> RenderResult<bool> {
        let fps = if delta > 0.0 { (1.0 / delta).round() as u32 } else { 0 };
        if self.last_fps == Some(fps) {
            return Ok(false);
        }
        self.last_fps = Some(fps);
        self.rasterize(fps);

        if let Some(texture) = self.texture {
            engine.mark_texture_dirty(texture)?;
        }
        self.layer_dirty = self.layer.is_some();
        Ok(true)
    }

    /// Copy the raster into the bound quad if it changed or the runtime lost it
    pub fn upload_if_needed(&mut self, platform: &mut dyn XrPlatform) -> XrResult<bool> {
        let Some(layer) = self.layer else {
            return Ok(false);
        };
        if !self.layer_dirty && !platform.layer_needs_redraw(layer) {
            return Ok(false);
        }
        platform.upload_layer_texture(layer, self.pixel_width, self.pixel_height, &self.raster)?;
        self.layer_dirty = false;
        Ok(true)
    }

    /// Bar graph: one column lit per 2 fps, capped at the panel width
    fn rasterize(&mut self, fps: u32) {
        let width = self.pixel_width as usize;
        let lit = ((fps / 2) as usize).min(width);
        for (i, px) in self.raster.chunks_exact_mut(4).enumerate() {
            let value = if i % width < lit { 0xff } else { 0x20 };
            px.copy_from_slice(&[0, value, 0, 0xff]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_render::HeadlessEngine;

    #[test]
    fn test_attach_creates_visible_mesh() {
        let mut engine = HeadlessEngine::new();
        let mut overlay = GuiOverlay::default();
        let group = overlay.attach_to_scene(&mut engine).unwrap();
        assert!(engine.is_attached(group));
        assert_eq!(engine.group_meshes(group).len(), 1);

        let again = overlay.attach_to_scene(&mut engine).unwrap();
        assert!(!engine.is_attached(group));
        assert_eq!(engine.attached_groups(), &[again]);
    }

    #[test]
    fn test_stats_dirty_only_on_change() {
        let mut engine = HeadlessEngine::new();
        let mut overlay = GuiOverlay::default();
        overlay.attach_to_scene(&mut engine).unwrap();
        assert!(overlay.update_stats(&mut engine, 1.0 / 60.0).unwrap());
        assert!(!overlay.update_stats(&mut engine, 1.0 / 60.0).unwrap());
        assert!(overlay.update_stats(&mut engine, 1.0 / 30.0).unwrap());
    }

    #[test]
    fn test_quad_descriptor_matches_panel() {
        let overlay = GuiOverlay::default();
        let init = overlay.quad_descriptor(ReferenceSpaceId::next());
        assert_eq!(init.layout, StereoLayout::Mono);
        assert_eq!(init.view_pixel_width, Some(80));
        assert_eq!(init.transform, overlay.pose);
    }

    #[test]
    fn test_rasterize_lights_columns() {
        let mut overlay = GuiOverlay::new(1.0, 1.0, 4, 1, Pose::IDENTITY);
        overlay.rasterize(4);
        assert_eq!(overlay.raster()[1], 0xff);
        assert_eq!(overlay.raster()[5], 0xff);
        assert_eq!(overlay.raster()[9], 0x20);
    }
}
