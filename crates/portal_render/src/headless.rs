//! GPU-less render engine
//!
//! Keeps the scene graph as plain maps and "draws" by counting which
//! attached meshes each camera view can see.

use std::collections::HashMap;

use portal_xr::SessionId;

use crate::{
    CameraRig, ClipPlane, FrameStats, GroupId, MeshDesc, MeshId, RenderEngine, RenderError,
    RenderResult, TextureId, TextureSource,
};

#[derive(Debug)]
struct TextureEntry {
    source: TextureSource,
    needs_update: bool,
    uploads: u64,
}

#[derive(Debug, Default)]
struct GroupEntry {
    meshes: Vec<MeshId>,
}

/// Render engine that records instead of drawing
#[derive(Debug, Default)]
pub struct HeadlessEngine {
    textures: HashMap<TextureId, TextureEntry>,
    meshes: HashMap<MeshId, MeshDesc>,
    groups: HashMap<GroupId, GroupEntry>,
    /// Scene graph roots in attach order
    scene: Vec<GroupId>,
    clipping_planes: Vec<ClipPlane>,
    session: Option<SessionId>,
    frame: u64,
    last_frame: Option<FrameStats>,
}

impl HeadlessEngine {
    /// Engine with an empty scene and no session
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene graph roots in attach order
    pub fn attached_groups(&self) -> &[GroupId] {
        &self.scene
    }

    /// Meshes reachable from the scene graph
    pub fn attached_meshes(&self) -> Vec<MeshId> {
        self.scene
            .iter()
            .filter_map(|g| self.groups.get(g))
            .flat_map(|g| g.meshes.iter().copied())
            .collect()
    }

    /// Live meshes, attached or not
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// What a texture samples, if it exists
    pub fn texture_source(&self, texture: TextureId) -> Option<TextureSource> {
        self.textures.get(&texture).map(|t| t.source)
    }

    /// Uploads `render` has performed for a texture; zero if unknown
    pub fn texture_uploads(&self, texture: TextureId) -> u64 {
        self.textures.get(&texture).map(|t| t.uploads).unwrap_or(0)
    }

    /// Planes set for the next render
    pub fn clipping_planes(&self) -> &[ClipPlane] {
        &self.clipping_planes
    }

    /// XR session the renderer is bound to
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Completed `render` calls
    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    /// Stats of the most recent `render` call
    pub fn last_frame(&self) -> Option<&FrameStats> {
        self.last_frame.as_ref()
    }
}

impl RenderEngine for HeadlessEngine {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_texture(&mut self, source: TextureSource) -> RenderResult<TextureId> {
        if let TextureSource::Raster { width, height } = source {
            if width == 0 || height == 0 {
                return Err(RenderError::Backend(format!(
                    "empty raster texture {}x{}",
                    width, height
                )));
            }
        }
        let id = TextureId::next();
        self.textures.insert(
            id,
            TextureEntry {
                source,
                needs_update: false,
                uploads: 0,
            },
        );
        Ok(id)
    }

    fn mark_texture_dirty(&mut self, texture: TextureId) -> RenderResult<()> {
        let entry = self
            .textures
            .get_mut(&texture)
            .ok_or(RenderError::UnknownTexture(texture))?;
        entry.needs_update = true;
        Ok(())
    }

    fn texture_needs_update(&self, texture: TextureId) -> bool {
        self.textures
            .get(&texture)
            .map(|t| t.needs_update)
            .unwrap_or(false)
    }

    fn create_mesh(&mut self, desc: MeshDesc) -> RenderResult<MeshId> {
        if !self.textures.contains_key(&desc.texture) {
            return Err(RenderError::UnknownTexture(desc.texture));
        }
        let id = MeshId::next();
        log::trace!("Mesh {} '{}' on layers {:?}", id, desc.name, desc.layers);
        self.meshes.insert(id, desc);
        Ok(id)
    }

    fn mesh(&self, mesh: MeshId) -> Option<&MeshDesc> {
        self.meshes.get(&mesh)
    }

    fn destroy_mesh(&mut self, mesh: MeshId) {
        self.meshes.remove(&mesh);
        for group in self.groups.values_mut() {
            group.meshes.retain(|m| *m != mesh);
        }
    }

    fn create_group(&mut self) -> GroupId {
        let id = GroupId::next();
        self.groups.insert(id, GroupEntry::default());
        id
    }

    fn add_to_group(&mut self, group: GroupId, mesh: MeshId) -> RenderResult<()> {
        if !self.meshes.contains_key(&mesh) {
            return Err(RenderError::UnknownMesh(mesh));
        }
        let entry = self
            .groups
            .get_mut(&group)
            .ok_or(RenderError::UnknownGroup(group))?;
        if !entry.meshes.contains(&mesh) {
            entry.meshes.push(mesh);
        }
        Ok(())
    }

    fn group_meshes(&self, group: GroupId) -> Vec<MeshId> {
        self.groups
            .get(&group)
            .map(|g| g.meshes.clone())
            .unwrap_or_default()
    }

    fn destroy_group(&mut self, group: GroupId) {
        self.scene.retain(|g| *g != group);
        if let Some(entry) = self.groups.remove(&group) {
            for mesh in entry.meshes {
                self.meshes.remove(&mesh);
            }
        }
    }

    fn attach(&mut self, group: GroupId) -> RenderResult<()> {
        if !self.groups.contains_key(&group) {
            return Err(RenderError::UnknownGroup(group));
        }
        if self.scene.contains(&group) {
            return Err(RenderError::AlreadyAttached(group));
        }
        self.scene.push(group);
        Ok(())
    }

    fn detach(&mut self, group: GroupId) -> bool {
        let before = self.scene.len();
        self.scene.retain(|g| *g != group);
        self.scene.len() != before
    }

    fn is_attached(&self, group: GroupId) -> bool {
        self.scene.contains(&group)
    }

    fn set_clipping_planes(&mut self, planes: &[ClipPlane]) {
        self.clipping_planes = planes.to_vec();
    }

    fn bind_xr_session(&mut self, session: Option<SessionId>) {
        if self.session != session {
            log::debug!("Headless engine bound to session {:?}", session);
        }
        self.session = session;
    }

    fn render(&mut self, rig: &CameraRig) -> RenderResult<FrameStats> {
        let mut uploads = 0;
        for texture in self.textures.values_mut().filter(|t| t.needs_update) {
            texture.needs_update = false;
            texture.uploads += 1;
            uploads += 1;
        }

        let visible: Vec<&MeshDesc> = self
            .attached_meshes()
            .into_iter()
            .filter_map(|m| self.meshes.get(&m))
            .collect();
        let draws_per_view = rig
            .views()
            .into_iter()
            .map(|view| visible.iter().filter(|m| view.test(m.layers)).count())
            .collect();

        self.frame += 1;
        let stats = FrameStats {
            frame: self.frame,
            draws_per_view,
            uploads,
        };
        self.last_frame = Some(stats.clone());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraLayers, PlaneGeometry};
    use portal_xr::MediaSourceId;

    fn textured(engine: &mut HeadlessEngine) -> TextureId {
        engine
            .create_texture(TextureSource::Media(MediaSourceId::next()))
            .unwrap()
    }

    #[test]
    fn test_attach_twice_rejected() {
        let mut engine = HeadlessEngine::new();
        let group = engine.create_group();
        engine.attach(group).unwrap();
        assert_eq!(engine.attach(group), Err(RenderError::AlreadyAttached(group)));
        assert!(engine.detach(group));
        assert!(!engine.detach(group));
    }

    #[test]
    fn test_render_uploads_dirty_textures_once() {
        let mut engine = HeadlessEngine::new();
        let texture = textured(&mut engine);
        engine.mark_texture_dirty(texture).unwrap();
        assert!(engine.texture_needs_update(texture));

        let rig = CameraRig::new();
        assert_eq!(engine.render(&rig).unwrap().uploads, 1);
        assert_eq!(engine.render(&rig).unwrap().uploads, 0);
        assert_eq!(engine.texture_uploads(texture), 1);
    }

    #[test]
    fn test_eye_visibility() {
        let mut engine = HeadlessEngine::new();
        let texture = textured(&mut engine);
        let group = engine.create_group();
        for layer in [CameraLayers::LEFT_EYE, CameraLayers::RIGHT_EYE] {
            let mesh = engine
                .create_mesh(MeshDesc::new("eye", PlaneGeometry::new(1.0, 1.0), texture).on_layer(layer))
                .unwrap();
            engine.add_to_group(group, mesh).unwrap();
        }
        engine.attach(group).unwrap();

        let mut rig = CameraRig::new();
        assert_eq!(engine.render(&rig).unwrap().draws_per_view, vec![1]);
        rig.configure(true, true);
        assert_eq!(engine.render(&rig).unwrap().draws_per_view, vec![1, 1]);
    }

    #[test]
    fn test_destroy_group_drops_meshes() {
        let mut engine = HeadlessEngine::new();
        let texture = textured(&mut engine);
        let group = engine.create_group();
        let mesh = engine
            .create_mesh(MeshDesc::new("m", PlaneGeometry::new(1.0, 1.0), texture))
            .unwrap();
        engine.add_to_group(group, mesh).unwrap();
        engine.attach(group).unwrap();

        engine.destroy_group(group);
        assert!(!engine.is_attached(group));
        assert!(engine.mesh(mesh).is_none());
        assert_eq!(engine.mesh_count(), 0);
    }
}
