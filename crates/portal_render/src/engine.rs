//! The render engine trait

use portal_xr::{MediaSourceId, SessionId};

use crate::{CameraRig, ClipPlane, GroupId, MeshDesc, MeshId, RenderResult, TextureId};

/// Where a texture's pixels come from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSource {
    /// Decoded frames of a media element
    Media(MediaSourceId),
    /// CPU raster the application draws into
    Raster { width: u32, height: u32 },
}

/// What one `render` call did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    /// Meshes drawn per view, in view order
    pub draws_per_view: Vec<usize>,
    /// Texture uploads performed before drawing
    pub uploads: usize,
}

impl FrameStats {
    pub fn total_draws(&self) -> usize {
        self.draws_per_view.iter().sum()
    }
}

/// Capability surface of the 3D engine.
///
/// Dirty textures are uploaded, and their dirty flag cleared, by the next
/// `render` call.
pub trait RenderEngine {
    fn name(&self) -> &str;

    fn create_texture(&mut self, source: TextureSource) -> RenderResult<TextureId>;
    fn mark_texture_dirty(&mut self, texture: TextureId) -> RenderResult<()>;
    fn texture_needs_update(&self, texture: TextureId) -> bool;

    fn create_mesh(&mut self, desc: MeshDesc) -> RenderResult<MeshId>;
    fn mesh(&self, mesh: MeshId) -> Option<&MeshDesc>;
    fn destroy_mesh(&mut self, mesh: MeshId);

    fn create_group(&mut self) -> GroupId;
    fn add_to_group(&mut self, group: GroupId, mesh: MeshId) -> RenderResult<()>;
    fn group_meshes(&self, group: GroupId) -> Vec<MeshId>;
    /// Drop the group and every mesh in it, detaching it first
    fn destroy_group(&mut self, group: GroupId);

    /// Add the group to the scene graph
    fn attach(&mut self, group: GroupId) -> RenderResult<()>;
    /// Remove the group from the scene graph; false if it was not attached
    fn detach(&mut self, group: GroupId) -> bool;
    fn is_attached(&self, group: GroupId) -> bool;

    fn set_clipping_planes(&mut self, planes: &[ClipPlane]);

    /// Route frames to an XR session's views, or back to the preview window
    fn bind_xr_session(&mut self, session: Option<SessionId>);

    fn render(&mut self, rig: &CameraRig) -> RenderResult<FrameStats>;
}
