//! # portal_render - 3D engine capability
//!
//! The demo never talks to a concrete renderer. It needs four things from
//! one: textures fed by a media source or a raster, plane meshes tagged
//! with camera layers, groups that can be attached to and detached from
//! the scene, and a per-frame `render` through a camera rig.
//!
//! ```text
//! ┌───────────────┐   create_texture / create_mesh   ┌─────────────────┐
//! │ portal_video  │ ───────────────────────────────► │  RenderEngine   │
//! │ portal_presen │   attach / detach / render       │  (headless, GL) │
//! └───────────────┘ ───────────────────────────────► └─────────────────┘
//! ```
//!
//! [`headless::HeadlessEngine`] implements the trait without a GPU and
//! records every call; it backs the runtime binary and the tests.

pub mod error;
pub mod camera;
pub mod geometry;
pub mod engine;
pub mod headless;

pub use error::{RenderError, RenderResult};
pub use camera::{CameraLayers, CameraRig};
pub use geometry::{ClipPlane, MeshDesc, PlaneGeometry, UvRect};
pub use engine::{FrameStats, RenderEngine, TextureSource};
pub use headless::HeadlessEngine;

use portal_core::define_id;

define_id!(
    /// GPU texture owned by the engine
    TextureId
);

define_id!(
    /// Mesh entity
    MeshId
);

define_id!(
    /// Group of meshes attached to the scene as one unit
    GroupId
);

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::{
        CameraLayers, CameraRig, ClipPlane, FrameStats, GroupId, HeadlessEngine, MeshDesc,
        MeshId, PlaneGeometry, RenderEngine, RenderError, RenderResult, TextureId,
        TextureSource, UvRect,
    };
}
