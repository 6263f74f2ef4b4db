//! # portal_video - stereo video layer manager
//!
//! Shows one side-by-side stereo video in one of two ways:
//!
//! - **WebGL planes**: two textured planes sampling the left and right
//!   halves of a shared video texture, visible to one eye each through
//!   camera layers 1 and 2. The texture is refreshed by a 24 Hz timer.
//! - **Compositor layer**: a stereo quad layer the XR runtime samples
//!   straight from the media element, outside the render loop.
//!
//! [`VideoLayerManager`] owns both and keeps at most one of them active.
//!
//! ```text
//!            init_video_layer(WebGlPlanes)
//!   None ───────────────────────────────────► WebGlPlanes
//!    ▲  ◄─────── clear_video_layer ──────────     │
//!    │                                            │ transition_to(CompositorLayer)
//!    │                                            ▼
//!    └───────── clear_video_layer ───────── CompositorLayer
//! ```

pub mod error;
pub mod config;
pub mod source;
pub mod texture;
pub mod webgl;
pub mod compositor;
pub mod manager;

pub use error::{VideoLayerError, VideoLayerResult};
pub use config::VideoLayerConfig;
pub use source::{ReadyState, VideoElement, VideoSource};
pub use texture::SharedTexture;
pub use webgl::StereoMeshPair;
pub use compositor::CompositorQuadLayer;
pub use manager::{CompositorTarget, LayerHandle, Representation, VideoLayerManager};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::{
        CompositorQuadLayer, CompositorTarget, LayerHandle, ReadyState, Representation,
        SharedTexture, StereoMeshPair, VideoElement, VideoLayerConfig, VideoLayerError,
        VideoLayerManager, VideoLayerResult, VideoSource,
    };
}
