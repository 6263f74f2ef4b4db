//! Render errors

use thiserror::Error;

use crate::{GroupId, MeshId, TextureId};

/// Render engine errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Unknown texture: {0}")]
    UnknownTexture(TextureId),

    #[error("Unknown mesh: {0}")]
    UnknownMesh(MeshId),

    #[error("Unknown group: {0}")]
    UnknownGroup(GroupId),

    #[error("Group already attached: {0}")]
    AlreadyAttached(GroupId),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
