//! Video layer errors

use portal_render::RenderError;
use portal_xr::XrError;
use thiserror::Error;

use crate::Representation;

/// Video layer errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VideoLayerError {
    /// A representation is already active; clear it before initialising again
    #[error("Video layer already initialised as {0:?}")]
    DuplicateLayerInit(Representation),

    #[error("Invalid video layer config: {0}")]
    InvalidConfig(String),

    #[error("XR error: {0}")]
    Xr(#[from] XrError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

pub type VideoLayerResult<T> = Result<T, VideoLayerError>;
