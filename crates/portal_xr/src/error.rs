//! XR error types

use thiserror::Error;

use crate::SessionId;

/// XR platform errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XrError {
    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("No XR runtime could satisfy the session request: {0}")]
    SessionUnavailable(String),

    #[error("Unknown session: {0}")]
    InvalidSession(SessionId),

    #[error("Session has ended: {0}")]
    SessionEnded(SessionId),

    #[error("Compositor layer binding is not available")]
    CompositorUnsupported,

    #[error("Completion abandoned before it settled")]
    Aborted,

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type for XR platform operations
pub type XrResult<T> = Result<T, XrError>;
