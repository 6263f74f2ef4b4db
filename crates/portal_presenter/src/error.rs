//! Session errors

use portal_video::VideoLayerError;
use portal_xr::{SessionId, XrError};
use thiserror::Error;

/// Session lifecycle errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Both the preferred and the reduced session request were rejected
    #[error("No XR session available: {0}")]
    SessionUnavailable(String),

    #[error("A session is already active or being requested")]
    AlreadyActive,

    #[error("No active session")]
    NotActive,

    /// A deferred completion settled after its session ended
    #[error("Continuation for ended session {0} discarded")]
    StaleSessionContinuation(SessionId),

    #[error("Video layer error: {0}")]
    Layer(#[from] VideoLayerError),

    #[error("XR error: {0}")]
    Xr(#[from] XrError),
}

pub type SessionResult<T> = Result<T, SessionError>;
