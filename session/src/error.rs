use sentinel_store::StoreError;
use thiserror::Error;

use crate::{SessionId, SessionState};

/// Errors returned by [`SessionManager`](crate::SessionManager).
#[derive(Error, Debug)]
pub enum SessionError {
    /// A required capability is not loaded; new sessions are refused.
    #[error("session: capability unavailable: {0}")]
    Unavailable(String),

    #[error("session: too many open sessions (limit {limit})")]
    TooManySessions { limit: usize },

    #[error("session: {0} not found")]
    NotFound(SessionId),

    #[error("session: invalid transition {from} -> {to}")]
    InvalidState { from: SessionState, to: SessionState },

    #[error("session: {0} has no analysis results yet")]
    NoData(SessionId),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session worker is no longer running.
    #[error("session: closed")]
    Closed,
}
