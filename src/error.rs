//! Error types
//!
//! Every failure in this crate is local to one output session. Nothing here
//! is fatal to the process.

use thiserror::Error;

use crate::session::{OutputState, SessionId, StopReason};

/// Crate-wide error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The host has no active primary output to borrow encoders from
    #[error("no active primary output; start the main stream once so its encoders can be shared")]
    NoPrimaryOutput,

    /// Operation requested against a session in an incompatible state
    #[error("cannot {operation} session {session} while it is {state}")]
    InvalidState {
        session: SessionId,
        state: OutputState,
        operation: &'static str,
    },

    /// No session with this id exists in the registry
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Host reported a failed stop
    #[error("stream failed: {0}")]
    StreamFailure(StopReason),

    /// Host refused the start request outright
    #[error("host rejected start request for session {0}")]
    StartRejected(SessionId),

    /// Stored target list could not be decoded
    #[error("stored targets are corrupt: {0}")]
    PersistenceCorrupt(String),

    /// Host failed to create an output or service handle
    #[error("host error: {0}")]
    Host(String),

    /// The owning context has shut down
    #[error("output manager has shut down")]
    ManagerClosed,
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
