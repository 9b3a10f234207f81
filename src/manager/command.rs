//! Requests and notifications crossing into and out of the owning context

use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::session::{SessionId, SessionSnapshot, Transition};
use crate::target::TargetRecord;

/// Request from a [`super::ManagerHandle`], answered on `reply`
#[derive(Debug)]
pub enum Command {
    Add {
        record: TargetRecord,
        reply: oneshot::Sender<SessionId>,
    },
    Edit {
        id: SessionId,
        record: TargetRecord,
        reply: oneshot::Sender<Result<()>>,
    },
    Remove {
        id: SessionId,
        reply: oneshot::Sender<Result<TargetRecord>>,
    },
    Start {
        id: SessionId,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        id: SessionId,
        reply: oneshot::Sender<Result<()>>,
    },
    Enumerate {
        reply: oneshot::Sender<Vec<SessionSnapshot>>,
    },
    Snapshot {
        id: SessionId,
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },
    Save {
        reply: oneshot::Sender<Result<()>>,
    },
    /// Replace all sessions with the stored list
    Reload {
        reply: oneshot::Sender<usize>,
    },
    DockLocation {
        reply: oneshot::Sender<i64>,
    },
    SetDockLocation {
        location: i64,
        reply: oneshot::Sender<()>,
    },
    /// Save, release every output and end the context. `reply` is `None`
    /// when sent because the last handle was dropped.
    Shutdown {
        reply: Option<oneshot::Sender<Result<()>>>,
    },
}

/// Change notification for renderers
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    /// A session was added, edited, or changed state
    SessionChanged(SessionSnapshot),
    /// One state-machine step
    StateChanged {
        session: SessionId,
        transition: Transition,
    },
    /// New frame rate for a streaming session
    Telemetry { session: SessionId, fps: u64 },
    /// A session stopped with a failure
    StreamFailed { session: SessionId, error: Error },
    SessionRemoved(SessionId),
    /// Whole registry replaced from storage
    Reloaded(Vec<SessionSnapshot>),
}
