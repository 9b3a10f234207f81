//! Client handle to the output manager

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

use super::command::{Command, ManagerEvent};
use crate::error::{Error, Result};
use crate::marshal::{EventMarshaler, Task};
use crate::session::{SessionId, SessionSnapshot};
use crate::target::TargetRecord;

/// Cloneable handle for presentation code
///
/// Every call is queued behind pending host notifications and answered by
/// the owning context. Dropping the last clone shuts the manager down after
/// saving.
#[derive(Clone)]
pub struct ManagerHandle {
    inner: Arc<HandleInner>,
    events: broadcast::Sender<ManagerEvent>,
}

struct HandleInner {
    marshaler: EventMarshaler,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        let _ = self
            .marshaler
            .submit(Task::Command(Command::Shutdown { reply: None }));
    }
}

impl ManagerHandle {
    pub(super) fn new(marshaler: EventMarshaler, events: broadcast::Sender<ManagerEvent>) -> Self {
        Self {
            inner: Arc::new(HandleInner { marshaler }),
            events,
        }
    }

    /// Add an idle target
    pub async fn add(&self, record: TargetRecord) -> Result<SessionId> {
        self.request(|reply| Command::Add { record, reply }).await
    }

    /// Replace a target's name, endpoint and key
    pub async fn edit(&self, id: SessionId, record: TargetRecord) -> Result<()> {
        self.request(|reply| Command::Edit { id, record, reply })
            .await?
    }

    /// Remove an idle target
    pub async fn remove(&self, id: SessionId) -> Result<TargetRecord> {
        self.request(|reply| Command::Remove { id, reply }).await?
    }

    /// Start pushing to a target
    pub async fn start(&self, id: SessionId) -> Result<()> {
        self.request(|reply| Command::Start { id, reply }).await?
    }

    /// Force-stop a target
    pub async fn stop(&self, id: SessionId) -> Result<()> {
        self.request(|reply| Command::Stop { id, reply }).await?
    }

    /// Snapshot of every session in display order
    pub async fn enumerate(&self) -> Result<Vec<SessionSnapshot>> {
        self.request(|reply| Command::Enumerate { reply }).await
    }

    /// Snapshot of one session
    pub async fn snapshot(&self, id: SessionId) -> Result<SessionSnapshot> {
        self.request(|reply| Command::Snapshot { id, reply })
            .await?
            .ok_or(Error::SessionNotFound(id))
    }

    /// Persist the current target list
    pub async fn save(&self) -> Result<()> {
        self.request(|reply| Command::Save { reply }).await?
    }

    /// Replace all sessions with the stored list; returns how many loaded
    ///
    /// Active sessions are force-stopped and released. Each replaced session
    /// is announced with [`ManagerEvent::SessionRemoved`], then the new list
    /// with [`ManagerEvent::Reloaded`]; loaded sessions get fresh ids.
    pub async fn reload(&self) -> Result<usize> {
        self.request(|reply| Command::Reload { reply }).await
    }

    pub async fn dock_location(&self) -> Result<i64> {
        self.request(|reply| Command::DockLocation { reply }).await
    }

    pub async fn set_dock_location(&self, location: i64) -> Result<()> {
        self.request(|reply| Command::SetDockLocation { location, reply })
            .await
    }

    /// Save, release every output and stop the manager
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply: Some(reply) })
            .await?
    }

    /// Receive change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events.subscribe()
    }

    /// Whether the manager has stopped
    pub fn is_closed(&self) -> bool {
        self.inner.marshaler.is_closed()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.inner.marshaler.submit(Task::Command(make(tx)))?;
        rx.await.map_err(|_| Error::ManagerClosed)
    }
}
