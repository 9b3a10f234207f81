//! Session registry implementation
//!
//! The single source of truth for which sessions exist. Owned by one context;
//! no locking.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::host::{OutputHost, OutputKinds};
use crate::marshal::{EventMarshaler, SessionEvent};
use crate::session::{OutputSession, SessionId, SessionSnapshot, Transition};
use crate::stats::DEFAULT_MIN_WINDOW;
use crate::target::TargetRecord;

/// Ordered collection of every configured output session
///
/// Order is insertion order and survives persistence; it affects display only.
pub struct SessionRegistry {
    /// Sessions in display order
    sessions: Vec<OutputSession>,

    /// Next id to hand out
    next_id: u64,

    /// Host used to create handles at first start
    host: Arc<dyn OutputHost>,

    /// Host type identifiers
    kinds: OutputKinds,

    /// Where session outputs send their notifications
    marshaler: EventMarshaler,

    /// Shortest span a telemetry sample may cover
    sample_window: Duration,
}

impl SessionRegistry {
    /// Create an empty registry with default host kinds
    pub fn new(host: Arc<dyn OutputHost>, marshaler: EventMarshaler) -> Self {
        Self::with_kinds(host, marshaler, OutputKinds::default())
    }

    /// Create an empty registry with custom host kinds
    pub fn with_kinds(
        host: Arc<dyn OutputHost>,
        marshaler: EventMarshaler,
        kinds: OutputKinds,
    ) -> Self {
        Self {
            sessions: Vec::new(),
            next_id: 1,
            host,
            kinds,
            marshaler,
            sample_window: DEFAULT_MIN_WINDOW,
        }
    }

    /// Set the shortest span a telemetry sample may cover for sessions
    /// added from now on
    pub fn sample_window(mut self, window: Duration) -> Self {
        self.sample_window = window;
        self
    }

    /// Append an idle session for `record`
    ///
    /// Touches nothing on the host.
    pub fn add(&mut self, record: TargetRecord) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        tracing::info!(session = %id, name = %record.name, "Target added");
        self.sessions
            .push(OutputSession::new(id, record).with_sample_window(self.sample_window));
        id
    }

    /// Remove an idle session and release its host handles
    ///
    /// Returns the removed record.
    pub fn remove(&mut self, id: SessionId) -> Result<TargetRecord> {
        let index = self.index_of(id)?;
        let session = &self.sessions[index];
        if !session.state().can_remove() {
            return Err(Error::InvalidState {
                session: id,
                state: session.state(),
                operation: "remove",
            });
        }

        let mut session = self.sessions.remove(index);
        session.release();
        tracing::info!(session = %id, name = %session.record().name, "Target removed");
        Ok(session.record().clone())
    }

    /// Replace a session's name, endpoint and key
    pub fn edit(&mut self, id: SessionId, record: TargetRecord) -> Result<()> {
        self.get_mut(id)?.edit(record);
        Ok(())
    }

    /// Start pushing to a target
    pub fn start(&mut self, id: SessionId) -> Result<()> {
        let index = self.index_of(id)?;
        let Self {
            sessions,
            host,
            kinds,
            marshaler,
            ..
        } = self;
        sessions[index].start(host.as_ref(), kinds, marshaler)
    }

    /// Force-stop a target
    pub fn stop(&mut self, id: SessionId) -> Result<Option<Transition>> {
        Ok(self.get_mut(id)?.stop())
    }

    /// Look up a session
    pub fn get(&self, id: SessionId) -> Option<&OutputSession> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    /// Ids in display order
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(OutputSession::id).collect()
    }

    /// Render snapshot of every session, in display order
    ///
    /// A copy, not a live view; enumerate again after mutations.
    pub fn enumerate(&self) -> Vec<SessionSnapshot> {
        self.sessions.iter().map(OutputSession::snapshot).collect()
    }

    /// Project the registry into stored form, dropping runtime state
    pub fn serialize(&self) -> Vec<TargetRecord> {
        self.sessions.iter().map(|s| s.record().clone()).collect()
    }

    /// Replace all sessions with one idle session per record
    ///
    /// Existing sessions are released first.
    pub fn load(&mut self, records: impl IntoIterator<Item = TargetRecord>) {
        self.release_all();
        for record in records {
            self.add(record);
        }
        tracing::info!(sessions = self.sessions.len(), "Targets loaded");
    }

    /// Apply a marshaled host notification
    ///
    /// Notifications for sessions that no longer exist are dropped.
    pub fn dispatch(&mut self, event: SessionEvent, now: Instant) -> Vec<Transition> {
        match self.sessions.iter_mut().find(|s| s.id() == event.session) {
            Some(session) => session.handle_signal(event.signal, now),
            None => {
                tracing::debug!(
                    session = %event.session,
                    signal = %event.signal,
                    "Signal for unknown session"
                );
                Vec::new()
            }
        }
    }

    /// Sample telemetry on every streaming session
    ///
    /// Returns the sessions whose rate was updated.
    pub fn sample_telemetry(&mut self, now: Instant) -> Vec<(SessionId, u64)> {
        self.sessions
            .iter_mut()
            .filter_map(|s| s.sample_telemetry(now).map(|fps| (s.id(), fps)))
            .collect()
    }

    /// Release every session's handles and empty the registry
    pub fn release_all(&mut self) {
        for session in &mut self.sessions {
            session.release();
        }
        self.sessions.clear();
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions not idle
    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.state().is_active())
            .count()
    }

    fn index_of(&self, id: SessionId) -> Result<usize> {
        self.sessions
            .iter()
            .position(|s| s.id() == id)
            .ok_or(Error::SessionNotFound(id))
    }

    fn get_mut(&mut self, id: SessionId) -> Result<&mut OutputSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(Error::SessionNotFound(id))
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::sync::mpsc;

    use super::*;
    use crate::host::testing::FakeHost;
    use crate::host::OutputSignal;
    use crate::marshal::Task;
    use crate::session::OutputState;

    fn registry(host: &FakeHost) -> (SessionRegistry, mpsc::UnboundedReceiver<Task>) {
        let (marshaler, inbox) = EventMarshaler::channel();
        (SessionRegistry::new(Arc::new(host.clone()), marshaler), inbox)
    }

    fn drain(registry: &mut SessionRegistry, inbox: &mut mpsc::UnboundedReceiver<Task>) {
        while let Ok(task) = inbox.try_recv() {
            if let Task::Signal(event) = task {
                registry.dispatch(event, Instant::now());
            }
        }
    }

    fn record(n: u32) -> TargetRecord {
        TargetRecord::new(format!("t{}", n), format!("rtmp://host{}/live", n), format!("k{}", n))
    }

    #[test]
    fn test_add_preserves_order() {
        let host = FakeHost::new();
        let (mut registry, _inbox) = registry(&host);

        let a = registry.add(record(1));
        let b = registry.add(record(2));
        let c = registry.add(record(3));

        assert_eq!(registry.ids(), vec![a, b, c]);
        let names: Vec<_> = registry.enumerate().into_iter().map(|s| s.record.name).collect();
        assert_eq!(names, vec!["t1", "t2", "t3"]);
        assert!(registry.enumerate().iter().all(|s| s.state == OutputState::Idle));
        assert!(host.outputs().is_empty());
    }

    #[test]
    fn test_serialize_load_round_trip() {
        let host = FakeHost::new();
        let (mut registry, _inbox) = registry(&host);

        let ids: Vec<_> = (1..=4).map(|n| registry.add(record(n))).collect();
        registry.remove(ids[1]).unwrap();
        registry.add(record(5));
        registry.remove(ids[3]).unwrap();

        let stored = registry.serialize();
        assert_eq!(stored, vec![record(1), record(3), record(5)]);

        let (mut restored, _inbox) = self::registry(&host);
        restored.load(stored.clone());
        assert_eq!(restored.serialize(), stored);
    }

    #[test]
    fn test_load_replaces_contents() {
        let host = FakeHost::new();
        let (mut registry, _inbox) = registry(&host);
        registry.add(record(1));

        registry.load(vec![record(7), record(8)]);

        assert_eq!(registry.serialize(), vec![record(7), record(8)]);
    }

    #[test]
    fn test_remove_active_session_rejected() {
        let host = FakeHost::with_primary();
        let (mut registry, mut inbox) = registry(&host);
        let id = registry.add(record(1));

        registry.start(id).unwrap();
        let err = registry.remove(id).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidState {
                session: id,
                state: OutputState::Connecting,
                operation: "remove"
            }
        );
        assert_eq!(registry.len(), 1);

        registry.stop(id).unwrap();
        host.output(0).fire("stop", 0);
        drain(&mut registry, &mut inbox);

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed, record(1));
        assert!(registry.is_empty());
        assert!(host.output(0).released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_unknown_session() {
        let host = FakeHost::new();
        let (mut registry, _inbox) = registry(&host);

        assert_eq!(
            registry.start(SessionId(42)),
            Err(Error::SessionNotFound(SessionId(42)))
        );
        assert!(registry.remove(SessionId(42)).is_err());
        assert!(registry
            .dispatch(
                SessionEvent {
                    session: SessionId(42),
                    signal: OutputSignal::Started
                },
                Instant::now()
            )
            .is_empty());
    }

    #[test]
    fn test_failures_stay_local() {
        let host = FakeHost::with_primary();
        let (mut registry, mut inbox) = registry(&host);
        let a = registry.add(record(1));
        let b = registry.add(record(2));

        registry.start(a).unwrap();
        registry.start(b).unwrap();
        host.output(0).fire("stop", -2);
        host.output(1).fire("start", 0);
        drain(&mut registry, &mut inbox);

        let snapshots = registry.enumerate();
        assert_eq!(snapshots[0].state, OutputState::Idle);
        assert_eq!(snapshots[0].status, "Failed to connect to server");
        assert_eq!(snapshots[1].state, OutputState::Streaming);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_edit() {
        let host = FakeHost::new();
        let (mut registry, _inbox) = registry(&host);
        let id = registry.add(TargetRecord::default());

        registry.edit(id, record(9)).unwrap();

        assert_eq!(registry.get(id).unwrap().record(), &record(9));
    }

    #[test]
    fn test_release_all_stops_active_outputs() {
        let host = FakeHost::with_primary();
        let (mut registry, mut inbox) = registry(&host);
        let id = registry.add(record(1));
        registry.start(id).unwrap();
        host.output(0).fire("start", 0);
        drain(&mut registry, &mut inbox);

        drop(registry);

        let output = host.output(0);
        assert_eq!(output.force_stops.load(Ordering::SeqCst), 1);
        assert!(output.released.load(Ordering::SeqCst));
    }
}
