//! Event marshaling into the owning context
//!
//! Host outputs fire notifications on threads this crate does not own. Those
//! threads never touch session state; each notification becomes a [`Task`]
//! on a single queue drained by the context that owns every session.
//!
//! ```text
//!   host thread A ──┐
//!   host thread B ──┼──► UnboundedSender<Task> ──► owning context
//!   ManagerHandle ──┘        (FIFO per sender)      (one task at a time)
//! ```
//!
//! Tasks from one producer are delivered in submission order, so all
//! notifications of a single output stay ordered. Nothing is promised across
//! outputs.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::host::{OutputEventHandler, OutputSignal};
use crate::manager::Command;
use crate::session::SessionId;

/// A host notification addressed to one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub signal: OutputSignal,
}

/// Unit of work for the owning context
#[derive(Debug)]
pub enum Task {
    /// Host notification
    Signal(SessionEvent),
    /// Request from a [`crate::ManagerHandle`]
    Command(Command),
}

/// Submits tasks to the owning context
///
/// Cheap to clone; safe to use from any thread, inside or outside a runtime.
#[derive(Debug, Clone)]
pub struct EventMarshaler {
    tx: mpsc::UnboundedSender<Task>,
}

impl EventMarshaler {
    /// Create a marshaler and the receiving end the owning context drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Task>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Handler to register with the host output of `session`
    pub fn forwarder(&self, session: SessionId) -> Arc<dyn OutputEventHandler> {
        Arc::new(SignalForwarder {
            session,
            marshaler: self.clone(),
        })
    }

    /// Queue a host notification for `session`
    ///
    /// Returns `false` if the owning context is gone.
    pub fn post_signal(&self, session: SessionId, signal: OutputSignal) -> bool {
        let posted = self
            .submit(Task::Signal(SessionEvent { session, signal }))
            .is_ok();
        if !posted {
            tracing::debug!(session = %session, signal = %signal, "Dropping signal, owner gone");
        }
        posted
    }

    /// Queue any task
    pub fn submit(&self, task: Task) -> Result<()> {
        self.tx.send(task).map_err(|_| Error::ManagerClosed)
    }

    /// Whether the owning context has stopped receiving
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Per-session [`OutputEventHandler`] that only forwards
struct SignalForwarder {
    session: SessionId,
    marshaler: EventMarshaler,
}

impl SignalForwarder {
    fn post(&self, signal: OutputSignal) {
        self.marshaler.post_signal(self.session, signal);
    }
}

impl OutputEventHandler for SignalForwarder {
    fn on_starting(&self) {
        self.post(OutputSignal::Starting);
    }

    fn on_started(&self) {
        self.post(OutputSignal::Started);
    }

    fn on_stopping(&self) {
        self.post(OutputSignal::Stopping);
    }

    fn on_stopped(&self, code: i64) {
        self.post(OutputSignal::Stopped { code });
    }

    fn on_reconnect(&self) {
        self.post(OutputSignal::Reconnect);
    }

    fn on_reconnected(&self) {
        self.post(OutputSignal::Reconnected);
    }

    fn on_deactivated(&self) {
        self.post(OutputSignal::Deactivated);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::host::dispatch_signal;

    fn signals(rx: &mut mpsc::UnboundedReceiver<Task>) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(task) = rx.try_recv() {
            if let Task::Signal(event) = task {
                out.push(event);
            }
        }
        out
    }

    #[test]
    fn test_forwarder_wraps_signals() {
        let (marshaler, mut rx) = EventMarshaler::channel();
        let handler = marshaler.forwarder(SessionId(7));

        handler.on_starting();
        handler.on_stopped(-2);

        assert_eq!(
            signals(&mut rx),
            vec![
                SessionEvent {
                    session: SessionId(7),
                    signal: OutputSignal::Starting
                },
                SessionEvent {
                    session: SessionId(7),
                    signal: OutputSignal::Stopped { code: -2 }
                },
            ]
        );
    }

    #[test]
    fn test_order_preserved_from_foreign_thread() {
        let (marshaler, mut rx) = EventMarshaler::channel();
        let handler = marshaler.forwarder(SessionId(1));

        let names = ["starting", "start", "reconnect", "reconnect_success", "stopping", "stop"];
        thread::spawn(move || {
            for name in names {
                dispatch_signal(handler.as_ref(), name, 0);
            }
        })
        .join()
        .unwrap();

        let received: Vec<_> = signals(&mut rx).into_iter().map(|e| e.signal.name()).collect();
        assert_eq!(received, names);
    }

    #[test]
    fn test_closed_consumer() {
        let (marshaler, rx) = EventMarshaler::channel();
        drop(rx);

        assert!(marshaler.is_closed());
        assert!(!marshaler.post_signal(SessionId(1), OutputSignal::Started));
        // Forwarders must not panic when the owner is gone
        marshaler.forwarder(SessionId(1)).on_stopped(0);
    }
}
