//! The owning context
//!
//! [`OutputManager`] exclusively owns the session registry. It drains one task
//! queue (host notifications and handle requests, in arrival order) and a
//! telemetry timer, one at a time, so no session is ever touched from two
//! places at once.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::command::{Command, ManagerEvent};
use super::config::ManagerConfig;
use super::handle::ManagerHandle;
use crate::host::{ConfigStore, OutputHost};
use crate::marshal::{EventMarshaler, SessionEvent, Task};
use crate::persist::TargetStore;
use crate::registry::SessionRegistry;
use crate::session::{OutputState, SessionId, Transition};

/// Multi-target output manager
pub struct OutputManager {
    registry: SessionRegistry,
    store: TargetStore,
    inbox: mpsc::UnboundedReceiver<Task>,
    events: broadcast::Sender<ManagerEvent>,
    telemetry_interval: Duration,
}

impl OutputManager {
    /// Create a manager with the stored targets already loaded
    pub fn new(
        host: Arc<dyn OutputHost>,
        config_store: Arc<dyn ConfigStore>,
        config: ManagerConfig,
    ) -> (Self, ManagerHandle) {
        let (marshaler, inbox) = EventMarshaler::channel();
        let (events, _) = broadcast::channel(config.event_capacity);

        let store = TargetStore::new(
            config_store,
            config.section.clone(),
            config.targets_key.clone(),
            config.dock_key.clone(),
        );
        // A session whose baseline falls in the last half of a period skips
        // that period's tick
        let mut registry =
            SessionRegistry::with_kinds(host, marshaler.clone(), config.output_kinds.clone())
                .sample_window(config.telemetry_interval / 2);
        registry.load(store.load());

        let manager = Self {
            registry,
            store,
            inbox,
            events: events.clone(),
            telemetry_interval: config.telemetry_interval,
        };
        (manager, ManagerHandle::new(marshaler, events))
    }

    /// Create a manager and run it on the current runtime
    pub fn spawn(
        host: Arc<dyn OutputHost>,
        config_store: Arc<dyn ConfigStore>,
        config: ManagerConfig,
    ) -> (ManagerHandle, JoinHandle<()>) {
        let (manager, handle) = Self::new(host, config_store, config);
        (handle, tokio::spawn(manager.run()))
    }

    /// Process tasks until shutdown
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.telemetry_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(sessions = self.registry.len(), "Output manager running");

        loop {
            tokio::select! {
                task = self.inbox.recv() => {
                    let Some(task) = task else { break };
                    if self.handle_task(task).is_break() {
                        break;
                    }
                }
                _ = ticker.tick() => self.sample_telemetry(),
            }
        }

        tracing::info!("Output manager stopped");
    }

    fn handle_task(&mut self, task: Task) -> ControlFlow<()> {
        match task {
            Task::Signal(event) => {
                self.apply_signal(event);
                ControlFlow::Continue(())
            }
            Task::Command(command) => self.apply_command(command),
        }
    }

    fn apply_signal(&mut self, event: SessionEvent) {
        let steps = self.registry.dispatch(event, Instant::now());
        self.publish_steps(event.session, &steps);

        let stopped = steps.last().is_some_and(|step| step.to == OutputState::Idle);
        if stopped {
            let error = self
                .registry
                .get(event.session)
                .and_then(|s| s.last_stop())
                .and_then(|reason| reason.as_error());
            if let Some(error) = error {
                self.emit(ManagerEvent::StreamFailed {
                    session: event.session,
                    error,
                });
            }
        }
    }

    fn apply_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Add { record, reply } => {
                let id = self.registry.add(record);
                self.publish_session(id);
                let _ = reply.send(id);
            }
            Command::Edit { id, record, reply } => {
                let result = self.registry.edit(id, record);
                if result.is_ok() {
                    self.publish_session(id);
                }
                let _ = reply.send(result);
            }
            Command::Remove { id, reply } => {
                let result = self.registry.remove(id);
                if result.is_ok() {
                    self.emit(ManagerEvent::SessionRemoved(id));
                }
                let _ = reply.send(result);
            }
            Command::Start { id, reply } => {
                let result = self.registry.start(id);
                match &result {
                    Ok(()) => self.publish_steps(
                        id,
                        &[Transition {
                            from: OutputState::Idle,
                            to: OutputState::Connecting,
                        }],
                    ),
                    Err(e) => tracing::warn!(session = %id, error = %e, "Start failed"),
                }
                let _ = reply.send(result);
            }
            Command::Stop { id, reply } => {
                let result = self.registry.stop(id).map(|step| {
                    if let Some(step) = step {
                        self.publish_steps(id, &[step]);
                    }
                });
                let _ = reply.send(result);
            }
            Command::Enumerate { reply } => {
                let _ = reply.send(self.registry.enumerate());
            }
            Command::Snapshot { id, reply } => {
                let _ = reply.send(self.registry.get(id).map(|s| s.snapshot()));
            }
            Command::Save { reply } => {
                let _ = reply.send(self.store.save(&self.registry.serialize()));
            }
            Command::Reload { reply } => {
                for id in self.registry.ids() {
                    self.emit(ManagerEvent::SessionRemoved(id));
                }
                self.registry.load(self.store.load());
                self.emit(ManagerEvent::Reloaded(self.registry.enumerate()));
                let _ = reply.send(self.registry.len());
            }
            Command::DockLocation { reply } => {
                let _ = reply.send(self.store.dock_location());
            }
            Command::SetDockLocation { location, reply } => {
                self.store.set_dock_location(location);
                let _ = reply.send(());
            }
            Command::Shutdown { reply } => {
                let result = self.store.save(&self.registry.serialize());
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Failed to save targets on shutdown");
                }
                let active = self.registry.active_count();
                self.registry.release_all();
                tracing::info!(stopped = active, "Released all outputs");

                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn sample_telemetry(&mut self) {
        for (session, fps) in self.registry.sample_telemetry(Instant::now()) {
            self.emit(ManagerEvent::Telemetry { session, fps });
        }
    }

    fn publish_steps(&self, session: SessionId, steps: &[Transition]) {
        if steps.is_empty() {
            return;
        }
        for &transition in steps {
            self.emit(ManagerEvent::StateChanged {
                session,
                transition,
            });
        }
        self.publish_session(session);
    }

    fn publish_session(&self, id: SessionId) {
        if let Some(session) = self.registry.get(id) {
            self.emit(ManagerEvent::SessionChanged(session.snapshot()));
        }
    }

    fn emit(&self, event: ManagerEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}
