//! Output session
//!
//! Runtime wrapper around one [`TargetRecord`]. Owns the host output and
//! service handles for that target, drives the state machine from host
//! notifications, and samples frame-rate telemetry.
//!
//! Every method runs on the owning context. Host notifications reach
//! [`OutputSession::handle_signal`] only through the event marshaler.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use super::reason::StopReason;
use super::state::{Controls, OutputState, Transition};
use crate::error::{Error, Result};
use crate::host::{HostOutput, HostService, OutputHost, OutputKinds, OutputSignal, ServiceSettings};
use crate::marshal::EventMarshaler;
use crate::stats::FrameRateMeter;
use crate::target::TargetRecord;

/// Identity of a session for the lifetime of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the presentation layer needs to render one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub record: TargetRecord,
    pub state: OutputState,
    /// Status line; empty when idle after a clean stop
    pub status: String,
    /// Reason of the last failed stop, cleared on the next start
    pub failure: Option<StopReason>,
    /// Last measured frames per second
    pub fps: Option<u64>,
    pub controls: Controls,
}

/// One replicated push target
pub struct OutputSession {
    id: SessionId,
    record: TargetRecord,
    state: OutputState,
    last_stop: Option<StopReason>,
    meter: FrameRateMeter,
    // Declared before `service` so the output is released first
    output: Option<Box<dyn HostOutput>>,
    service: Option<Box<dyn HostService>>,
}

impl OutputSession {
    /// Create an idle session; host handles are created at first start
    pub fn new(id: SessionId, record: TargetRecord) -> Self {
        Self {
            id,
            record,
            state: OutputState::Idle,
            last_stop: None,
            meter: FrameRateMeter::new(),
            output: None,
            service: None,
        }
    }

    /// Skip telemetry samples covering less than `window`
    pub fn with_sample_window(mut self, window: Duration) -> Self {
        self.meter = FrameRateMeter::with_min_window(window);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn record(&self) -> &TargetRecord {
        &self.record
    }

    pub fn state(&self) -> OutputState {
        self.state
    }

    pub fn last_stop(&self) -> Option<StopReason> {
        self.last_stop
    }

    pub fn meter(&self) -> &FrameRateMeter {
        &self.meter
    }

    /// Whether host handles have been created
    pub fn has_handles(&self) -> bool {
        self.output.is_some()
    }

    /// Replace name, endpoint and key; endpoint and key apply at next start
    pub fn edit(&mut self, record: TargetRecord) {
        if self.state.is_active() {
            tracing::info!(
                session = %self.id,
                state = %self.state,
                "Target edited while active, takes effect on next start"
            );
        }
        self.record = record;
    }

    /// Begin pushing to this target
    ///
    /// Borrows the primary output's encoders, applies endpoint and key to the
    /// service and issues an asynchronous start. Only legal from `Idle`.
    pub fn start(
        &mut self,
        host: &dyn OutputHost,
        kinds: &OutputKinds,
        marshaler: &EventMarshaler,
    ) -> Result<()> {
        if self.state != OutputState::Idle {
            return Err(self.invalid_state("start"));
        }

        let encoders = host.primary_encoders().ok_or_else(|| {
            tracing::warn!(session = %self.id, "No primary output to share encoders with");
            Error::NoPrimaryOutput
        })?;

        self.ensure_handles(host, kinds, marshaler)?;
        let (Some(output), Some(service)) =
            (self.output.as_deref_mut(), self.service.as_deref_mut())
        else {
            return Err(Error::Host("output handles missing".to_string()));
        };

        if output.is_active() {
            tracing::warn!(session = %self.id, "Host output still active while idle");
            return Err(Error::InvalidState {
                session: self.id,
                state: self.state,
                operation: "start",
            });
        }

        output.set_encoders(encoders);
        service.update(&ServiceSettings {
            server: self.record.endpoint.clone(),
            key: self.record.key.clone(),
        });

        // Notifications for this start are queued, not applied, until we return
        if !output.start() {
            tracing::warn!(session = %self.id, endpoint = %self.record.endpoint, "Host refused start");
            return Err(Error::StartRejected(self.id));
        }

        self.last_stop = None;
        self.transition(OutputState::Connecting);
        tracing::info!(
            session = %self.id,
            name = %self.record.name,
            endpoint = %self.record.endpoint,
            video = %encoders.video,
            audio = %encoders.audio,
            "Start requested"
        );
        Ok(())
    }

    /// Force-stop the host output
    ///
    /// No-op when idle. Repeating while stopping re-issues the forced stop
    /// without changing state.
    pub fn stop(&mut self) -> Option<Transition> {
        if self.state == OutputState::Idle {
            tracing::debug!(session = %self.id, "Stop ignored, already idle");
            return None;
        }

        if let Some(output) = self.output.as_deref_mut() {
            output.force_stop();
        }

        if self.state == OutputState::Stopping {
            return None;
        }

        tracing::info!(session = %self.id, state = %self.state, "Stop requested");
        Some(self.transition(OutputState::Stopping))
    }

    /// Apply one marshaled host notification
    ///
    /// Returns the steps taken, in order. Notifications that do not fit the
    /// current state are ignored.
    pub fn handle_signal(&mut self, signal: OutputSignal, now: Instant) -> Vec<Transition> {
        use OutputState::*;

        let mut steps = Vec::new();
        match (self.state, signal) {
            (Connecting, OutputSignal::Starting) => {
                tracing::debug!(session = %self.id, "Output connecting");
            }
            (Connecting, OutputSignal::Started) => {
                steps.push(self.transition(Streaming));
                self.reset_telemetry(now);
            }
            (Streaming, OutputSignal::Reconnect) => {
                steps.push(self.transition(Reconnecting));
            }
            (Reconnecting, OutputSignal::Reconnect) => {
                tracing::debug!(session = %self.id, "Output still reconnecting");
            }
            (Reconnecting, OutputSignal::Reconnected) => {
                steps.push(self.transition(Streaming));
                self.reset_telemetry(now);
            }
            (Connecting | Streaming | Reconnecting, OutputSignal::Stopping) => {
                steps.push(self.transition(Stopping));
            }
            (Stopping, OutputSignal::Stopping) => {}
            (Stopping | Connecting, OutputSignal::Stopped { code }) => {
                steps.push(self.finish(code));
            }
            (Streaming | Reconnecting, OutputSignal::Stopped { code }) => {
                // Host skipped `stopping`; still pass through it
                steps.push(self.transition(Stopping));
                steps.push(self.finish(code));
            }
            (_, OutputSignal::Deactivated) => {
                tracing::debug!(session = %self.id, state = %self.state, "Output deactivated");
            }
            (state, signal) => {
                tracing::warn!(
                    session = %self.id,
                    state = %state,
                    signal = %signal,
                    "Ignoring out-of-order output signal"
                );
            }
        }
        steps
    }

    /// Take a telemetry sample if the state calls for one
    ///
    /// Returns the new frame rate when one was computed.
    pub fn sample_telemetry(&mut self, now: Instant) -> Option<u64> {
        if !self.state.samples_telemetry() {
            return None;
        }
        let frames = self.output.as_deref()?.total_frames();
        let fps = self.meter.sample(frames, now)?;
        tracing::debug!(session = %self.id, fps = fps, frames = frames, "Telemetry sample");
        Some(fps)
    }

    /// Current render state
    pub fn snapshot(&self) -> SessionSnapshot {
        let status = match self.state.status() {
            Some(status) => status.to_string(),
            None => self
                .last_stop
                .and_then(StopReason::message)
                .unwrap_or_default()
                .to_string(),
        };

        SessionSnapshot {
            id: self.id,
            record: self.record.clone(),
            state: self.state,
            status,
            failure: self.last_stop.filter(|reason| reason.is_failure()),
            fps: self.meter.fps(),
            controls: self.state.controls(),
        }
    }

    /// Drop host handles, force-stopping the output first if it is active
    pub fn release(&mut self) {
        if let Some(mut output) = self.output.take() {
            if self.state.is_active() || output.is_active() {
                output.force_stop();
            }
            tracing::debug!(session = %self.id, "Released host output");
        }
        self.service = None;
        self.meter.clear();
        self.state = OutputState::Idle;
    }

    fn ensure_handles(
        &mut self,
        host: &dyn OutputHost,
        kinds: &OutputKinds,
        marshaler: &EventMarshaler,
    ) -> Result<()> {
        if self.output.is_some() && self.service.is_some() {
            return Ok(());
        }

        let service = host
            .create_service(&kinds.service_kind, &kinds.service_name)
            .map_err(Error::Host)?;
        let mut output = host
            .create_output(&kinds.output_kind, &kinds.output_name)
            .map_err(Error::Host)?;
        output.set_service(service.as_ref());
        output.connect_events(marshaler.forwarder(self.id));

        tracing::debug!(session = %self.id, kind = %kinds.output_kind, "Created host output");
        self.output = Some(output);
        self.service = Some(service);
        Ok(())
    }

    fn reset_telemetry(&mut self, now: Instant) {
        let baseline = self.output.as_deref().map_or(0, |o| o.total_frames());
        self.meter.reset(baseline, now);
    }

    fn finish(&mut self, code: i64) -> Transition {
        let reason = StopReason::from_code(code);
        self.meter.clear();
        self.last_stop = Some(reason);

        if reason.is_failure() {
            tracing::warn!(session = %self.id, code = code, reason = %reason, "Output stopped with error");
        } else {
            tracing::info!(session = %self.id, "Output stopped");
        }
        self.transition(OutputState::Idle)
    }

    fn transition(&mut self, to: OutputState) -> Transition {
        let from = self.state;
        debug_assert!(from.can_transition_to(to), "illegal transition {} -> {}", from, to);
        tracing::debug!(session = %self.id, from = %from, to = %to, "State change");
        self.state = to;
        Transition { from, to }
    }

    fn invalid_state(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            session: self.id,
            state: self.state,
            operation,
        }
    }
}

impl fmt::Debug for OutputSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSession")
            .field("id", &self.id)
            .field("record", &self.record)
            .field("state", &self.state)
            .field("last_stop", &self.last_stop)
            .field("has_handles", &self.has_handles())
            .finish()
    }
}
