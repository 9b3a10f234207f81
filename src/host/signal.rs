//! Host output notifications
//!
//! Hosts announce output progress as named signals. [`OutputEventHandler`] is
//! the capability interface a session registers when its output is created;
//! [`dispatch_signal`] routes a named signal to it.

use std::fmt;

/// One notification from a host output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSignal {
    /// `starting`
    Starting,
    /// `start`
    Started,
    /// `reconnect`
    Reconnect,
    /// `reconnect_success`
    Reconnected,
    /// `stopping`
    Stopping,
    /// `deactivate`
    Deactivated,
    /// `stop`, with the host's result code
    Stopped { code: i64 },
}

impl OutputSignal {
    /// Parse a named host signal. `code` is only read for `stop`.
    pub fn from_name(name: &str, code: i64) -> Option<Self> {
        let signal = match name {
            "starting" => OutputSignal::Starting,
            "start" => OutputSignal::Started,
            "reconnect" => OutputSignal::Reconnect,
            "reconnect_success" => OutputSignal::Reconnected,
            "stopping" => OutputSignal::Stopping,
            "deactivate" => OutputSignal::Deactivated,
            "stop" => OutputSignal::Stopped { code },
            _ => return None,
        };
        Some(signal)
    }

    /// Host name of this signal
    pub fn name(&self) -> &'static str {
        match self {
            OutputSignal::Starting => "starting",
            OutputSignal::Started => "start",
            OutputSignal::Reconnect => "reconnect",
            OutputSignal::Reconnected => "reconnect_success",
            OutputSignal::Stopping => "stopping",
            OutputSignal::Deactivated => "deactivate",
            OutputSignal::Stopped { .. } => "stop",
        }
    }

    /// Invoke the matching hook on `handler`
    pub fn deliver(self, handler: &dyn OutputEventHandler) {
        match self {
            OutputSignal::Starting => handler.on_starting(),
            OutputSignal::Started => handler.on_started(),
            OutputSignal::Reconnect => handler.on_reconnect(),
            OutputSignal::Reconnected => handler.on_reconnected(),
            OutputSignal::Stopping => handler.on_stopping(),
            OutputSignal::Deactivated => handler.on_deactivated(),
            OutputSignal::Stopped { code } => handler.on_stopped(code),
        }
    }
}

impl fmt::Display for OutputSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSignal::Stopped { code } => write!(f, "stop({})", code),
            other => f.write_str(other.name()),
        }
    }
}

/// Hooks invoked by the host for one output
///
/// Called on host worker threads. Implementations must not touch session
/// state directly.
pub trait OutputEventHandler: Send + Sync {
    fn on_starting(&self) {}
    fn on_started(&self) {}
    fn on_stopping(&self) {}
    fn on_stopped(&self, _code: i64) {}
    fn on_reconnect(&self) {}
    fn on_reconnected(&self) {}
    fn on_deactivated(&self) {}
}

/// Route a named host signal to `handler`
///
/// Returns `false` for names this crate does not listen to.
pub fn dispatch_signal(handler: &dyn OutputEventHandler, name: &str, code: i64) -> bool {
    match OutputSignal::from_name(name, code) {
        Some(signal) => {
            signal.deliver(handler);
            true
        }
        None => {
            tracing::trace!(signal = name, "Ignoring unknown output signal");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<OutputSignal>>,
    }

    impl Recorder {
        fn push(&self, signal: OutputSignal) {
            self.seen.lock().unwrap().push(signal);
        }
    }

    impl OutputEventHandler for Recorder {
        fn on_starting(&self) {
            self.push(OutputSignal::Starting);
        }
        fn on_started(&self) {
            self.push(OutputSignal::Started);
        }
        fn on_stopped(&self, code: i64) {
            self.push(OutputSignal::Stopped { code });
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(OutputSignal::from_name("start", 0), Some(OutputSignal::Started));
        assert_eq!(
            OutputSignal::from_name("reconnect_success", 0),
            Some(OutputSignal::Reconnected)
        );
        assert_eq!(
            OutputSignal::from_name("stop", -2),
            Some(OutputSignal::Stopped { code: -2 })
        );
        assert_eq!(OutputSignal::from_name("activate", 0), None);
    }

    #[test]
    fn test_names_round_trip() {
        let all = [
            OutputSignal::Starting,
            OutputSignal::Started,
            OutputSignal::Reconnect,
            OutputSignal::Reconnected,
            OutputSignal::Stopping,
            OutputSignal::Deactivated,
            OutputSignal::Stopped { code: -4 },
        ];
        for signal in all {
            assert_eq!(OutputSignal::from_name(signal.name(), -4), Some(signal));
        }
    }

    #[test]
    fn test_dispatch_signal() {
        let recorder = Recorder::default();

        assert!(dispatch_signal(&recorder, "starting", 0));
        assert!(dispatch_signal(&recorder, "start", 0));
        // Default hooks are no-ops but the name is still recognised
        assert!(dispatch_signal(&recorder, "deactivate", 0));
        assert!(dispatch_signal(&recorder, "stop", -3));
        assert!(!dispatch_signal(&recorder, "bogus", 0));

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                OutputSignal::Starting,
                OutputSignal::Started,
                OutputSignal::Stopped { code: -3 }
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(OutputSignal::Stopped { code: -1 }.to_string(), "stop(-1)");
        assert_eq!(OutputSignal::Reconnect.to_string(), "reconnect");
    }
}
