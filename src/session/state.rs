//! Output session state machine
//!
//! ```text
//! Idle ──start()──► Connecting ──start──► Streaming ◄──reconnect_success── Reconnecting
//!  ▲                    │                    │  └────────reconnect─────────────►│
//!  │                    │                    ▼                                  │
//!  └────────stop────── Stopping ◄──stop()/stopping──────────────────────────────┘
//! ```
//!
//! `Idle` is both initial and terminal. A connect failure may also return
//! `Connecting` straight to `Idle`.

use std::fmt;

/// Lifecycle state of one output session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputState {
    /// Not pushing; handles may or may not exist yet
    #[default]
    Idle,
    /// Start requested, waiting for the host to connect
    Connecting,
    /// Pushing media
    Streaming,
    /// Host lost the connection and is retrying
    Reconnecting,
    /// Stop requested, waiting for the host to finish
    Stopping,
}

impl OutputState {
    /// Whether the host output is in use
    pub fn is_active(self) -> bool {
        self != OutputState::Idle
    }

    /// Whether the frame-rate sampler should run
    pub fn samples_telemetry(self) -> bool {
        matches!(self, OutputState::Streaming | OutputState::Reconnecting)
    }

    /// Whether the session may be removed from the registry
    pub fn can_remove(self) -> bool {
        self == OutputState::Idle
    }

    /// Whether `next` is a legal single step from `self`
    pub fn can_transition_to(self, next: OutputState) -> bool {
        use OutputState::*;

        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Streaming)
                | (Connecting, Stopping)
                | (Connecting, Idle)
                | (Streaming, Reconnecting)
                | (Streaming, Stopping)
                | (Reconnecting, Streaming)
                | (Reconnecting, Stopping)
                | (Stopping, Idle)
        )
    }

    /// Status line shown while in this state, if the state has one
    pub fn status(self) -> Option<&'static str> {
        match self {
            OutputState::Idle => None,
            OutputState::Connecting => Some("Connecting"),
            OutputState::Streaming => Some("Streaming"),
            OutputState::Reconnecting => Some("Reconnecting"),
            OutputState::Stopping => Some("Stopping..."),
        }
    }

    /// Control layout the presentation layer must render for this state
    pub fn controls(self) -> Controls {
        match self {
            OutputState::Idle => Controls {
                action: Action::Start,
                action_enabled: true,
                remove_enabled: true,
            },
            OutputState::Connecting => Controls {
                action: Action::Start,
                action_enabled: false,
                remove_enabled: false,
            },
            OutputState::Streaming | OutputState::Reconnecting => Controls {
                action: Action::Stop,
                action_enabled: true,
                remove_enabled: false,
            },
            OutputState::Stopping => Controls {
                action: Action::Stop,
                action_enabled: false,
                remove_enabled: false,
            },
        }
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputState::Idle => "idle",
            OutputState::Connecting => "connecting",
            OutputState::Streaming => "streaming",
            OutputState::Reconnecting => "reconnecting",
            OutputState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// One step taken by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OutputState,
    pub to: OutputState,
}

/// Label of the start/stop control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

/// Enabled/label state of a session's controls
///
/// Editing is always allowed; new settings apply at the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// What the start/stop control does
    pub action: Action,
    /// Whether the start/stop control accepts input
    pub action_enabled: bool,
    /// Whether the remove control accepts input
    pub remove_enabled: bool,
}
