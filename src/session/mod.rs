//! Output sessions
//!
//! One [`OutputSession`] per configured target. A session owns the host
//! handles for its target and moves through [`OutputState`] as marshaled host
//! notifications arrive.

pub mod output;
pub mod reason;
pub mod state;

pub use output::{OutputSession, SessionId, SessionSnapshot};
pub use reason::StopReason;
pub use state::{Action, Controls, OutputState, Transition};
