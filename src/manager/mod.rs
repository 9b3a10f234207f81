//! Output manager
//!
//! Runs the owning context as a tokio task and hands out a cloneable
//! [`ManagerHandle`] to presentation code.
//!
//! ```text
//!  presentation ──ManagerHandle──┐
//!                                ├──► Task queue ──► OutputManager ──► SessionRegistry
//!  host threads ──forwarders─────┘                     │  ▲
//!                                                      │  └── 1s telemetry tick
//!                                                      ▼
//!                                      broadcast<ManagerEvent> ──► renderers
//! ```

pub mod command;
pub mod config;
pub mod context;
pub mod handle;

pub use command::{Command, ManagerEvent};
pub use config::ManagerConfig;
pub use context::OutputManager;
pub use handle::ManagerHandle;
