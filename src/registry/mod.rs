//! Session registry
//!
//! The registry owns every [`crate::session::OutputSession`] in display order
//! and is the only place sessions are created or destroyed.
//!
//! ```text
//!                 SessionRegistry (owning context only)
//!          ┌──────────────────────────────────────────┐
//!          │ sessions: Vec<OutputSession>             │
//!          │   [0] id=1  Streaming  output+service    │
//!          │   [1] id=2  Idle       (no handles yet)  │
//!          │   [2] id=3  Stopping   output+service    │
//!          └──────────────────────────────────────────┘
//!             ▲ add/remove/edit/start/stop   ▲ dispatch(SessionEvent)
//!             │                              │
//!       presentation intents          EventMarshaler queue
//! ```
//!
//! Host handles are created at a session's first start and released when the
//! session is removed, when the registry is reloaded, or when it is dropped.

pub mod store;

pub use store::SessionRegistry;
