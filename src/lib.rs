//! # multi-rtmp
//!
//! Replicates one live stream to any number of independently controlled push
//! targets. The host application captures, encodes and runs the primary
//! output; this crate manages a pool of additional outputs that borrow the
//! primary's encoders, each with its own start/stop lifecycle, status and
//! frame-rate telemetry.
//!
//! - [`target`]: durable description of one destination
//! - [`session`]: per-target state machine and host handles
//! - [`marshal`]: moves host notifications onto the owning context
//! - [`registry`]: ordered set of sessions
//! - [`persist`]: target list storage in the host configuration
//! - [`manager`]: the owning context and its client handle
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use multi_rtmp::host::{ConfigStore, OutputHost};
//! use multi_rtmp::{ManagerConfig, OutputManager, TargetRecord};
//!
//! # async fn example(host: Arc<dyn OutputHost>, config: Arc<dyn ConfigStore>) -> multi_rtmp::Result<()> {
//! let (handle, _task) = OutputManager::spawn(host, config, ManagerConfig::default());
//!
//! let id = handle
//!     .add(TargetRecord::new("Backup", "rtmp://backup.example/live", "key"))
//!     .await?;
//! handle.start(id).await?;
//!
//! let mut events = handle.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod host;
pub mod manager;
pub mod marshal;
pub mod persist;
pub mod registry;
pub mod session;
pub mod stats;
pub mod target;

pub use error::{Error, Result};
pub use manager::{ManagerConfig, ManagerEvent, ManagerHandle, OutputManager};
pub use registry::SessionRegistry;
pub use session::{OutputSession, OutputState, SessionId, SessionSnapshot, StopReason};
pub use target::TargetRecord;
