//! Host output and service handles
//!
//! The host owns transport. This crate only creates outputs, points them at a
//! service configuration, lends them the primary output's encoders, and asks
//! them to start or stop.

use std::fmt;
use std::sync::Arc;

use super::signal::OutputEventHandler;

/// Opaque reference to an encoder owned by the host's primary output
///
/// Borrowing an encoder never transfers ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncoderRef(pub u64);

impl fmt::Display for EncoderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoder#{}", self.0)
    }
}

/// Encoders currently in use by the primary output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryEncoders {
    /// Video encoder
    pub video: EncoderRef,
    /// First audio track encoder
    pub audio: EncoderRef,
}

/// Settings pushed into a service before each start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Server URL (`server`)
    pub server: String,
    /// Stream key (`key`)
    pub key: String,
}

/// Host type identifiers used when creating handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputKinds {
    /// Output type id
    pub output_kind: String,
    /// Output instance name
    pub output_name: String,
    /// Service type id
    pub service_kind: String,
    /// Service instance name
    pub service_name: String,
}

impl Default for OutputKinds {
    fn default() -> Self {
        Self {
            output_kind: "rtmp_output".to_string(),
            output_name: "multi-output".to_string(),
            service_kind: "rtmp_custom".to_string(),
            service_name: "multi-output-service".to_string(),
        }
    }
}

/// A host-side service configuration handle
///
/// Dropping the box releases the handle.
pub trait HostService: Send {
    /// Apply server and key settings
    fn update(&mut self, settings: &ServiceSettings);
}

/// A host-side output handle
///
/// Dropping the box releases the handle. All methods return immediately;
/// outcomes arrive later through the connected event handler, on a thread
/// the host chooses.
pub trait HostOutput: Send {
    /// Attach the service this output pushes to
    fn set_service(&mut self, service: &dyn HostService);

    /// Register the handler that receives this output's notifications
    fn connect_events(&mut self, handler: Arc<dyn OutputEventHandler>);

    /// Use the given encoders for the next start
    fn set_encoders(&mut self, encoders: PrimaryEncoders);

    /// Issue an asynchronous start; `false` if the host refused outright
    fn start(&mut self) -> bool;

    /// Stop immediately without draining
    fn force_stop(&mut self);

    /// Whether the host considers the output active
    fn is_active(&self) -> bool;

    /// Monotonic count of frames this output has sent
    fn total_frames(&self) -> u64;
}

/// Factory for host handles and access to the primary output
pub trait OutputHost: Send + Sync {
    /// Create an output handle
    fn create_output(&self, kind: &str, name: &str) -> Result<Box<dyn HostOutput>, String>;

    /// Create a service handle
    fn create_service(&self, kind: &str, name: &str) -> Result<Box<dyn HostService>, String>;

    /// Encoders of the currently active primary output, if there is one
    fn primary_encoders(&self) -> Option<PrimaryEncoders>;
}
