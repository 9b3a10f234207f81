//! Host collaborators
//!
//! The host application owns capture, encoding, transport and durable
//! configuration. This module defines the seams this crate talks to it
//! through:
//!
//! - [`OutputHost`] creates output/service handles and exposes the primary
//!   output's encoders
//! - [`HostOutput`] / [`HostService`] are owned handles, released on drop
//! - [`OutputEventHandler`] receives an output's notifications on host threads
//! - [`ConfigStore`] is the host's key-value configuration

pub mod output;
pub mod signal;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use output::{
    EncoderRef, HostOutput, HostService, OutputHost, OutputKinds, PrimaryEncoders,
    ServiceSettings,
};
pub use signal::{dispatch_signal, OutputEventHandler, OutputSignal};
pub use store::{ConfigStore, MemoryConfigStore};
