//! Manager configuration

use std::time::Duration;

use crate::host::OutputKinds;

/// Output manager configuration options
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Configuration store section
    pub section: String,

    /// Key holding the encoded target list
    pub targets_key: String,

    /// Key holding the dock placement
    pub dock_key: String,

    /// Frame-rate sampling period
    pub telemetry_interval: Duration,

    /// Capacity of the presentation event broadcast
    pub event_capacity: usize,

    /// Host type identifiers for new handles
    pub output_kinds: OutputKinds,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            section: "obs-multi-rtmp".to_string(),
            targets_key: "targets".to_string(),
            dock_key: "DockLocation".to_string(),
            telemetry_interval: Duration::from_secs(1),
            event_capacity: 256,
            output_kinds: OutputKinds::default(),
        }
    }
}

impl ManagerConfig {
    /// Set the configuration store section
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Set the target list key
    pub fn targets_key(mut self, key: impl Into<String>) -> Self {
        self.targets_key = key.into();
        self
    }

    /// Set the dock placement key
    pub fn dock_key(mut self, key: impl Into<String>) -> Self {
        self.dock_key = key.into();
        self
    }

    /// Set the telemetry period; zero is raised to one millisecond
    pub fn telemetry_interval(mut self, interval: Duration) -> Self {
        self.telemetry_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the event broadcast capacity (at least 1)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Set host output/service kinds
    pub fn output_kinds(mut self, kinds: OutputKinds) -> Self {
        self.output_kinds = kinds;
        self
    }
}
