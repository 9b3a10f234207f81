//! Push target records
//!
//! A target record is the durable description of one push destination.
//! It carries no id: at runtime its identity is the session wrapping it,
//! and in storage it is identified only by position.

use serde::{Deserialize, Serialize};

/// One push destination
///
/// Field names in stored form are `name`, `rtmp-path` and `rtmp-key`.
/// All three are required when loading; `endpoint` and `key` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    /// Display label
    pub name: String,

    /// RTMP server URL
    #[serde(rename = "rtmp-path")]
    pub endpoint: String,

    /// Stream key
    #[serde(rename = "rtmp-key")]
    pub key: String,
}

impl TargetRecord {
    /// Create a new record
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            key: key.into(),
        }
    }

    /// Label to render, falling back to the endpoint when the name is blank
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.endpoint
        } else {
            &self.name
        }
    }
}
