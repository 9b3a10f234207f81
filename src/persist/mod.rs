//! Target list persistence
//!
//! The ordered target list is stored under one key of the host configuration
//! store as base64 text wrapping a versioned JSON document:
//!
//! ```text
//! {"version":1,"targets":[{"name":"..","rtmp-path":"..","rtmp-key":".."}, ...]}
//! ```
//!
//! A bare JSON array of records is also accepted on load. Records missing any
//! of the three fields are skipped. Anything undecodable loads as an empty
//! list.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::host::ConfigStore;
use crate::target::TargetRecord;

/// Current document version
pub const FORMAT_VERSION: u64 = 1;

#[derive(Serialize)]
struct StoredTargets<'a> {
    version: u64,
    targets: &'a [TargetRecord],
}

/// Encode records into the stored text form
pub fn encode_targets(records: &[TargetRecord]) -> Result<String> {
    let document = StoredTargets {
        version: FORMAT_VERSION,
        targets: records,
    };
    let json = serde_json::to_vec(&document)
        .map_err(|e| Error::PersistenceCorrupt(format!("encode failed: {}", e)))?;
    Ok(BASE64.encode(json))
}

/// Decode the stored text form
///
/// Invalid records are skipped; a malformed document is an error.
pub fn decode_targets(blob: &str) -> Result<Vec<TargetRecord>> {
    let blob = blob.trim();
    if blob.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = BASE64
        .decode(blob)
        .map_err(|e| Error::PersistenceCorrupt(format!("invalid base64: {}", e)))?;
    let document: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::PersistenceCorrupt(format!("invalid JSON: {}", e)))?;

    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut object) => {
            let version = object
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::PersistenceCorrupt("missing version".to_string()))?;
            if version > FORMAT_VERSION {
                return Err(Error::PersistenceCorrupt(format!(
                    "unsupported version {}",
                    version
                )));
            }
            match object.remove("targets") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(Error::PersistenceCorrupt("missing targets".to_string())),
            }
        }
        _ => {
            return Err(Error::PersistenceCorrupt(
                "document is not a target list".to_string(),
            ))
        }
    };

    let total = entries.len();
    let records: Vec<TargetRecord> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();
    if records.len() < total {
        tracing::debug!(
            skipped = total - records.len(),
            kept = records.len(),
            "Skipped invalid stored targets"
        );
    }
    Ok(records)
}

/// Reads and writes the target list in the host configuration store
pub struct TargetStore {
    store: Arc<dyn ConfigStore>,
    section: String,
    targets_key: String,
    dock_key: String,
}

impl TargetStore {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        section: impl Into<String>,
        targets_key: impl Into<String>,
        dock_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            section: section.into(),
            targets_key: targets_key.into(),
            dock_key: dock_key.into(),
        }
    }

    /// Write the ordered target list
    pub fn save(&self, records: &[TargetRecord]) -> Result<()> {
        let blob = encode_targets(records)?;
        self.store.set_string(&self.section, &self.targets_key, &blob);
        tracing::info!(targets = records.len(), section = %self.section, "Targets saved");
        Ok(())
    }

    /// Read the ordered target list, reporting corruption
    ///
    /// An absent key is an empty list, not an error.
    pub fn try_load(&self) -> Result<Vec<TargetRecord>> {
        match self.store.get_string(&self.section, &self.targets_key) {
            Some(blob) => decode_targets(&blob),
            None => Ok(Vec::new()),
        }
    }

    /// Read the ordered target list; corruption loads as empty
    pub fn load(&self) -> Vec<TargetRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, section = %self.section, "Ignoring stored targets");
                Vec::new()
            }
        }
    }

    /// Saved dock placement, `0` when unset
    pub fn dock_location(&self) -> i64 {
        self.store
            .get_int(&self.section, &self.dock_key)
            .unwrap_or(0)
    }

    pub fn set_dock_location(&self, location: i64) {
        self.store.set_int(&self.section, &self.dock_key, location);
    }
}
