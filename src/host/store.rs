//! Host configuration store

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Durable key-value configuration owned by the host
///
/// Values are opaque text; callers choose their own encoding.
pub trait ConfigStore: Send + Sync {
    /// Read a value, `None` if the key has never been written
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Write a value
    fn set_string(&self, section: &str, key: &str, value: &str);

    /// Read an integer value, `None` if absent or not a number
    fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        self.get_string(section, key)?.trim().parse().ok()
    }

    /// Write an integer value
    fn set_int(&self, section: &str, key: &str, value: i64) {
        self.set_string(section, key, &value.to_string());
    }
}

/// Process-local [`ConfigStore`]
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: Mutex<HashMap<(String, String), String>>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all sections
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Whether nothing has been stored
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<(String, String), String>> {
        // A panic while holding the lock cannot leave the map half-written
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.values()
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }

    fn set_string(&self, section: &str, key: &str, value: &str) {
        self.values()
            .insert((section.to_string(), key.to_string()), value.to_string());
    }
}
