//! In-memory storage backend for tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::Mutex;

use super::StorageBackend;
use crate::error::StorageError;

/// HashMap-backed [`StorageBackend`].
///
/// An optional per-value byte quota makes it possible to exercise the
/// quota-exceeded recovery path without a real storage limit.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Unbounded in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects any value larger than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().expect("storage lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(StorageError::WriteFailed {
                    key: key.to_string(),
                    reason: format!("quota of {quota} bytes exceeded"),
                });
            }
        }
        let mut entries = self.entries.lock().expect("storage lock poisoned");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().expect("storage lock poisoned");
        entries.remove(key);
        Ok(())
    }
}
