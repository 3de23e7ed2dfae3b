//! In-process backend
//!
//! Clones share one map, so a host or test can hold a handle and observe
//! exactly what was physically written through the manager.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::KeyValueBackend;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, String>,
    writes: usize,
}

/// Shared in-memory key-value map
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with one entry, not counted as a write
    pub fn with_entry(key: &str, value: &str) -> Self {
        let backend = Self::new();
        backend.lock().entries.insert(key.to_string(), value.to_string());
        backend
    }

    /// Number of successful `set_item` calls so far
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Current value without going through the trait
    pub fn peek(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still a usable map
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.lock().entries.remove(key);
        Ok(())
    }
}
