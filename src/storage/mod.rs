//! Durable key-value storage
//!
//! `KeyValueBackend` is the raw medium and may fail. `SafeStore` wraps a
//! backend and never fails: every fault becomes a `warn!` event plus a
//! `false`/`None` result, so callers carry on with in-memory state.

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use tracing::{debug, warn};

use crate::error::StorageError;

/// Raw persistent key-value medium
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueBackend {
    /// Read the value for `key`, `Ok(None)` when absent
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Fault-isolating adapter over a backend
#[derive(Debug)]
pub struct SafeStore<B> {
    backend: B,
}

impl<B: KeyValueBackend> SafeStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Read a value; faults are logged and reported as absent
    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "storage get failed");
                None
            }
        }
    }

    /// Write a value; returns `false` on any fault
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        match self.backend.set_item(key, value) {
            Ok(()) => {
                debug!(key, bytes = value.len(), "storage set");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "storage set failed");
                false
            }
        }
    }

    /// Delete a value; returns `false` on any fault
    pub fn remove(&mut self, key: &str) -> bool {
        match self.backend.remove_item(key) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "storage remove failed");
                false
            }
        }
    }
}
