//! BGA Trainer - learning progress core
//!
//! Records practice attempts, keeps two aggregate counters and persists
//! the whole profile through a key-value store:
//! - Fault-isolating storage adapter over pluggable backends
//! - Profile parsing and structural repair of older stored data
//! - Debounced, idle-deferred writes driven by an explicit clock
//! - Optional tokio driver for native hosts
//!
//! # Example
//!
//! ```
//! use bga_trainer::{LearningManager, MemoryBackend, SystemClock, TrackerConfig};
//!
//! let mut manager = LearningManager::new(MemoryBackend::new(), SystemClock::new(), TrackerConfig::default());
//! manager.initialize();
//! manager.save_attempt("case-1", "A", "B", "A", "B", "drill");
//! manager.flush_now();
//!
//! let stats = manager.basic_stats();
//! assert_eq!(stats.total_attempts, 1);
//! assert_eq!(stats.correct_cases, 1);
//! ```

pub mod error;
pub mod clock;
pub mod config;
pub mod storage;
pub mod profile;
pub mod scheduler;
pub mod manager;
pub mod driver;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{IdleSupport, TrackerConfig, DEFAULT_STORAGE_KEY};
pub use driver::{FlushDriver, SharedManager};
pub use error::{ConfigError, ParseError, StorageError};
pub use manager::{LearningManager, ManagerState, ProfileOrigin};
pub use profile::{Attempt, AttemptEntry, BasicStats, CaseId, Label, Profile};
pub use scheduler::WriteScheduler;
pub use storage::{FileBackend, KeyValueBackend, MemoryBackend, SafeStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a `tracing` subscriber (WARN by default, `RUST_LOG` overrides).
/// Safe to call more than once.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}
