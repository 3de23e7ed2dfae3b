//! Learning profile manager
//!
//! Owns the single live profile, rehydrates it from the store, records
//! attempts and schedules writes back. All operations are infallible from
//! the host's point of view: storage faults and corrupt data degrade to
//! "continue with the in-memory profile".

use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::error::StorageError;
use crate::profile::{self, Attempt, BasicStats, CaseId, Label, Profile};
use crate::scheduler::WriteScheduler;
use crate::storage::{KeyValueBackend, SafeStore};

/// How the active profile came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOrigin {
    /// Newly created, either nothing was stored, the stored value was
    /// corrupt, or after a reset
    Fresh,
    /// Loaded unchanged from the store
    Rehydrated,
    /// Loaded from the store with missing or legacy members filled in
    Repaired,
}

/// Persistence lifecycle of the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Loading,
    Active(ProfileOrigin),
}

/// Profile manager over a storage backend and a clock
pub struct LearningManager<B, C> {
    store: SafeStore<B>,
    clock: C,
    config: TrackerConfig,
    profile: Profile,
    scheduler: WriteScheduler,
    state: ManagerState,
}

impl<B: KeyValueBackend, C: Clock> LearningManager<B, C> {
    /// Create an uninitialized manager. Call `initialize` before use.
    pub fn new(backend: B, clock: C, config: TrackerConfig) -> Self {
        let profile = Profile::new(clock.now_utc());
        let scheduler = WriteScheduler::from_config(&config);
        Self {
            store: SafeStore::new(backend),
            clock,
            config,
            profile,
            scheduler,
            state: ManagerState::Uninitialized,
        }
    }

    /// Load the stored profile, or start a fresh one
    pub fn initialize(&mut self) -> &Profile {
        self.state = ManagerState::Loading;
        let key = self.config.storage_key.clone();

        let Some(raw) = self.store.get(&key) else {
            info!(key = %key, "no stored profile, creating a new one");
            self.create_new_profile();
            return &self.profile;
        };

        match profile::parse(&raw) {
            Ok(stored) => {
                let repaired = profile::repair(stored, self.clock.now_utc());
                let origin = if repaired.is_clean() {
                    ProfileOrigin::Rehydrated
                } else {
                    for drift in &repaired.drift {
                        debug!(%drift, "repaired stored profile");
                    }
                    ProfileOrigin::Repaired
                };
                info!(
                    attempts = repaired.profile.attempts.len(),
                    total_cases = repaired.profile.total_cases,
                    ?origin,
                    "loaded stored profile"
                );
                self.profile = repaired.profile;
                self.state = ManagerState::Active(origin);
            }
            Err(e) => {
                error!(key = %key, error = %e, "invalid stored profile, creating a new one");
                self.create_new_profile();
            }
        }
        &self.profile
    }

    /// Replace the active profile with an empty one and write it through
    /// immediately
    pub fn create_new_profile(&mut self) -> &Profile {
        self.profile = Profile::new(self.clock.now_utc());
        self.state = ManagerState::Active(ProfileOrigin::Fresh);
        self.write_current();
        &self.profile
    }

    /// Record one practice action and schedule a deferred write
    pub fn save_attempt(
        &mut self,
        case_id: impl Into<CaseId>,
        selected_primary: impl Into<Label>,
        selected_comp: impl Into<Label>,
        correct_primary: impl Into<Label>,
        correct_comp: impl Into<Label>,
        mode: impl Into<String>,
    ) -> Attempt {
        if self.state == ManagerState::Uninitialized {
            self.initialize();
        }

        let attempt = Attempt::new(
            case_id.into(),
            selected_primary.into(),
            selected_comp.into(),
            correct_primary.into(),
            correct_comp.into(),
            Some(mode.into()),
            self.clock.now_utc(),
        );
        self.profile.record(attempt.clone());
        self.scheduler.arm(self.clock.elapsed());
        debug!(
            case_id = %attempt.case_id,
            is_correct = attempt.is_correct,
            total_cases = self.profile.total_cases,
            "recorded attempt"
        );
        attempt
    }

    /// Dashboard counters, recomputed from the attempt list
    pub fn basic_stats(&self) -> BasicStats {
        self.profile.basic_stats()
    }

    /// Discard all progress. Pending deferred writes are left in place and
    /// will persist the new, empty profile.
    pub fn reset(&mut self) -> bool {
        let key = self.config.storage_key.clone();
        if !self.store.remove(&key) {
            warn!(key = %key, "could not remove stored profile during reset");
        }
        self.create_new_profile();
        info!("learning progress reset");
        true
    }

    /// Run any deferred writes that are due. Returns how many physical
    /// writes were attempted.
    pub fn poll(&mut self, host_idle: bool) -> usize {
        let due = self.scheduler.poll(self.clock.elapsed(), host_idle);
        for _ in 0..due {
            self.write_current();
        }
        due
    }

    /// Cancel deferred work and write the current profile now
    pub fn flush_now(&mut self) -> bool {
        self.scheduler.flush_now();
        self.write_current()
    }

    pub fn has_pending_write(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Serialize the profile as it is right now and store it
    fn write_current(&mut self) -> bool {
        match self.profile.to_json().map_err(StorageError::from) {
            Ok(json) => self.store.set(&self.config.storage_key, &json),
            Err(e) => {
                warn!(error = %e, "profile not written");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::IdleSupport;
    use crate::storage::{MemoryBackend, MockKeyValueBackend};

    const KEY: &str = crate::config::DEFAULT_STORAGE_KEY;

    fn fallback_config() -> TrackerConfig {
        TrackerConfig {
            idle: IdleSupport::fallback(),
            ..Default::default()
        }
    }

    fn manager(backend: MemoryBackend) -> (LearningManager<MemoryBackend, ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        (LearningManager::new(backend, clock.clone(), fallback_config()), clock)
    }

    #[test]
    fn test_initialize_empty_store_writes_through() {
        let backend = MemoryBackend::new();
        let (mut m, _) = manager(backend.clone());

        assert_eq!(m.state(), ManagerState::Uninitialized);
        let profile = m.initialize().clone();

        assert_eq!(m.state(), ManagerState::Active(ProfileOrigin::Fresh));
        assert_eq!(backend.write_count(), 1);
        let stored = backend.peek(KEY).unwrap();
        assert_eq!(serde_json::from_str::<Profile>(&stored).unwrap(), profile);
    }

    #[test]
    fn test_initialize_corrupt_value_starts_fresh() {
        let backend = MemoryBackend::with_entry(KEY, "not-json");
        let (mut m, _) = manager(backend.clone());

        let profile = m.initialize();
        assert!(profile.attempts.is_empty());
        assert_eq!(profile.total_cases, 0);
        assert_eq!(profile.correct_cases, 0);
        assert_eq!(m.state(), ManagerState::Active(ProfileOrigin::Fresh));
    }

    #[test]
    fn test_initialize_repairs_drift() {
        let backend = MemoryBackend::with_entry(KEY, r#"{"startedAt":"2023-06-01T00:00:00Z","totalCases":5}"#);
        let (mut m, _) = manager(backend.clone());

        let profile = m.initialize().clone();
        assert!(profile.attempts.is_empty());
        assert_eq!(profile.total_cases, 5);
        assert_eq!(profile.started_at.to_rfc3339(), "2023-06-01T00:00:00+00:00");
        assert_eq!(m.state(), ManagerState::Active(ProfileOrigin::Repaired));
        // repair alone does not write
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn test_burst_collapses_to_one_write() {
        let backend = MemoryBackend::new();
        let (mut m, clock) = manager(backend.clone());
        m.initialize();
        let writes_after_init = backend.write_count();

        for i in 0..5 {
            m.save_attempt(format!("case-{}", i), "a", "b", "a", "b", "drill");
            clock.advance_ms(100);
            assert_eq!(m.poll(false), 0);
        }
        assert_eq!(backend.write_count(), writes_after_init);

        clock.advance_ms(200 + 250);
        assert_eq!(m.poll(false), 1);
        assert_eq!(backend.write_count(), writes_after_init + 1);

        let stored: Profile = serde_json::from_str(&backend.peek(KEY).unwrap()).unwrap();
        assert_eq!(stored.attempts.len(), 5);
        assert_eq!(stored.total_cases, 5);
    }

    #[test]
    fn test_deferred_write_uses_state_at_fire_time() {
        let backend = MemoryBackend::new();
        let (mut m, clock) = manager(backend.clone());
        m.initialize();

        m.save_attempt("A", "a", "b", "a", "b", "drill");
        clock.advance_ms(300);
        m.poll(false); // window elapsed, task queued
        m.save_attempt("B", "a", "b", "x", "b", "drill");
        clock.advance_ms(250);
        assert_eq!(m.poll(false), 1);

        let stored: Profile = serde_json::from_str(&backend.peek(KEY).unwrap()).unwrap();
        assert_eq!(stored.attempts.len(), 2);
        assert_eq!(stored.correct_cases, 1);
    }

    #[test]
    fn test_late_write_after_reset_persists_fresh_profile() {
        let backend = MemoryBackend::new();
        let (mut m, clock) = manager(backend.clone());
        m.initialize();

        m.save_attempt("A", "a", "b", "a", "b", "drill");
        assert!(m.reset());
        assert!(m.has_pending_write());

        clock.advance_ms(1000);
        assert_eq!(m.poll(false), 1);

        let stored: Profile = serde_json::from_str(&backend.peek(KEY).unwrap()).unwrap();
        assert!(stored.attempts.is_empty());
        assert_eq!(m.basic_stats(), BasicStats::default());
    }

    #[test]
    fn test_save_attempt_before_initialize() {
        let backend = MemoryBackend::new();
        let (mut m, _) = manager(backend);
        let attempt = m.save_attempt(7u64, "a", "b", "a", "c", "exam");
        assert!(!attempt.is_correct);
        assert_eq!(m.profile().total_cases, 1);
        assert!(matches!(m.state(), ManagerState::Active(_)));
    }

    #[test]
    fn test_flush_now_writes_immediately() {
        let backend = MemoryBackend::new();
        let (mut m, _) = manager(backend.clone());
        m.initialize();
        m.save_attempt("A", "a", "b", "a", "b", "drill");

        assert!(m.flush_now());
        assert!(!m.has_pending_write());
        let stored: Profile = serde_json::from_str(&backend.peek(KEY).unwrap()).unwrap();
        assert_eq!(stored.attempts.len(), 1);
    }

    #[test]
    fn test_storage_faults_never_surface() {
        let mut backend = MockKeyValueBackend::new();
        backend
            .expect_get_item()
            .returning(|_| Err(StorageError::Unavailable("storage disabled".into())));
        backend
            .expect_set_item()
            .returning(|key, value| Err(StorageError::QuotaExceeded { key: key.to_string(), bytes: value.len() }));
        backend
            .expect_remove_item()
            .returning(|_| Err(StorageError::Unavailable("storage disabled".into())));

        let clock = ManualClock::default();
        let mut m = LearningManager::new(backend, clock.clone(), fallback_config());

        m.initialize();
        m.save_attempt("A", "a", "b", "a", "b", "drill");
        clock.advance_ms(600);
        assert_eq!(m.poll(false), 1);
        assert!(!m.flush_now());
        assert!(m.reset());
        assert_eq!(m.basic_stats(), BasicStats::default());
    }
}
