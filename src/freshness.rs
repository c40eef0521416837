use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use tracing::debug;

pub const STALE_AFTER: Duration = Duration::from_secs(12 * 60 * 60);

/// Decides when persisted jobs are old enough to scrape again.
#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    pub stale_after: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            stale_after: STALE_AFTER,
        }
    }
}

impl FreshnessPolicy {
    /// True when the file is missing, its mtime can't be read, or it is older
    /// than `stale_after`.
    pub fn should_auto_refresh(&self, path: &Path) -> bool {
        match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => self.is_stale_at(modified, SystemTime::now()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No usable mtime, treating as stale");
                true
            }
        }
    }

    /// A modification time in the future is never stale.
    pub fn is_stale_at(&self, modified: SystemTime, now: SystemTime) -> bool {
        now.duration_since(modified)
            .map(|age| age > self.stale_after)
            .unwrap_or(false)
    }
}

/// Single-flight guard for background refreshes.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    in_flight: Mutex<bool>,
}

impl RefreshCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Test-and-set under the lock. `None` if a refresh already holds the slot.
    pub fn try_acquire(self: &Arc<Self>) -> Option<RefreshSlot> {
        let mut in_flight = self.lock();
        if *in_flight {
            return None;
        }
        *in_flight = true;
        Some(RefreshSlot {
            coordinator: Arc::clone(self),
        })
    }

    #[cfg(test)]
    pub fn is_in_flight(&self) -> bool {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        // The flag is a plain bool, so a poisoned lock still holds a usable value.
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Held for the duration of a refresh; releases the slot when dropped,
/// including on early return or panic.
#[derive(Debug)]
pub struct RefreshSlot {
    coordinator: Arc<RefreshCoordinator>,
}

impl Drop for RefreshSlot {
    fn drop(&mut self) {
        *self.coordinator.lock() = false;
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::sync::Barrier;
    use std::thread;

    use super::*;

    fn touch(path: &Path, age: Duration) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn missing_file_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FreshnessPolicy::default().should_auto_refresh(&dir.path().join("jobs.json")));
    }

    #[test]
    fn staleness_boundary_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        let policy = FreshnessPolicy::default();

        touch(&path, STALE_AFTER + Duration::from_secs(1));
        assert!(policy.should_auto_refresh(&path));

        touch(&path, STALE_AFTER - Duration::from_secs(1));
        assert!(!policy.should_auto_refresh(&path));
    }

    #[test]
    fn staleness_is_strictly_greater_than_threshold() {
        let policy = FreshnessPolicy::default();
        let now = SystemTime::now();

        assert!(!policy.is_stale_at(now - STALE_AFTER, now));
        assert!(policy.is_stale_at(now - STALE_AFTER - Duration::from_secs(1), now));
        assert!(!policy.is_stale_at(now - STALE_AFTER + Duration::from_secs(1), now));
        assert!(!policy.is_stale_at(now + Duration::from_secs(60), now));
    }

    #[test]
    fn second_acquire_fails_while_slot_is_held() {
        let coordinator = RefreshCoordinator::new();

        let slot = coordinator.try_acquire();
        assert!(slot.is_some());
        assert!(coordinator.is_in_flight());
        assert!(coordinator.try_acquire().is_none());

        drop(slot);
        assert!(!coordinator.is_in_flight());
        assert!(coordinator.try_acquire().is_some());
    }

    #[test]
    fn concurrent_acquires_yield_exactly_one_slot() {
        let coordinator = RefreshCoordinator::new();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    coordinator.try_acquire()
                })
            })
            .collect();

        let slots: Vec<_> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn slot_is_released_when_refresh_panics() {
        let coordinator = RefreshCoordinator::new();
        let slot = coordinator.try_acquire().unwrap();

        let result = thread::spawn(move || {
            let _slot = slot;
            panic!("scrape blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!coordinator.is_in_flight());
    }
}
