//! Overlap guard: which jobs currently have a `run()` in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Names of jobs mid-run, each tagged with the token of the run that owns
/// the entry.
///
/// Every operation holds a synchronous lock for a single map access and never
/// suspends, so check-and-insert is atomic with respect to other ticks.
#[derive(Debug, Default)]
pub struct RunningSet {
    runs: Mutex<HashMap<String, u64>>,
    next_token: AtomicU64,
}

impl RunningSet {
    /// Claim `name` for a new run. Returns `None` if a run is already in flight.
    pub fn try_begin(&self, name: &str) -> Option<RunGuard<'_>> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        if runs.contains_key(name) {
            return None;
        }
        runs.insert(name.to_string(), token);
        Some(RunGuard {
            set: self,
            name: name.to_string(),
            token,
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Drop the entry for `name` regardless of which run owns it. Returns
    /// whether an entry was present.
    pub fn clear(&self, name: &str) -> bool {
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    fn finish(&self, name: &str, token: u64) {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        if runs.get(name) == Some(&token) {
            runs.remove(name);
        }
    }
}

/// Releases its run's entry when dropped, whether the run succeeded, failed,
/// panicked or was cancelled. An entry that was cleared and re-claimed by a
/// newer run is left alone.
#[derive(Debug)]
pub struct RunGuard<'a> {
    set: &'a RunningSet,
    name: String,
    token: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.set.finish(&self.name, self.token);
    }
}
