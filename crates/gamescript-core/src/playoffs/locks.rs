// Per-scenario mutual exclusion for bracket writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::model::ScenarioId;

/// One lock per scenario, created on first use. Scenarios never contend
/// with each other.
#[derive(Debug, Default)]
pub struct ScenarioLocks {
    locks: Mutex<HashMap<ScenarioId, Arc<Mutex<()>>>>,
}

impl ScenarioLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, scenario_id: ScenarioId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("scenario lock table poisoned");
        Arc::clone(locks.entry(scenario_id).or_default())
    }

    /// Run `f` while holding `scenario_id`'s lock.
    pub fn with_lock<T>(&self, scenario_id: ScenarioId, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(scenario_id);
        // A panic under the lock leaves no partial state behind (writes are
        // transactional), so a poisoned lock is safe to reuse.
        let _guard = handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }
}
