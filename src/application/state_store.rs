use crate::domain::errors::UnknownStateError;
use crate::domain::unit_state::{ActiveState, Snapshot, UnitState};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Latest known state per unit.
///
/// Every read or write takes the single interior lock once and releases it
/// before returning, so the lock is never held across an await point.
#[derive(Debug, Default)]
pub struct StateStore {
    units: Mutex<Snapshot>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw `ActiveState` value for `unit_name`.
    ///
    /// Returns `Ok(true)` when the stored state changed (including the first
    /// observation of a unit) and `Ok(false)` for a repeated state. An
    /// unrecognized value leaves the store untouched.
    pub fn update(&self, unit_name: &str, raw_state: &str) -> Result<bool, UnknownStateError> {
        let state: ActiveState = raw_state.parse()?;

        let mut units = self.lock();
        if let Some(existing) = units.get(unit_name)
            && existing.active_state == state
        {
            return Ok(false);
        }

        units.insert(unit_name.to_string(), UnitState::new(unit_name, state));
        Ok(true)
    }

    /// Independent copy of every entry, taken under one lock acquisition
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    pub fn get(&self, unit_name: &str) -> Option<UnitState> {
        self.lock().get(unit_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Writes are single inserts, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.units.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_update_is_a_change() {
        let store = StateStore::new();
        assert_eq!(store.update("a.service", "\"active\""), Ok(true));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["a.service"].active_state, ActiveState::Active);
    }

    #[test]
    fn test_repeated_state_is_idempotent() {
        let store = StateStore::new();
        assert_eq!(store.update("a.service", "\"active\""), Ok(true));
        let before = store.snapshot();

        assert_eq!(store.update("a.service", "\"active\""), Ok(false));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_overwrite_with_new_state() {
        let store = StateStore::new();
        store.update("a.service", "\"active\"").unwrap();
        assert_eq!(store.update("a.service", "\"failed\""), Ok(true));
        assert_eq!(
            store.get("a.service").map(|u| u.active_state),
            Some(ActiveState::Failed)
        );
    }

    #[test]
    fn test_unknown_state_leaves_store_unchanged() {
        let store = StateStore::new();
        store.update("a.service", "\"active\"").unwrap();
        let before = store.snapshot();

        let err = store.update("a.service", "\"maintenance\"").unwrap_err();
        assert_eq!(err.raw, "\"maintenance\"");
        assert!(store.update("b.service", "bogus").is_err());

        assert_eq!(store.snapshot(), before);
        assert!(store.get("b.service").is_none());
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let store = StateStore::new();
        store.update("a.service", "active").unwrap();
        let snapshot = store.snapshot();

        store.update("a.service", "inactive").unwrap();
        store.update("b.service", "active").unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["a.service"].active_state, ActiveState::Active);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(StateStore::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let unit = format!("unit-{i}.service");
                    store.update(&unit, "\"activating\"").unwrap();
                    store.update(&unit, "\"active\"").unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 32);
        assert!(
            snapshot
                .values()
                .all(|u| u.active_state == ActiveState::Active)
        );
    }
}
