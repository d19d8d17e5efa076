//! Versioned weight store.
//!
//! Holds the current `EngineWeights` snapshot behind an `Arc` swapped under
//! a lock. Readers clone the `Arc` and keep a consistent snapshot for as
//! long as they need it; only the drift tracker installs successors.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::foundation::WeightsVersion;
use crate::domain::mcda::EngineWeights;

#[derive(Debug)]
pub struct WeightStore {
    current: RwLock<Arc<EngineWeights>>,
    history: RwLock<Vec<Arc<EngineWeights>>>,
}

impl WeightStore {
    pub fn new(initial: EngineWeights) -> Self {
        let initial = Arc::new(initial);
        Self {
            current: RwLock::new(Arc::clone(&initial)),
            history: RwLock::new(vec![initial]),
        }
    }

    /// The active snapshot.
    pub fn current(&self) -> Arc<EngineWeights> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_version(&self) -> WeightsVersion {
        self.current().version()
    }

    /// A past or current snapshot by version.
    pub fn snapshot(&self, version: WeightsVersion) -> Option<Arc<EngineWeights>> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|w| w.version() == version)
            .cloned()
    }

    /// Every snapshot, oldest first.
    pub fn history(&self) -> Vec<Arc<EngineWeights>> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Derives and installs the successor of the current snapshot.
    ///
    /// The write lock is held while `derive` runs, so concurrent updates
    /// are serialized and none is lost.
    pub(crate) fn advance<E>(
        &self,
        derive: impl FnOnce(&EngineWeights) -> Result<EngineWeights, E>,
    ) -> Result<Arc<EngineWeights>, E> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(derive(&**current)?);
        *current = Arc::clone(&next);
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&next));
        Ok(next)
    }
}

impl Default for WeightStore {
    fn default() -> Self {
        Self::new(EngineWeights::baseline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ValidationError;
    use std::collections::BTreeMap;

    fn shifted(w: &EngineWeights) -> Result<EngineWeights, ValidationError> {
        let next: BTreeMap<String, f64> = [("cost", 0.5), ("time", 0.3), ("reliability", 0.2)]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        w.successor(next)
    }

    #[test]
    fn starts_at_initial_version() {
        let store = WeightStore::default();
        assert_eq!(store.current_version(), WeightsVersion::INITIAL);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn advance_installs_successor_and_keeps_history() {
        let store = WeightStore::default();
        let held = store.current();

        let next = store.advance(shifted).unwrap();

        assert_eq!(next.version().value(), 2);
        assert_eq!(store.current_version().value(), 2);
        assert_eq!(held.get("cost"), Some(0.4));
        assert_eq!(
            store.snapshot(WeightsVersion::INITIAL).unwrap().get("cost"),
            Some(0.4)
        );
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn failed_advance_leaves_store_untouched() {
        let store = WeightStore::default();
        let result = store.advance(|_| Err::<EngineWeights, _>(ValidationError::empty_field("weights")));
        assert!(result.is_err());
        assert_eq!(store.current_version(), WeightsVersion::INITIAL);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn concurrent_advances_are_serialized() {
        let store = Arc::new(WeightStore::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.advance(shifted).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.current_version().value(), 9);
        let versions: Vec<u64> = store.history().iter().map(|w| w.version().value()).collect();
        assert_eq!(versions, (1..=9).collect::<Vec<_>>());
    }
}
