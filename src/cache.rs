//! Per-key memoization with at-most-one computation per key.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

type Slot<V> = Arc<Mutex<Option<V>>>;

/// Keyed cache whose slots are locked while their value is computed.
///
/// Concurrent callers for the same key wait for the first computation and
/// then share its result. Failed computations leave the slot empty.
pub(crate) struct SlotCache<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Clone> SlotCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> Slot<V> {
        Arc::clone(self.slots.lock().entry(key.to_string()).or_default())
    }

    /// Cached value for `key`, if one has been computed.
    pub(crate) fn get(&self, key: &str) -> Option<V> {
        let slot = self.slots.lock().get(key).cloned()?;
        let value = slot.lock().clone();
        value
    }

    pub(crate) fn get_or_insert_with(&self, key: &str, compute: impl FnOnce() -> V) -> V {
        let slot = self.slot(key);
        let mut guard = slot.lock();
        if let Some(value) = guard.as_ref() {
            return value.clone();
        }
        let value = compute();
        *guard = Some(value.clone());
        value
    }

    pub(crate) fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let slot = self.slot(key);
        let mut guard = slot.lock();
        if let Some(value) = guard.as_ref() {
            return Ok(value.clone());
        }
        let value = compute()?;
        *guard = Some(value.clone());
        Ok(value)
    }
}
