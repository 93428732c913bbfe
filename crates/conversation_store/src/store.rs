use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as SlotMutex, OwnedMutexGuard};

use crate::schema::ConversationState;

type Slot = Arc<SlotMutex<Option<ConversationState>>>;

#[derive(Debug, Default)]
pub struct ConversationStore {
    slots: Mutex<HashMap<String, Slot>>,
}

/// Exclusive access to one key's state, held for the duration of a turn.
///
/// Dropping the slot releases the key. A slot left without state (a reset, or
/// a failed first turn) is removed from the store unless another caller is
/// already queued on it.
#[derive(Debug)]
pub struct ConversationSlot<'a> {
    store: &'a ConversationStore,
    key: String,
    guard: Option<OwnedMutexGuard<Option<ConversationState>>>,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> ConversationSlot<'_> {
        let slot = {
            let mut slots = lock_unpoisoned(&self.slots);
            Arc::clone(slots.entry(key.to_owned()).or_default())
        };

        ConversationSlot {
            store: self,
            key: key.to_owned(),
            guard: Some(slot.lock_owned().await),
        }
    }

    /// Snapshot of `key`'s state, waiting for any in-flight turn on it.
    pub async fn get(&self, key: &str) -> Option<ConversationState> {
        self.lock(key).await.state().cloned()
    }

    /// Removes `key`'s state, waiting for any in-flight turn on it.
    pub async fn remove(&self, key: &str) -> Option<ConversationState> {
        self.lock(key).await.take()
    }

    /// Number of keys currently holding a slot.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.slots).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release_if_empty(&self, key: &str, guard: OwnedMutexGuard<Option<ConversationState>>) {
        if guard.is_some() {
            return;
        }

        let mut slots = lock_unpoisoned(&self.slots);
        // One reference in the map and one in this guard means nobody is queued.
        if Arc::strong_count(OwnedMutexGuard::mutex(&guard)) == 2 {
            slots.remove(key);
        }
    }
}

impl ConversationSlot<'_> {
    /// Current state, `None` for a fresh conversation.
    #[must_use]
    pub fn state(&self) -> Option<&ConversationState> {
        self.guard.as_deref().and_then(Option::as_ref)
    }

    /// Overwrites the state with the result of a successful turn.
    pub fn replace(&mut self, state: ConversationState) -> Option<ConversationState> {
        self.guard
            .as_deref_mut()
            .and_then(|slot| slot.replace(state))
    }

    /// Clears the state, returning the conversation to fresh.
    pub fn take(&mut self) -> Option<ConversationState> {
        self.guard.as_deref_mut().and_then(Option::take)
    }
}

impl Drop for ConversationSlot<'_> {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            self.store.release_if_empty(&self.key, guard);
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
