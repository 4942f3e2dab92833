//! In-memory draft store, used as a test double and for ephemeral sessions

use std::sync::{Arc, Mutex, MutexGuard};

use super::{append, live, tombstone, upsert, Draft, DraftError, DraftStore, Slots};

/// Draft store backed by a shared vector; clones see the same drafts
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStore {
    slots: Arc<Mutex<Slots>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drafts(drafts: Vec<Draft>) -> Self {
        Self {
            slots: Arc::new(Mutex::new(drafts.into_iter().map(Some).collect())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // A poisoned lock still holds a consistent Vec
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DraftStore for MemoryDraftStore {
    fn entries(&self) -> Result<Vec<(usize, Draft)>, DraftError> {
        Ok(live(&self.lock()))
    }

    fn save(&self, index: usize, draft: Draft) -> Result<usize, DraftError> {
        upsert(&mut self.lock(), index, draft)
    }

    fn insert(&self, draft: Draft) -> Result<usize, DraftError> {
        Ok(append(&mut self.lock(), draft))
    }

    fn discard(&self, index: usize) -> Result<(), DraftError> {
        tombstone(&mut self.lock(), index);
        Ok(())
    }
}
