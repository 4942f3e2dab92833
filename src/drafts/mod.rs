//! Draft persistence
//!
//! Drafts are in-progress, unsubmitted wizard values kept so a wizard can be
//! resumed later. Each wizard kind owns one namespace holding a JSON array of
//! drafts; a draft is addressed by its index in that array. Discarding a
//! draft nulls its slot instead of removing it, so an index handed to one
//! session never starts pointing at another session's draft.

mod file;
mod memory;

pub use file::JsonFileDraftStore;
pub use memory::MemoryDraftStore;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::wizard::value::DraftValue;

/// A persisted, partially filled-in wizard value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[schema(value_type = Object)]
    pub value: DraftValue,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds
    pub updated_at: i64,
    /// Step the wizard was on when the draft was last saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
}

impl Draft {
    pub fn new(value: DraftValue, step_id: Option<String>) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            value,
            created_at: now,
            updated_at: now,
            step_id,
        }
    }

    /// Copy of this draft with a new value, keeping `created_at`
    pub fn updated(&self, value: DraftValue, step_id: Option<String>) -> Self {
        Self {
            value,
            created_at: self.created_at,
            updated_at: Utc::now().timestamp_millis().max(self.created_at),
            step_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft index {index} is out of range (only {len} slots allocated)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("failed to access draft storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Slots of one namespace. A discarded draft leaves a `None` slot (`null` on
/// disk) so the index of every other draft stays put.
pub(crate) type Slots = Vec<Option<Draft>>;

/// Storage port for drafts of a single wizard kind.
///
/// A draft keeps the index it was inserted at until it is discarded; indices
/// are never reused or shifted. Calls are synchronous from the caller's
/// perspective and each call is atomic within one store instance. Two
/// sessions writing the same index are not coordinated: last write wins.
pub trait DraftStore: Send + Sync {
    /// Live drafts with their indices, in index order
    fn entries(&self) -> Result<Vec<(usize, Draft)>, DraftError>;

    /// Upsert `draft` at `index`.
    ///
    /// An index equal to the slot count appends. Returns the index the draft
    /// now lives at.
    fn save(&self, index: usize, draft: Draft) -> Result<usize, DraftError>;

    /// Store `draft` in a fresh slot and return its index
    fn insert(&self, draft: Draft) -> Result<usize, DraftError>;

    /// Remove the draft at `index`. Unknown indices are ignored.
    fn discard(&self, index: usize) -> Result<(), DraftError>;

    /// All live drafts, in index order
    fn list(&self) -> Result<Vec<Draft>, DraftError> {
        Ok(self.entries()?.into_iter().map(|(_, draft)| draft).collect())
    }

    fn get(&self, index: usize) -> Result<Option<Draft>, DraftError> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|(i, _)| *i == index)
            .map(|(_, draft)| draft))
    }
}

/// Upsert helper shared by the store implementations
pub(crate) fn upsert(slots: &mut Slots, index: usize, draft: Draft) -> Result<usize, DraftError> {
    match index.cmp(&slots.len()) {
        std::cmp::Ordering::Less => slots[index] = Some(draft),
        std::cmp::Ordering::Equal => slots.push(Some(draft)),
        std::cmp::Ordering::Greater => {
            return Err(DraftError::IndexOutOfRange {
                index,
                len: slots.len(),
            })
        }
    }
    Ok(index)
}

pub(crate) fn append(slots: &mut Slots, draft: Draft) -> usize {
    slots.push(Some(draft));
    slots.len() - 1
}

/// Empty the slot at `index`; returns whether a draft was removed
pub(crate) fn tombstone(slots: &mut Slots, index: usize) -> bool {
    slots.get_mut(index).and_then(Option::take).is_some()
}

pub(crate) fn live(slots: &Slots) -> Vec<(usize, Draft)> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| slot.clone().map(|draft| (index, draft)))
        .collect()
}

/// Storage key for a wizard namespace
pub fn namespace_key(wizard: &str) -> String {
    format!("composer.drafts.{wizard}")
}
