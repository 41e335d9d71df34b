//! Draft persistence for in-progress answer sets.
//!
//! A draft is a serialized snapshot of an `AnswerSet` wrapped in a small
//! envelope (`Draft`). Stores only ever see bytes; the wizard keeps the live
//! answer set to itself.

mod file;
mod memory;

pub use file::FileDraftStore;
pub use memory::MemoryDraftStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answers::AnswerSet;
use crate::errors::PersistenceError;

/// Current draft envelope version.
pub const DRAFT_VERSION: u32 = 1;

/// Key-value byte store for drafts, analogous to browser local storage.
pub trait DraftStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError>;

    /// Remove a draft. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;

    /// Keys of every stored draft.
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;
}

/// Serialized draft envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub version: u32,
    /// Flow the answers belong to
    pub flow: String,
    pub saved_at: DateTime<Utc>,
    pub answers: AnswerSet,
}

impl Draft {
    pub fn new(flow: &str, answers: AnswerSet) -> Self {
        Self {
            version: DRAFT_VERSION,
            flow: flow.to_string(),
            saved_at: Utc::now(),
            answers,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        serde_json::to_vec_pretty(self).map_err(PersistenceError::Serialize)
    }

    /// Decode a stored draft. `key` is only used for error context.
    pub fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self, PersistenceError> {
        let draft: Draft =
            serde_json::from_slice(bytes).map_err(|source| PersistenceError::Corrupt {
                key: key.to_string(),
                source,
            })?;

        if draft.version != DRAFT_VERSION {
            return Err(PersistenceError::Incompatible {
                key: key.to_string(),
                reason: format!(
                    "version {} (expected {})",
                    draft.version, DRAFT_VERSION
                ),
            });
        }

        Ok(draft)
    }

    /// Load and decode a draft in one go; `Ok(None)` when nothing is stored.
    pub fn load(store: &dyn DraftStore, key: &str) -> Result<Option<Self>, PersistenceError> {
        match store.get(key)? {
            Some(bytes) => Self::from_bytes(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Age of the draft relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.saved_at)
    }
}
