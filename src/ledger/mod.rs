//! Per-scope JSON ledger recording which remote item was materialized as
//! which local file.
//!
//! The ledger lives next to the media as `metadata.json`. It is re-read at the
//! start of every scope and rewritten in full after every mutation, so a crash
//! loses at most the entry being recorded.

pub mod error;
pub mod store;

pub use error::LedgerError;
pub use store::LedgerStore;

use serde::{Deserialize, Deserializer, Serialize};

/// File name of the ledger inside every scope directory.
pub const LEDGER_FILE_NAME: &str = "metadata.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LedgerEntry {
    pub photo_id: String,
    pub title: String,
    pub filename: String,
}

/// On-disk document. Entries keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ledger {
    pub set_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub photos: Vec<LedgerEntry>,
}

/// Ledgers written by older tools store an empty list as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<LedgerEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<LedgerEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Ledger {
    pub fn empty(set_id: &str) -> Self {
        Self {
            set_id: set_id.to_string(),
            photos: Vec::new(),
        }
    }

    pub fn get(&self, photo_id: &str) -> Option<&LedgerEntry> {
        self.photos.iter().find(|e| e.photo_id == photo_id)
    }

    pub fn contains_id(&self, photo_id: &str) -> bool {
        self.get(photo_id).is_some()
    }

    pub fn contains_filename(&self, filename: &str) -> bool {
        self.photos.iter().any(|e| e.filename == filename)
    }
}
