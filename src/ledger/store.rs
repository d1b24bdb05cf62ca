use std::path::{Path, PathBuf};

use super::{Ledger, LedgerEntry, LedgerError};

/// A loaded ledger bound to its file. Every mutation rewrites the file.
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    ledger: Ledger,
}

impl LedgerStore {
    /// Read the ledger at `path`, or start an empty one for `set_id` if the
    /// file does not exist yet. Nothing is written until the first mutation.
    pub fn load(path: &Path, set_id: &str) -> Result<Self, LedgerError> {
        let ledger = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| LedgerError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No ledger at {}, starting empty", path.display());
                Ledger::empty(set_id)
            }
            Err(source) => {
                return Err(LedgerError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            ledger,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Overwrite the title and filename of the entry with the same id in
    /// place, or append a new entry.
    pub fn add_or_update(&mut self, entry: LedgerEntry) -> Result<(), LedgerError> {
        match self
            .ledger
            .photos
            .iter_mut()
            .find(|e| e.photo_id == entry.photo_id)
        {
            Some(existing) => {
                tracing::debug!("Updating existing ledger entry for {}", entry.photo_id);
                existing.title = entry.title;
                existing.filename = entry.filename;
            }
            None => self.ledger.photos.push(entry),
        }
        self.persist()
    }

    pub fn remove_by_id(&mut self, photo_id: &str) -> Result<(), LedgerError> {
        self.ledger.photos.retain(|e| {
            let keep = e.photo_id != photo_id;
            if !keep {
                tracing::info!("Removing id `{}' from the ledger", photo_id);
            }
            keep
        });
        self.persist()
    }

    pub fn remove_by_filename(&mut self, filename: &str) -> Result<(), LedgerError> {
        self.ledger.photos.retain(|e| {
            let keep = e.filename != filename;
            if !keep {
                tracing::info!("Removing filename `{}' from the ledger", filename);
            }
            keep
        });
        self.persist()
    }

    /// Write the whole document next to the target, then rename over it.
    fn persist(&self) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(&self.ledger)?;
        let tmp = self.path.with_extension("json.tmp");
        let write_err = |source: std::io::Error| LedgerError::Write {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, bytes).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)
    }
}
