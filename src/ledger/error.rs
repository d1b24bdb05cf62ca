use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Ledger {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}
