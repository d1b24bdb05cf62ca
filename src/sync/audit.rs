//! Report-only comparison of remote listing, ledger and directory contents.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::flickr::RemoteItem;
use crate::ledger::{Ledger, LEDGER_FILE_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Remote item not in the ledger, but a file named after its id exists.
    UnrecordedOnDisk {
        id: String,
        title: String,
        filename: String,
    },
    /// Remote item not in the ledger and nothing on disk.
    NeedsDownload { id: String, title: String },
    /// Ledger entry whose item is gone from Flickr.
    NeedsDeletion { id: String, title: String },
    /// File in the directory that no ledger entry references.
    UntrackedFile { filename: String },
    /// Ledger entry whose file is missing from the directory.
    MissingFile { id: String, filename: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::UnrecordedOnDisk { id, title, filename } => write!(
                f,
                "Media id `{id}' ({title}) is missing from the ledger but appears on disk as `{filename}'; it needs to be added to the ledger"
            ),
            Finding::NeedsDownload { id, title } => write!(
                f,
                "Media id `{id}' ({title}) is missing from the ledger; it needs to be downloaded"
            ),
            Finding::NeedsDeletion { id, title } => write!(
                f,
                "Media id `{id}' ({title}) no longer exists on Flickr; it needs to be deleted"
            ),
            Finding::UntrackedFile { filename } => write!(
                f,
                "`{filename}' exists on disk but not in the ledger; inconsistency"
            ),
            Finding::MissingFile { id, filename } => write!(
                f,
                "`{filename}' (id `{id}') exists in the ledger but not on disk; inconsistency"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }
}

/// Run the four independent scans. `files` is every regular file name in the
/// scope directory; the ledger file itself is ignored.
pub fn audit(
    remote: &HashMap<String, RemoteItem>,
    ledger: &Ledger,
    files: &BTreeSet<String>,
) -> AuditReport {
    let media_files: Vec<&String> = files.iter().filter(|f| *f != LEDGER_FILE_NAME).collect();
    let mut findings = Vec::new();

    let mut remote_ids: Vec<&String> = remote.keys().collect();
    remote_ids.sort();
    for id in remote_ids {
        if ledger.contains_id(id) {
            continue;
        }
        let title = remote[id].title.clone();
        match media_files.iter().find(|f| is_named_for(f, id)) {
            Some(filename) => findings.push(Finding::UnrecordedOnDisk {
                id: id.clone(),
                title,
                filename: (*filename).clone(),
            }),
            None => findings.push(Finding::NeedsDownload {
                id: id.clone(),
                title,
            }),
        }
    }

    for entry in &ledger.photos {
        if !remote.contains_key(&entry.photo_id) {
            findings.push(Finding::NeedsDeletion {
                id: entry.photo_id.clone(),
                title: entry.title.clone(),
            });
        }
    }

    for filename in &media_files {
        if !ledger.contains_filename(filename) {
            findings.push(Finding::UntrackedFile {
                filename: (*filename).clone(),
            });
        }
    }

    for entry in &ledger.photos {
        if !files.contains(&entry.filename) {
            findings.push(Finding::MissingFile {
                id: entry.photo_id.clone(),
                filename: entry.filename.clone(),
            });
        }
    }

    for finding in &findings {
        tracing::info!("{}", finding);
    }
    AuditReport { findings }
}

/// Whether `filename` carries `id` as its leading name component, as in
/// `42_abcd_o.jpg` or `42.mov`. `420_x.jpg` does not belong to `42`.
fn is_named_for(filename: &str, id: &str) -> bool {
    match filename.strip_prefix(id) {
        Some(rest) => rest.is_empty() || rest.starts_with(['_', '.']),
        None => false,
    }
}
