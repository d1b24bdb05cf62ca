//! Per-scope reconciliation of the remote listing, the ledger and the files
//! on disk.
//!
//! A scope is processed in one of two modes. Audit mode only reports what
//! differs. Sync mode downloads what is missing, repairs ledger entries for
//! files that are already present, and finally deletes whatever Flickr no
//! longer has.

pub mod audit;
pub mod file;
pub mod paths;

use std::collections::{BTreeSet, HashMap};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::flickr::{FlickrApi, FlickrError, OriginalUrls, RemoteItem, Scope};
use crate::ledger::{LedgerEntry, LedgerStore, LEDGER_FILE_NAME};
use audit::AuditReport;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Process the scope even when it looks fully synced.
    pub force: bool,
    pub audit_only: bool,
    pub no_progress_bar: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub downloaded: usize,
    /// Files already on disk whose ledger entry had to be added or fixed.
    pub repaired: usize,
    /// Items without a retrievable original.
    pub skipped: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeOutcome {
    /// File and ledger counts already matched the listing.
    Skipped,
    Audited(AuditReport),
    Synced(SyncStats),
}

/// Where to fetch an item from and what to call it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Source {
    url: String,
    filename: String,
}

pub struct SyncEngine<'a> {
    api: &'a FlickrApi,
    root: PathBuf,
    options: SyncOptions,
}

impl<'a> SyncEngine<'a> {
    pub fn new(api: &'a FlickrApi, root: &Path, options: SyncOptions) -> Self {
        Self {
            api,
            root: root.to_path_buf(),
            options,
        }
    }

    pub async fn process_scope(&self, scope: &Scope) -> Result<ScopeOutcome> {
        let dir = paths::scope_dir(&self.root, scope);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let remote = self
            .api
            .enumerate(scope)
            .await
            .with_context(|| format!("Failed to list {}", scope))?;
        let files = file::list_files(&dir)
            .await
            .with_context(|| format!("Failed to read {}", dir.display()))?;
        let mut store = LedgerStore::load(&dir.join(LEDGER_FILE_NAME), scope.id())?;

        if self.options.audit_only {
            tracing::info!("Auditing {}", scope);
            return Ok(ScopeOutcome::Audited(audit::audit(&remote, store.ledger(), &files)));
        }

        if self.options.force {
            tracing::info!("Force processing {}", scope);
        } else if looks_synced(&files, remote.len(), store.ledger().photos.len()) {
            tracing::info!("Skipping {}. Found {} existing files", scope, files.len());
            return Ok(ScopeOutcome::Skipped);
        } else {
            tracing::info!(
                "Processing {}. Found {} files on disk, {} in the ledger and {} on Flickr",
                scope,
                files.len(),
                store.ledger().photos.len(),
                remote.len()
            );
        }

        let mut stats = SyncStats::default();
        let pb = create_progress_bar(self.options.no_progress_bar, remote.len() as u64);
        let mut items: Vec<&RemoteItem> = remote.values().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        for item in items {
            self.sync_item(item, &dir, &mut store, &mut stats, &pb).await?;
            pb.inc(1);
        }
        pb.finish_and_clear();

        // Only after every remote item is recorded, so a replacement lands
        // before its predecessor is removed.
        self.remove_orphans(&remote, &dir, &mut store, &mut stats).await?;

        Ok(ScopeOutcome::Synced(stats))
    }

    async fn sync_item(
        &self,
        item: &RemoteItem,
        dir: &Path,
        store: &mut LedgerStore,
        stats: &mut SyncStats,
        pb: &ProgressBar,
    ) -> Result<()> {
        let Some(source) = self.resolve_source(item).await? else {
            pb.suspend(|| {
                tracing::warn!(
                    "Could not get original size for {} `{}' ({}). Skipping it for now",
                    item.kind,
                    item.title,
                    item.id
                )
            });
            stats.skipped += 1;
            return Ok(());
        };

        let entry = LedgerEntry {
            photo_id: item.id.clone(),
            title: item.title.clone(),
            filename: source.filename.clone(),
        };

        // A filename is owned by one item; drop a stale claim by another id.
        if store
            .ledger()
            .photos
            .iter()
            .any(|e| e.filename == entry.filename && e.photo_id != entry.photo_id)
        {
            store.remove_by_filename(&entry.filename)?;
        }

        let path = dir.join(&source.filename);
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check {}", path.display()))?;
        if exists {
            tracing::debug!("Media existed at {}", path.display());
            if store.ledger().get(&entry.photo_id) != Some(&entry) {
                stats.repaired += 1;
            }
            store.add_or_update(entry)?;
            return Ok(());
        }

        let bytes = self
            .api
            .download(&source.url)
            .await
            .with_context(|| format!("Failed to download {} `{}'", item.kind, item.id))?;
        file::write_file(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        store.add_or_update(entry)?;
        stats.downloaded += 1;
        pb.suspend(|| {
            tracing::info!("Saved {} `{}' to {}", item.kind, item.title, path.display())
        });
        Ok(())
    }

    /// Listing URLs are used when present; otherwise one size lookup.
    async fn resolve_source(&self, item: &RemoteItem) -> Result<Option<Source>, FlickrError> {
        let urls = if item.has_inline_original() {
            OriginalUrls {
                photo: item.photo_url.clone(),
                video: item.video_url.clone(),
            }
        } else {
            self.api.original_urls(&item.id).await?
        };
        Ok(source_for(&item.id, &urls))
    }

    async fn remove_orphans(
        &self,
        remote: &HashMap<String, RemoteItem>,
        dir: &Path,
        store: &mut LedgerStore,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let orphans: Vec<LedgerEntry> = store
            .ledger()
            .photos
            .iter()
            .filter(|e| !remote.contains_key(&e.photo_id))
            .cloned()
            .collect();

        for entry in orphans {
            let path = dir.join(&entry.filename);
            tracing::info!(
                "Deleting media id `{}' at `{}'",
                entry.photo_id,
                path.display()
            );
            file::remove_file_best_effort(&path).await;
            store.remove_by_id(&entry.photo_id)?;
            stats.deleted += 1;
        }
        Ok(())
    }
}

/// Videos are saved as `<id>.mov`; photos keep the name Flickr serves them
/// under. `None` when there is nothing to download.
fn source_for(id: &str, urls: &OriginalUrls) -> Option<Source> {
    if let Some(video) = &urls.video {
        return Some(Source {
            url: video.clone(),
            filename: format!("{id}.mov"),
        });
    }
    let photo = urls.photo.as_ref()?;
    let filename = paths::filename_from_url(photo);
    if filename.is_empty() {
        return None;
    }
    Some(Source {
        url: photo.clone(),
        filename: filename.to_string(),
    })
}

/// One file per remote item plus the ledger, and one ledger entry per item.
fn looks_synced(files: &BTreeSet<String>, remote: usize, ledger: usize) -> bool {
    files.len() == remote + 1 && remote == ledger
}

fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}
