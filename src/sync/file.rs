use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tokio::fs;

/// Names of the regular files directly inside `dir`.
pub async fn list_files(dir: &Path) -> std::io::Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(e),
    };
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Write `bytes` to a `.part` sibling and rename it over `path`, so an
/// interrupted run never leaves a truncated file under the final name.
pub async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let part = part_path(path);
    fs::write(&part, bytes).await?;
    if let Err(e) = fs::rename(&part, path).await {
        let _ = fs::remove_file(&part).await;
        return Err(e);
    }
    Ok(())
}

/// Delete a file, ignoring one that is already gone.
pub async fn remove_file_best_effort(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} was already gone", path.display());
        }
        Err(e) => tracing::warn!("Could not delete {}: {}", path.display(), e),
    }
}
