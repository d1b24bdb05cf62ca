//! Offline reports over an existing mirror: media counts and duplicate file
//! names across album directories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ledger::LEDGER_FILE_NAME;

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "gif", "png"];
const VIDEO_EXTENSIONS: &[&str] = &["mov"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaCount {
    pub photos: usize,
    pub videos: usize,
}

impl MediaCount {
    pub fn total(&self) -> usize {
        self.photos + self.videos
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    /// File names seen more than once, with every path they were found at.
    pub duplicates: BTreeMap<String, Vec<PathBuf>>,
    pub count: MediaCount,
}

impl DuplicateReport {
    /// Copies beyond the first of every duplicated name.
    pub fn total_dupes(&self) -> usize {
        self.duplicates.values().map(|paths| paths.len() - 1).sum()
    }

    /// Media files once duplicates are discounted.
    pub fn real_count(&self) -> usize {
        self.count.total().saturating_sub(self.total_dupes())
    }
}

fn media_files(root: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| ext.eq_ignore_ascii_case(x)))
}

pub fn count_media(root: &Path) -> MediaCount {
    let mut count = MediaCount::default();
    for entry in media_files(root) {
        if has_extension(entry.path(), PHOTO_EXTENSIONS) {
            count.photos += 1;
        } else if has_extension(entry.path(), VIDEO_EXTENSIONS) {
            count.videos += 1;
        }
    }
    count
}

/// Group every non-ledger file under `root` by name. A photo that belongs to
/// several albums is mirrored once per album, so this is how many copies the
/// mirror holds.
pub fn find_duplicates(root: &Path) -> DuplicateReport {
    let mut by_name: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in media_files(root) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == LEDGER_FILE_NAME {
            continue;
        }
        by_name.entry(name).or_default().push(entry.into_path());
    }
    by_name.retain(|_, paths| paths.len() > 1);

    DuplicateReport {
        duplicates: by_name,
        count: count_media(root),
    }
}

pub fn log_count(count: &MediaCount) {
    tracing::info!(
        "Found {} media files, including duplicates (photos can be part of more than one album). ({} photos, {} videos)",
        count.total(),
        count.photos,
        count.videos
    );
}

pub fn log_duplicates(report: &DuplicateReport) {
    for (name, paths) in &report.duplicates {
        tracing::info!("File `{}' was found {} times", name, paths.len());
        for path in paths {
            tracing::info!("  {}", path.display());
        }
    }
    tracing::info!(
        "Total dupes: {}. Real count of media files: {}",
        report.total_dupes(),
        report.real_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("flickrsync")
            .join("report_tests")
            .join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_count_media_by_extension() {
        let root = test_dir("count");
        touch(&root, "20120101 A/1_a.jpg");
        touch(&root, "20120101 A/2_b.PNG");
        touch(&root, "20120101 A/3.mov");
        touch(&root, "20120101 A/metadata.json");
        touch(&root, "NO-SET/4_c.gif");
        touch(&root, "NO-SET/notes.txt");

        let count = count_media(&root);
        assert_eq!(count, MediaCount { photos: 3, videos: 1 });
        assert_eq!(count.total(), 4);
    }

    #[test]
    fn test_find_duplicates_across_albums() {
        let root = test_dir("dupes");
        touch(&root, "20120101 A/1_a.jpg");
        touch(&root, "20120101 A/2.mov");
        touch(&root, "20120101 A/metadata.json");
        touch(&root, "20130101 B/1_a.jpg");
        touch(&root, "20130101 B/metadata.json");
        touch(&root, "20140101 C/1_a.jpg");
        touch(&root, "20140101 C/2.mov");

        let report = find_duplicates(&root);
        assert_eq!(report.duplicates.len(), 2);
        assert_eq!(report.duplicates["1_a.jpg"].len(), 3);
        assert_eq!(report.duplicates["2.mov"].len(), 2);
        assert!(!report.duplicates.contains_key(LEDGER_FILE_NAME));
        assert_eq!(report.total_dupes(), 3);
        assert_eq!(report.count.total(), 5);
        assert_eq!(report.real_count(), 2);
    }

    #[test]
    fn test_empty_tree() {
        let root = test_dir("empty");
        let report = find_duplicates(&root);
        assert_eq!(report.total_dupes(), 0);
        assert_eq!(report.real_count(), 0);
    }
}
