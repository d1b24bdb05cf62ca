use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::flickr::Scope;

/// Local directory of a scope.
///
/// Albums are prefixed with their UTC creation date so directories sort the
/// way Flickr orders the albums; the unscoped pseudo-album is `NO-SET`.
pub fn scope_dir(root: &Path, scope: &Scope) -> PathBuf {
    match scope {
        Scope::Album(album) => {
            let created =
                DateTime::<Utc>::from_timestamp(album.date_created, 0).unwrap_or_default();
            root.join(format!(
                "{} {}",
                created.format("%Y%m%d"),
                clean_title(scope.title())
            ))
        }
        Scope::NotInSet => root.join(scope.title()),
    }
}

/// Remove characters that are invalid in file names on common platforms.
pub fn clean_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '>' | '<' | '?' | '"' | '|' | '*'))
        .collect()
}

/// Everything after the last `/` of a URL; empty if there is no `/`.
pub fn filename_from_url(url: &str) -> &str {
    url.rfind('/').map_or("", |i| &url[i + 1..])
}
