use std::fmt;

/// Media kind reported by the listing's `media` extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Anything other than `"video"` (including a missing attribute) is a photo.
    pub fn from_media_attr(media: Option<&str>) -> Self {
        match media {
            Some(m) if m.eq_ignore_ascii_case("video") => MediaKind::Video,
            _ => MediaKind::Photo,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => f.write_str("photo"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// One photo or video as listed by Flickr. Rebuilt from the API on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub title: String,
    pub kind: MediaKind,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
}

impl RemoteItem {
    /// Whether the listing already carried the original URL for this kind,
    /// so no per-item size lookup is needed.
    pub fn has_inline_original(&self) -> bool {
        match self.kind {
            MediaKind::Photo => self.photo_url.is_some(),
            MediaKind::Video => self.video_url.is_some(),
        }
    }
}

/// Original-size URLs resolved through `flickr.photos.getSizes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalUrls {
    pub photo: Option<String>,
    pub video: Option<String>,
}

/// A Flickr photoset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub title: String,
    /// Unix seconds.
    pub date_created: i64,
    pub photos: u32,
    pub videos: u32,
}

/// Unit of synchronization: one album, or everything that belongs to none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Album(Album),
    NotInSet,
}

impl Scope {
    /// Title used for the directory and log lines of the unscoped pseudo-album.
    pub const NOT_IN_SET_TITLE: &'static str = "NO-SET";

    /// Identifier recorded as the ledger's `SetId`; empty for [`Scope::NotInSet`].
    pub fn id(&self) -> &str {
        match self {
            Scope::Album(album) => &album.id,
            Scope::NotInSet => "",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Scope::Album(album) => &album.title,
            Scope::NotInSet => Self::NOT_IN_SET_TITLE,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Album(album) => write!(f, "`{}' ({})", album.title, album.id),
            Scope::NotInSet => write!(f, "`{}'", Self::NOT_IN_SET_TITLE),
        }
    }
}
