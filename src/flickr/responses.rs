//! Wire types for Flickr's XML `<rsp>` documents.
//!
//! Each struct matches exactly one response shape, so a failed parse doubles
//! as "this is not that kind of response". Unknown attributes and elements are
//! ignored.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{Album, MediaKind, RemoteItem};

pub fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, quick_xml::DeError> {
    quick_xml::de::from_reader(body)
}

/// `<rsp stat="fail"><err code=".." msg=".."/></rsp>`
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub err: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(rename = "@code")]
    pub code: String,
    #[serde(rename = "@msg", default)]
    pub msg: String,
}

/// `flickr.photosets.getList`
#[derive(Debug, Deserialize)]
pub struct PhotosetsResponse {
    pub photosets: Photosets,
}

#[derive(Debug, Deserialize)]
pub struct Photosets {
    #[serde(rename = "photoset", default)]
    pub sets: Vec<PhotosetElement>,
}

/// `flickr.photosets.getInfo`
#[derive(Debug, Deserialize)]
pub struct PhotosetInfoResponse {
    pub photoset: PhotosetElement,
}

#[derive(Debug, Deserialize)]
pub struct PhotosetElement {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@date_create", default)]
    pub date_create: i64,
    #[serde(rename = "@photos", default)]
    pub photos: u32,
    #[serde(rename = "@videos", default)]
    pub videos: u32,
    #[serde(default)]
    pub title: String,
}

impl From<PhotosetElement> for Album {
    fn from(set: PhotosetElement) -> Self {
        Album {
            id: set.id,
            title: set.title,
            date_created: set.date_create,
            photos: set.photos,
            videos: set.videos,
        }
    }
}

/// `flickr.photosets.getPhotos`
#[derive(Debug, Deserialize)]
pub struct PhotosetPhotosResponse {
    pub photoset: PhotoList,
}

/// `flickr.photos.getNotInSet`
#[derive(Debug, Deserialize)]
pub struct NotInSetResponse {
    pub photos: PhotoList,
}

#[derive(Debug, Deserialize)]
pub struct PhotoList {
    #[serde(rename = "photo", default)]
    pub photos: Vec<PhotoElement>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoElement {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@title", default)]
    pub title: String,
    #[serde(rename = "@media", default)]
    pub media: Option<String>,
    #[serde(rename = "@url_o", default)]
    pub url_o: Option<String>,
}

impl From<PhotoElement> for RemoteItem {
    fn from(photo: PhotoElement) -> Self {
        let kind = MediaKind::from_media_attr(photo.media.as_deref());
        RemoteItem {
            id: photo.id,
            title: photo.title,
            kind,
            photo_url: photo.url_o.filter(|u| !u.is_empty()),
            video_url: None,
        }
    }
}

/// `flickr.photos.getSizes`
#[derive(Debug, Deserialize)]
pub struct SizesResponse {
    pub sizes: Sizes,
}

#[derive(Debug, Deserialize)]
pub struct Sizes {
    #[serde(rename = "size", default)]
    pub sizes: Vec<SizeElement>,
}

#[derive(Debug, Deserialize)]
pub struct SizeElement {
    #[serde(rename = "@label")]
    pub label: String,
    #[serde(rename = "@source")]
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_photoset_photos() {
        let body = br#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="ok">
<photoset id="72157" primary="1" owner="u" page="1" per_page="500" pages="1" total="2">
	<photo id="42" secret="abcd" server="1" farm="1" title="Beach" isprimary="1" media="photo" url_o="https://live.staticflickr.com/1/42_abcd_o.jpg" />
	<photo id="43" secret="efgh" server="1" farm="1" title="Waves" isprimary="0" media="video" url_o="https://live.staticflickr.com/1/43_efgh_o.jpg" />
</photoset>
</rsp>"#;
        let rsp: PhotosetPhotosResponse = parse(body).unwrap();
        let items: Vec<RemoteItem> = rsp.photoset.photos.into_iter().map(Into::into).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "42");
        assert_eq!(items[0].title, "Beach");
        assert_eq!(items[0].kind, MediaKind::Photo);
        assert_eq!(
            items[0].photo_url.as_deref(),
            Some("https://live.staticflickr.com/1/42_abcd_o.jpg")
        );
        assert_eq!(items[1].kind, MediaKind::Video);
        assert!(items[1].video_url.is_none());
    }

    #[test]
    fn test_parse_empty_photoset() {
        let body = br#"<rsp stat="ok"><photoset id="1" page="2" total="0"></photoset></rsp>"#;
        let rsp: PhotosetPhotosResponse = parse(body).unwrap();
        assert!(rsp.photoset.photos.is_empty());
    }

    #[test]
    fn test_parse_not_in_set() {
        let body = br#"<rsp stat="ok"><photos page="1" pages="1" perpage="500" total="1"><photo id="7" title="Lonely" media="photo" /></photos></rsp>"#;
        let rsp: NotInSetResponse = parse(body).unwrap();
        assert_eq!(rsp.photos.photos.len(), 1);
        let item: RemoteItem = rsp.photos.photos.into_iter().next().unwrap().into();
        assert_eq!(item.id, "7");
        assert!(item.photo_url.is_none());
    }

    #[test]
    fn test_error_response_is_not_a_listing() {
        let body = br#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="fail">
	<err code="1" msg="Photoset not found" />
</rsp>"#;
        assert!(parse::<PhotosetPhotosResponse>(body).is_err());
        let err: ErrorResponse = parse(body).unwrap();
        assert_eq!(err.err.code, "1");
        assert_eq!(err.err.msg, "Photoset not found");
    }

    #[test]
    fn test_listing_is_not_an_error_response() {
        let body = br#"<rsp stat="ok"><photoset id="1"><photo id="2" title="" /></photoset></rsp>"#;
        assert!(parse::<ErrorResponse>(body).is_err());
    }

    #[test]
    fn test_garbage_is_neither() {
        let body = b"oauth_problem=signature_invalid&debug_sbs=GET";
        assert!(parse::<PhotosetPhotosResponse>(body).is_err());
        assert!(parse::<ErrorResponse>(body).is_err());
    }

    #[test]
    fn test_parse_photosets_list() {
        let body = br#"<rsp stat="ok">
<photosets page="1" pages="1" perpage="2" total="2" cancreate="1">
	<photoset id="5" primary="2483" secret="abcdef" server="8" photos="4" videos="1" date_create="1356048000" date_update="1356048000">
		<title>Winter</title>
		<description>Snow</description>
	</photoset>
	<photoset id="4" primary="1234" secret="123456" server="8" photos="12" videos="0" date_create="1262304000" date_update="1262304000">
		<title>Spring</title>
		<description />
	</photoset>
</photosets>
</rsp>"#;
        let rsp: PhotosetsResponse = parse(body).unwrap();
        let albums: Vec<Album> = rsp.photosets.sets.into_iter().map(Into::into).collect();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].id, "5");
        assert_eq!(albums[0].title, "Winter");
        assert_eq!(albums[0].date_created, 1_356_048_000);
        assert_eq!(albums[0].photos, 4);
        assert_eq!(albums[0].videos, 1);
        assert_eq!(albums[1].title, "Spring");
    }

    #[test]
    fn test_parse_sizes() {
        let body = br#"<rsp stat="ok">
<sizes canblog="0" canprint="0" candownload="1">
	<size label="Square" width="75" height="75" source="https://live.staticflickr.com/1/43_s.jpg" url="https://www.flickr.com/photos/u/43/sizes/sq/" media="video" />
	<size label="Original" width="1920" height="1080" source="https://live.staticflickr.com/1/43_o.jpg" url="https://www.flickr.com/photos/u/43/sizes/o/" media="video" />
	<size label="Video Original" width="1920" height="1080" source="https://www.flickr.com/photos/u/43/play/orig/abc/" url="https://www.flickr.com/photos/u/43/" media="video" />
</sizes>
</rsp>"#;
        let rsp: SizesResponse = parse(body).unwrap();
        assert_eq!(rsp.sizes.sizes.len(), 3);
        assert_eq!(rsp.sizes.sizes[2].label, "Video Original");
        assert_eq!(
            rsp.sizes.sizes[2].source,
            "https://www.flickr.com/photos/u/43/play/orig/abc/"
        );
    }
}
