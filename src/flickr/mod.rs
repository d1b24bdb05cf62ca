//! Flickr REST client: signed calls for albums, listings and size lookups,
//! all dispatched through the shared rate-limited [`Fetcher`].

mod enumerate;
pub mod error;
pub mod oauth;
pub mod responses;
pub mod types;

pub use error::FlickrError;
pub use oauth::Signer;
pub use types::{Album, OriginalUrls, RemoteItem, Scope};

use std::cell::RefCell;

use serde::de::DeserializeOwned;

use crate::fetch::{FetchError, Fetcher};
use responses::{ErrorResponse, PhotosetInfoResponse, PhotosetsResponse, SizesResponse};

pub const API_BASE_URL: &str = "https://api.flickr.com/services/rest";

const GET_SETS: &str = "flickr.photosets.getList";
const GET_SET_INFO: &str = "flickr.photosets.getInfo";
const GET_SIZES: &str = "flickr.photos.getSizes";

const ORIGINAL_LABEL: &str = "Original";
const VIDEO_ORIGINAL_LABEL: &str = "Video Original";

pub struct FlickrApi {
    fetcher: Fetcher,
    signer: Signer,
    base_url: String,
}

impl std::fmt::Debug for FlickrApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrApi")
            .field("base_url", &self.base_url)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl FlickrApi {
    pub fn new(fetcher: Fetcher, signer: Signer) -> Self {
        Self {
            fetcher,
            signer,
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Call a REST method, returning the body and the URL of the last attempt.
    async fn call(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<(Vec<u8>, String), FlickrError> {
        let mut all_params: Vec<(&str, &str)> = vec![("format", "rest"), ("method", method)];
        all_params.extend_from_slice(params);

        let last_url = RefCell::new(String::new());
        let body = self
            .fetcher
            .fetch(|_| {
                let url = self.signer.signed_url(&self.base_url, &all_params);
                *last_url.borrow_mut() = url.clone();
                url
            })
            .await?;
        Ok((body, last_url.into_inner()))
    }

    /// Call a REST method and parse the expected document, turning a Flickr
    /// `<err>` into [`FlickrError::Api`].
    async fn call_parsed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FlickrError> {
        let (body, url) = self.call(method, params).await?;
        parse_or_api_error(method, &url, &body)
    }

    /// All photosets, oldest first so local directories sort the same way
    /// across runs.
    pub async fn albums(&self) -> Result<Vec<Album>, FlickrError> {
        let response: PhotosetsResponse = self.call_parsed(GET_SETS, &[]).await?;
        let mut albums: Vec<Album> = response
            .photosets
            .sets
            .into_iter()
            .map(Album::from)
            .collect();
        albums.sort_by_key(|a| a.date_created);
        tracing::debug!("Found {} albums", albums.len());
        Ok(albums)
    }

    pub async fn album_info(&self, album_id: &str) -> Result<Album, FlickrError> {
        let response: PhotosetInfoResponse = self
            .call_parsed(GET_SET_INFO, &[("photoset_id", album_id)])
            .await?;
        Ok(response.photoset.into())
    }

    /// Scopes to process, in order.
    ///
    /// Without a `set_id` every album is followed by the unscoped
    /// pseudo-album. An album missing from the list is looked up directly.
    pub async fn scopes(
        &self,
        set_id: Option<&str>,
        only_not_in_set: bool,
    ) -> Result<Vec<Scope>, FlickrError> {
        if only_not_in_set {
            return Ok(vec![Scope::NotInSet]);
        }

        let albums = self.albums().await?;
        let Some(set_id) = set_id else {
            let mut scopes: Vec<Scope> = albums.into_iter().map(Scope::Album).collect();
            scopes.push(Scope::NotInSet);
            return Ok(scopes);
        };

        match albums.into_iter().find(|a| a.id == set_id) {
            Some(album) => Ok(vec![Scope::Album(album)]),
            None => {
                tracing::debug!("Album {} not in the list, fetching it directly", set_id);
                Ok(vec![Scope::Album(self.album_info(set_id).await?)])
            }
        }
    }

    /// Look up the original photo and video URLs of one item.
    ///
    /// An unusable answer is logged and yields no URLs, which makes the
    /// caller skip the item rather than abort the whole run.
    pub async fn original_urls(&self, photo_id: &str) -> Result<OriginalUrls, FlickrError> {
        let (body, url) = self.call(GET_SIZES, &[("photo_id", photo_id)]).await?;
        let response: SizesResponse = match responses::parse(&body) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    "Could not parse sizes for {} from {}: {}. Body: {}",
                    photo_id,
                    url,
                    e,
                    String::from_utf8_lossy(&body)
                );
                return Ok(OriginalUrls::default());
            }
        };

        let mut urls = OriginalUrls::default();
        for size in response.sizes.sizes {
            match size.label.as_str() {
                ORIGINAL_LABEL => urls.photo = Some(size.source),
                VIDEO_ORIGINAL_LABEL => urls.video = Some(size.source),
                _ => {}
            }
        }
        Ok(urls)
    }

    /// Fetch a media URL. Static URLs are not signed.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetcher.fetch(|_| url.to_string()).await
    }
}

/// Parse `body` as `T`; failing that, as a Flickr error; failing that, log the
/// raw body and report an unexpected response.
fn parse_or_api_error<T: DeserializeOwned>(
    method: &str,
    url: &str,
    body: &[u8],
) -> Result<T, FlickrError> {
    match responses::parse::<T>(body) {
        Ok(parsed) => Ok(parsed),
        Err(parse_err) => match responses::parse::<ErrorResponse>(body) {
            Ok(rsp) => Err(FlickrError::Api {
                method: method.to_string(),
                code: rsp.err.code,
                message: rsp.err.msg,
            }),
            Err(_) => Err(unexpected_response(method, url, body, &parse_err)),
        },
    }
}

fn unexpected_response(
    method: &str,
    url: &str,
    body: &[u8],
    cause: &quick_xml::DeError,
) -> FlickrError {
    let body = String::from_utf8_lossy(body).into_owned();
    tracing::error!(
        "Could not unmarshal body for `{}' ({}): {}. Body: {}",
        url,
        method,
        cause,
        body
    );
    FlickrError::UnexpectedResponse {
        method: method.to_string(),
        url: url.to_string(),
        body,
    }
}
