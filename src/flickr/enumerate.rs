use std::collections::HashMap;

use super::responses::{
    self, ErrorResponse, NotInSetResponse, PhotoElement, PhotosetPhotosResponse,
};
use super::{unexpected_response, FlickrApi, FlickrError, RemoteItem, Scope};

/// Items requested per listing page.
pub const PAGE_SIZE: usize = 500;

/// Error code Flickr answers with once `page` runs past the last page.
const NO_MORE_RESULTS_CODE: &str = "1";

const LISTING_EXTRAS: &str = "media,url_o";

const GET_SET_PHOTOS: &str = "flickr.photosets.getPhotos";
const GET_NOT_IN_SET: &str = "flickr.photos.getNotInSet";

enum Page {
    Items(Vec<PhotoElement>),
    NoMoreResults,
}

impl FlickrApi {
    /// Every item of `scope`, keyed by id.
    ///
    /// Pages are requested until one comes back short or Flickr reports that
    /// the page is out of range. The second signal is the only one that ends a
    /// scope holding an exact multiple of [`PAGE_SIZE`] items.
    pub async fn enumerate(
        &self,
        scope: &Scope,
    ) -> Result<HashMap<String, RemoteItem>, FlickrError> {
        let method = match scope {
            Scope::Album(_) => GET_SET_PHOTOS,
            Scope::NotInSet => GET_NOT_IN_SET,
        };
        let per_page = PAGE_SIZE.to_string();

        let mut items = HashMap::new();
        let mut page_number = 1u32;
        loop {
            let page = page_number.to_string();
            let mut params = vec![
                ("extras", LISTING_EXTRAS),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ];
            if let Scope::Album(album) = scope {
                params.push(("photoset_id", album.id.as_str()));
            }

            tracing::debug!("Fetching page {} of {}", page_number, scope);
            let (body, url) = self.call(method, &params).await?;
            let photos = match parse_listing(scope, method, &url, &body)? {
                Page::Items(photos) => photos,
                Page::NoMoreResults => {
                    tracing::debug!("Page {} of {} is past the end", page_number, scope);
                    break;
                }
            };

            let count = photos.len();
            for photo in photos {
                let item = RemoteItem::from(photo);
                items.insert(item.id.clone(), item);
            }
            if count < PAGE_SIZE {
                break;
            }
            page_number += 1;
        }

        tracing::debug!("Found {} items in {}", items.len(), scope);
        Ok(items)
    }
}

fn parse_listing(scope: &Scope, method: &str, url: &str, body: &[u8]) -> Result<Page, FlickrError> {
    let listing = match scope {
        Scope::Album(_) => {
            responses::parse::<PhotosetPhotosResponse>(body).map(|rsp| rsp.photoset.photos)
        }
        Scope::NotInSet => responses::parse::<NotInSetResponse>(body).map(|rsp| rsp.photos.photos),
    };
    let parse_err = match listing {
        Ok(photos) => return Ok(Page::Items(photos)),
        Err(e) => e,
    };

    match responses::parse::<ErrorResponse>(body) {
        Ok(rsp) if rsp.err.code == NO_MORE_RESULTS_CODE => Ok(Page::NoMoreResults),
        Ok(rsp) => {
            tracing::error!(
                "Flickr error {} ({}) listing {} from {}",
                rsp.err.code,
                rsp.err.msg,
                scope,
                url
            );
            Err(FlickrError::Api {
                method: method.to_string(),
                code: rsp.err.code,
                message: rsp.err.msg,
            })
        }
        Err(_) => Err(unexpected_response(method, url, body, &parse_err)),
    }
}
