use thiserror::Error;

use crate::fetch::FetchError;

#[derive(Error, Debug)]
pub enum FlickrError {
    #[error("Flickr API error for {method}: {message} (code: {code})")]
    Api {
        method: String,
        code: String,
        message: String,
    },

    /// Neither the expected document nor a Flickr `<err>`; usually a signature
    /// rejection that outlived the retry budget.
    #[error("Could not parse response for {method} from {url}")]
    UnexpectedResponse {
        method: String,
        url: String,
        body: String,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
