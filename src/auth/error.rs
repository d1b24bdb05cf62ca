use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No OAuth secrets file found at {0}")]
    MissingSecrets(PathBuf),

    #[error("OAuth secrets file {0} is empty or has no consumer key/secret")]
    EmptySecrets(PathBuf),

    #[error("OAuth secrets file {path} is not valid JSON: {source}")]
    InvalidSecrets {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Flickr did not confirm the callback: {0}")]
    CallbackNotConfirmed(String),

    #[error("No {field} in {step} response: {body}")]
    MissingField {
        step: &'static str,
        field: &'static str,
        body: String,
    },

    #[error("No verification code entered")]
    EmptyVerifier,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
