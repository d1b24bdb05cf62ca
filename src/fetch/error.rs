use thiserror::Error;

/// Failures of a single outbound request.
///
/// None of these are retried: only the `signature_invalid` marker inside an
/// otherwise successful body is, and that never surfaces as an error.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Raised by the retry loop while the signature marker persists; the
    /// fetcher unwraps it back into a body once the budget is spent.
    #[error("Invalid OAuth signature reported by the server")]
    SignatureInvalid(Vec<u8>),
}

impl FetchError {
    /// Whether a fresh, re-signed attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::SignatureInvalid(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_invalid_retryable() {
        let e = FetchError::SignatureInvalid(b"oauth_problem=signature_invalid".to_vec());
        assert!(e.is_retryable());
    }

    #[test]
    fn test_http_status_not_retryable() {
        for status in [401, 404, 500, 503] {
            let e = FetchError::HttpStatus {
                status,
                url: "x".into(),
            };
            assert!(!e.is_retryable(), "status {status} must not be retried");
        }
    }

    #[test]
    fn test_transport_not_retryable() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = rt
            .block_on(reqwest::Client::new().get("http://127.0.0.1:1").send())
            .unwrap_err();
        let e = FetchError::Transport {
            url: "http://127.0.0.1:1".into(),
            source: err,
        };
        assert!(!e.is_retryable());
    }
}
