//! Rate-limited fetch path shared by every outbound request.
//!
//! All traffic (API calls, OAuth handshake, media downloads) funnels through a
//! single [`Fetcher`]. It owns the one "last dispatch" timestamp that keeps the
//! tool at no more than one request per second, and it re-signs and retries a
//! request whenever Flickr answers with its sporadic `signature_invalid` error.

pub mod error;

pub use error::FetchError;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::retry::{self, RetryAction, RetryConfig};

/// Body substring Flickr returns when it rejects a request signature.
pub const SIGNATURE_INVALID_MARKER: &[u8] = b"oauth_problem=signature_invalid";

/// Raw outcome of a single GET: status code and the full body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal HTTP seam used by the fetcher.
/// The production implementation is `reqwest::Client`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError> {
        let response = reqwest::Client::get(self, url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Enforces a minimum spacing between consecutive dispatches.
///
/// The lock is held across the sleep, so callers are strictly serialized on
/// the single shared timestamp.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Wait until a request may be dispatched, then record the dispatch time.
    pub async fn acquire(&self) {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                tracing::debug!(
                    "Sleeping for {}ms before making another request",
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Tuning knobs for the fetcher. Defaults follow Flickr's API terms.
#[derive(Debug, Clone, Copy)]
pub struct FetcherConfig {
    pub min_interval: Duration,
    pub retry: RetryConfig,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            retry: RetryConfig::default(),
        }
    }
}

pub struct Fetcher {
    transport: Box<dyn Transport>,
    limiter: RateLimiter,
    retry: RetryConfig,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("limiter", &self.limiter)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>, config: FetcherConfig) -> Self {
        Self {
            transport,
            limiter: RateLimiter::new(config.min_interval),
            retry: config.retry,
        }
    }

    /// Fetch the body produced by `url_for_attempt`.
    ///
    /// `url_for_attempt` is called once per attempt with the 0-indexed attempt
    /// number, so every retry carries a freshly generated nonce and timestamp.
    /// When the signature marker outlives the retry budget the last body is
    /// returned unchanged and the caller's parser reports it.
    pub async fn fetch<F>(&self, url_for_attempt: F) -> Result<Vec<u8>, FetchError>
    where
        F: Fn(u32) -> String,
    {
        let result = retry::retry_with_backoff(
            &self.retry,
            |e: &FetchError| {
                if e.is_retryable() {
                    RetryAction::Retry
                } else {
                    RetryAction::Abort
                }
            },
            |attempt| {
                let url = url_for_attempt(attempt);
                async move { self.dispatch(&url).await }
            },
        )
        .await;

        match result {
            Err(FetchError::SignatureInvalid(body)) => {
                tracing::warn!(
                    "Signature still rejected after {} retries, giving up",
                    self.retry.max_retries
                );
                Ok(body)
            }
            other => other,
        }
    }

    async fn dispatch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.limiter.acquire().await;
        tracing::debug!("GET {}", url);

        let response = self.transport.get(url).await?;
        if contains_marker(&response.body) {
            return Err(FetchError::SignatureInvalid(response.body));
        }
        if !(200..300).contains(&response.status) {
            tracing::debug!(
                "Body for failed request: {}",
                String::from_utf8_lossy(&response.body)
            );
            return Err(FetchError::HttpStatus {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response.body)
    }
}

fn contains_marker(body: &[u8]) -> bool {
    body.windows(SIGNATURE_INVALID_MARKER.len())
        .any(|w| w == SIGNATURE_INVALID_MARKER)
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::testing::{ok, FakeTransport};
    use super::*;

    fn fetcher(transport: &FakeTransport) -> Fetcher {
        Fetcher::new(Box::new(transport.clone()), FetcherConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_requests_are_spaced_one_second_apart() {
        let transport = FakeTransport::new(|_| ok("body"));
        let fetcher = fetcher(&transport);

        let start = Instant::now();
        fetcher.fetch(|_| "https://a/1".to_string()).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(10));

        fetcher.fetch(|_| "https://a/2".to_string()).await.unwrap();
        fetcher.fetch(|_| "https://a/3".to_string()).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "elapsed {elapsed:?}");
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_once_interval_has_passed() {
        let transport = FakeTransport::new(|_| ok("body"));
        let fetcher = fetcher(&transport);

        fetcher.fetch(|_| "https://a/1".to_string()).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;

        let before = Instant::now();
        fetcher.fetch(|_| "https://a/2".to_string()).await.unwrap();
        assert!(before.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signature_invalid_is_retried_with_regenerated_url() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let transport = FakeTransport::new(move |_| {
            if c.fetch_add(1, Ordering::SeqCst) < 2 {
                TransportResponse {
                    status: 401,
                    body: b"oauth_problem=signature_invalid&debug_sbs=GET".to_vec(),
                }
            } else {
                ok("<rsp stat=\"ok\"/>")
            }
        });
        let fetcher = fetcher(&transport);

        let body = fetcher
            .fetch(|attempt| format!("https://api/rest?oauth_nonce={attempt}"))
            .await
            .unwrap();
        assert_eq!(body, b"<rsp stat=\"ok\"/>");
        assert_eq!(
            transport.requests(),
            vec![
                "https://api/rest?oauth_nonce=0",
                "https://api/rest?oauth_nonce=1",
                "https://api/rest?oauth_nonce=2",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_signature_invalid_returns_body_after_budget() {
        let transport = FakeTransport::new(|_| ok("oauth_problem=signature_invalid"));
        let fetcher = fetcher(&transport);

        let body = fetcher.fetch(|_| "https://api/rest".to_string()).await.unwrap();
        assert_eq!(body, b"oauth_problem=signature_invalid");
        // 1 initial + 10 retries
        assert_eq!(transport.requests().len(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_not_retried() {
        let transport = FakeTransport::new(|_| TransportResponse {
            status: 500,
            body: b"boom".to_vec(),
        });
        let fetcher = fetcher(&transport);

        let err = fetcher
            .fetch(|_| "https://live.staticflickr.com/1/42_abcd_o.jpg".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 500, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_contains_marker() {
        assert!(contains_marker(b"x=1&oauth_problem=signature_invalid&y=2"));
        assert!(!contains_marker(b"oauth_problem=token_rejected"));
        assert!(!contains_marker(b""));
    }
}
