//! One-time OAuth 1.0a authorization: request token, user approval in the
//! browser, access-token exchange.

use std::collections::HashMap;
use std::io::{self, Write};

use super::credentials::{Credential, Secrets};
use super::error::AuthError;
use crate::fetch::Fetcher;
use crate::flickr::oauth::percent_encode;

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub request_token: String,
    pub authorize: String,
    pub access_token: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            request_token: "https://www.flickr.com/services/oauth/request_token".to_string(),
            authorize: "https://www.flickr.com/services/oauth/authorize".to_string(),
            access_token: "https://www.flickr.com/services/oauth/access_token".to_string(),
        }
    }
}

/// Split an `a=b&c=d` body into decoded pairs.
fn parse_form(body: &[u8]) -> HashMap<String, String> {
    String::from_utf8_lossy(body)
        .trim()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| {
            let decode = |s: &str| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            };
            (decode(k), decode(v))
        })
        .collect()
}

fn required(
    form: &mut HashMap<String, String>,
    step: &'static str,
    field: &'static str,
    body: &[u8],
) -> Result<String, AuthError> {
    match form.remove(field) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AuthError::MissingField {
            step,
            field,
            body: String::from_utf8_lossy(body).into_owned(),
        }),
    }
}

/// Run the handshake. `read_verifier` is shown the authorization URL and
/// returns the code the user typed.
pub async fn authorize<F, Fut>(
    fetcher: &Fetcher,
    secrets: &Secrets,
    endpoints: &Endpoints,
    read_verifier: F,
) -> Result<Credential, AuthError>
where
    F: FnOnce(String) -> Fut,
    Fut: std::future::Future<Output = Result<String, AuthError>>,
{
    let app = secrets.signer();
    let body = fetcher
        .fetch(|_| app.signed_url(&endpoints.request_token, &[("oauth_callback", "oob")]))
        .await?;
    let mut form = parse_form(&body);
    if form.get("oauth_callback_confirmed").map(String::as_str) != Some("true") {
        let body = String::from_utf8_lossy(&body).into_owned();
        tracing::error!("Bad request-token response: {}", body);
        return Err(AuthError::CallbackNotConfirmed(body));
    }
    let request_token = required(&mut form, "request-token", "oauth_token", &body)?;
    let request_secret = required(&mut form, "request-token", "oauth_token_secret", &body)?;

    let authorize_url = format!(
        "{}?perms=read&oauth_token={}",
        endpoints.authorize,
        percent_encode(&request_token)
    );
    let verifier = read_verifier(authorize_url).await?;
    if verifier.is_empty() {
        return Err(AuthError::EmptyVerifier);
    }

    let user = secrets
        .signer()
        .with_token(&request_token, &request_secret);
    let body = fetcher
        .fetch(|_| {
            user.signed_url(
                &endpoints.access_token,
                &[("oauth_verifier", verifier.as_str())],
            )
        })
        .await?;
    let mut form = parse_form(&body);
    let credential = Credential {
        oauth_token: required(&mut form, "access-token", "oauth_token", &body)?,
        oauth_token_secret: required(&mut form, "access-token", "oauth_token_secret", &body)?,
        full_name: form.remove("fullname").unwrap_or_default(),
        user_nsid: form.remove("user_nsid").unwrap_or_default(),
        username: form.remove("username").unwrap_or_default(),
    };
    tracing::info!("Authorized as {}", credential.username);
    Ok(credential)
}

/// Open `url` in the browser (best effort), then read the code from stdin.
pub async fn prompt_for_verifier(url: String) -> Result<String, AuthError> {
    open_browser(&url);
    let code = tokio::task::spawn_blocking(move || {
        println!("Authorize the app on Flickr's site, then enter the code shown and press Return:");
        println!("{url}");
        print!("> ");
        io::stdout().flush()?;
        let mut code = String::new();
        io::stdin().read_line(&mut code)?;
        Ok::<String, io::Error>(code.trim().to_string())
    })
    .await
    .map_err(io::Error::other)??;
    Ok(code)
}

fn open_browser(url: &str) {
    let mut command = if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("rundll32.exe");
        c.arg("url.dll,FileProtocolHandler");
        c
    } else {
        std::process::Command::new("xdg-open")
    };
    if let Err(e) = command.arg(url).spawn() {
        tracing::debug!("Could not open a browser: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::fetch::testing::{instant_fetcher, ok, FakeTransport};

    fn secrets() -> Secrets {
        Secrets {
            consumer_key: "ck".into(),
            secret: "cs".into(),
        }
    }

    fn flickr() -> FakeTransport {
        FakeTransport::new(|url| {
            if url.starts_with("https://www.flickr.com/services/oauth/request_token?") {
                ok(
                    "oauth_callback_confirmed=true&oauth_token=72157-req&oauth_token_secret=reqsecret",
                )
            } else if url.starts_with("https://www.flickr.com/services/oauth/access_token?") {
                ok(
                    "fullname=Jane%20Doe&oauth_token=72157-acc&oauth_token_secret=accsecret&user_nsid=12345%40N00&username=jane\n",
                )
            } else {
                panic!("unexpected url {url}")
            }
        })
    }

    #[test]
    fn test_parse_form_decodes() {
        let form = parse_form(b"fullname=Jane%20Doe&user_nsid=1%40N00&empty=&novalue");
        assert_eq!(form["fullname"], "Jane Doe");
        assert_eq!(form["user_nsid"], "1@N00");
        assert_eq!(form["empty"], "");
        assert!(!form.contains_key("novalue"));
    }

    #[tokio::test]
    async fn test_full_handshake() {
        let transport = flickr();
        let fetcher = instant_fetcher(transport.clone());
        let shown = Arc::new(Mutex::new(String::new()));
        let s = shown.clone();

        let credential = authorize(&fetcher, &secrets(), &Endpoints::default(), |url| async move {
            *s.lock().unwrap() = url;
            Ok("123-456-789".to_string())
        })
        .await
        .unwrap();

        assert_eq!(
            *shown.lock().unwrap(),
            "https://www.flickr.com/services/oauth/authorize?perms=read&oauth_token=72157-req"
        );
        assert_eq!(
            credential,
            Credential {
                full_name: "Jane Doe".into(),
                oauth_token: "72157-acc".into(),
                oauth_token_secret: "accsecret".into(),
                user_nsid: "12345@N00".into(),
                username: "jane".into(),
            }
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].contains("oauth_callback=oob"));
        assert!(!requests[0].contains("oauth_token="));
        assert!(requests[1].contains("oauth_token=72157-req"));
        assert!(requests[1].contains("oauth_verifier=123-456-789"));
    }

    #[tokio::test]
    async fn test_authorize_url_encodes_request_token() {
        let transport = FakeTransport::new(|_| {
            ok(
                "oauth_callback_confirmed=true&oauth_token=72157-a%2Bb%2Fc&oauth_token_secret=reqsecret",
            )
        });
        let fetcher = instant_fetcher(transport.clone());
        let shown = Arc::new(Mutex::new(String::new()));
        let s = shown.clone();

        let _ = authorize(&fetcher, &secrets(), &Endpoints::default(), |url| async move {
            *s.lock().unwrap() = url;
            Err(AuthError::EmptyVerifier)
        })
        .await;

        assert_eq!(
            *shown.lock().unwrap(),
            "https://www.flickr.com/services/oauth/authorize?perms=read&oauth_token=72157-a%2Bb%2Fc"
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_callback_fails() {
        let transport = FakeTransport::new(|_| ok("oauth_problem=parameter_absent"));
        let fetcher = instant_fetcher(transport.clone());
        let err = authorize(&fetcher, &secrets(), &Endpoints::default(), |_| async {
            Ok("unused".to_string())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::CallbackNotConfirmed(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_access_token_fails() {
        let transport = FakeTransport::new(|url| {
            if url.contains("request_token") {
                ok("oauth_callback_confirmed=true&oauth_token=t&oauth_token_secret=s")
            } else {
                ok("oauth_problem=token_rejected")
            }
        });
        let fetcher = instant_fetcher(transport);
        let err = authorize(&fetcher, &secrets(), &Endpoints::default(), |_| async {
            Ok("code".to_string())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AuthError::MissingField {
                field: "oauth_token",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_verifier_stops_before_exchange() {
        let transport = flickr();
        let fetcher = instant_fetcher(transport.clone());
        let err = authorize(&fetcher, &secrets(), &Endpoints::default(), |_| async {
            Ok(String::new())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::EmptyVerifier));
        assert_eq!(transport.requests().len(), 1);
    }
}
