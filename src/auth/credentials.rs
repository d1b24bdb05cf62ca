use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::AuthError;
use crate::flickr::Signer;

/// App credentials issued by Flickr. Read-only.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Secrets {
    pub consumer_key: String,
    pub secret: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("consumer_key", &self.consumer_key)
            .field("secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl Secrets {
    /// Load and validate the secrets file. Fails before anything touches the
    /// network if it is missing, empty, or lacks either half of the pair.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::MissingSecrets(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(AuthError::EmptySecrets(path.to_path_buf()));
        }
        let secrets: Secrets =
            serde_json::from_slice(&bytes).map_err(|source| AuthError::InvalidSecrets {
                path: path.to_path_buf(),
                source,
            })?;
        if secrets.consumer_key.is_empty() || secrets.secret.is_empty() {
            return Err(AuthError::EmptySecrets(path.to_path_buf()));
        }
        Ok(secrets)
    }

    /// Signer for the app alone, before a user token exists.
    pub fn signer(&self) -> Signer {
        Signer::new(&self.consumer_key, &self.secret)
    }
}

/// Cached user authorization.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "FullName", default)]
    pub full_name: String,
    #[serde(rename = "OAuthToken", default)]
    pub oauth_token: String,
    #[serde(rename = "OAuthTokenSecret", default)]
    pub oauth_token_secret: String,
    #[serde(rename = "UserNSID", default)]
    pub user_nsid: String,
    #[serde(rename = "Username", default)]
    pub username: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("full_name", &self.full_name)
            .field("oauth_token", &"<redacted>")
            .field("oauth_token_secret", &"<redacted>")
            .field("user_nsid", &self.user_nsid)
            .field("username", &self.username)
            .finish()
    }
}

impl Credential {
    /// The cached credential, or `None` if there is none with a token.
    pub fn load(path: &Path) -> Result<Option<Self>, AuthError> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let credential: Credential = serde_json::from_slice(&bytes)?;
        if credential.oauth_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(credential))
    }

    /// Write the credential, readable by the owner only.
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec(self)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!("Saved credentials to {}", path.display());
        Ok(())
    }

    /// Signer for API calls made on the user's behalf.
    pub fn signer(&self, secrets: &Secrets) -> Signer {
        secrets
            .signer()
            .with_token(&self.oauth_token, &self.oauth_token_secret)
    }
}
