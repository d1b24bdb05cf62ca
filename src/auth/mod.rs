//! App secrets, the cached user credential, and the handshake that produces
//! it when there is none.

pub mod credentials;
pub mod error;
pub mod handshake;

use std::path::Path;

use anyhow::{Context, Result};

pub use credentials::{Credential, Secrets};

use crate::fetch::Fetcher;

/// Return the cached credential, or run the handshake and cache its result.
pub async fn load_or_authorize(
    fetcher: &Fetcher,
    secrets: &Secrets,
    credential_path: &Path,
) -> Result<Credential> {
    if let Some(credential) = Credential::load(credential_path)
        .with_context(|| format!("Failed to read {}", credential_path.display()))?
    {
        tracing::info!("Using credentials for user: {}", credential.username);
        return Ok(credential);
    }

    tracing::info!("No cached credentials, starting OAuth authorization");
    let credential = handshake::authorize(
        fetcher,
        secrets,
        &handshake::Endpoints::default(),
        handshake::prompt_for_verifier,
    )
    .await
    .context("Could not complete OAuth setup")?;
    credential
        .save(credential_path)
        .with_context(|| format!("Failed to save {}", credential_path.display()))?;
    Ok(credential)
}
