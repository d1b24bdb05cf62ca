//! flickrsync-rs — mirror a Flickr library to local storage.
//!
//! Every album becomes a directory holding its originals plus a
//! `metadata.json` ledger of which Flickr item each file came from. Runs are
//! incremental: new items are downloaded, items gone from Flickr are deleted,
//! and ledgers are repaired from what is already on disk. All requests go
//! through one OAuth-signing, one-request-per-second fetcher.

#![warn(clippy::all)]

mod auth;
mod cli;
mod config;
mod fetch;
mod flickr;
mod ledger;
mod report;
pub mod retry;
mod sync;
mod types;

use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use config::Config;
use fetch::{Fetcher, FetcherConfig};
use flickr::{FlickrApi, Scope};
use sync::{ScopeOutcome, SyncEngine, SyncOptions, SyncStats};

/// Open today's log file under the config directory, creating it if needed.
fn open_log_file(config: &Config) -> anyhow::Result<File> {
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;
    let path = log_dir.join(format!(
        "flickrsync-{}.log",
        chrono::Local::now().format("%Y%m%d")
    ));
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Console on stderr plus a plain-text copy in the daily log file.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let log_file = open_log_file(config)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

fn log_outcome(scope: &Scope, outcome: &ScopeOutcome) {
    match outcome {
        ScopeOutcome::Skipped => {}
        ScopeOutcome::Audited(report) if report.is_clean() => {
            tracing::info!("{}: no discrepancies", scope);
        }
        ScopeOutcome::Audited(report) => {
            tracing::info!("{}: {} discrepancies", scope, report.len());
        }
        ScopeOutcome::Synced(stats) => {
            tracing::info!(
                "{}: {} downloaded, {} repaired, {} skipped, {} deleted",
                scope,
                stats.downloaded,
                stats.repaired,
                stats.skipped,
                stats.deleted
            );
        }
    }
}

async fn run_sync(config: &Config) -> anyhow::Result<()> {
    let secrets = auth::Secrets::load(&config.secrets_path())?;

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let fetcher = Fetcher::new(Box::new(client), FetcherConfig::default());

    let credential = auth::load_or_authorize(&fetcher, &secrets, &config.credential_path()).await?;
    let api = FlickrApi::new(fetcher, credential.signer(&secrets));

    let scopes = api
        .scopes(config.set_id.as_deref(), config.only_not_in_set)
        .await
        .context("Failed to resolve albums")?;
    tracing::info!("Processing {} scopes", scopes.len());

    let engine = SyncEngine::new(
        &api,
        &config.directory,
        SyncOptions {
            force: config.force,
            audit_only: config.audit_only,
            no_progress_bar: config.no_progress_bar,
        },
    );

    let started = Instant::now();
    let mut totals = SyncStats::default();
    let mut skipped_scopes = 0;
    let mut findings = 0;
    for scope in &scopes {
        let outcome = engine.process_scope(scope).await?;
        log_outcome(scope, &outcome);
        match outcome {
            ScopeOutcome::Skipped => skipped_scopes += 1,
            ScopeOutcome::Audited(report) => findings += report.len(),
            ScopeOutcome::Synced(stats) => {
                totals.downloaded += stats.downloaded;
                totals.repaired += stats.repaired;
                totals.skipped += stats.skipped;
                totals.deleted += stats.deleted;
            }
        }
    }

    tracing::info!("── Summary ──");
    if config.audit_only {
        tracing::info!("  {} discrepancies in {} scopes", findings, scopes.len());
    } else {
        tracing::info!(
            "  {} downloaded, {} repaired, {} without original, {} deleted",
            totals.downloaded,
            totals.repaired,
            totals.skipped,
            totals.deleted
        );
        tracing::info!("  {} of {} scopes already in sync", skipped_scopes, scopes.len());
    }
    tracing::info!("  elapsed: {}", format_duration(started.elapsed()));
    Ok(())
}

async fn run(config: &Config) -> anyhow::Result<()> {
    if config.count_only {
        report::log_count(&report::count_media(&config.directory));
        return Ok(());
    }
    if config.find_dupes {
        report::log_duplicates(&report::find_duplicates(&config.directory));
        return Ok(());
    }
    run_sync(config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = Config::from_cli(cli)?;
    init_logging(&config)?;
    tracing::debug!(?config, "Starting flickrsync-rs");

    if let Err(e) = run(&config).await {
        tracing::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 05s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
    }
}
