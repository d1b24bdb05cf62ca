use clap::Parser;

use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "flickrsync-rs",
    about = "Mirror a Flickr library, album by album, to a local directory"
)]
pub struct Cli {
    /// Root directory of the local mirror
    #[arg(short = 'd', long)]
    pub directory: String,

    /// Only process the album with this id
    #[arg(short = 's', long, conflicts_with = "only_not_in_set")]
    pub set_id: Option<String>,

    /// Process albums even when they look fully synced
    #[arg(long)]
    pub force: bool,

    /// Report differences between Flickr, the ledgers and the disk without
    /// changing anything
    #[arg(long)]
    pub audit_only: bool,

    /// Count the photos and videos already mirrored, then exit
    #[arg(long, conflicts_with = "find_dupes")]
    pub count_only: bool,

    /// List files mirrored into more than one album, then exit
    #[arg(long)]
    pub find_dupes: bool,

    /// Only process media that belongs to no album
    #[arg(long)]
    pub only_not_in_set: bool,

    /// Directory holding OAuth secrets, cached credentials and logs
    #[arg(long, default_value = "~/.flickrsync-rs")]
    pub config_directory: String,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}
