use std::path::PathBuf;

use crate::types::LogLevel;

const SECRETS_FILE_NAME: &str = "oauth-secrets.json";
const CREDENTIAL_FILE_NAME: &str = "oauth.json";
const LOG_DIR_NAME: &str = "logs";

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub directory: PathBuf,
    pub config_directory: PathBuf,
    pub set_id: Option<String>,
    pub log_level: LogLevel,
    pub force: bool,
    pub audit_only: bool,
    pub count_only: bool,
    pub find_dupes: bool,
    pub only_not_in_set: bool,
    pub no_progress_bar: bool,
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_cli(cli: crate::cli::Cli) -> anyhow::Result<Self> {
        if cli.directory.trim().is_empty() {
            anyhow::bail!("--directory must not be empty");
        }
        let set_id = cli.set_id.filter(|id| !id.trim().is_empty());

        Ok(Self {
            directory: expand_tilde(&cli.directory),
            config_directory: expand_tilde(&cli.config_directory),
            set_id,
            log_level: cli.log_level,
            force: cli.force,
            audit_only: cli.audit_only,
            count_only: cli.count_only,
            find_dupes: cli.find_dupes,
            only_not_in_set: cli.only_not_in_set,
            no_progress_bar: cli.no_progress_bar,
        })
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.config_directory.join(SECRETS_FILE_NAME)
    }

    pub fn credential_path(&self) -> PathBuf {
        self.config_directory.join(CREDENTIAL_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config_directory.join(LOG_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> anyhow::Result<Config> {
        let mut argv = vec!["flickrsync-rs"];
        argv.extend_from_slice(args);
        Config::from_cli(crate::cli::Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let result = expand_tilde("~/Pictures");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("Pictures"));
        }
    }

    #[test]
    fn test_expand_tilde_no_prefix() {
        assert_eq!(
            expand_tilde("/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            expand_tilde("relative/path"),
            PathBuf::from("relative/path")
        );
    }

    #[test]
    fn test_derived_paths() {
        let cfg = config(&["-d", "/photos", "--config-directory", "/etc/flickrsync"]).unwrap();
        assert_eq!(cfg.directory, PathBuf::from("/photos"));
        assert_eq!(
            cfg.secrets_path(),
            PathBuf::from("/etc/flickrsync/oauth-secrets.json")
        );
        assert_eq!(
            cfg.credential_path(),
            PathBuf::from("/etc/flickrsync/oauth.json")
        );
        assert_eq!(cfg.log_dir(), PathBuf::from("/etc/flickrsync/logs"));
    }

    #[test]
    fn test_blank_values_rejected_or_dropped() {
        assert!(config(&["-d", "  "]).is_err());
        let cfg = config(&["-d", "/photos", "-s", ""]).unwrap();
        assert_eq!(cfg.set_id, None);
    }
}
