use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "dlcsync")]
#[command(about = "Resolve DLC containers under a directory tree and download their files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "DLCSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory to watch
    #[arg(long, global = true, env = "GAMES_DIR")]
    pub root: Option<PathBuf>,

    /// Milliseconds between scans
    #[arg(long = "interval", global = true, env = "SCAN_INTERVAL")]
    pub interval_ms: Option<u64>,

    /// Append-only log of failed links
    #[arg(long, global = true, env = "FAILED_LOG")]
    pub failure_log: Option<PathBuf>,

    /// Base URL of the decryption service
    #[arg(long, global = true, env = "DCRYPT_URL")]
    pub decrypt_url: Option<String>,

    /// Saved OAuth credentials (authorized_user JSON)
    #[arg(long, global = true, env = "TOKEN_PATH")]
    pub token_path: Option<PathBuf>,

    /// Fixed bearer token for the storage API
    #[arg(long, global = true, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Extra attempts per file after the first failure
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Descend into symlinked directories
    #[arg(long, global = true)]
    pub follow_symlinks: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scan the root forever on the configured interval (default)
    Watch,
    /// Scan the root once and exit
    Scan,
    /// Decrypt a container and print its links
    Decrypt {
        #[command(flatten)]
        source: DecryptSource,
    },
    /// Download every link listed in a file
    Download {
        /// Newline-separated list of links
        links_file: PathBuf,
        /// Destination directory
        #[arg(short, long, default_value = "downloads")]
        output: PathBuf,
    },
}

/// Where the container to decrypt comes from
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct DecryptSource {
    /// Path to a .dlc file
    pub file: Option<PathBuf>,

    /// URL of a hosted container
    #[arg(long)]
    pub link: Option<String>,

    /// File holding pasted container text
    #[arg(long, value_name = "FILE")]
    pub paste: Option<PathBuf>,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch)
    }

    /// Apply flags and environment over `base`.
    pub fn apply(&self, mut base: Config) -> Config {
        if let Some(root) = &self.root {
            base.root_dir = root.clone();
        }
        if let Some(interval) = self.interval_ms {
            base.scan_interval_ms = interval;
        }
        if let Some(log) = &self.failure_log {
            base.failure_log = log.clone();
        }
        if let Some(url) = &self.decrypt_url {
            base.decrypt_url = url.clone();
        }
        if let Some(path) = &self.token_path {
            base.token_path = path.clone();
        }
        if let Some(token) = &self.access_token {
            base.access_token = Some(token.clone());
        }
        if let Some(retries) = self.max_retries {
            base.max_retries = retries;
        }
        if self.follow_symlinks {
            base.follow_symlinks = true;
        }
        if self.no_progress {
            base.progress = false;
        }
        base
    }

    /// Defaults, then the config file (if any), then flags and environment.
    pub fn resolve_config(&self) -> Result<Config> {
        let base = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        self.apply(base).finalize()
    }
}
