use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "hostwatch",
    author,
    version,
    about = "Push-based server monitoring dashboard backend",
    long_about = None
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "/etc/hostwatch/config.yaml",
        env = "HOSTWATCH_CONFIG"
    )]
    pub config: PathBuf,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, env = "HOSTWATCH_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "HOSTWATCH_LOG_FORMAT")]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the server (default if no command specified)
    Run,

    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show current version
    Version,

    /// Register a monitored server and print its agent token (shown once)
    AddServer {
        /// Display name for the server
        #[arg(short, long)]
        name: String,

        /// Hostname of the monitored machine
        #[arg(long)]
        hostname: Option<String>,
    },

    /// Regenerate the agent token for a server (prints the new token once)
    RotateToken {
        /// Server id
        #[arg(short, long)]
        id: i64,
    },

    /// Delete metrics and ban events older than the retention cutoffs
    Prune {
        /// Override metric retention in days
        #[arg(long)]
        metric_days: Option<u32>,

        /// Override ban event retention in days
        #[arg(long)]
        ban_days: Option<u32>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

impl Cli {
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn effective_log_format(&self) -> &str {
        self.log_format.as_deref().unwrap_or("json")
    }
}
