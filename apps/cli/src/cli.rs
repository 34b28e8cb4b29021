//! Command-line arguments

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use subscout_core::SelectionCriteria;
use subscout_engine::SessionConfig;

#[derive(Debug, Parser)]
#[command(
    name = "subscout",
    version,
    about = "Passive subdomain discovery across many data sources"
)]
pub struct Args {
    /// Domain(s) to enumerate
    #[arg(short, long = "domain", required_unless_present = "list_sources")]
    pub domains: Vec<String>,

    /// Sources to use (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Sources to exclude (comma-separated)
    #[arg(short = 'e', long = "exclude-sources", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Use every source, not only the defaults
    #[arg(long)]
    pub all: bool,

    /// Only use sources that support recursive enumeration
    #[arg(long)]
    pub recursive: bool,

    /// List available sources and exit
    #[arg(long)]
    pub list_sources: bool,

    /// Provider keys file (JSON map of source name to key list)
    #[arg(long = "provider-config", env = "SUBSCOUT_PROVIDER_CONFIG")]
    pub provider_config: Option<PathBuf>,

    /// Maximum enumeration time per domain, in seconds
    #[arg(long = "max-time", default_value_t = 600)]
    pub max_time: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// HTTP proxy for every request
    #[arg(long)]
    pub proxy: Option<String>,

    /// Maximum HTTP requests per second across all sources
    #[arg(long = "rate-limit")]
    pub rate_limit: Option<u32>,

    /// Print hosts as JSON lines with their source
    #[arg(long)]
    pub json: bool,

    /// Print per-source statistics after each domain
    #[arg(long)]
    pub stats: bool,

    /// Debug logging for subscout crates
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print hosts
    #[arg(long, conflicts_with = "verbose")]
    pub silent: bool,
}

impl Args {
    pub fn selection(&self) -> SelectionCriteria {
        SelectionCriteria::new()
            .with_sources(self.sources.iter().cloned())
            .excluding(self.exclude.iter().cloned())
            .with_use_all(self.all)
            .with_recursive_only(self.recursive)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            timeout: Duration::from_secs(self.timeout),
            proxy: self.proxy.clone(),
            rate_limit: self.rate_limit,
            ..SessionConfig::default()
        }
    }

    pub fn max_time(&self) -> Duration {
        Duration::from_secs(self.max_time)
    }
}
