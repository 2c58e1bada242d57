use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{level_filters::LevelFilter, trace, warn};

use crate::actors::scheduler::{SchedulerConfig, TriggerMinutes};
use crate::target::{Target, expand_targets, expand_url_list};
use crate::util::{DEFAULT_MINUTES, get_default_addr, get_default_port, get_default_timeout};

/// Command line arguments
///
/// Every option can also come from the environment (or a `.env` file) and, except for
/// the log level, from a JSON config file. Flags and environment win over the file.
#[derive(Clone, Parser)]
#[command(
    name = "psi-exporter",
    version,
    about = "Exports PageSpeed Insights results as Prometheus metrics"
)]
pub struct Args {
    /// Google PageSpeed Insights API key
    #[arg(long = "apikey", env = "PSI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Comma-separated list of URLs to monitor
    #[arg(long, env = "PSI_URLS")]
    pub urls: Option<String>,

    /// Comma-separated list of minutes in an hour to run fetch [default: 0,30]
    #[arg(long, env = "PSI_MINUTES")]
    pub minutes: Option<String>,

    /// Port to run the exporter on [default: 2112]
    #[arg(long, env = "PSI_PORT")]
    pub port: Option<u16>,

    /// Address to listen on [default: 0.0.0.0]
    #[arg(long, env = "PSI_ADDR")]
    pub addr: Option<IpAddr>,

    /// Fetch initial data
    #[arg(long, env = "PSI_INITIAL")]
    pub initial: bool,

    /// Timeout of a single PageSpeed request in seconds [default: 60]
    #[arg(long, env = "PSI_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "PSI_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// JSON config file
    #[arg(short = 'f', long = "config")]
    pub config: Option<PathBuf>,
}

/// Contents of the optional JSON config file
#[derive(Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub urls: Option<Vec<String>>,

    /// Minutes of the hour; values outside 0-59 are dropped
    pub minutes: Option<Vec<i64>>,
    pub port: Option<u16>,
    pub addr: Option<IpAddr>,
    pub initial: Option<bool>,

    /// Request timeout in seconds
    pub timeout: Option<u64>,
}

pub fn read_config_file(path: &Path) -> anyhow::Result<FileConfig> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|_| trace!("loaded config file {}", path.display()))
}

/// Fully resolved exporter configuration
#[derive(Clone)]
pub struct Config {
    pub api_key: String,

    /// Expanded (URL, strategy) pairs in sweep order
    pub targets: Vec<Target>,

    pub minutes: TriggerMinutes,

    pub bind_addr: SocketAddr,

    /// Run one sweep right after startup
    pub run_on_start: bool,

    pub request_timeout: Duration,
}

impl Config {
    /// Resolve the command line, reading the config file it points to
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let file = args
            .config
            .as_deref()
            .map(read_config_file)
            .transpose()?;
        Self::resolve(args, file)
    }

    /// Merge arguments over file values over defaults and validate the result
    ///
    /// Fails if no API key is available or no URL survives trimming.
    pub fn resolve(args: &Args, file: Option<FileConfig>) -> anyhow::Result<Self> {
        let file = file.unwrap_or_default();

        let Some(api_key) = args
            .api_key
            .clone()
            .or(file.api_key)
            .filter(|key| !key.trim().is_empty())
        else {
            bail!("an API key must be provided (--apikey or PSI_API_KEY)");
        };

        let targets = match (&args.urls, file.urls) {
            (Some(list), _) => expand_url_list(list),
            (None, Some(urls)) => expand_targets(urls),
            (None, None) => vec![],
        };
        if targets.is_empty() {
            bail!("at least one URL must be provided (--urls or PSI_URLS)");
        }

        let minutes = match (&args.minutes, file.minutes) {
            (Some(list), _) => TriggerMinutes::parse(list),
            (None, Some(values)) => TriggerMinutes::from_values(values),
            (None, None) => TriggerMinutes::parse(DEFAULT_MINUTES),
        };
        if minutes.is_empty() {
            warn!("no valid minutes specified, no scheduled fetch will occur");
        }

        let request_timeout = match args.timeout.or(file.timeout) {
            Some(0) => bail!("the request timeout must be at least one second"),
            Some(secs) => Duration::from_secs(secs),
            None => get_default_timeout(),
        };

        let ip = args.addr.or(file.addr).unwrap_or_else(get_default_addr);
        let port = args.port.or(file.port).unwrap_or_else(get_default_port);

        Ok(Self {
            api_key,
            targets,
            minutes,
            bind_addr: SocketAddr::new(ip, port),
            run_on_start: args.initial || file.initial.unwrap_or(false),
            request_timeout,
        })
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        let mut config = SchedulerConfig::new(self.targets.clone(), self.minutes.clone());
        config.run_on_start = self.run_on_start;
        config
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("targets", &self.targets)
            .field("minutes", &self.minutes)
            .field("bind_addr", &self.bind_addr)
            .field("run_on_start", &self.run_on_start)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
