use crate::error::{HostwatchError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub geoip: GeoIpConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    // Read-side endpoints carry no session auth; loopback unless fronted by a proxy
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8420
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default = "default_prune_interval")]
    pub prune_interval: String,
}

fn default_db_path() -> String {
    "/var/lib/hostwatch/hostwatch.db".to_string()
}

fn default_prune_interval() -> String {
    "6h".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            retention: RetentionConfig::default(),
            prune_interval: default_prune_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_metric_retention")]
    pub metrics: String,
    #[serde(default = "default_ban_event_retention")]
    pub ban_events: String,
}

fn default_metric_retention() -> String {
    "365d".to_string()
}

fn default_ban_event_retention() -> String {
    "90d".to_string()
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            metrics: default_metric_retention(),
            ban_events: default_ban_event_retention(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_geoip_url")]
    pub base_url: String,
    #[serde(default = "default_geoip_timeout")]
    pub timeout: String,
    #[serde(default = "default_geoip_cache_ttl")]
    pub cache_ttl: String,
}

fn default_true() -> bool {
    true
}

fn default_geoip_url() -> String {
    "http://ip-api.com".to_string()
}

fn default_geoip_timeout() -> String {
    "2s".to_string()
}

fn default_geoip_cache_ttl() -> String {
    "24h".to_string()
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_geoip_url(),
            timeout: default_geoip_timeout(),
            cache_ttl: default_geoip_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// A server with no ingestion inside this window reads as offline
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold: String,
    /// Serialize ban diff+append per server (exactly-once ban events)
    #[serde(default)]
    pub serialize_ban_writes: bool,
}

fn default_offline_threshold() -> String {
    "5m".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            offline_threshold: default_offline_threshold(),
            serialize_ban_writes: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Load configuration from a YAML file, substituting ${VAR} env references.
/// A missing file yields the built-in defaults.
pub fn load(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| HostwatchError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let content = substitute_env_vars(&content)?;
        serde_yaml::from_str(&content)
            .map_err(|e| HostwatchError::Config(format!("Failed to parse {}: {}", path.display(), e)))?
    } else {
        warn!(path = %path.display(), "Config file not found, using defaults");
        Config::default()
    };

    validate(&config)?;

    Ok(config)
}

/// Substitute ${VAR} patterns with environment variables
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let placeholder = &cap[0];

        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(placeholder, &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        for var in &missing_vars {
            let placeholder = format!("${{{}}}", var);
            result = result.replace(&placeholder, "");
        }
        warn!(missing = ?missing_vars, "Some environment variables are not set");
    }

    Ok(result)
}

/// Parse a humantime duration string from a named config field
pub fn parse_duration(value: &str, field: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| HostwatchError::Config(format!("Invalid duration for {}: {}", field, e)))
}

fn validate(config: &Config) -> Result<()> {
    config
        .server
        .bind
        .parse::<std::net::IpAddr>()
        .map_err(|_| HostwatchError::Config(format!("Invalid bind address: {}", config.server.bind)))?;

    if config.storage.db_path.is_empty() {
        return Err(HostwatchError::Config("storage.db_path must be set".to_string()));
    }

    if config.geoip.enabled && config.geoip.base_url.is_empty() {
        return Err(HostwatchError::Config(
            "geoip.base_url must be set when geoip is enabled".to_string(),
        ));
    }

    parse_duration(&config.geoip.timeout, "geoip.timeout")?;
    parse_duration(&config.geoip.cache_ttl, "geoip.cache_ttl")?;
    parse_duration(&config.ingest.offline_threshold, "ingest.offline_threshold")?;
    parse_duration(&config.storage.prune_interval, "storage.prune_interval")?;

    Ok(())
}
