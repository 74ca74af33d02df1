use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use trailarr_common::{MonitorMode, SourceKind};

/// Shortest refresh interval the scheduler accepts.
pub const MIN_INTERVAL_MINS: u64 = 10;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directory holding the SQLite database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub trailer: TrailerConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            logging: LoggingConfig::default(),
            monitor: MonitorConfig::default(),
            trailer: TrailerConfig::default(),
            http: HttpConfig::default(),
            connections: Vec::new(),
        }
    }
}

impl Config {
    /// Path of the SQLite database inside `data_dir`.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("trailarr.db")
    }

    /// Look up a connection by name.
    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Connections that take part in refresh cycles.
    pub fn enabled_connections(&self) -> impl Iterator<Item = &ConnectionConfig> {
        self.connections.iter().filter(|c| c.enabled)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Run refresh cycles on a schedule
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minutes between refresh cycles (minimum 10)
    #[serde(default = "default_interval_mins")]
    pub interval_mins: u64,
}

fn default_interval_mins() -> u64 {
    60
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_mins: default_interval_mins(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_mins * 60)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrailerConfig {
    /// Also accept `<name>-trailer.<ext>` files next to the media
    #[serde(default = "default_true")]
    pub check_inline: bool,

    /// Refresh Plex connections (rating keys and Plex-side trailers)
    #[serde(default = "default_true")]
    pub check_plex: bool,
}

impl Default for TrailerConfig {
    fn default() -> Self {
        Self {
            check_inline: true,
            check_plex: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Per-request timeout for remote APIs
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ConnectionConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: SourceKind,

    pub url: String,

    /// Arr API key or Plex token
    pub api_key: String,

    #[serde(
        default = "default_monitor_mode",
        deserialize_with = "deserialize_monitor_mode"
    )]
    pub monitor: MonitorMode,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub path_mappings: Vec<PathMapping>,
}

fn default_monitor_mode() -> MonitorMode {
    MonitorMode::New
}

/// Accept any string for `monitor`; unknown values become `none`.
fn deserialize_monitor_mode<'de, D>(deserializer: D) -> Result<MonitorMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(coerce_monitor_mode(&raw))
}

/// Parse a monitor mode, falling back to [`MonitorMode::None`] with a warning.
pub fn coerce_monitor_mode(raw: &str) -> MonitorMode {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(
            "Invalid monitor mode '{}', falling back to '{}'",
            raw,
            MonitorMode::None
        );
        MonitorMode::None
    })
}

/// Folder prefix rewrite from the source's view of the filesystem to ours.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PathMapping {
    pub from: String,
    pub to: String,
}

fn default_true() -> bool {
    true
}
