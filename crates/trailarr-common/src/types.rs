//! Core type definitions for connections and media records.
//!
//! All enums serialize in lowercase, which is also the form stored in the
//! database and accepted in the configuration file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of remote media source a connection talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Radarr movie manager.
    Radarr,
    /// Sonarr series manager.
    Sonarr,
    /// Plex media server.
    Plex,
}

impl SourceKind {
    /// Whether this source is an authoritative Arr catalog.
    pub fn is_arr(self) -> bool {
        matches!(self, Self::Radarr | Self::Sonarr)
    }

    /// Application name reported by the source's status endpoint.
    pub fn app_name(self) -> &'static str {
        match self {
            Self::Radarr => "Radarr",
            Self::Sonarr => "Sonarr",
            Self::Plex => "Plex",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radarr => write!(f, "radarr"),
            Self::Sonarr => write!(f, "sonarr"),
            Self::Plex => write!(f, "plex"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "radarr" => Ok(Self::Radarr),
            "sonarr" => Ok(Self::Sonarr),
            "plex" => Ok(Self::Plex),
            _ => Err(format!("Invalid source kind: {}", s)),
        }
    }
}

/// Policy governing when a trailer should be monitored for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMode {
    /// Monitor every item that has no trailer.
    Missing,
    /// Monitor only items first seen in the current cycle.
    New,
    /// Never monitor.
    None,
    /// Mirror the remote application's own monitored flag.
    Sync,
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::New => write!(f, "new"),
            Self::None => write!(f, "none"),
            Self::Sync => write!(f, "sync"),
        }
    }
}

impl FromStr for MonitorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "missing" => Ok(Self::Missing),
            "new" => Ok(Self::New),
            "none" => Ok(Self::None),
            "sync" => Ok(Self::Sync),
            _ => Err(format!("Invalid monitor mode: {}", s)),
        }
    }
}

/// Lifecycle status of a media record's trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    /// Trailer wanted, not yet on disk.
    Monitored,
    /// No trailer and not monitored.
    Missing,
    /// A download is in progress.
    Downloading,
    /// A trailer exists.
    Downloaded,
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monitored => write!(f, "monitored"),
            Self::Missing => write!(f, "missing"),
            Self::Downloading => write!(f, "downloading"),
            Self::Downloaded => write!(f, "downloaded"),
        }
    }
}

impl FromStr for MonitorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monitored" => Ok(Self::Monitored),
            "missing" => Ok(Self::Missing),
            "downloading" => Ok(Self::Downloading),
            "downloaded" => Ok(Self::Downloaded),
            _ => Err(format!("Invalid monitor status: {}", s)),
        }
    }
}
