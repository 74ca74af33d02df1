//! Clients for the remote media sources.
//!
//! Each source kind has one client implementing [`MediaSource`]. The client
//! for a connection is picked once by [`create_source`]; callers never branch
//! on the source kind again after that.

pub mod arr;
pub mod plex;
mod request;

pub use arr::{RadarrClient, SonarrClient};
pub use plex::PlexClient;

use crate::config::ConnectionConfig;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use trailarr_common::SourceKind;

/// Failure talking to a remote source.
///
/// Messages never contain the connection's API key or token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Refused connection, malformed host or a non-success status code.
    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Timeout(String),

    /// The body was not JSON or lacked the fields identifying the source.
    #[error("{0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection failure",
            Self::Timeout(_) => "timeout",
            Self::InvalidResponse(_) => "invalid response",
        }
    }
}

/// A remote catalog of movies or series.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    /// Check the source is reachable and is what it claims to be.
    ///
    /// Returns a human readable status line including the source version.
    async fn system_status(&self) -> Result<String, RemoteError>;

    /// Fetch every media record the source knows about, unparsed.
    async fn all_media(&self) -> Result<Vec<Value>, RemoteError>;
}

/// Plex adds trailer lookups on top of the media listing.
#[async_trait::async_trait]
pub trait PlexSource: MediaSource {
    /// Whether Plex has at least one trailer extra for the item.
    async fn has_trailers(&self, rating_key: i64) -> Result<bool, RemoteError>;
}

/// Client for one configured connection.
#[derive(Clone)]
pub enum Source {
    Arr(Arc<dyn MediaSource>),
    Plex(Arc<dyn PlexSource>),
}

impl Source {
    pub async fn system_status(&self) -> Result<String, RemoteError> {
        match self {
            Self::Arr(source) => source.system_status().await,
            Self::Plex(source) => source.system_status().await,
        }
    }
}

/// Create the client matching the connection's source kind
pub fn create_source(config: &ConnectionConfig, timeout: Duration) -> Source {
    match config.kind {
        SourceKind::Radarr => Source::Arr(Arc::new(RadarrClient::new(config, timeout))),
        SourceKind::Sonarr => Source::Arr(Arc::new(SonarrClient::new(config, timeout))),
        SourceKind::Plex => Source::Plex(Arc::new(PlexClient::new(config, timeout))),
    }
}
