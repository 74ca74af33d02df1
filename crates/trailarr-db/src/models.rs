//! Internal Rust models matching the database schema.
//!
//! These structures map to the `connections` and `media` tables, plus the
//! input shapes used by the bulk write queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trailarr_common::{ConnectionId, MediaId, MonitorStatus, SourceKind};

/// Registered remote connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    pub source_kind: SourceKind,
    pub url: String,
    pub added_at: DateTime<Utc>,
}

/// Persisted media record (movie or series).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: MediaId,
    pub connection_id: ConnectionId,
    /// Identifier of the item on its source (Arr id).
    pub remote_id: i64,
    pub is_movie: bool,
    pub title: String,
    pub year: i32,
    pub language: String,
    pub overview: Option<String>,
    pub runtime: i32,
    pub youtube_trailer_id: Option<String>,
    pub folder_path: Option<String>,
    pub imdb_id: Option<String>,
    pub txdb_id: Option<String>,
    pub plex_rating_key: Option<i64>,
    pub trailer_exists: bool,
    pub plex_trailer_exists: bool,
    pub monitor: bool,
    pub arr_monitored: bool,
    pub status: MonitorStatus,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub downloaded_at: Option<DateTime<Utc>>,
}

/// Input for a create-or-update keyed on `(connection_id, remote_id)`.
///
/// Tracking columns (`monitor`, `status`, `trailer_exists`, Plex fields) are
/// never written by an upsert; they belong to the status pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaUpsert {
    pub connection_id: ConnectionId,
    pub remote_id: i64,
    pub is_movie: bool,
    pub title: String,
    pub year: i32,
    pub language: String,
    pub overview: Option<String>,
    pub runtime: i32,
    pub youtube_trailer_id: Option<String>,
    pub folder_path: Option<String>,
    pub imdb_id: Option<String>,
    pub txdb_id: Option<String>,
    pub arr_monitored: bool,
}

/// Result row of a bulk upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertedMedia {
    pub media: Media,
    /// The row was inserted by this call rather than updated.
    pub is_new: bool,
}

/// Monitoring/status write produced by the filesystem status pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaStatusUpdate {
    pub id: MediaId,
    pub monitor: bool,
    pub status: MonitorStatus,
    pub trailer_exists: bool,
}

/// Write produced by the Plex pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlexMediaUpdate {
    pub id: MediaId,
    pub plex_rating_key: i64,
    pub plex_trailer_exists: bool,
}
