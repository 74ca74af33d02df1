//! Mapping of raw remote records into [`CanonicalMedia`].
//!
//! Parsing is pure and field-by-field: a record missing a required field, or
//! carrying it with the wrong shape, yields [`ParseError::MalformedRecord`]
//! naming the field. Optional fields fall back to defaults.

mod arr;
mod language;
mod plex;

pub use arr::{parse_radarr, parse_sonarr};
pub use language::language_code;
pub use plex::parse_plex;

use serde_json::Value;
use thiserror::Error;
use trailarr_common::{ConnectionId, SourceKind};
use trailarr_db::models::MediaUpsert;

/// A remote record in source-independent form.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalMedia {
    pub connection_id: ConnectionId,
    /// Arr `id` or Plex `ratingKey`.
    pub remote_id: i64,
    pub is_movie: bool,
    pub title: String,
    pub year: i32,
    /// ISO 639-1 code.
    pub language: String,
    pub overview: Option<String>,
    /// Minutes.
    pub runtime: i32,
    pub youtube_trailer_id: Option<String>,
    pub folder_path: Option<String>,
    pub imdb_id: Option<String>,
    /// TMDB id for movies, TVDB id for series.
    pub txdb_id: Option<String>,
    /// The source's own monitored flag.
    pub remote_monitored: bool,
}

impl CanonicalMedia {
    pub fn into_upsert(self) -> MediaUpsert {
        MediaUpsert {
            connection_id: self.connection_id,
            remote_id: self.remote_id,
            is_movie: self.is_movie,
            title: self.title,
            year: self.year,
            language: self.language,
            overview: self.overview,
            runtime: self.runtime,
            youtube_trailer_id: self.youtube_trailer_id,
            folder_path: self.folder_path,
            imdb_id: self.imdb_id,
            txdb_id: self.txdb_id,
            arr_monitored: self.remote_monitored,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed record: field '{field}' {reason}")]
    MalformedRecord { field: &'static str, reason: String },
}

impl ParseError {
    fn missing(field: &'static str) -> Self {
        Self::MalformedRecord {
            field,
            reason: "is missing".to_string(),
        }
    }

    fn wrong_type(field: &'static str, expected: &str) -> Self {
        Self::MalformedRecord {
            field,
            reason: format!("is not {}", expected),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MalformedRecord { field, .. } => *field,
        }
    }
}

/// Parse one raw record using the parser for the connection's source kind.
pub fn parse(
    kind: SourceKind,
    connection_id: ConnectionId,
    raw: &Value,
) -> Result<CanonicalMedia, ParseError> {
    match kind {
        SourceKind::Radarr => parse_radarr(connection_id, raw),
        SourceKind::Sonarr => parse_sonarr(connection_id, raw),
        SourceKind::Plex => parse_plex(connection_id, raw),
    }
}

/// The source identifier of a raw record, if it can be read.
///
/// Works on records that fail [`parse`], so a malformed entry can still be
/// tied to the row stored for it.
pub fn remote_id(kind: SourceKind, raw: &Value) -> Option<i64> {
    match kind {
        SourceKind::Radarr | SourceKind::Sonarr => required_i64(raw, "id").ok(),
        SourceKind::Plex => plex::rating_key(raw).ok(),
    }
}

fn field<'a>(raw: &'a Value, name: &'static str) -> Option<&'a Value> {
    raw.get(name).filter(|v| !v.is_null())
}

fn required_str(raw: &Value, name: &'static str) -> Result<String, ParseError> {
    match field(raw, name) {
        None => Err(ParseError::missing(name)),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ParseError::MalformedRecord {
            field: name,
            reason: "is empty".to_string(),
        }),
        Some(_) => Err(ParseError::wrong_type(name, "a string")),
    }
}

fn required_i64(raw: &Value, name: &'static str) -> Result<i64, ParseError> {
    match field(raw, name) {
        None => Err(ParseError::missing(name)),
        Some(v) => v.as_i64().ok_or_else(|| ParseError::wrong_type(name, "an integer")),
    }
}

fn required_year(raw: &Value) -> Result<i32, ParseError> {
    let year = required_i64(raw, "year")?;
    i32::try_from(year).map_err(|_| ParseError::wrong_type("year", "a valid year"))
}

/// A string field; absent, null, empty and wrongly typed all read as `None`.
fn optional_str(raw: &Value, name: &'static str) -> Option<String> {
    field(raw, name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_bool(raw: &Value, name: &'static str) -> bool {
    field(raw, name).and_then(Value::as_bool).unwrap_or(false)
}
