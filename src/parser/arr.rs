use super::language::language_code;
use super::{optional_bool, optional_str, required_i64, required_str, required_year};
use super::{CanonicalMedia, ParseError};
use serde_json::Value;
use trailarr_common::ConnectionId;

/// Parse a Radarr `/api/v3/movie` entry.
pub fn parse_radarr(connection_id: ConnectionId, raw: &Value) -> Result<CanonicalMedia, ParseError> {
    parse_arr(connection_id, raw, true, "tmdbId")
}

/// Parse a Sonarr `/api/v3/series` entry.
pub fn parse_sonarr(connection_id: ConnectionId, raw: &Value) -> Result<CanonicalMedia, ParseError> {
    parse_arr(connection_id, raw, false, "tvdbId")
}

fn parse_arr(
    connection_id: ConnectionId,
    raw: &Value,
    is_movie: bool,
    txdb_field: &'static str,
) -> Result<CanonicalMedia, ParseError> {
    let remote_id = required_i64(raw, "id")?;
    let title = required_str(raw, "title")?;
    let year = required_year(raw)?;

    let language = raw
        .get("originalLanguage")
        .and_then(|lang| lang.get("name"))
        .and_then(Value::as_str)
        .map(language_code)
        .unwrap_or("en")
        .to_string();

    let runtime = raw
        .get("runtime")
        .and_then(Value::as_i64)
        .and_then(|r| i32::try_from(r).ok())
        .unwrap_or(0);

    // Arr reports 0 for unknown external ids.
    let txdb_id = raw
        .get(txdb_field)
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
        .map(|id| id.to_string());

    Ok(CanonicalMedia {
        connection_id,
        remote_id,
        is_movie,
        title,
        year,
        language,
        overview: optional_str(raw, "overview"),
        runtime,
        youtube_trailer_id: optional_str(raw, "youTubeTrailerId"),
        folder_path: optional_str(raw, "path"),
        imdb_id: optional_str(raw, "imdbId"),
        txdb_id,
        remote_monitored: optional_bool(raw, "monitored"),
    })
}
