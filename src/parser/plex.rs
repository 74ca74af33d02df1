use super::{optional_str, required_str, required_year, CanonicalMedia, ParseError};
use serde_json::Value;
use trailarr_common::ConnectionId;

/// Parse a Plex library `Metadata` entry.
///
/// Plex sends `ratingKey` as a string; a JSON number is accepted too.
pub fn parse_plex(connection_id: ConnectionId, raw: &Value) -> Result<CanonicalMedia, ParseError> {
    let remote_id = rating_key(raw)?;
    let title = required_str(raw, "title")?;
    let year = required_year(raw)?;
    let is_movie = raw.get("type").and_then(Value::as_str) != Some("show");

    Ok(CanonicalMedia {
        connection_id,
        remote_id,
        is_movie,
        title,
        year,
        language: "en".to_string(),
        overview: optional_str(raw, "summary"),
        runtime: 0,
        youtube_trailer_id: None,
        folder_path: None,
        imdb_id: None,
        txdb_id: None,
        remote_monitored: false,
    })
}

pub(super) fn rating_key(raw: &Value) -> Result<i64, ParseError> {
    const FIELD: &str = "ratingKey";

    match raw.get(FIELD) {
        None | Some(Value::Null) => Err(ParseError::missing(FIELD)),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ParseError::wrong_type(FIELD, "an integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| ParseError::wrong_type(FIELD, "a numeric string")),
        Some(_) => Err(ParseError::wrong_type(FIELD, "a number or numeric string")),
    }
}
