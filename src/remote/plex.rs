//! Plex Media Server client.
//!
//! Plex has no single "all media" endpoint, so the listing enumerates the
//! library sections and fetches movies (type 1) then shows (type 2) from each
//! one. A failure on any section fails the whole listing.

use super::request::RequestClient;
use super::{MediaSource, PlexSource, RemoteError};
use crate::config::ConnectionConfig;
use serde_json::Value;
use std::time::Duration;
use trailarr_common::SourceKind;

/// Plex item type for movies.
const TYPE_MOVIE: u8 = 1;
/// Plex item type for shows.
const TYPE_SHOW: u8 = 2;

pub struct PlexClient {
    http: RequestClient,
}

impl PlexClient {
    pub fn new(config: &ConnectionConfig, timeout: Duration) -> Self {
        let http = RequestClient::new(
            &config.url,
            SourceKind::Plex.app_name(),
            vec![
                ("X-Plex-Token", config.api_key.clone()),
                ("X-Plex-Client-Identifier", "Trailarr".to_string()),
                ("Accept", "application/json".to_string()),
            ],
            timeout,
        );
        Self { http }
    }

    async fn section_keys(&self) -> Result<Vec<String>, RemoteError> {
        let body = self.http.get_json("/library/sections").await?;

        container_list(&body, "Directory")?
            .iter()
            .map(|section| match section.get("key") {
                Some(Value::String(key)) => Ok(key.clone()),
                Some(Value::Number(key)) => Ok(key.to_string()),
                _ => Err(RemoteError::InvalidResponse(
                    "Plex library section without a key".to_string(),
                )),
            })
            .collect()
    }

    async fn section_media(&self, key: &str, media_type: u8) -> Result<Vec<Value>, RemoteError> {
        let body = self
            .http
            .get_json(&format!("/library/sections/{}/all?type={}", key, media_type))
            .await?;
        Ok(container_list(&body, "Metadata")?.to_vec())
    }
}

/// `MediaContainer.<field>` as a list; a missing field is an empty list.
fn container_list<'a>(body: &'a Value, field: &str) -> Result<&'a [Value], RemoteError> {
    match body.get("MediaContainer").and_then(|c| c.get(field)) {
        None | Some(Value::Null) => Ok(Default::default()),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(RemoteError::InvalidResponse(format!(
            "Invalid response format for {} in Plex API",
            field
        ))),
    }
}

#[async_trait::async_trait]
impl MediaSource for PlexClient {
    async fn system_status(&self) -> Result<String, RemoteError> {
        let body = self.http.get_json("/identity").await?;
        let container = body.get("MediaContainer");

        let machine_id = container
            .and_then(|c| c.get("machineIdentifier"))
            .and_then(Value::as_str);
        let version = container
            .and_then(|c| c.get("version"))
            .and_then(Value::as_str);

        match (machine_id, version) {
            (Some(_), Some(version)) => Ok(format!(
                "Plex Connection Successful! Version: {}",
                version
            )),
            _ => Err(RemoteError::InvalidResponse(
                "Invalid host or token, not a Plex instance.".to_string(),
            )),
        }
    }

    async fn all_media(&self) -> Result<Vec<Value>, RemoteError> {
        let keys = self.section_keys().await?;
        tracing::debug!("Plex reports {} library sections", keys.len());

        let mut media = Vec::new();
        for media_type in [TYPE_MOVIE, TYPE_SHOW] {
            for key in &keys {
                media.extend(self.section_media(key, media_type).await?);
            }
        }
        Ok(media)
    }
}

#[async_trait::async_trait]
impl PlexSource for PlexClient {
    async fn has_trailers(&self, rating_key: i64) -> Result<bool, RemoteError> {
        let body = self
            .http
            .get_json(&format!("/library/metadata/{}/extras", rating_key))
            .await?;

        Ok(container_list(&body, "Metadata")?
            .iter()
            .any(|extra| extra.get("subtype").and_then(Value::as_str) == Some("trailer")))
    }
}
