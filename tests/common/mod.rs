//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires an in-memory store, a registered
//! connection and scripted remote sources into the reconciliation engine.
//! Trailer folders live in a temporary directory.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{json, Value};
use tempfile::TempDir;

use trailarr::config::PathMapping;
use trailarr::files::{FsTrailerFinder, TrailerFinder};
use trailarr::reconcile::{refresh_arr, refresh_plex, ConnectionContext, CycleOutcome, CycleReport};
use trailarr::remote::{MediaSource, PlexSource, RemoteError};
use trailarr::store::SqliteStore;
use trailarr_common::{ConnectionId, MonitorMode, SourceKind};
use trailarr_db::models::Media;
use trailarr_db::pool::{get_conn, init_memory_pool, DbPool, PooledConnection};
use trailarr_db::queries::{connections, media};

/// Remote source whose listing is set by the test.
pub struct ScriptedSource {
    listing: Mutex<Result<Vec<Value>, RemoteError>>,
    trailers: Mutex<HashMap<i64, Result<bool, RemoteError>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            listing: Mutex::new(Ok(Vec::new())),
            trailers: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_listing(&self, records: Vec<Value>) {
        *self.listing.lock().unwrap() = Ok(records);
    }

    pub fn fail_listing(&self, error: RemoteError) {
        *self.listing.lock().unwrap() = Err(error);
    }

    pub fn set_trailer(&self, rating_key: i64, result: Result<bool, RemoteError>) {
        self.trailers.lock().unwrap().insert(rating_key, result);
    }
}

#[async_trait::async_trait]
impl MediaSource for ScriptedSource {
    async fn system_status(&self) -> Result<String, RemoteError> {
        Ok("Scripted Connection Successful! Version: 1.0".to_string())
    }

    async fn all_media(&self) -> Result<Vec<Value>, RemoteError> {
        self.listing.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PlexSource for ScriptedSource {
    async fn has_trailers(&self, rating_key: i64) -> Result<bool, RemoteError> {
        self.trailers
            .lock()
            .unwrap()
            .get(&rating_key)
            .cloned()
            .unwrap_or(Ok(false))
    }
}

/// Trailer finder that records every folder it is asked about.
#[derive(Default)]
pub struct RecordingFinder {
    calls: Mutex<Vec<String>>,
}

impl RecordingFinder {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TrailerFinder for RecordingFinder {
    async fn trailer_exists(&self, folder_path: &str, _check_inline: bool) -> bool {
        self.calls.lock().unwrap().push(folder_path.to_string());
        false
    }
}

/// A Radarr movie record whose folder lives under the harness media dir.
pub fn radarr_movie(harness: &TestHarness, id: i64, title: &str, year: i32) -> Value {
    json!({
        "id": id,
        "title": title,
        "year": year,
        "path": harness.folder(title).to_string_lossy(),
        "monitored": true,
        "tmdbId": 1000 + id,
    })
}

pub fn plex_movie(rating_key: &str, title: &str, year: i32) -> Value {
    json!({
        "ratingKey": rating_key,
        "title": title,
        "year": year,
        "type": "movie",
    })
}

/// Test harness with an in-memory database and a temp media directory.
pub struct TestHarness {
    pub db: DbPool,
    pub store: SqliteStore,
    pub media_dir: TempDir,
    pub radarr: ConnectionContext,
    pub plex: ConnectionContext,
    pub radarr_source: ScriptedSource,
    pub plex_source: ScriptedSource,
}

impl TestHarness {
    /// Create a harness whose Radarr connection uses `mode`.
    pub fn new(mode: MonitorMode) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let (radarr_id, plex_id) = {
            let conn = get_conn(&db).expect("failed to get db connection");
            let radarr = connections::upsert_connection(&conn, "radarr", SourceKind::Radarr, "http://radarr")
                .expect("failed to register radarr");
            let plex = connections::upsert_connection(&conn, "plex", SourceKind::Plex, "http://plex")
                .expect("failed to register plex");
            (radarr.id, plex.id)
        };

        Self {
            store: SqliteStore::new(db.clone()),
            db,
            media_dir: tempfile::tempdir().expect("failed to create temp dir"),
            radarr: context(radarr_id, "radarr", SourceKind::Radarr, mode),
            plex: context(plex_id, "plex", SourceKind::Plex, MonitorMode::None),
            radarr_source: ScriptedSource::new(),
            plex_source: ScriptedSource::new(),
        }
    }

    pub fn with_path_mappings(mut self, mappings: Vec<PathMapping>) -> Self {
        self.radarr.path_mappings = mappings;
        self
    }

    /// Media folder for a title (created on disk).
    pub fn folder(&self, title: &str) -> PathBuf {
        let path = self.media_dir.path().join(title);
        std::fs::create_dir_all(&path).expect("failed to create media folder");
        path
    }

    /// Drop a trailer into the title's `Trailers` folder.
    pub fn add_trailer(&self, title: &str) {
        let trailers = self.folder(title).join("Trailers");
        std::fs::create_dir_all(&trailers).expect("failed to create trailers folder");
        std::fs::write(trailers.join(format!("{title}.mp4")), b"").expect("failed to write trailer");
    }

    pub async fn refresh_radarr(&self) -> CycleOutcome {
        self.refresh_radarr_with(&FsTrailerFinder).await
    }

    pub async fn refresh_radarr_with(&self, trailers: &dyn TrailerFinder) -> CycleOutcome {
        refresh_arr(&self.radarr, &self.radarr_source, &self.store, trailers)
            .await
            .expect("store error during radarr refresh")
    }

    pub async fn refresh_plex(&self) -> CycleOutcome {
        refresh_plex(&self.plex, &self.plex_source, &self.store)
            .await
            .expect("store error during plex refresh")
    }

    pub fn conn(&self) -> PooledConnection {
        get_conn(&self.db).expect("failed to get db connection")
    }

    /// All rows of the Radarr connection, ordered by title.
    pub fn radarr_media(&self) -> Vec<Media> {
        media::list_media(&self.conn(), Some(self.radarr.id)).expect("failed to list media")
    }

    pub fn media_by_title(&self, title: &str) -> Media {
        self.radarr_media()
            .into_iter()
            .find(|m| m.title == title)
            .unwrap_or_else(|| panic!("no stored media titled '{title}'"))
    }
}

fn context(id: ConnectionId, name: &str, kind: SourceKind, monitor: MonitorMode) -> ConnectionContext {
    ConnectionContext {
        id,
        name: name.to_string(),
        kind,
        monitor,
        path_mappings: Vec::new(),
        check_inline: true,
    }
}

/// Unwrap a completed cycle's report.
pub fn completed(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        CycleOutcome::Aborted { reason, .. } => panic!("cycle aborted: {reason}"),
    }
}
