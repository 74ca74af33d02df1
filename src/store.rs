//! Async facade over the SQLite media store.
//!
//! The reconciliation engine only sees [`MediaStore`]. [`SqliteStore`] runs
//! each call on the blocking pool against a pooled connection; SQLite's own
//! transactions keep concurrent cycles from interleaving partial writes.

use std::collections::HashSet;
use trailarr_common::{ConnectionId, Error, MediaId, Result, SourceKind};
use trailarr_db::models::{
    Connection, Media, MediaStatusUpdate, MediaUpsert, PlexMediaUpdate, UpsertedMedia,
};
use trailarr_db::pool::{get_conn, DbPool, PooledConnection};
use trailarr_db::queries::{connections, media};

/// Persistence operations the reconciliation engine depends on.
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Create or update records keyed on `(connection_id, remote_id)`.
    async fn create_or_update_bulk(&self, items: Vec<MediaUpsert>) -> Result<Vec<UpsertedMedia>>;

    /// Delete a connection's records whose id is not in `keep_ids`.
    async fn delete_except(
        &self,
        connection_id: ConnectionId,
        keep_ids: HashSet<MediaId>,
    ) -> Result<usize>;

    /// Ids of a connection's stored records with the given source ids.
    async fn ids_by_remote_id(
        &self,
        connection_id: ConnectionId,
        remote_ids: Vec<i64>,
    ) -> Result<HashSet<MediaId>>;

    async fn update_status_bulk(&self, updates: Vec<MediaStatusUpdate>) -> Result<usize>;

    async fn update_plex_bulk(&self, updates: Vec<PlexMediaUpdate>) -> Result<usize>;

    /// Case-insensitive title substring search across all connections.
    async fn search(&self, title: String) -> Result<Vec<Media>>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PooledConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::internal(format!("Store task failed: {}", e)))?
    }

    /// Register a configured connection by name.
    pub async fn register_connection(
        &self,
        name: String,
        kind: SourceKind,
        url: String,
    ) -> Result<Connection> {
        self.with_conn(move |conn| connections::upsert_connection(conn, &name, kind, &url))
            .await
    }

    /// Drop connections (and their media) whose names are not listed.
    pub async fn prune_connections(&self, keep_names: Vec<String>) -> Result<usize> {
        self.with_conn(move |conn| connections::prune_connections(conn, &keep_names))
            .await
    }

    pub async fn connection_by_name(&self, name: String) -> Result<Option<Connection>> {
        self.with_conn(move |conn| connections::get_connection_by_name(conn, &name))
            .await
    }

    pub async fn list_media(&self, connection_id: Option<ConnectionId>) -> Result<Vec<Media>> {
        self.with_conn(move |conn| media::list_media(conn, connection_id))
            .await
    }
}

#[async_trait::async_trait]
impl MediaStore for SqliteStore {
    async fn create_or_update_bulk(&self, items: Vec<MediaUpsert>) -> Result<Vec<UpsertedMedia>> {
        self.with_conn(move |conn| media::create_or_update_bulk(conn, &items))
            .await
    }

    async fn delete_except(
        &self,
        connection_id: ConnectionId,
        keep_ids: HashSet<MediaId>,
    ) -> Result<usize> {
        self.with_conn(move |conn| media::delete_except(conn, connection_id, &keep_ids))
            .await
    }

    async fn ids_by_remote_id(
        &self,
        connection_id: ConnectionId,
        remote_ids: Vec<i64>,
    ) -> Result<HashSet<MediaId>> {
        self.with_conn(move |conn| media::ids_by_remote_id(conn, connection_id, &remote_ids))
            .await
    }

    async fn update_status_bulk(&self, updates: Vec<MediaStatusUpdate>) -> Result<usize> {
        self.with_conn(move |conn| media::update_status_bulk(conn, &updates))
            .await
    }

    async fn update_plex_bulk(&self, updates: Vec<PlexMediaUpdate>) -> Result<usize> {
        self.with_conn(move |conn| media::update_plex_bulk(conn, &updates))
            .await
    }

    async fn search(&self, title: String) -> Result<Vec<Media>> {
        self.with_conn(move |conn| media::search(conn, &title)).await
    }
}
