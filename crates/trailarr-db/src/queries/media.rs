//! Media database queries.
//!
//! The reconciliation engine is the only writer of these rows. Every bulk
//! operation runs inside a single transaction so a failing cycle never leaves
//! half of a batch behind.

use chrono::Utc;
use rusqlite::{Connection as SqliteConnection, OptionalExtension, Row};
use std::collections::HashSet;
use trailarr_common::{ConnectionId, Error, MediaId, MonitorStatus, Result};

use super::{parse_column, parse_optional_timestamp, parse_timestamp};
use crate::models::{Media, MediaStatusUpdate, MediaUpsert, PlexMediaUpdate, UpsertedMedia};

const MEDIA_COLUMNS: &str = "id, connection_id, remote_id, is_movie, title, year, language, \
     overview, runtime, youtube_trailer_id, folder_path, imdb_id, txdb_id, plex_rating_key, \
     trailer_exists, plex_trailer_exists, monitor, arr_monitored, status, added_at, updated_at, \
     downloaded_at";

fn media_from_row(row: &Row<'_>) -> rusqlite::Result<Media> {
    Ok(Media {
        id: parse_column(row, 0)?,
        connection_id: parse_column(row, 1)?,
        remote_id: row.get(2)?,
        is_movie: row.get(3)?,
        title: row.get(4)?,
        year: row.get(5)?,
        language: row.get(6)?,
        overview: row.get(7)?,
        runtime: row.get(8)?,
        youtube_trailer_id: row.get(9)?,
        folder_path: row.get(10)?,
        imdb_id: row.get(11)?,
        txdb_id: row.get(12)?,
        plex_rating_key: row.get(13)?,
        trailer_exists: row.get(14)?,
        plex_trailer_exists: row.get(15)?,
        monitor: row.get(16)?,
        arr_monitored: row.get(17)?,
        status: parse_column(row, 18)?,
        added_at: parse_timestamp(row, 19)?,
        updated_at: parse_timestamp(row, 20)?,
        downloaded_at: parse_optional_timestamp(row, 21)?,
    })
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

/// Get a media record by ID.
pub fn get_media(conn: &SqliteConnection, id: MediaId) -> Result<Option<Media>> {
    conn.query_row(
        &format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        media_from_row,
    )
    .optional()
    .map_err(db_err)
}

/// List media records, optionally restricted to one connection.
///
/// Ordered by title, then year.
pub fn list_media(conn: &SqliteConnection, connection_id: Option<ConnectionId>) -> Result<Vec<Media>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media
             WHERE (:connection_id IS NULL OR connection_id = :connection_id)
             ORDER BY title COLLATE NOCASE, year"
        ))
        .map_err(db_err)?;

    let media = stmt
        .query_map(
            rusqlite::named_params! {
                ":connection_id": connection_id.map(|id| id.to_string()),
            },
            media_from_row,
        )
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;

    Ok(media)
}

/// Ids of a connection's stored rows whose source id is in `remote_ids`.
///
/// Source ids with no stored row are ignored.
pub fn ids_by_remote_id(
    conn: &SqliteConnection,
    connection_id: ConnectionId,
    remote_ids: &[i64],
) -> Result<HashSet<MediaId>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM media
             WHERE connection_id = :connection_id AND remote_id = :remote_id",
        )
        .map_err(db_err)?;

    let mut ids = HashSet::new();
    for remote_id in remote_ids {
        let id = stmt
            .query_row(
                rusqlite::named_params! {
                    ":connection_id": connection_id.to_string(),
                    ":remote_id": remote_id,
                },
                |row| parse_column::<MediaId>(row, 0),
            )
            .optional()
            .map_err(db_err)?;
        ids.extend(id);
    }

    Ok(ids)
}

/// Create or update media records keyed on `(connection_id, remote_id)`.
///
/// Existing rows keep their id, tracking columns and `added_at`; only the
/// source-owned columns are refreshed. Each result reports whether the row
/// was inserted by this call.
///
/// # Returns
///
/// * `Ok(Vec<UpsertedMedia>)` - One entry per input, in input order
/// * `Err(Error)` - If any write fails; nothing from the batch is kept
pub fn create_or_update_bulk(
    conn: &SqliteConnection,
    items: &[MediaUpsert],
) -> Result<Vec<UpsertedMedia>> {
    let tx = conn.unchecked_transaction().map_err(db_err)?;
    let mut results = Vec::with_capacity(items.len());

    for item in items {
        let now = Utc::now().to_rfc3339();
        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM media WHERE connection_id = :connection_id AND remote_id = :remote_id",
                rusqlite::named_params! {
                    ":connection_id": item.connection_id.to_string(),
                    ":remote_id": item.remote_id,
                },
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        let (id, is_new) = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE media SET
                        is_movie = :is_movie,
                        title = :title,
                        year = :year,
                        language = :language,
                        overview = :overview,
                        runtime = :runtime,
                        youtube_trailer_id = COALESCE(:youtube_trailer_id, youtube_trailer_id),
                        folder_path = :folder_path,
                        imdb_id = :imdb_id,
                        txdb_id = :txdb_id,
                        arr_monitored = :arr_monitored,
                        updated_at = :updated_at
                     WHERE id = :id",
                    rusqlite::named_params! {
                        ":id": id,
                        ":is_movie": item.is_movie,
                        ":title": item.title,
                        ":year": item.year,
                        ":language": item.language,
                        ":overview": item.overview,
                        ":runtime": item.runtime,
                        ":youtube_trailer_id": item.youtube_trailer_id,
                        ":folder_path": item.folder_path,
                        ":imdb_id": item.imdb_id,
                        ":txdb_id": item.txdb_id,
                        ":arr_monitored": item.arr_monitored,
                        ":updated_at": now,
                    },
                )
                .map_err(db_err)?;
                (id, false)
            }
            None => {
                let id = MediaId::new().to_string();
                tx.execute(
                    "INSERT INTO media (
                        id, connection_id, remote_id, is_movie, title, year, language, overview,
                        runtime, youtube_trailer_id, folder_path, imdb_id, txdb_id, arr_monitored,
                        status, added_at, updated_at
                     ) VALUES (
                        :id, :connection_id, :remote_id, :is_movie, :title, :year, :language,
                        :overview, :runtime, :youtube_trailer_id, :folder_path, :imdb_id,
                        :txdb_id, :arr_monitored, :status, :added_at, :updated_at
                     )",
                    rusqlite::named_params! {
                        ":id": id,
                        ":connection_id": item.connection_id.to_string(),
                        ":remote_id": item.remote_id,
                        ":is_movie": item.is_movie,
                        ":title": item.title,
                        ":year": item.year,
                        ":language": item.language,
                        ":overview": item.overview,
                        ":runtime": item.runtime,
                        ":youtube_trailer_id": item.youtube_trailer_id,
                        ":folder_path": item.folder_path,
                        ":imdb_id": item.imdb_id,
                        ":txdb_id": item.txdb_id,
                        ":arr_monitored": item.arr_monitored,
                        ":status": MonitorStatus::Missing.to_string(),
                        ":added_at": now,
                        ":updated_at": now,
                    },
                )
                .map_err(db_err)?;
                (id, true)
            }
        };

        let media = tx
            .query_row(
                &format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = :id"),
                rusqlite::named_params! { ":id": id },
                media_from_row,
            )
            .map_err(db_err)?;

        results.push(UpsertedMedia { media, is_new });
    }

    tx.commit().map_err(db_err)?;
    Ok(results)
}

/// Delete every media record of a connection whose id is not in `keep_ids`.
///
/// This is how removals at the source propagate. Returns the number of rows
/// deleted.
pub fn delete_except(
    conn: &SqliteConnection,
    connection_id: ConnectionId,
    keep_ids: &HashSet<MediaId>,
) -> Result<usize> {
    let tx = conn.unchecked_transaction().map_err(db_err)?;

    let stale: Vec<String> = {
        let mut stmt = tx
            .prepare("SELECT id FROM media WHERE connection_id = :connection_id")
            .map_err(db_err)?;
        let ids = stmt
            .query_map(
                rusqlite::named_params! { ":connection_id": connection_id.to_string() },
                |row| parse_column::<MediaId>(row, 0),
            )
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;
        ids.into_iter()
            .filter(|id| !keep_ids.contains(id))
            .map(|id| id.to_string())
            .collect()
    };

    let mut deleted = 0;
    for id in &stale {
        deleted += tx
            .execute(
                "DELETE FROM media WHERE id = :id",
                rusqlite::named_params! { ":id": id },
            )
            .map_err(db_err)?;
    }

    tx.commit().map_err(db_err)?;
    Ok(deleted)
}

/// Write monitoring flag, status and trailer flag for many records at once.
///
/// `downloaded_at` is stamped the first time a record reaches
/// [`MonitorStatus::Downloaded`]. Returns the number of rows updated.
pub fn update_status_bulk(conn: &SqliteConnection, updates: &[MediaStatusUpdate]) -> Result<usize> {
    let tx = conn.unchecked_transaction().map_err(db_err)?;
    let now = Utc::now().to_rfc3339();
    let mut updated = 0;

    for update in updates {
        updated += tx
            .execute(
                "UPDATE media SET
                    monitor = :monitor,
                    status = :status,
                    trailer_exists = :trailer_exists,
                    downloaded_at = CASE
                        WHEN :status = 'downloaded' THEN COALESCE(downloaded_at, :now)
                        ELSE downloaded_at
                    END,
                    updated_at = :now
                 WHERE id = :id",
                rusqlite::named_params! {
                    ":id": update.id.to_string(),
                    ":monitor": update.monitor,
                    ":status": update.status.to_string(),
                    ":trailer_exists": update.trailer_exists,
                    ":now": now,
                },
            )
            .map_err(db_err)?;
    }

    tx.commit().map_err(db_err)?;
    Ok(updated)
}

/// Write Plex rating keys and Plex trailer flags for many records at once.
pub fn update_plex_bulk(conn: &SqliteConnection, updates: &[PlexMediaUpdate]) -> Result<usize> {
    let tx = conn.unchecked_transaction().map_err(db_err)?;
    let now = Utc::now().to_rfc3339();
    let mut updated = 0;

    for update in updates {
        updated += tx
            .execute(
                "UPDATE media SET
                    plex_rating_key = :plex_rating_key,
                    plex_trailer_exists = :plex_trailer_exists,
                    updated_at = :now
                 WHERE id = :id",
                rusqlite::named_params! {
                    ":id": update.id.to_string(),
                    ":plex_rating_key": update.plex_rating_key,
                    ":plex_trailer_exists": update.plex_trailer_exists,
                    ":now": now,
                },
            )
            .map_err(db_err)?;
    }

    tx.commit().map_err(db_err)?;
    Ok(updated)
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Search media by title substring, case-insensitively, across all connections.
pub fn search(conn: &SqliteConnection, title: &str) -> Result<Vec<Media>> {
    let pattern = format!("%{}%", escape_like(title.trim()));

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media
             WHERE title LIKE :pattern ESCAPE '\\'
             ORDER BY title COLLATE NOCASE, year"
        ))
        .map_err(db_err)?;

    let media = stmt
        .query_map(
            rusqlite::named_params! { ":pattern": pattern },
            media_from_row,
        )
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;

    Ok(media)
}
