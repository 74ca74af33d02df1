//! Connection database queries.
//!
//! Connections are defined in the configuration file; this module keeps the
//! `connections` table in step with it so media rows have a stable owner.

use chrono::Utc;
use rusqlite::{Connection as SqliteConnection, OptionalExtension, Row};
use trailarr_common::{ConnectionId, Error, Result, SourceKind};

use super::{parse_column, parse_timestamp};
use crate::models::Connection;

const CONNECTION_COLUMNS: &str = "id, name, source_kind, url, added_at";

fn connection_from_row(row: &Row<'_>) -> rusqlite::Result<Connection> {
    Ok(Connection {
        id: parse_column(row, 0)?,
        name: row.get(1)?,
        source_kind: parse_column(row, 2)?,
        url: row.get(3)?,
        added_at: parse_timestamp(row, 4)?,
    })
}

/// Register a connection by name, or refresh its kind and URL if it exists.
///
/// The id and `added_at` of an existing connection are preserved, so media
/// rows survive configuration edits.
///
/// # Returns
///
/// * `Ok(Connection)` - The stored connection
/// * `Err(Error)` - If a database error occurs
pub fn upsert_connection(
    conn: &SqliteConnection,
    name: &str,
    source_kind: SourceKind,
    url: &str,
) -> Result<Connection> {
    if let Some(existing) = get_connection_by_name(conn, name)? {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        if existing.source_kind != source_kind {
            // Media from a different catalog can't be reconciled against the new one.
            tx.execute(
                "DELETE FROM media WHERE connection_id = :id",
                rusqlite::named_params! { ":id": existing.id.to_string() },
            )
            .map_err(|e| Error::database(e.to_string()))?;
        }

        tx.execute(
            "UPDATE connections SET source_kind = :source_kind, url = :url WHERE id = :id",
            rusqlite::named_params! {
                ":id": existing.id.to_string(),
                ":source_kind": source_kind.to_string(),
                ":url": url,
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;

        return Ok(Connection {
            source_kind,
            url: url.to_string(),
            ..existing
        });
    }

    let id = ConnectionId::new();
    let added_at = Utc::now();

    conn.execute(
        "INSERT INTO connections (id, name, source_kind, url, added_at)
         VALUES (:id, :name, :source_kind, :url, :added_at)",
        rusqlite::named_params! {
            ":id": id.to_string(),
            ":name": name,
            ":source_kind": source_kind.to_string(),
            ":url": url,
            ":added_at": added_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Connection {
        id,
        name: name.to_string(),
        source_kind,
        url: url.to_string(),
        added_at,
    })
}

/// Get a connection by ID.
pub fn get_connection(conn: &SqliteConnection, id: ConnectionId) -> Result<Option<Connection>> {
    conn.query_row(
        &format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = :id"),
        rusqlite::named_params! { ":id": id.to_string() },
        connection_from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Get a connection by its unique name.
pub fn get_connection_by_name(conn: &SqliteConnection, name: &str) -> Result<Option<Connection>> {
    conn.query_row(
        &format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE name = :name"),
        rusqlite::named_params! { ":name": name },
        connection_from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List all connections, ordered by name.
pub fn list_connections(conn: &SqliteConnection) -> Result<Vec<Connection>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections ORDER BY name"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let connections = stmt
        .query_map([], connection_from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(connections)
}

/// Delete a connection (cascades to its media).
///
/// # Returns
///
/// * `Ok(true)` - If the connection was deleted
/// * `Ok(false)` - If the connection did not exist
pub fn delete_connection(conn: &SqliteConnection, id: ConnectionId) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "DELETE FROM connections WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows_affected > 0)
}

/// Delete every connection whose name is not in `keep_names`.
///
/// Used at startup to drop connections that were removed from the
/// configuration file. Returns the number of connections deleted.
pub fn prune_connections(conn: &SqliteConnection, keep_names: &[String]) -> Result<usize> {
    let mut removed = 0;
    for existing in list_connections(conn)? {
        if keep_names.iter().any(|name| name == &existing.name) {
            continue;
        }
        if delete_connection(conn, existing.id)? {
            tracing::info!("Removed connection '{}' no longer in config", existing.name);
            removed += 1;
        }
    }
    Ok(removed)
}
