//! Trailarr-DB: Database schema, migrations, and query operations
//!
//! This crate provides the media store for trailarr using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use trailarr_common::SourceKind;
//! use trailarr_db::pool::{init_pool, get_conn};
//! use trailarr_db::queries::connections;
//!
//! let pool = init_pool("/config/trailarr.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let radarr = connections::upsert_connection(
//!     &conn,
//!     "radarr",
//!     SourceKind::Radarr,
//!     "http://localhost:7878",
//! )
//! .unwrap();
//! println!("Registered connection: {}", radarr.id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
