//! Trailarr-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across trailarr:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for connections and media records
//! - **Core Types**: Enums for source kinds, monitor modes, and trailer status
//! - **Path Utilities**: Functions to detect video files by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use trailarr_common::{MediaId, MonitorMode, Error, Result};
//! use trailarr_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let media_id = MediaId::new();
//!
//! let mode: MonitorMode = "sync".parse().unwrap();
//! assert_eq!(mode, MonitorMode::Sync);
//!
//! assert!(is_video_file(Path::new("Movie - Trailer-trailer.mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::database("connection table missing"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
