//! Reconciliation of one connection's remote catalog with the local store.
//!
//! Arr connections own their rows: a cycle creates, updates and deletes
//! records, then derives monitoring and status from trailers on disk. Plex
//! connections only annotate rows an Arr connection created.

mod engine;
pub mod path_map;
mod plex;
pub mod policy;

pub use engine::refresh_arr;
pub use plex::refresh_plex;

use crate::config::{ConnectionConfig, PathMapping};
use crate::files::TrailerFinder;
use crate::remote::{RemoteError, Source};
use crate::store::MediaStore;
use std::fmt;
use trailarr_common::{ConnectionId, MonitorMode, Result, SourceKind};

/// Upper bound on concurrent trailer lookups within one cycle.
const TRAILER_CHECK_CONCURRENCY: usize = 8;

/// Everything a cycle needs to know about its connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionContext {
    pub id: ConnectionId,
    pub name: String,
    pub kind: SourceKind,
    pub monitor: MonitorMode,
    pub path_mappings: Vec<PathMapping>,
    /// Accept `-trailer` files next to the media.
    pub check_inline: bool,
}

impl ConnectionContext {
    pub fn new(id: ConnectionId, config: &ConnectionConfig, check_inline: bool) -> Self {
        Self {
            id,
            name: config.name.clone(),
            kind: config.kind,
            monitor: config.monitor,
            path_mappings: config.path_mappings.clone(),
            check_inline,
        }
    }
}

/// Stage of a refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Fetching,
    Parsing,
    PathMapping,
    Upserting,
    DeletingStale,
    CheckingTrailers,
    UpdatingStatus,
    Done,
    Aborted,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::PathMapping => "path mapping",
            Self::Upserting => "upserting",
            Self::DeletingStale => "deleting stale",
            Self::CheckingTrailers => "checking trailers",
            Self::UpdatingStatus => "updating status",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Counters from a completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub connection: String,
    /// Raw records returned by the source.
    pub fetched: usize,
    pub parsed: usize,
    /// Malformed records left out of this cycle.
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Plex items with no stored counterpart.
    pub unmatched: usize,
    pub monitored: usize,
    pub downloaded: usize,
    /// Stored rows kept only because their source entry was malformed.
    pub protected: usize,
    pub state: CycleState,
}

impl CycleReport {
    fn new(connection: &str) -> Self {
        Self {
            connection: connection.to_string(),
            fetched: 0,
            parsed: 0,
            skipped: 0,
            created: 0,
            updated: 0,
            deleted: 0,
            unmatched: 0,
            monitored: 0,
            downloaded: 0,
            protected: 0,
            state: CycleState::Fetching,
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: fetched {}, skipped {}, created {}, updated {}, deleted {}, monitored {}, downloaded {}",
            self.connection,
            self.fetched,
            self.skipped,
            self.created,
            self.updated,
            self.deleted,
            self.monitored,
            self.downloaded
        )?;
        if self.protected > 0 {
            write!(f, ", protected {}", self.protected)?;
        }
        if self.unmatched > 0 {
            write!(f, ", unmatched {}", self.unmatched)?;
        }
        Ok(())
    }
}

/// Why a cycle stopped without writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The listing request failed.
    Fetch(RemoteError),
    /// The listing succeeded but held no records.
    EmptyListing,
    /// A Plex trailer lookup failed.
    TrailerLookup(RemoteError),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed ({}): {}", e.kind(), e),
            Self::EmptyListing => write!(f, "source returned no media"),
            Self::TrailerLookup(e) => write!(f, "trailer lookup failed ({}): {}", e.kind(), e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Aborted { connection: String, reason: AbortReason },
}

/// Run one refresh cycle for a connection with the matching reconciler.
///
/// Store errors are returned as `Err`; remote failures end in
/// [`CycleOutcome::Aborted`].
pub async fn run_cycle(
    ctx: &ConnectionContext,
    source: &Source,
    store: &dyn MediaStore,
    trailers: &dyn TrailerFinder,
) -> Result<CycleOutcome> {
    match source {
        Source::Arr(source) => refresh_arr(ctx, source.as_ref(), store, trailers).await,
        Source::Plex(source) => refresh_plex(ctx, source.as_ref(), store).await,
    }
}
