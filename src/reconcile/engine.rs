//! Refresh cycle for Radarr and Sonarr connections.

use super::{path_map, policy};
use super::{AbortReason, ConnectionContext, CycleOutcome, CycleReport, CycleState};
use super::TRAILER_CHECK_CONCURRENCY;
use crate::files::TrailerFinder;
use crate::parser::{self, CanonicalMedia};
use crate::remote::MediaSource;
use crate::store::MediaStore;
use futures::stream::{self, StreamExt};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use trailarr_common::{MediaId, MonitorStatus, Result};
use trailarr_db::models::{MediaStatusUpdate, UpsertedMedia};

/// Tracks the stage of one cycle and logs each transition.
struct Cycle<'a> {
    ctx: &'a ConnectionContext,
    report: CycleReport,
}

impl<'a> Cycle<'a> {
    fn new(ctx: &'a ConnectionContext) -> Self {
        Self {
            ctx,
            report: CycleReport::new(&ctx.name),
        }
    }

    fn enter(&mut self, state: CycleState) {
        tracing::trace!("[{}] {} -> {}", self.ctx.name, self.report.state, state);
        self.report.state = state;
    }

    fn abort(mut self, reason: AbortReason) -> CycleOutcome {
        self.enter(CycleState::Aborted);
        tracing::warn!("[{}] Refresh aborted: {}", self.ctx.name, reason);
        CycleOutcome::Aborted {
            connection: self.report.connection,
            reason,
        }
    }

    fn finish(mut self) -> CycleOutcome {
        self.enter(CycleState::Done);
        tracing::info!("Refresh complete for {}", self.report);
        CycleOutcome::Completed(self.report)
    }
}

/// Records parsed from one listing.
pub(super) struct Parsed {
    pub media: Vec<CanonicalMedia>,
    /// Source ids of the malformed records that still carry a readable id.
    pub malformed_ids: Vec<i64>,
}

/// Parse every raw record, logging and counting the malformed ones.
pub(super) fn parse_all(ctx: &ConnectionContext, raw: &[Value], report: &mut CycleReport) -> Parsed {
    let mut media = Vec::with_capacity(raw.len());
    let mut malformed_ids = Vec::new();
    for record in raw {
        match parser::parse(ctx.kind, ctx.id, record) {
            Ok(parsed) => media.push(parsed),
            Err(e) => {
                tracing::warn!(
                    "[{}] Skipping malformed record (field '{}'): {}",
                    ctx.name,
                    e.field(),
                    e
                );
                report.skipped += 1;
                match parser::remote_id(ctx.kind, record) {
                    Some(id) => malformed_ids.push(id),
                    None => tracing::debug!(
                        "[{}] Malformed record has no readable id; nothing stored is kept for it",
                        ctx.name
                    ),
                }
            }
        }
    }
    report.parsed = media.len();
    Parsed {
        media,
        malformed_ids,
    }
}

/// Refresh one Arr connection.
///
/// Nothing is written when the listing fails or is empty. Rows whose remote
/// id disappeared from the listing are deleted. A malformed record keeps the
/// row stored under its id, if any, until it parses again or disappears.
pub async fn refresh_arr(
    ctx: &ConnectionContext,
    source: &dyn MediaSource,
    store: &dyn MediaStore,
    trailers: &dyn TrailerFinder,
) -> Result<CycleOutcome> {
    let mut cycle = Cycle::new(ctx);
    tracing::debug!("[{}] Refreshing from {}", ctx.name, ctx.kind);

    let raw = match source.all_media().await {
        Ok(raw) if raw.is_empty() => return Ok(cycle.abort(AbortReason::EmptyListing)),
        Ok(raw) => raw,
        Err(e) => return Ok(cycle.abort(AbortReason::Fetch(e))),
    };
    cycle.report.fetched = raw.len();

    cycle.enter(CycleState::Parsing);
    let Parsed {
        media: mut parsed,
        malformed_ids,
    } = parse_all(ctx, &raw, &mut cycle.report);

    cycle.enter(CycleState::PathMapping);
    for media in &mut parsed {
        if let Some(path) = media.folder_path.as_deref() {
            media.folder_path = Some(path_map::apply(&ctx.path_mappings, path));
        }
    }

    cycle.enter(CycleState::Upserting);
    let upserts = parsed.into_iter().map(CanonicalMedia::into_upsert).collect();
    let upserted = store.create_or_update_bulk(upserts).await?;
    cycle.report.created = upserted.iter().filter(|u| u.is_new).count();
    cycle.report.updated = upserted.len() - cycle.report.created;

    cycle.enter(CycleState::DeletingStale);
    let mut keep: HashSet<MediaId> = upserted.iter().map(|u| u.media.id).collect();
    if !malformed_ids.is_empty() {
        let protected = store.ids_by_remote_id(ctx.id, malformed_ids).await?;
        cycle.report.protected = protected.difference(&keep).count();
        keep.extend(protected);
        if cycle.report.protected > 0 {
            tracing::warn!(
                "[{}] Keeping {} stored records whose source entries are malformed",
                ctx.name,
                cycle.report.protected
            );
        }
    }
    cycle.report.deleted = store.delete_except(ctx.id, keep).await?;
    if cycle.report.deleted > 0 {
        tracing::info!(
            "[{}] Removed {} records no longer on the source",
            ctx.name,
            cycle.report.deleted
        );
    }

    cycle.enter(CycleState::CheckingTrailers);
    let trailer_flags = check_trailers(&upserted, trailers, ctx.check_inline).await;

    cycle.enter(CycleState::UpdatingStatus);
    let updates: Vec<MediaStatusUpdate> = upserted
        .iter()
        .map(|u| {
            let trailer_exists = trailer_flags.get(&u.media.id).copied().unwrap_or(false);
            status_update(ctx, u, trailer_exists)
        })
        .collect();

    cycle.report.monitored = updates
        .iter()
        .filter(|u| u.status == MonitorStatus::Monitored)
        .count();
    cycle.report.downloaded = updates
        .iter()
        .filter(|u| u.status == MonitorStatus::Downloaded)
        .count();

    store.update_status_bulk(updates).await?;

    Ok(cycle.finish())
}

/// Look up trailers for every record, a bounded number at a time.
fn check_trailers<'a>(
    upserted: &'a [UpsertedMedia],
    trailers: &'a dyn TrailerFinder,
    check_inline: bool,
) -> BoxFuture<'a, HashMap<MediaId, bool>> {
    stream::iter(upserted)
        .map(move |u| async move {
            let exists = match u.media.folder_path.as_deref() {
                Some(path) if !path.is_empty() => trailers.trailer_exists(path, check_inline).await,
                _ => false,
            };
            (u.media.id, exists)
        })
        .buffer_unordered(TRAILER_CHECK_CONCURRENCY)
        .collect()
        .boxed()
}

fn status_update(
    ctx: &ConnectionContext,
    upserted: &UpsertedMedia,
    trailer_exists: bool,
) -> MediaStatusUpdate {
    let media = &upserted.media;

    // Monitoring is only ever switched on here; the downloader clears it.
    let monitor = media.monitor
        || policy::decide_monitor(
            upserted.is_new,
            trailer_exists,
            media.arr_monitored,
            ctx.monitor,
        );

    MediaStatusUpdate {
        id: media.id,
        monitor,
        status: policy::decide_status(trailer_exists, monitor, media.status),
        trailer_exists,
    }
}
