//! Refresh cycle for Plex connections.
//!
//! Plex never creates or deletes rows. Each Plex item is matched to an
//! existing record by title and year, and the match gets its rating key and
//! whether Plex already holds a trailer for it.

use super::engine::parse_all;
use super::{AbortReason, ConnectionContext, CycleOutcome, CycleReport, CycleState};
use super::TRAILER_CHECK_CONCURRENCY;
use crate::parser::CanonicalMedia;
use crate::remote::PlexSource;
use crate::store::MediaStore;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use trailarr_common::{MediaId, Result};
use trailarr_db::models::{Media, PlexMediaUpdate};

fn same_title(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// First stored record with the same title (ignoring case) and year.
fn find_match<'a>(item: &CanonicalMedia, candidates: &'a [Media]) -> Option<&'a Media> {
    candidates
        .iter()
        .find(|media| media.year == item.year && same_title(&media.title, &item.title))
}

/// Collapse lookups that matched the same record into one update.
///
/// `lookups` is in listing order. The first rating key is kept and the
/// trailer flag is set if any of the matched items has a trailer.
fn merge_by_record(lookups: Vec<PlexMediaUpdate>) -> Vec<PlexMediaUpdate> {
    let mut position: HashMap<MediaId, usize> = HashMap::new();
    let mut merged: Vec<PlexMediaUpdate> = Vec::with_capacity(lookups.len());
    for lookup in lookups {
        match position.get(&lookup.id) {
            Some(&i) => merged[i].plex_trailer_exists |= lookup.plex_trailer_exists,
            None => {
                position.insert(lookup.id, merged.len());
                merged.push(lookup);
            }
        }
    }
    merged
}

/// Refresh one Plex connection.
///
/// A failed trailer lookup aborts the cycle before anything is written.
/// Several Plex items matching one record produce a single update.
pub async fn refresh_plex(
    ctx: &ConnectionContext,
    source: &dyn PlexSource,
    store: &dyn MediaStore,
) -> Result<CycleOutcome> {
    let mut report = CycleReport::new(&ctx.name);
    tracing::debug!("[{}] Refreshing from plex", ctx.name);

    let raw = match source.all_media().await {
        Ok(raw) if raw.is_empty() => return Ok(aborted(ctx, AbortReason::EmptyListing)),
        Ok(raw) => raw,
        Err(e) => return Ok(aborted(ctx, AbortReason::Fetch(e))),
    };
    report.fetched = raw.len();

    report.state = CycleState::Parsing;
    let parsed = parse_all(ctx, &raw, &mut report).media;

    report.state = CycleState::Upserting;
    let mut matched: Vec<(MediaId, i64)> = Vec::new();
    for item in &parsed {
        let candidates = store.search(item.title.clone()).await?;
        match find_match(item, &candidates) {
            Some(media) => matched.push((media.id, item.remote_id)),
            None => {
                tracing::debug!(
                    "[{}] No stored record for '{}' ({})",
                    ctx.name,
                    item.title,
                    item.year
                );
                report.unmatched += 1;
            }
        }
    }

    report.state = CycleState::CheckingTrailers;
    let lookups = stream::iter(matched)
        .map(|(id, rating_key)| async move {
            source
                .has_trailers(rating_key)
                .await
                .map(|plex_trailer_exists| PlexMediaUpdate {
                    id,
                    plex_rating_key: rating_key,
                    plex_trailer_exists,
                })
        })
        .buffered(TRAILER_CHECK_CONCURRENCY)
        .try_collect::<Vec<_>>()
        .await;

    let updates = match lookups {
        Ok(lookups) => merge_by_record(lookups),
        Err(e) => return Ok(aborted(ctx, AbortReason::TrailerLookup(e))),
    };

    report.state = CycleState::UpdatingStatus;
    report.updated = store.update_plex_bulk(updates).await?;

    report.state = CycleState::Done;
    tracing::info!("Plex refresh complete for {}", report);
    Ok(CycleOutcome::Completed(report))
}

fn aborted(ctx: &ConnectionContext, reason: AbortReason) -> CycleOutcome {
    tracing::warn!("[{}] Plex refresh aborted: {}", ctx.name, reason);
    CycleOutcome::Aborted {
        connection: ctx.name.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trailarr_common::{ConnectionId, MonitorStatus};

    fn stored(title: &str, year: i32) -> Media {
        Media {
            id: MediaId::new(),
            connection_id: ConnectionId::new(),
            remote_id: 1,
            is_movie: true,
            title: title.to_string(),
            year,
            language: "en".to_string(),
            overview: None,
            runtime: 0,
            youtube_trailer_id: None,
            folder_path: None,
            imdb_id: None,
            txdb_id: None,
            plex_rating_key: None,
            trailer_exists: false,
            plex_trailer_exists: false,
            monitor: false,
            arr_monitored: false,
            status: MonitorStatus::Missing,
            added_at: Utc::now(),
            updated_at: Utc::now(),
            downloaded_at: None,
        }
    }

    fn plex_item(title: &str, year: i32) -> CanonicalMedia {
        CanonicalMedia {
            connection_id: ConnectionId::new(),
            remote_id: 77,
            is_movie: true,
            title: title.to_string(),
            year,
            language: "en".to_string(),
            overview: None,
            runtime: 0,
            youtube_trailer_id: None,
            folder_path: None,
            imdb_id: None,
            txdb_id: None,
            remote_monitored: false,
        }
    }

    #[test]
    fn test_match_requires_title_and_year() {
        let candidates = vec![
            stored("The Matrix Reloaded", 2003),
            stored("The Matrix", 2021),
            stored("the matrix", 1999),
        ];

        let found = find_match(&plex_item("The Matrix", 1999), &candidates).unwrap();
        assert_eq!(found.id, candidates[2].id);

        assert!(find_match(&plex_item("The Matrix", 2000), &candidates).is_none());
    }

    #[test]
    fn test_merge_keeps_first_key_and_any_trailer() {
        let heat = MediaId::new();
        let ronin = MediaId::new();
        let lookup = |id, plex_rating_key, plex_trailer_exists| PlexMediaUpdate {
            id,
            plex_rating_key,
            plex_trailer_exists,
        };

        let merged = merge_by_record(vec![
            lookup(heat, 500, false),
            lookup(ronin, 510, false),
            lookup(heat, 600, true),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, heat);
        assert_eq!(merged[0].plex_rating_key, 500);
        assert!(merged[0].plex_trailer_exists);
        assert_eq!(merged[1].plex_rating_key, 510);
        assert!(!merged[1].plex_trailer_exists);
    }

    #[test]
    fn test_first_match_wins() {
        let candidates = vec![stored("Heat", 1995), stored("HEAT", 1995)];
        let found = find_match(&plex_item("heat", 1995), &candidates).unwrap();
        assert_eq!(found.id, candidates[0].id);
    }
}
