//! Periodic refresh of every enabled connection.
//!
//! Each connection gets its own task ticking on the configured interval. A
//! task awaits its cycle before waiting for the next tick, so cycles for one
//! connection never overlap while different connections run side by side.

use crate::config::Config;
use crate::files::TrailerFinder;
use crate::reconcile::{run_cycle, ConnectionContext, CycleOutcome};
use crate::remote::{create_source, Source};
use crate::store::{MediaStore, SqliteStore};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// A connection ready to be refreshed.
pub struct ScheduledConnection {
    pub ctx: ConnectionContext,
    pub source: Source,
}

impl ScheduledConnection {
    fn is_plex(&self) -> bool {
        matches!(self.source, Source::Plex(_))
    }
}

/// Register configured connections in the store and build their clients.
///
/// Connections no longer in the configuration are removed along with their
/// media. Only enabled connections are returned; Plex connections are left
/// out when Plex checks are turned off.
pub async fn register_connections(
    config: &Config,
    store: &SqliteStore,
) -> Result<Vec<Arc<ScheduledConnection>>> {
    let names: Vec<String> = config.connections.iter().map(|c| c.name.clone()).collect();
    let pruned = store
        .prune_connections(names)
        .await
        .context("Failed to prune removed connections")?;
    if pruned > 0 {
        tracing::info!("Pruned {} connections removed from config", pruned);
    }

    let mut scheduled = Vec::new();
    for connection in &config.connections {
        let stored = store
            .register_connection(connection.name.clone(), connection.kind, connection.url.clone())
            .await
            .with_context(|| format!("Failed to register connection '{}'", connection.name))?;

        if !connection.enabled {
            tracing::debug!("Connection '{}' is disabled", connection.name);
            continue;
        }
        if !connection.kind.is_arr() && !config.trailer.check_plex {
            tracing::debug!("Plex checks disabled, skipping '{}'", connection.name);
            continue;
        }

        scheduled.push(Arc::new(ScheduledConnection {
            ctx: ConnectionContext::new(stored.id, connection, config.trailer.check_inline),
            source: create_source(connection, config.http.timeout()),
        }));
    }

    Ok(scheduled)
}

/// Run one cycle and log its failure, if any.
async fn refresh_logged(
    connection: &ScheduledConnection,
    store: &dyn MediaStore,
    trailers: &dyn TrailerFinder,
) -> Option<CycleOutcome> {
    match run_cycle(&connection.ctx, &connection.source, store, trailers).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!("[{}] Refresh failed: {}", connection.ctx.name, e);
            None
        }
    }
}

/// Refresh every connection once.
///
/// Arr connections run first, concurrently, so that the Plex connections that
/// follow can match against freshly created records. Failed cycles are
/// logged and reported as `None`.
pub async fn refresh_all(
    connections: &[Arc<ScheduledConnection>],
    store: &dyn MediaStore,
    trailers: &dyn TrailerFinder,
) -> Vec<(String, Option<CycleOutcome>)> {
    let (plex, arr): (Vec<_>, Vec<_>) = connections.iter().partition(|c| c.is_plex());

    let mut results = Vec::with_capacity(connections.len());
    for group in [arr, plex] {
        let outcomes = join_all(
            group
                .iter()
                .map(|connection| refresh_logged(connection, store, trailers)),
        )
        .await;
        results.extend(
            group
                .iter()
                .map(|connection| connection.ctx.name.clone())
                .zip(outcomes),
        );
    }
    results
}

async fn connection_loop(
    connection: Arc<ScheduledConnection>,
    store: Arc<dyn MediaStore>,
    trailers: Arc<dyn TrailerFinder>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // The initial pass already covered the first tick.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                refresh_logged(&connection, store.as_ref(), trailers.as_ref()).await;
            }
        }
    }

    tracing::debug!("[{}] Refresh task stopped", connection.ctx.name);
}

pub struct Scheduler {
    connections: Vec<Arc<ScheduledConnection>>,
    store: Arc<dyn MediaStore>,
    trailers: Arc<dyn TrailerFinder>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(
        connections: Vec<Arc<ScheduledConnection>>,
        store: Arc<dyn MediaStore>,
        trailers: Arc<dyn TrailerFinder>,
        interval: Duration,
    ) -> Self {
        Self {
            connections,
            store,
            trailers,
            interval,
        }
    }

    /// Refresh everything once, then keep refreshing until `shutdown` flips.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Scheduler started: {} connections every {} minutes",
            self.connections.len(),
            self.interval.as_secs() / 60
        );

        refresh_all(&self.connections, self.store.as_ref(), self.trailers.as_ref()).await;

        let handles: Vec<_> = self
            .connections
            .iter()
            .map(|connection| {
                tokio::spawn(connection_loop(
                    connection.clone(),
                    self.store.clone(),
                    self.trailers.clone(),
                    self.interval,
                    shutdown.clone(),
                ))
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Refresh task ended abnormally: {}", e);
            }
        }

        tracing::info!("Scheduler stopped");
    }
}
