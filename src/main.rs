mod cli;

use trailarr::config::{self, Config};
use trailarr::files::{FsTrailerFinder, TrailerFinder};
use trailarr::reconcile::CycleOutcome;
use trailarr::remote::create_source;
use trailarr::scheduler::{self, Scheduler};
use trailarr::store::{MediaStore, SqliteStore};
use trailarr_common::MonitorMode;
use trailarr_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn open_store(config: &Config) -> Result<SqliteStore> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

    let db_path = config.db_path();
    let db_path_str = db_path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path_str);
    let pool = init_pool(&db_path_str)?;

    Ok(SqliteStore::new(pool))
}

async fn start(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let store = open_store(&config)?;
    let connections = scheduler::register_connections(&config, &store).await?;

    if connections.is_empty() {
        tracing::warn!("No enabled connections configured, nothing to refresh");
        return Ok(());
    }

    let store: Arc<dyn MediaStore> = Arc::new(store);
    let trailers: Arc<dyn TrailerFinder> = Arc::new(FsTrailerFinder);

    if !config.monitor.enabled {
        tracing::info!("Scheduled refresh is disabled, running a single pass");
        scheduler::refresh_all(&connections, store.as_ref(), trailers.as_ref()).await;
        return Ok(());
    }

    tracing::info!("Starting Trailarr");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutting down...");
        let _ = shutdown_tx.send(true);
    });

    Scheduler::new(connections, store, trailers, config.monitor.interval())
        .run(shutdown_rx)
        .await;

    Ok(())
}

async fn refresh(config_path: Option<&Path>, only: Option<&str>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let store = open_store(&config)?;
    let mut connections = scheduler::register_connections(&config, &store).await?;

    if let Some(name) = only {
        connections.retain(|c| c.ctx.name == name);
        if connections.is_empty() {
            anyhow::bail!("No enabled connection named '{}'", name);
        }
    }

    let results = scheduler::refresh_all(&connections, &store, &FsTrailerFinder).await;

    let mut failed = 0;
    for (name, outcome) in results {
        match outcome {
            Some(CycleOutcome::Completed(report)) => println!("✓ {}", report),
            Some(CycleOutcome::Aborted { reason, .. }) => {
                failed += 1;
                println!("✗ {}: {}", name, reason);
            }
            None => {
                failed += 1;
                println!("✗ {}: refresh failed, see log", name);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} connection(s) did not refresh", failed);
    }
    Ok(())
}

async fn status(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if config.connections.is_empty() {
        println!("No connections configured");
        return Ok(());
    }

    for connection in config.enabled_connections() {
        let source = create_source(connection, config.http.timeout());
        match source.system_status().await {
            Ok(message) => println!("✓ {} ({}): {}", connection.name, connection.kind, message),
            Err(e) => println!(
                "✗ {} ({}): {} - {}",
                connection.name,
                connection.kind,
                e.kind(),
                e
            ),
        }
    }

    Ok(())
}

async fn list(config_path: Option<&Path>, only: Option<String>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let store = open_store(&config)?;

    let connection_id = match only {
        Some(name) => Some(
            store
                .connection_by_name(name.clone())
                .await?
                .with_context(|| format!("Unknown connection '{}'", name))?
                .id,
        ),
        None => None,
    };

    let media = store.list_media(connection_id).await?;
    for item in &media {
        println!(
            "{} ({})  status={} monitor={} trailer={} plex_trailer={}",
            item.title,
            item.year,
            item.status,
            item.monitor,
            item.trailer_exists,
            item.plex_trailer_exists
        );
    }
    println!("\n{} records", media.len());

    Ok(())
}

fn set_monitor(config_path: Option<&Path>, name: &str, mode: &str) -> Result<()> {
    let mode: MonitorMode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let path = config::find_config_file(config_path)
        .context("No config file found to update; pass --config")?;

    config::persist::set_monitor_mode(&path, name, mode)?;
    println!("✓ Monitor mode of '{}' set to {}", name, mode);
    Ok(())
}

fn remove_connection(config_path: Option<&Path>, name: &str) -> Result<()> {
    let path = config::find_config_file(config_path)
        .context("No config file found to update; pass --config")?;

    config::persist::remove_connection(&path, name)?;
    println!("✓ Removed '{}'; its media is pruned on the next start", name);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Data dir: {:?}", config.data_dir);
            println!(
                "  Monitor: {} (every {} minutes)",
                config.monitor.enabled, config.monitor.interval_mins
            );
            println!("  Connections: {}", config.connections.len());
            for connection in &config.connections {
                println!(
                    "    {} [{}] monitor={} enabled={} path mappings={}",
                    connection.name,
                    connection.kind,
                    connection.monitor,
                    connection.enabled,
                    connection.path_mappings.len()
                );
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Data dir: {:?}", config.data_dir);
            println!("  Monitor interval: {} minutes", config.monitor.interval_mins);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise verbose or the configured level
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "trailarr=trace,trailarr_db=debug,trailarr_common=debug".to_string()
        } else {
            let level = config::load_config_or_default(cli.config.as_deref())
                .map(|c| c.logging.level)
                .unwrap_or_else(|_| "info".to_string());
            format!("trailarr={level},trailarr_db={level}")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Start => tokio::runtime::Runtime::new()?.block_on(start(config_path)),
        Commands::Refresh { connection } => tokio::runtime::Runtime::new()?
            .block_on(refresh(config_path, connection.as_deref())),
        Commands::Status => tokio::runtime::Runtime::new()?.block_on(status(config_path)),
        Commands::List { connection } => {
            tokio::runtime::Runtime::new()?.block_on(list(config_path, connection))
        }
        Commands::SetMonitor { name, mode } => set_monitor(config_path, &name, &mode),
        Commands::RemoveConnection { name } => remove_connection(config_path, &name),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config.clone());
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("trailarr {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
