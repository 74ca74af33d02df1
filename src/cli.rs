use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trailarr")]
#[command(author, version, about = "Trailer tracking for Radarr, Sonarr and Plex")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh all connections on the configured interval until interrupted
    Start,

    /// Run one refresh cycle now
    Refresh {
        /// Only refresh this connection
        #[arg(long)]
        connection: Option<String>,
    },

    /// Check that every configured connection is reachable
    Status,

    /// List stored media records
    List {
        /// Only list records of this connection
        #[arg(long)]
        connection: Option<String>,
    },

    /// Change a connection's monitor mode in the config file
    SetMonitor {
        /// Connection name
        name: String,

        /// New mode: missing, new, none or sync
        mode: String,
    },

    /// Remove a connection from the config file
    RemoveConnection {
        /// Connection name
        name: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
