//! Trailarr - trailer tracking for Radarr, Sonarr and Plex libraries
//!
//! This library crate exposes the reconciliation core for integration testing.

pub mod config;
pub mod files;
pub mod parser;
pub mod reconcile;
pub mod remote;
pub mod scheduler;
pub mod store;
