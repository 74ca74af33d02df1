pub mod persist;
mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse, validate and prepare configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content).context("Failed to parse config")?;

    validate_config(&config)?;

    prepare_config(&mut config);

    Ok(config)
}

/// Default config file locations, in search order
const DEFAULT_PATHS: [&str; 4] = [
    "./config.toml",
    "./trailarr.toml",
    "~/.config/trailarr/config.toml",
    "/etc/trailarr/config.toml",
];

/// Resolve the config file to use: the given path, else the first default
/// location that exists.
pub fn find_config_file(custom_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = custom_path {
        return Some(path.to_path_buf());
    }

    DEFAULT_PATHS
        .iter()
        .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
        .find(|path| path.exists())
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = find_config_file(custom_path) {
        tracing::debug!("Using config file {:?}", path);
        return load_config(&path);
    }

    let mut config = Config::default();
    prepare_config(&mut config);
    Ok(config)
}

fn prepare_config(config: &mut Config) {
    if config.monitor.interval_mins < MIN_INTERVAL_MINS {
        tracing::warn!(
            "Monitor interval of {} minutes is below the minimum, using {}",
            config.monitor.interval_mins,
            MIN_INTERVAL_MINS
        );
        config.monitor.interval_mins = MIN_INTERVAL_MINS;
    }

    if config.http.timeout_secs == 0 {
        config.http.timeout_secs = HttpConfig::default().timeout_secs;
    }

    for connection in &mut config.connections {
        connection.url = connection.url.trim_end_matches('/').to_string();
        for mapping in &mut connection.path_mappings {
            mapping.from = with_trailing_separator(&mapping.from);
            mapping.to = with_trailing_separator(&mapping.to);
        }
    }
}

/// Append the path's own separator when it has more than one, so `/media/movies`
/// can't match `/media/movies-4k`. Single-separator paths like `/media` are kept.
pub fn with_trailing_separator(path: &str) -> String {
    let separator = if path.contains('\\') && !path.contains('/') {
        '\\'
    } else {
        '/'
    };

    let count = path.matches(separator).count();
    if count > 1 && !path.ends_with(separator) {
        format!("{}{}", path, separator)
    } else {
        path.to_string()
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    let mut names = HashSet::new();

    for connection in &config.connections {
        if connection.name.trim().is_empty() {
            anyhow::bail!("Connection names cannot be empty");
        }

        if !names.insert(connection.name.as_str()) {
            anyhow::bail!("Duplicate connection name '{}'", connection.name);
        }

        if !connection.enabled {
            continue;
        }

        if connection.url.trim().is_empty() {
            anyhow::bail!("Connection '{}' is enabled but has no URL", connection.name);
        }

        if connection.api_key.is_empty() {
            anyhow::bail!(
                "Connection '{}' is enabled but has no API key",
                connection.name
            );
        }

        for mapping in &connection.path_mappings {
            if mapping.from.is_empty() {
                anyhow::bail!(
                    "Connection '{}' has a path mapping with an empty 'from'",
                    connection.name
                );
            }
        }
    }

    Ok(())
}
