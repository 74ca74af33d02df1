//! Configuration persistence using toml_edit to preserve formatting and comments.

use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::DocumentMut;
use trailarr_common::MonitorMode;

fn read_document(path: &Path) -> Result<DocumentMut> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    content
        .parse()
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

fn write_document(path: &Path, doc: &DocumentMut) -> Result<()> {
    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))
}

/// Remove one `[[connections]]` table, leaving the rest of the file as written.
pub fn remove_connection(path: &Path, name: &str) -> Result<()> {
    let mut doc = read_document(path)?;

    let tables = connection_tables(&mut doc, path)?;
    let index = tables
        .iter()
        .position(|table| table.get("name").and_then(|v| v.as_str()) == Some(name))
        .ok_or_else(|| anyhow::anyhow!("Connection '{}' not found in {:?}", name, path))?;
    tables.remove(index);

    if tables.is_empty() {
        doc.remove("connections");
    }

    write_document(path, &doc)
}

fn connection_tables<'a>(
    doc: &'a mut DocumentMut,
    path: &Path,
) -> Result<&'a mut toml_edit::ArrayOfTables> {
    doc.get_mut("connections")
        .and_then(|item| item.as_array_of_tables_mut())
        .ok_or_else(|| anyhow::anyhow!("No connections defined in {:?}", path))
}

/// Change the monitor mode of one connection in place.
///
/// Only the `monitor` key of the matching `[[connections]]` table is touched.
pub fn set_monitor_mode(path: &Path, name: &str, mode: MonitorMode) -> Result<()> {
    let mut doc = read_document(path)?;

    let table = connection_tables(&mut doc, path)?
        .iter_mut()
        .find(|table| table.get("name").and_then(|v| v.as_str()) == Some(name))
        .ok_or_else(|| anyhow::anyhow!("Connection '{}' not found in {:?}", name, path))?;

    table["monitor"] = toml_edit::value(mode.to_string());

    write_document(path, &doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    const ORIGINAL: &str = r#"# trailarr settings
data_dir = "/config"

[[connections]]
name = "radarr"
type = "radarr"
url = "http://radarr:7878"
api_key = "abc" # keep me
monitor = "new"
"#;

    #[test]
    fn test_set_monitor_mode_preserves_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, ORIGINAL).unwrap();

        set_monitor_mode(&path, "radarr", MonitorMode::Sync).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# trailarr settings"));
        assert!(written.contains("# keep me"));

        let config = load_config(&path).unwrap();
        assert_eq!(config.connections[0].monitor, MonitorMode::Sync);
    }

    #[test]
    fn test_set_monitor_mode_unknown_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, ORIGINAL).unwrap();

        assert!(set_monitor_mode(&path, "sonarr", MonitorMode::Sync).is_err());
    }

    #[test]
    fn test_remove_connection_keeps_others_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let original = format!(
            "{}{}",
            ORIGINAL,
            r#"
[[connections]]
name = "sonarr"
type = "sonarr"
url = "http://sonarr:8989/"
api_key = "def"
monitor = "sometimes"

[[connections.path_mappings]]
from = "/tv/shows"
to = "/media/tv"
"#
        );
        std::fs::write(&path, &original).unwrap();

        remove_connection(&path, "radarr").unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# trailarr settings"));
        assert!(!written.contains("radarr"));
        assert!(written.contains(r#"url = "http://sonarr:8989/""#));
        assert!(written.contains(r#"monitor = "sometimes""#));
        assert!(written.contains(r#"from = "/tv/shows""#));
        assert!(written.contains(r#"to = "/media/tv""#));

        let config = load_config(&path).unwrap();
        assert_eq!(config.connections.len(), 1);
        assert_eq!(config.connections[0].name, "sonarr");
    }

    #[test]
    fn test_remove_last_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, ORIGINAL).unwrap();

        remove_connection(&path, "radarr").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.connections.is_empty());
        assert_eq!(config.data_dir, Path::new("/config"));
        assert!(remove_connection(&path, "radarr").is_err());
    }
}
