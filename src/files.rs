//! Trailer detection on disk.
//!
//! A media folder has a trailer when it contains a `Trailers` subfolder (any
//! case) holding at least one video file, or, when inline checks are on, a
//! video file in the folder itself whose stem contains `-trailer`.

use std::path::{Path, PathBuf};
use trailarr_common::paths::{is_inline_trailer, is_video_file};
use walkdir::WalkDir;

const TRAILERS_FOLDER: &str = "trailers";

/// Filesystem collaborator of the reconciliation engine.
#[async_trait::async_trait]
pub trait TrailerFinder: Send + Sync {
    /// Whether a trailer exists for the media stored at `folder_path`.
    ///
    /// Unreadable or nonexistent folders count as "no trailer".
    async fn trailer_exists(&self, folder_path: &str, check_inline: bool) -> bool;
}

/// [`TrailerFinder`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTrailerFinder;

#[async_trait::async_trait]
impl TrailerFinder for FsTrailerFinder {
    async fn trailer_exists(&self, folder_path: &str, check_inline: bool) -> bool {
        let folder = PathBuf::from(folder_path);
        match tokio::task::spawn_blocking(move || find_trailer(&folder, check_inline)).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Trailer check for {} failed: {}", folder_path, e);
                false
            }
        }
    }
}

/// Entries directly inside `dir`, skipping anything unreadable.
fn children(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
}

/// Blocking trailer lookup.
pub fn find_trailer(folder: &Path, check_inline: bool) -> bool {
    if !folder.is_dir() {
        return false;
    }

    for entry in children(folder) {
        let path = entry.path();

        if entry.file_type().is_dir() {
            let is_trailers = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.eq_ignore_ascii_case(TRAILERS_FOLDER))
                .unwrap_or(false);

            if is_trailers
                && children(path).any(|e| e.file_type().is_file() && is_video_file(e.path()))
            {
                tracing::trace!("Found trailer folder in {:?}", folder);
                return true;
            }
            continue;
        }

        if check_inline && is_inline_trailer(path) {
            tracing::trace!("Found inline trailer {:?}", path);
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_folder() {
        assert!(!find_trailer(Path::new("/definitely/not/here"), true));
    }

    #[test]
    fn test_trailers_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        let trailers = dir.path().join("Trailers");
        fs::create_dir(&trailers).unwrap();
        assert!(!find_trailer(dir.path(), false));

        fs::write(trailers.join("notes.txt"), b"").unwrap();
        assert!(!find_trailer(dir.path(), false));

        fs::write(trailers.join("Heat.mp4"), b"").unwrap();
        assert!(find_trailer(dir.path(), false));
    }

    #[test]
    fn test_trailers_folder_any_case() {
        let dir = tempfile::tempdir().unwrap();
        let trailers = dir.path().join("trailers");
        fs::create_dir(&trailers).unwrap();
        fs::write(trailers.join("a.mkv"), b"").unwrap();
        assert!(find_trailer(dir.path(), false));
    }

    #[test]
    fn test_inline_trailer_respects_flag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Heat (1995).mkv"), b"").unwrap();
        fs::write(dir.path().join("Heat (1995)-trailer.mkv"), b"").unwrap();

        assert!(find_trailer(dir.path(), true));
        assert!(!find_trailer(dir.path(), false));
    }

    #[tokio::test]
    async fn test_fs_finder() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Heat-Trailer.webm"), b"").unwrap();

        let finder = FsTrailerFinder;
        let folder = dir.path().to_string_lossy().to_string();
        assert!(finder.trailer_exists(&folder, true).await);
        assert!(!finder.trailer_exists(&folder, false).await);
    }
}
