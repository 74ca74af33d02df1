//! Path utilities for detecting video files by extension.
//!
//! Used by the trailer finder to decide which files in a media folder can
//! count as a trailer.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "webm", "mov", "wmv"];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use trailarr_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/Trailer.MP4")));
/// assert!(!is_video_file(Path::new("poster.jpg")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a path names an inline trailer file (`<name>-trailer.<video ext>`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use trailarr_common::paths::is_inline_trailer;
///
/// assert!(is_inline_trailer(Path::new("Dune (2021)-trailer.mkv")));
/// assert!(!is_inline_trailer(Path::new("Dune (2021).mkv")));
/// ```
pub fn is_inline_trailer(path: &Path) -> bool {
    if !is_video_file(path) {
        return false;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_lowercase().contains("-trailer"))
        .unwrap_or(false)
}
