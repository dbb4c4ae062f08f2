//! Filename utilities for uploads.
//!
//! Uploads are accepted on extension alone; no content sniffing happens here.
//! Client-supplied names are never used as paths directly, only as a display
//! name after [`sanitize_filename`].

use std::path::Path;

/// Container extensions accepted for upload.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm", "flv", "wmv"];

/// Check if a path has an accepted video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use chunkforge_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("talk.mp4")));
/// assert!(is_video_file(Path::new("/path/to/CLIP.MKV")));
/// assert!(!is_video_file(Path::new("notes.txt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    video_extension(path).is_some()
}

/// Lowercased extension of `path` if it is in the allow-list.
pub fn video_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Get the list of accepted video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Reduce a client-supplied filename to a safe display name.
///
/// Directory components are dropped (both `/` and `\` separators), characters
/// outside `[A-Za-z0-9._-]` become `_`, and leading dots are stripped so the
/// result can never be a hidden file or a relative path.
///
/// # Examples
///
/// ```
/// use chunkforge_common::paths::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/My Video.mp4"), "My_Video.mp4");
/// assert_eq!(sanitize_filename("C:\\clips\\a.mkv"), "a.mkv");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}
