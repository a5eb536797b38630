//! Video classification for files.
//!
//! A file counts as a video when the server's type tag says so, or failing
//! that when its URL carries a known video extension. The display name is
//! consulted only when the URL has no extension at all, since names are
//! user-edited and URLs are not.

use crate::node::FileRef;

/// Extensions recognized as video content.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "avi", "mkv", "mov", "flv", "wmv", "m4v", "3gp",
];

/// Whether a file should be treated as video content.
pub fn is_video(file: &FileRef) -> bool {
    let tag = file.file_type.to_ascii_lowercase();
    if tag == "video" || tag.starts_with("video/") {
        return true;
    }

    match url_extension(&file.url) {
        Some(ext) => is_video_extension(&ext),
        None => match name_extension(&file.name) {
            Some(ext) => is_video_extension(&ext),
            None => false,
        },
    }
}

fn is_video_extension(ext: &str) -> bool {
    VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext))
}

/// Extension of the URL's path component, with query and fragment stripped.
fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    extension_of(path)
}

fn name_extension(name: &str) -> Option<String> {
    extension_of(name)
}

fn extension_of(s: &str) -> Option<String> {
    let last_segment = s.rsplit('/').next().unwrap_or(s);
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
