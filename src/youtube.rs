//! YouTube URL parsing and canonical URL construction
//!
//! Everything in this module is pure string work: no I/O, no panics on
//! arbitrary input. Invalid input yields `None` / empty strings.

use regex::Regex;
use std::sync::OnceLock;

/// Length of a YouTube video id
const VIDEO_ID_LEN: usize = 11;

fn video_id_regex() -> &'static Regex {
    static VIDEO_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    VIDEO_ID_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Failed to compile video id regex")
    })
}

fn url_shape_regex() -> &'static Regex {
    static URL_SHAPE_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_SHAPE_REGEX.get_or_init(|| {
        // Known URL shapes: youtu.be/<id>, /v/<id>, /u/<w>/<id>, /embed/<id>,
        // watch?...v=<id>. The capture is validated for length afterwards.
        Regex::new(r"(?:youtu\.be/|/v/|/u/\w/|/embed/|watch\?.*?v=)([^#&?/\s]*)")
            .expect("Failed to compile URL shape regex")
    })
}

/// Check whether a string is a bare 11-character video id
pub fn is_video_id(input: &str) -> bool {
    video_id_regex().is_match(input)
}

/// Extract the 11-character video id from a URL or bare id.
///
/// Returns `None` when no known URL shape matches or the captured group is
/// not exactly 11 characters.
pub fn resolve_video_id(input: &str) -> Option<String> {
    let trimmed = input.trim();

    if is_video_id(trimmed) {
        return Some(trimmed.to_string());
    }

    let captures = url_shape_regex().captures(trimmed)?;
    let candidate = captures.get(1)?.as_str();

    if candidate.len() == VIDEO_ID_LEN && is_video_id(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Embed URL for a video URL or bare id, empty string when resolution fails
pub fn embed_url(input: &str) -> String {
    match resolve_video_id(input) {
        Some(id) => format!("https://www.youtube.com/embed/{}", id),
        None => String::new(),
    }
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Search URL for a channel name
pub fn channel_url(channel: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(channel)
    )
}

/// Default thumbnail URL for a video id
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bare_id() {
        assert_eq!(
            resolve_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_resolve_short_url() {
        assert_eq!(
            resolve_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_resolve_watch_url() {
        assert_eq!(
            resolve_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_resolve_watch_url_with_preceding_params() {
        assert_eq!(
            resolve_video_id("https://www.youtube.com/watch?feature=shared&v=dQw4w9WgXcQ&t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_resolve_embed_url() {
        assert_eq!(
            resolve_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_resolve_v_and_u_shapes() {
        assert_eq!(
            resolve_video_id("https://www.youtube.com/v/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            resolve_video_id("https://www.youtube.com/u/w/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        assert_eq!(resolve_video_id(""), None);
        assert_eq!(resolve_video_id("not a url"), None);
        assert_eq!(resolve_video_id("https://example.com/watch?v=short"), None);
        // 12 characters is not a video id
        assert_eq!(resolve_video_id("https://youtu.be/dQw4w9WgXcQQ"), None);
    }

    #[test]
    fn test_embed_url_composes_from_resolve() {
        assert_eq!(
            embed_url("https://youtu.be/dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
        assert_eq!(embed_url("nope"), "");
    }

    #[test]
    fn test_canonical_urls() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert_eq!(
            thumbnail_url("dQw4w9WgXcQ"),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
        assert!(channel_url("Rust Conf").contains("Rust%20Conf"));
    }
}
