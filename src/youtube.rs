//! YouTube link helpers for video-based recipe capture.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref VIDEO_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?:youtube\.com/watch\?(?:[^#\s]*&)?v=|youtu\.be/)([^&\n?#/\s]+)")
            .expect("Watch link pattern should be valid"),
        Regex::new(r"youtube\.com/(?:embed|shorts)/([^&\n?#/\s]+)")
            .expect("Embed link pattern should be valid"),
    ];
}

/// Whether the input looks like a YouTube link
pub fn is_youtube_url(input: &str) -> bool {
    input.contains("youtube.com") || input.contains("youtu.be")
}

/// Extract the video id from watch, short, embed and shorts links
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Convert a `SS`, `MM:SS` or `HH:MM:SS` timestamp to seconds
///
/// Returns `None` for empty, non-numeric or out-of-range components.
///
/// ```rust
/// use easycook::youtube::timestamp_to_seconds;
///
/// assert_eq!(timestamp_to_seconds("02:30"), Some(150));
/// assert_eq!(timestamp_to_seconds("1:02:03"), Some(3723));
/// assert_eq!(timestamp_to_seconds("soon"), None);
/// ```
pub fn timestamp_to_seconds(timestamp: &str) -> Option<u32> {
    let parts: Vec<&str> = timestamp.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut values = Vec::with_capacity(parts.len());
    for part in &parts {
        let part = part.trim();
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        values.push(part.parse::<u32>().ok()?);
    }

    // Only the leading component may exceed 59
    if values.iter().skip(1).any(|v| *v >= 60) {
        return None;
    }

    values
        .iter()
        .try_fold(0u32, |acc, v| acc.checked_mul(60)?.checked_add(*v))
}

/// Link that opens the video at the given timestamp
pub fn timestamp_url(video_id: &str, timestamp: &str) -> Option<String> {
    let seconds = timestamp_to_seconds(timestamp)?;
    Some(format!("https://www.youtube.com/watch?v={video_id}&t={seconds}s"))
}

/// High quality thumbnail for a video
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}
