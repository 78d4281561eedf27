//! Text formatting for individual display fields.

use chrono::{DateTime, Local, Utc};
use serde_json::Value;

/// Short "how long ago" label for a `playedAt` timestamp.
///
/// Unparseable input gives an empty string. Timestamps in the future count
/// as "Just now".
pub fn relative_time(played_at: &str, now: DateTime<Utc>) -> String {
    let Ok(played) = DateTime::parse_from_rfc3339(played_at.trim()) else {
        return String::new();
    };

    let minutes = (now - played.with_timezone(&Utc)).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days == 1 {
        "Yesterday".to_string()
    } else {
        format!("{}d ago", days)
    }
}

/// Absolute timestamp in the local zone, or the input unchanged if it does
/// not parse.
pub fn local_timestamp(played_at: &str) -> String {
    match DateTime::parse_from_rfc3339(played_at.trim()) {
        Ok(time) => time
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => played_at.to_string(),
    }
}

/// `followers.total` as "1.2M followers". `None` when absent or zero.
pub fn followers(artist: &Value) -> Option<String> {
    let total = artist.pointer("/followers/total").and_then(Value::as_f64)?;
    (total > 0.0).then(|| format!("{:.1}M followers", total / 1_000_000.0))
}

/// "Playing" or "Paused" from `isPlaying`, `None` when the field is absent.
pub fn playback_status(track: &Value) -> Option<&'static str> {
    track
        .get("isPlaying")
        .and_then(Value::as_bool)
        .map(|playing| if playing { "Playing" } else { "Paused" })
}

/// Whether the now-playing widget should show `track` at all.
///
/// Needs a non-blank name, and `isPlaying` must not be explicitly `false`.
pub fn is_actively_playing(track: &Value) -> bool {
    let named = track
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    named && track.get("isPlaying").and_then(Value::as_bool) != Some(false)
}

/// "N songs" from `trackCount`, else the length of `songs`.
pub fn playlist_track_count(playlist: &Value) -> Option<String> {
    let count = playlist
        .get("trackCount")
        .and_then(Value::as_u64)
        .filter(|count| *count > 0)
        .or_else(|| {
            playlist
                .get("songs")
                .and_then(Value::as_array)
                .map(|songs| songs.len() as u64)
        })?;
    Some(format!("{} songs", count))
}

/// "Public" / "Private" from `isPublic`.
pub fn playlist_visibility(playlist: &Value) -> Option<&'static str> {
    playlist
        .get("isPublic")
        .and_then(Value::as_bool)
        .map(|public| if public { "Public" } else { "Private" })
}

pub fn first_genre(artist: &Value) -> Option<&str> {
    artist.pointer("/genres/0").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn ago(delta: Duration) -> String {
        (now() - delta).to_rfc3339()
    }

    #[test]
    fn test_relative_time_buckets() {
        assert_eq!(relative_time(&ago(Duration::seconds(30)), now()), "Just now");
        assert_eq!(relative_time(&ago(Duration::minutes(5)), now()), "5m ago");
        assert_eq!(relative_time(&ago(Duration::minutes(59)), now()), "59m ago");
        assert_eq!(relative_time(&ago(Duration::hours(3)), now()), "3h ago");
        assert_eq!(relative_time(&ago(Duration::hours(30)), now()), "Yesterday");
        assert_eq!(relative_time(&ago(Duration::days(4)), now()), "4d ago");
    }

    #[test]
    fn test_relative_time_edge_inputs() {
        assert_eq!(relative_time("not a date", now()), "");
        assert_eq!(relative_time(&ago(Duration::minutes(-10)), now()), "Just now");
    }

    #[test]
    fn test_local_timestamp_passthrough() {
        assert_eq!(local_timestamp("yesterday-ish"), "yesterday-ish");
        assert_eq!(local_timestamp("2024-03-10T12:00:00Z").len(), 16);
    }

    #[test]
    fn test_followers() {
        assert_eq!(
            followers(&json!({"followers": {"total": 1_234_567}})).as_deref(),
            Some("1.2M followers")
        );
        assert_eq!(followers(&json!({"followers": {"total": 0}})), None);
        assert_eq!(followers(&json!({})), None);
    }

    #[test]
    fn test_actively_playing() {
        assert!(is_actively_playing(&json!({"name": "Song"})));
        assert!(is_actively_playing(&json!({"name": "Song", "isPlaying": true})));
        assert!(!is_actively_playing(&json!({"name": "Song", "isPlaying": false})));
        assert!(!is_actively_playing(&json!({"name": "  "})));
        assert!(!is_actively_playing(&Value::Null));

        assert_eq!(playback_status(&json!({"isPlaying": false})), Some("Paused"));
        assert_eq!(playback_status(&json!({})), None);
    }

    #[test]
    fn test_playlist_fields() {
        assert_eq!(
            playlist_track_count(&json!({"trackCount": 12})).as_deref(),
            Some("12 songs")
        );
        assert_eq!(
            playlist_track_count(&json!({"trackCount": 0, "songs": [1, 2]})).as_deref(),
            Some("2 songs")
        );
        assert_eq!(playlist_track_count(&json!({})), None);
        assert_eq!(playlist_visibility(&json!({"isPublic": false})), Some("Private"));
        assert_eq!(first_genre(&json!({"genres": ["shoegaze", "dream pop"]})), Some("shoegaze"));
    }
}
