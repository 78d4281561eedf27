//! Plain-text rendering of view states.

use chrono::{DateTime, Local, Utc};
use serde_json::Value;

use crate::accent::Accent;
use crate::api::TimeRange;
use crate::poll::ViewState;
use crate::projection::{self, RecordKind, format};

/// Render `state`, using `body` for whatever data it holds.
///
/// Stale data kept next to an error is shown with the error underneath.
pub fn state<T>(state: &ViewState<T>, body: impl Fn(&T) -> String) -> String {
    match state {
        ViewState::Idle => "Waiting for first refresh...".to_string(),
        ViewState::Loading => "Loading...".to_string(),
        ViewState::Success(data) => body(data),
        ViewState::Error {
            message,
            occurred_at,
            last_good: Some(data),
        } => format!(
            "{}\n! {} (at {}, showing earlier data)",
            body(data),
            message,
            occurred_at.with_timezone(&Local).format("%H:%M:%S")
        ),
        ViewState::Error { message, .. } => format!("Error: {}", message),
    }
}

fn numbered(records: &[Value], line: impl Fn(&Value) -> String) -> String {
    if records.is_empty() {
        return "(nothing here yet)".to_string();
    }
    records
        .iter()
        .enumerate()
        .map(|(i, record)| format!("{:>3}. {}", i + 1, line(record)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn song_line(song: &Value) -> String {
    format!(
        "{} - {}",
        projection::project_name(song, RecordKind::Song),
        projection::project_song_artist(song)
    )
}

pub fn artists(records: &[Value], range: TimeRange) -> String {
    let list = numbered(records, |artist| {
        let mut line = projection::project_name(artist, RecordKind::Artist);
        if let Some(genre) = format::first_genre(artist) {
            line.push_str(&format!("  [{}]", genre));
        }
        if let Some(followers) = format::followers(artist) {
            line.push_str(&format!("  {}", followers));
        }
        line
    });
    format!("Top Artists ({})\n{}", range.label(), list)
}

pub fn songs(records: &[Value], range: TimeRange) -> String {
    format!("Top Songs ({})\n{}", range.label(), numbered(records, song_line))
}

pub fn now_playing(track: &Option<Value>) -> String {
    let Some(track) = track else {
        return "Nothing playing right now.".to_string();
    };

    let mut lines = vec![
        format!("Track:  {}", projection::project_name(track, RecordKind::Track)),
        format!("Artist: {}", projection::project_song_artist(track)),
    ];
    if let Some(album) = projection::ALBUM_NAME.resolve(&track["album"]) {
        lines.push(format!("Album:  {}", album));
    }
    if let Some(status) = format::playback_status(track) {
        lines.push(format!("Status: {}", status));
    }
    if let Some(link) = projection::project_link(track) {
        lines.push(format!("Link:   {}", link));
    }
    lines.join("\n")
}

pub fn history(records: &[Value]) -> String {
    let list = numbered(records, |item| {
        let played = item
            .get("playedAt")
            .and_then(Value::as_str)
            .map(format::local_timestamp)
            .unwrap_or_default();
        format!("{:<16}  {}", played, song_line(item))
    });
    format!("Listening History\n{}", list)
}

/// Short list with relative play times, for the dashboard.
pub fn recently_played(records: &[Value], now: DateTime<Utc>) -> String {
    numbered(records, |item| {
        let ago = item
            .get("playedAt")
            .and_then(Value::as_str)
            .map(|at| format::relative_time(at, now))
            .unwrap_or_default();
        if ago.is_empty() {
            song_line(item)
        } else {
            format!("{}  ({})", song_line(item), ago)
        }
    })
}

pub fn playlists(records: &[Value]) -> String {
    let list = numbered(records, |playlist| {
        let mut line = projection::project_name(playlist, RecordKind::Playlist);
        if let Some(count) = format::playlist_track_count(playlist) {
            line.push_str(&format!("  {}", count));
        }
        if let Some(visibility) = format::playlist_visibility(playlist) {
            line.push_str(&format!("  [{}]", visibility));
        }
        line.push_str(&format!("  id={}", projection::project_key(playlist, 0)));
        line
    });
    format!("Playlists\n{}", list)
}

pub fn albums(records: &[Value]) -> String {
    let list = numbered(records, |album| {
        format!(
            "{} - {}  id={}",
            projection::project_name(album, RecordKind::Album),
            projection::project_song_artist(album),
            projection::project_key(album, 0)
        )
    });
    format!("Albums\n{}", list)
}

pub fn tracks(title: &str, records: &[Value]) -> String {
    format!("{}\n{}", title, numbered(records, song_line))
}

/// Top-level scalar fields of an object, one per line.
pub fn fields(title: &str, record: &Value) -> String {
    let Some(object) = record.as_object() else {
        return format!("{}\n(no data)", title);
    };
    let lines: Vec<String> = object
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some(format!("  {}: {}", key, text))
        })
        .collect();
    format!("{}\n{}", title, lines.join("\n"))
}

pub fn dashboard(
    data: &ViewState<Value>,
    track: &ViewState<Option<Value>>,
    recent: &ViewState<Vec<Value>>,
    accent: Option<&Accent>,
    now: DateTime<Utc>,
) -> String {
    let mut out = Vec::new();

    if let Some(quip) = accent.and_then(|a| a.quip.as_deref()) {
        out.push(format!("~ {} ~", quip));
    }

    out.push(state(data, |dashboard| {
        let name = projection::project_name(dashboard, RecordKind::Artist);
        let mut text = format!("Welcome back, {}", name);
        if let Some(stats) = dashboard.get("stats") {
            text.push('\n');
            text.push_str(&fields("Stats", stats));
        }
        text
    }));

    let playing = state(track, |track| match track {
        Some(track) if format::is_actively_playing(track) => {
            let mut text = format!("Now Playing\n{}", now_playing(&Some(track.clone())));
            if let Some(accent) = accent {
                text.push_str(&format!("\nAccent: {}", accent.color));
            }
            text
        }
        _ => "Now Playing\nNothing playing right now.".to_string(),
    });
    out.push(playing);

    out.push(format!(
        "Recently Played\n{}",
        state(recent, |records| recently_played(records, now))
    ));

    out.join("\n\n")
}
