//! Display fields from loosely-typed payloads.
//!
//! The backend relays provider JSON in several shapes (`name` on one
//! endpoint, `artistName` on another, nested `album.images` on a third), so
//! every displayed field is resolved through an ordered list of candidate
//! JSON pointers. The first candidate holding a non-blank string wins;
//! otherwise the field's placeholder is used.
//!
//! All functions here are pure and never fail.

pub mod format;

use serde_json::Value;
use std::cmp::Ordering;

/// Ordered fallback chain for one display field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// JSON pointers, tried in order
    pub candidates: &'static [&'static str],
    pub placeholder: &'static str,
}

impl Projection {
    /// First candidate holding a non-blank string (or a number).
    pub fn resolve(&self, record: &Value) -> Option<String> {
        self.candidates
            .iter()
            .find_map(|pointer| record.pointer(pointer).and_then(scalar_text))
    }

    /// Resolved value, or the placeholder.
    pub fn project(&self, record: &Value) -> String {
        self.resolve(record)
            .unwrap_or_else(|| self.placeholder.to_string())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub const ARTIST_NAME: Projection = Projection {
    candidates: &["/name", "/artistName", "/displayName"],
    placeholder: "Unknown Artist",
};

pub const SONG_NAME: Projection = Projection {
    candidates: &["/name", "/songName", "/title"],
    placeholder: "Unknown Song",
};

pub const SONG_ARTIST: Projection = Projection {
    candidates: &["/artistName", "/artist/name", "/artists/0/name", "/artist"],
    placeholder: "Unknown Artist",
};

pub const ALBUM_NAME: Projection = Projection {
    candidates: &["/name", "/albumName", "/title", "/album/name"],
    placeholder: "Unknown Album",
};

pub const PLAYLIST_NAME: Projection = Projection {
    candidates: &["/name", "/title"],
    placeholder: "Untitled Playlist",
};

pub const TRACK_NAME: Projection = Projection {
    candidates: &["/name", "/songName", "/title", "/trackName"],
    placeholder: "Unknown Track",
};

pub const IMAGE: Projection = Projection {
    candidates: &[
        "/image",
        "/albumImage",
        "/images/0/url",
        "/album/images/0/url",
        "/profileImage",
        "/photoUrl",
    ],
    placeholder: "",
};

pub const LINK: Projection = Projection {
    candidates: &["/href", "/external_urls/spotify"],
    placeholder: "",
};

pub const KEY: Projection = Projection {
    candidates: &["/id", "/artistId", "/songId", "/playlistId", "/spotifyId"],
    placeholder: "",
};

/// Name used for sorting any list of records
const SORT_NAME: Projection = Projection {
    candidates: &["/name", "/artistName", "/songName", "/title", "/displayName"],
    placeholder: "",
};

/// What kind of record a name is projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Artist,
    Song,
    Album,
    Playlist,
    Track,
}

impl RecordKind {
    pub fn name_projection(self) -> &'static Projection {
        match self {
            RecordKind::Artist => &ARTIST_NAME,
            RecordKind::Song => &SONG_NAME,
            RecordKind::Album => &ALBUM_NAME,
            RecordKind::Playlist => &PLAYLIST_NAME,
            RecordKind::Track => &TRACK_NAME,
        }
    }
}

pub fn project_name(record: &Value, kind: RecordKind) -> String {
    kind.name_projection().project(record)
}

/// Artist credited on a song record.
pub fn project_song_artist(record: &Value) -> String {
    SONG_ARTIST.project(record)
}

pub fn project_image(record: &Value) -> Option<String> {
    IMAGE.resolve(record)
}

pub fn project_link(record: &Value) -> Option<String> {
    LINK.resolve(record)
}

/// Stable identity for list rendering, falling back to the position.
pub fn project_key(record: &Value, index: usize) -> String {
    KEY.resolve(record).unwrap_or_else(|| index.to_string())
}

/// Records whose projected `fields` contain `query`, case-insensitively.
///
/// A record matches if any field matches; fields absent from a record never
/// match. A blank query returns every record.
pub fn filter_by_text(records: &[Value], query: &str, fields: &[&Projection]) -> Vec<Value> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| {
            fields.iter().any(|field| {
                field
                    .resolve(record)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect()
}

/// Client-side ordering for list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortCriterion {
    /// Server order
    #[default]
    Default,
    /// A to Z by name
    Name,
    /// Most popular first
    Popularity,
}

/// Sorted copy of `records`. Ties keep their server order.
pub fn sort_by(records: &[Value], criterion: SortCriterion) -> Vec<Value> {
    let mut sorted = records.to_vec();
    match criterion {
        SortCriterion::Default => {}
        SortCriterion::Name => sorted.sort_by(|a, b| sort_name(a).cmp(&sort_name(b))),
        SortCriterion::Popularity => sorted.sort_by(|a, b| {
            popularity(b)
                .partial_cmp(&popularity(a))
                .unwrap_or(Ordering::Equal)
        }),
    }
    sorted
}

fn sort_name(record: &Value) -> String {
    SORT_NAME.project(record).to_lowercase()
}

fn popularity(record: &Value) -> f64 {
    record
        .get("popularity")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}
