//! Endpoints, query parameters and errors for the feedback.fm REST API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Window the backend aggregates top lists over.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Roughly the last four weeks
    #[value(name = "short_term")]
    ShortTerm,
    /// Roughly the last six months
    #[default]
    #[value(name = "medium_term")]
    MediumTerm,
    /// All time
    #[value(name = "long_term")]
    LongTerm,
}

impl TimeRange {
    /// Query-string value understood by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }

    /// Human label for headers.
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "Last 4 Weeks",
            TimeRange::MediumTerm => "Last 6 Months",
            TimeRange::LongTerm => "All Time",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A GET endpoint serving view data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Profile { user_id: String },
    Dashboard { user_id: String },
    Stats { user_id: String },
    TopArtists { time_range: TimeRange },
    TopSongs { time_range: TimeRange },
    CurrentlyPlaying,
    History { limit: u32 },
    Playlists,
    Playlist { id: String },
    PlaylistSongs { id: String },
    Albums,
    Album { id: String },
    AlbumSongs { id: String },
    AlbumSearch { query: String },
}

impl Endpoint {
    /// Path and query relative to the API base URL.
    pub fn path_and_query(&self) -> String {
        use urlencoding::encode;

        match self {
            Endpoint::Profile { user_id } => format!("/users/{}", encode(user_id)),
            Endpoint::Dashboard { user_id } => format!("/users/{}/dashboard", encode(user_id)),
            Endpoint::Stats { user_id } => format!("/users/{}/stats", encode(user_id)),
            Endpoint::TopArtists { time_range } => {
                format!("/artists/top?time_range={}", time_range.as_str())
            }
            Endpoint::TopSongs { time_range } => {
                format!("/songs/top?time_range={}", time_range.as_str())
            }
            Endpoint::CurrentlyPlaying => "/songs/currently-playing".to_string(),
            Endpoint::History { limit } => format!("/history?limit={}", limit),
            Endpoint::Playlists => "/playlists".to_string(),
            Endpoint::Playlist { id } => format!("/playlists/{}", encode(id)),
            Endpoint::PlaylistSongs { id } => format!("/playlists/{}/songs", encode(id)),
            Endpoint::Albums => "/albums".to_string(),
            Endpoint::Album { id } => format!("/albums/{}", encode(id)),
            Endpoint::AlbumSongs { id } => format!("/albums/{}/songs", encode(id)),
            Endpoint::AlbumSearch { query } => format!("/albums/search?query={}", encode(query)),
        }
    }
}

/// Errors returned by backend calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// 401 - the stored credential is no longer accepted
    #[error("Session expired. Please login again.")]
    Unauthorized,

    /// Any other non-2xx status, with the server's `message` field if it sent one
    #[error("HTTP {status}{}", status_detail(.message))]
    Status { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The request needs a user id and the session has none
    #[error("User ID not found. Please login.")]
    MissingSubject,
}

fn status_detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Text shown in place of a view's data.
    ///
    /// Prefers what the server said, otherwise `fallback` (the view's generic
    /// "Failed to load ..." string).
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::Unauthorized | ApiError::MissingSubject => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_query_values() {
        assert_eq!(TimeRange::ShortTerm.as_str(), "short_term");
        assert_eq!(TimeRange::default(), TimeRange::MediumTerm);
        assert_eq!(
            Endpoint::TopArtists {
                time_range: TimeRange::LongTerm
            }
            .path_and_query(),
            "/artists/top?time_range=long_term"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let endpoint = Endpoint::Dashboard {
            user_id: "user name/1".into(),
        };
        assert_eq!(endpoint.path_and_query(), "/users/user%20name%2F1/dashboard");

        let search = Endpoint::AlbumSearch {
            query: "a&b".into(),
        };
        assert_eq!(search.path_and_query(), "/albums/search?query=a%26b");
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::Status {
            status: 500,
            message: Some("Spotify is down".into()),
        };
        assert_eq!(err.user_message("Failed to load top artists"), "Spotify is down");

        let err = ApiError::Status {
            status: 502,
            message: None,
        };
        assert_eq!(err.user_message("Failed to load top artists"), "Failed to load top artists");

        let err = ApiError::Network("connection reset".into());
        assert_eq!(err.user_message("Failed to load playlists"), "Failed to load playlists");
    }

    #[test]
    fn test_status_display() {
        let err = ApiError::Status {
            status: 404,
            message: Some("not found".into()),
        };
        assert_eq!(err.to_string(), "HTTP 404: not found");
        let bare = ApiError::Status {
            status: 503,
            message: None,
        };
        assert_eq!(bare.to_string(), "HTTP 503");
    }

    #[test]
    fn test_missing_subject_message() {
        assert_eq!(
            ApiError::MissingSubject.user_message("Failed to load dashboard"),
            "User ID not found. Please login."
        );
    }
}
