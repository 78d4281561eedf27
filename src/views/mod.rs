//! The dashboard's data views.
//!
//! Each view is a [`ViewResource`]: an endpoint builder plus a decoder,
//! driven by a [`PollingController`](crate::poll::PollingController). The
//! constructors below pin the endpoint, key type and failure text of every
//! screen; [`Route`] picks the poll interval.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::api::{ApiError, DashboardApi, Endpoint};
use crate::config::PollingConfig;
use crate::poll::{PollConfig, PollConfigError, Resource};
use crate::session::SessionStatus;

pub use crate::api::TimeRange;

/// Accepted history page sizes
pub const HISTORY_LIMIT_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// Tracks shown in the dashboard's recently-played strip
pub const RECENTLY_PLAYED_LIMIT: u32 = 10;

/// Screens of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Unauthenticated landing screen
    Login,
    Dashboard,
    TopArtists,
    TopSongs,
    CurrentlyPlaying,
    History,
    Playlists,
    Albums,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Dashboard => "/dashboard",
            Route::TopArtists => "/top-artists",
            Route::TopSongs => "/top-songs",
            Route::CurrentlyPlaying => "/currently-playing",
            Route::History => "/history",
            Route::Playlists => "/playlists",
            Route::Albums => "/albums",
        }
    }

    /// Where a session status change sends the user, if anywhere.
    pub fn for_status(status: SessionStatus) -> Option<Route> {
        match status {
            SessionStatus::SignedIn => None,
            SessionStatus::SignedOut | SessionStatus::Expired => Some(Route::Login),
        }
    }

    /// Refresh schedule for this screen's main resource.
    pub fn poll_config(&self, polling: &PollingConfig) -> Result<PollConfig, PollConfigError> {
        let secs = match self {
            Route::Login => return Err(PollConfigError::ZeroInterval),
            Route::Dashboard => polling.dashboard_secs,
            Route::TopArtists | Route::TopSongs => polling.top_lists_secs,
            Route::CurrentlyPlaying => polling.currently_playing_secs,
            Route::History => polling.history_secs,
            Route::Playlists | Route::Albums => polling.playlists_secs,
        };
        PollConfig::every_secs(secs)
    }
}

/// Which album list to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumQuery {
    All,
    Search(String),
}

type EndpointFn<K> = fn(&K, Option<&str>) -> Result<Endpoint, ApiError>;
type DecodeFn<T> = fn(Value) -> Result<T, ApiError>;

/// A view's remote data: where to get it and how to read it.
pub struct ViewResource<K, T> {
    name: &'static str,
    requires_subject: bool,
    endpoint: EndpointFn<K>,
    decode: DecodeFn<T>,
}

impl<K, T> ViewResource<K, T> {
    /// Endpoint for `key` given the session's subject id.
    pub fn endpoint(&self, key: &K, subject: Option<&str>) -> Result<Endpoint, ApiError> {
        (self.endpoint)(key, subject)
    }
}

#[async_trait]
impl<K, T> Resource for ViewResource<K, T>
where
    K: Clone + PartialEq + Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    type Key = K;
    type Output = T;

    fn name(&self) -> &str {
        self.name
    }

    fn requires_subject(&self) -> bool {
        self.requires_subject
    }

    async fn fetch(
        &self,
        api: &dyn DashboardApi,
        key: &K,
        subject: Option<&str>,
    ) -> Result<T, ApiError> {
        let endpoint = self.endpoint(key, subject)?;
        let payload = api.get(&endpoint).await?;
        (self.decode)(payload)
    }
}

fn subject(subject: Option<&str>) -> Result<String, ApiError> {
    subject
        .map(str::to_string)
        .ok_or(ApiError::MissingSubject)
}

fn as_is(value: Value) -> Result<Value, ApiError> {
    Ok(value)
}

/// A list payload. `null` is an empty list; anything else but an array is
/// a malformed response.
pub fn into_records(value: Value) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        other => Err(ApiError::Parse(format!(
            "expected a list, got {}",
            json_kind(&other)
        ))),
    }
}

/// Nothing playing comes back as 204 or as an empty object.
fn into_track(value: Value) -> Result<Option<Value>, ApiError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(fields) if fields.is_empty() => Ok(None),
        Value::Object(fields) => Ok(Some(Value::Object(fields))),
        other => Err(ApiError::Parse(format!(
            "expected a track, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

pub fn clamp_history_limit(limit: u32) -> u32 {
    limit.clamp(*HISTORY_LIMIT_RANGE.start(), *HISTORY_LIMIT_RANGE.end())
}

pub fn dashboard() -> ViewResource<(), Value> {
    ViewResource {
        name: "dashboard",
        requires_subject: true,
        endpoint: |_, id| Ok(Endpoint::Dashboard { user_id: subject(id)? }),
        decode: as_is,
    }
}

pub fn profile() -> ViewResource<(), Value> {
    ViewResource {
        name: "profile",
        requires_subject: true,
        endpoint: |_, id| Ok(Endpoint::Profile { user_id: subject(id)? }),
        decode: as_is,
    }
}

pub fn stats() -> ViewResource<(), Value> {
    ViewResource {
        name: "stats",
        requires_subject: true,
        endpoint: |_, id| Ok(Endpoint::Stats { user_id: subject(id)? }),
        decode: as_is,
    }
}

pub fn top_artists() -> ViewResource<TimeRange, Vec<Value>> {
    ViewResource {
        name: "top artists",
        requires_subject: false,
        endpoint: |range, _| Ok(Endpoint::TopArtists { time_range: *range }),
        decode: into_records,
    }
}

pub fn top_songs() -> ViewResource<TimeRange, Vec<Value>> {
    ViewResource {
        name: "top songs",
        requires_subject: false,
        endpoint: |range, _| Ok(Endpoint::TopSongs { time_range: *range }),
        decode: into_records,
    }
}

pub fn currently_playing() -> ViewResource<(), Option<Value>> {
    ViewResource {
        name: "currently playing track",
        requires_subject: false,
        endpoint: |_, _| Ok(Endpoint::CurrentlyPlaying),
        decode: into_track,
    }
}

/// Keyed by page size, clamped to [`HISTORY_LIMIT_RANGE`].
pub fn history() -> ViewResource<u32, Vec<Value>> {
    ViewResource {
        name: "listening history",
        requires_subject: false,
        endpoint: |limit, _| {
            Ok(Endpoint::History {
                limit: clamp_history_limit(*limit),
            })
        },
        decode: into_records,
    }
}

pub fn playlists() -> ViewResource<(), Vec<Value>> {
    ViewResource {
        name: "playlists",
        requires_subject: false,
        endpoint: |_, _| Ok(Endpoint::Playlists),
        decode: into_records,
    }
}

pub fn playlist() -> ViewResource<String, Value> {
    ViewResource {
        name: "playlist",
        requires_subject: false,
        endpoint: |id, _| Ok(Endpoint::Playlist { id: id.clone() }),
        decode: as_is,
    }
}

pub fn playlist_songs() -> ViewResource<String, Vec<Value>> {
    ViewResource {
        name: "playlist songs",
        requires_subject: false,
        endpoint: |id, _| Ok(Endpoint::PlaylistSongs { id: id.clone() }),
        decode: into_records,
    }
}

pub fn albums() -> ViewResource<AlbumQuery, Vec<Value>> {
    ViewResource {
        name: "albums",
        requires_subject: false,
        endpoint: |query, _| {
            Ok(match query {
                AlbumQuery::All => Endpoint::Albums,
                AlbumQuery::Search(text) if text.trim().is_empty() => Endpoint::Albums,
                AlbumQuery::Search(text) => Endpoint::AlbumSearch {
                    query: text.trim().to_string(),
                },
            })
        },
        decode: into_records,
    }
}

pub fn album() -> ViewResource<String, Value> {
    ViewResource {
        name: "album",
        requires_subject: false,
        endpoint: |id, _| Ok(Endpoint::Album { id: id.clone() }),
        decode: as_is,
    }
}

pub fn album_songs() -> ViewResource<String, Vec<Value>> {
    ViewResource {
        name: "album songs",
        requires_subject: false,
        endpoint: |id, _| Ok(Endpoint::AlbumSongs { id: id.clone() }),
        decode: into_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::traits::mocks::{MockApi, Reply};
    use serde_json::json;

    #[test]
    fn test_route_for_status() {
        assert_eq!(Route::for_status(SessionStatus::Expired), Some(Route::Login));
        assert_eq!(Route::for_status(SessionStatus::SignedOut), Some(Route::Login));
        assert_eq!(Route::for_status(SessionStatus::SignedIn), None);
        assert_eq!(Route::Login.path(), "/");
    }

    #[test]
    fn test_route_poll_intervals() {
        let polling = PollingConfig::default();
        let interval = |route: Route| route.poll_config(&polling).unwrap().interval().as_secs();
        assert_eq!(interval(Route::Dashboard), 60);
        assert_eq!(interval(Route::CurrentlyPlaying), 5);
        assert!(Route::Login.poll_config(&polling).is_err());
    }

    #[test]
    fn test_subject_endpoints() {
        assert_eq!(
            dashboard().endpoint(&(), Some("listener42")),
            Ok(Endpoint::Dashboard {
                user_id: "listener42".into()
            })
        );
        assert_eq!(stats().endpoint(&(), None), Err(ApiError::MissingSubject));
        assert!(dashboard().requires_subject());
        assert!(!top_artists().requires_subject());
    }

    #[test]
    fn test_history_limit_is_clamped() {
        assert_eq!(
            history().endpoint(&0, None),
            Ok(Endpoint::History { limit: 1 })
        );
        assert_eq!(
            history().endpoint(&500, None),
            Ok(Endpoint::History { limit: 100 })
        );
        assert_eq!(
            history().endpoint(&50, None),
            Ok(Endpoint::History { limit: 50 })
        );
    }

    #[test]
    fn test_album_query_endpoints() {
        assert_eq!(albums().endpoint(&AlbumQuery::All, None), Ok(Endpoint::Albums));
        assert_eq!(
            albums().endpoint(&AlbumQuery::Search("  ".into()), None),
            Ok(Endpoint::Albums)
        );
        assert_eq!(
            albums().endpoint(&AlbumQuery::Search(" Blue ".into()), None),
            Ok(Endpoint::AlbumSearch {
                query: "Blue".into()
            })
        );
    }

    #[test]
    fn test_record_decoding() {
        assert_eq!(into_records(Value::Null), Ok(vec![]));
        assert_eq!(into_records(json!([1, 2])), Ok(vec![json!(1), json!(2)]));
        assert!(matches!(into_records(json!({"a": 1})), Err(ApiError::Parse(_))));

        assert_eq!(into_track(Value::Null), Ok(None));
        assert_eq!(into_track(json!({})), Ok(None));
        assert_eq!(
            into_track(json!({"name": "Song"})),
            Ok(Some(json!({"name": "Song"})))
        );
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(top_artists().failure_message(), "Failed to load top artists");
        assert_eq!(history().failure_message(), "Failed to load listening history");
        assert_eq!(
            currently_playing().failure_message(),
            "Failed to load currently playing track"
        );
    }

    #[tokio::test]
    async fn test_fetch_decodes_payload() {
        let api = MockApi::new();
        api.script(
            Endpoint::TopSongs {
                time_range: TimeRange::LongTerm,
            },
            Reply::ok(json!([{"name": "Song"}])),
        );

        let songs = top_songs()
            .fetch(&api, &TimeRange::LongTerm, None)
            .await
            .unwrap();
        assert_eq!(songs, vec![json!({"name": "Song"})]);

        let missing = playlists().fetch(&api, &(), None).await;
        assert!(matches!(missing, Err(ApiError::Status { status: 404, .. })));
    }
}
