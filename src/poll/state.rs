//! View state published by a polling controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Data-loading status of one view. Exactly one variant holds at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState<T> {
    /// Not started, or started with a deferred first fetch
    #[default]
    Idle,
    /// First fetch of the current run is in flight
    Loading,
    Success(T),
    Error {
        message: String,
        occurred_at: DateTime<Utc>,
        /// Data from before the failure, kept when the view's
        /// [`StaleDataPolicy`] is `Retain`
        last_good: Option<T>,
    },
}

impl<T> ViewState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, ViewState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ViewState::Error { .. })
    }

    /// Whether a fetch has finished since the run started.
    pub fn is_settled(&self) -> bool {
        matches!(self, ViewState::Success(_) | ViewState::Error { .. })
    }

    /// The freshest data available: the success payload, or stale data kept
    /// alongside an error.
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Success(data) => Some(data),
            ViewState::Error { last_good, .. } => last_good.as_ref(),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// What a failed refresh does to data already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleDataPolicy {
    /// Keep showing the last good data next to the error
    #[default]
    Retain,
    /// Replace the data with the error
    Discard,
}
