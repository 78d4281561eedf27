//! Trait seam between the views and the backend.
//!
//! Production code uses [`FeedbackClient`](super::FeedbackClient); tests
//! substitute [`mocks::MockApi`], which replays scripted responses with
//! scripted latency.
//!
//! # Example
//!
//! ```ignore
//! use feedback_fm::api::DashboardApi;
//!
//! async fn count_playlists(api: &dyn DashboardApi) -> Result<usize, ApiError> {
//!     let value = api.get(&Endpoint::Playlists).await?;
//!     Ok(value.as_array().map(Vec::len).unwrap_or(0))
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;

use super::domain::{ApiError, Endpoint};

/// Read access to the feedback.fm REST API.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Fetch the JSON payload behind `endpoint`.
    async fn get(&self, endpoint: &Endpoint) -> Result<Value, ApiError>;

    /// Download raw bytes from an absolute URL (album artwork).
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

#[async_trait]
impl DashboardApi for super::client::FeedbackClient {
    async fn get(&self, endpoint: &Endpoint) -> Result<Value, ApiError> {
        self.get(endpoint).await
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.fetch_bytes(url).await
    }
}
