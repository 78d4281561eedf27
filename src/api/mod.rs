//! feedback.fm backend client.
//!
//! # Architecture
//!
//! Split by concern:
//! - **Domain** (`domain.rs`) - endpoints, time ranges and [`ApiError`]
//! - **DTOs** (`dto.rs`) - exact shapes of the auth responses we type
//! - **Client** (`client.rs`) - the reqwest-backed HTTP client
//! - **Traits** (`traits.rs`) - [`DashboardApi`], the seam the polling
//!   controller depends on so tests can substitute a scripted mock
//!
//! View payloads stay as `serde_json::Value`. Their shape varies by endpoint
//! and backend version, so display fields are derived later by
//! [`crate::projection`] instead of being fixed here.

pub mod client;
pub mod domain;
pub mod dto;
pub mod traits;

pub use client::FeedbackClient;
pub use domain::{ApiError, Endpoint, TimeRange};
pub use traits::DashboardApi;
