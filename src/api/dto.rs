//! Typed shapes of the auth endpoints and the backend's error body.
//!
//! Only the handful of responses we act on are typed. View payloads stay
//! untyped (`serde_json::Value`).

use serde::{Deserialize, Serialize};

/// `GET /auth/login`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

/// `GET /auth/callback?code=...`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token for the streaming provider, when the backend hands one out separately
    #[serde(default, alias = "spotifyAccessToken")]
    pub provider_token: Option<String>,
    /// Spotify profile of the signed-in user
    #[serde(default)]
    pub user: Option<serde_json::Value>,
    /// Listener id; older backends only put it inside `user.id`
    #[serde(default, alias = "userId")]
    pub listener_id: Option<String>,
}

impl CallbackResponse {
    /// The listener id, falling back to the embedded profile.
    pub fn subject_id(&self) -> Option<String> {
        self.listener_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| {
                self.user
                    .as_ref()
                    .and_then(|u| u.get("id"))
                    .and_then(|id| id.as_str())
                    .map(str::to_string)
            })
    }
}

/// `POST /auth/refresh` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// `POST /auth/refresh` response - passed through from the provider, hence snake_case
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Error body the backend sends with non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Most specific text available.
    pub fn into_message(self) -> Option<String> {
        self.message
            .filter(|m| !m.trim().is_empty())
            .or(self.error.filter(|e| !e.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_contract() {
        let json = r#"{
            "accessToken": "BQD-token",
            "refreshToken": "AQB-refresh",
            "user": {"id": "listener42", "display_name": "Sam"},
            "listenerId": "listener42"
        }"#;
        let parsed: CallbackResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "BQD-token");
        assert_eq!(parsed.refresh_token.as_deref(), Some("AQB-refresh"));
        assert_eq!(parsed.subject_id().as_deref(), Some("listener42"));
        assert!(parsed.provider_token.is_none());
    }

    #[test]
    fn test_callback_subject_from_profile() {
        let json = r#"{"accessToken": "t", "user": {"id": "from-profile"}}"#;
        let parsed: CallbackResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.subject_id().as_deref(), Some("from-profile"));

        let json = r#"{"accessToken": "t"}"#;
        let parsed: CallbackResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.subject_id(), None);
    }

    #[test]
    fn test_error_body_prefers_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "Authentication failed", "message": "bad code"}"#)
                .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("bad code"));

        let body: ErrorBody = serde_json::from_str(r#"{"error": "Token refresh failed"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Token refresh failed"));
    }

    #[test]
    fn test_refresh_request_shape() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "r1",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"refreshToken": "r1"}));
    }
}
