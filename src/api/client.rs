//! feedback.fm HTTP client
//!
//! Thin reqwest wrapper. Every request picks up the current session's
//! bearer token and, when present, the provider token in `X-Spotify-Token`.
//! The client reports a 401 as [`ApiError::Unauthorized`]; deciding what a
//! rejected session means is left to the caller.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::domain::{ApiError, Endpoint};
use super::dto;
use crate::config::ApiConfig;
use crate::session::{Session, SessionCredential};

/// Header carrying the streaming provider's token
pub const PROVIDER_TOKEN_HEADER: &str = "X-Spotify-Token";

const USER_AGENT: &str = concat!("feedback-fm/", env!("CARGO_PKG_VERSION"));

/// feedback.fm API client
pub struct FeedbackClient {
    http_client: reqwest::Client,
    base_url: String,
    session: Session,
}

impl FeedbackClient {
    /// Create a client for the configured backend
    pub fn new(config: &ApiConfig, session: Session) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a view payload
    pub async fn get(&self, endpoint: &Endpoint) -> Result<Value, ApiError> {
        let url = self.url(&endpoint.path_and_query());
        tracing::debug!(target: "api", "GET {}", url);
        let request = self.authorize(self.http_client.get(&url));
        self.send(request).await
    }

    /// Ask the backend where to send the user to authorize
    pub async fn auth_url(&self) -> Result<String, ApiError> {
        let request = self.http_client.get(self.url("/auth/login"));
        let response: dto::AuthUrlResponse = self.send_typed(request).await?;
        Ok(response.auth_url)
    }

    /// Exchange an OAuth callback code for a credential
    pub async fn exchange_code(&self, code: &str) -> Result<SessionCredential, ApiError> {
        let url = self.url(&format!(
            "/auth/callback?code={}",
            urlencoding::encode(code)
        ));
        let response: dto::CallbackResponse = self.send_typed(self.http_client.get(url)).await?;

        let subject_id = response.subject_id().ok_or_else(|| {
            ApiError::Parse("callback response carried no listener id".to_string())
        })?;

        Ok(SessionCredential {
            bearer_token: response.access_token.clone(),
            // The backend proxies the provider token as the access token unless it sends both
            external_provider_token: response
                .provider_token
                .clone()
                .or_else(|| Some(response.access_token.clone())),
            subject_id,
            refresh_token: response.refresh_token,
        })
    }

    /// Trade a refresh token for a new access token
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<dto::RefreshResponse, ApiError> {
        let request = self
            .http_client
            .post(self.url("/auth/refresh"))
            .json(&dto::RefreshRequest { refresh_token });
        self.send_typed(request).await
    }

    /// Download raw bytes (album artwork) from an absolute URL
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().map(str::to_string),
            });
        }

        Ok(response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .to_vec())
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Attach the session's tokens, if any
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(credential) = self.session.credential() else {
            return request;
        };
        let request = request.bearer_auth(&credential.bearer_token);
        match credential.external_provider_token {
            Some(token) => request.header(PROVIDER_TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn send_typed<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let value = self.send(request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Send the request and decode the JSON body
    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        decode_body(status, &body)
    }
}

/// Map a status and raw body to a payload or error
fn decode_body(status: StatusCode, body: &[u8]) -> Result<Value, ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    if !status.is_success() {
        let message = serde_json::from_slice::<dto::ErrorBody>(body)
            .ok()
            .and_then(dto::ErrorBody::into_message);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    // 204 from currently-playing means nothing is playing
    if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(body).map_err(|e| ApiError::Parse(e.to_string()))
}
