//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the
//! CLI and `main` use `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - Module-specific errors (e.g., [`ApiError`](crate::api::ApiError)) for detailed handling
//! - All errors implement `std::error::Error` for compatibility
//!
//! # Example
//!
//! ```ignore
//! use feedback_fm::error::{Error, Result};
//!
//! async fn sign_in(session: &Session, api: &impl DashboardApi, code: &str) -> Result<()> {
//!     let credential = api.exchange_code(code).await?; // API errors auto-convert
//!     session.sign_in(credential)?;                    // Session errors auto-convert
//!     Ok(())
//! }
//! ```

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend request failed
    #[error("API error: {0}")]
    Api(#[from] crate::api::ApiError),

    /// Session could not be persisted or restored
    #[error("Session error: {0}")]
    Session(#[from] crate::session::SessionError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Poll settings rejected
    #[error("Invalid poll settings: {0}")]
    Poll(#[from] crate::poll::PollConfigError),

    /// Artwork or quip list could not be read
    #[error("Accent error: {0}")]
    Accent(#[from] crate::accent::AccentError),

    /// Not signed in
    #[error("Not signed in: {0}")]
    NotSignedIn(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a not-signed-in error.
    pub fn not_signed_in(message: impl Into<String>) -> Self {
        Self::NotSignedIn(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error means the backend rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Api(e) => e.is_unauthorized(),
            Self::WithContext { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, crate::api::ApiError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Api(e).context(ctx))
    }
}
