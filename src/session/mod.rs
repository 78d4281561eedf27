//! The signed-in user's credential, shared by every view.
//!
//! A [`Session`] is an explicit context object: it is created once at
//! startup, cloned into each polling controller and into the HTTP client,
//! and is the only state shared between views. Writes happen at three
//! serialized points (sign-in, sign-out, and invalidation after a 401), so
//! last-write-wins is enough.
//!
//! # Example
//!
//! ```ignore
//! let session = Session::restore(FileSessionStore::default_location()?);
//! let mut status = session.subscribe();
//! // ... a request comes back 401 ...
//! session.invalidate();
//! assert_eq!(*status.borrow_and_update(), SessionStatus::Expired);
//! ```

mod store;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

pub use store::{FileSessionStore, SessionStore};

#[cfg(test)]
pub use store::mocks::MemorySessionStore;

/// Tokens and identity issued by the OAuth callback.
///
/// Serialized with the same keys the web client kept in browser storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    /// Sent as `Authorization: Bearer ...`
    #[serde(rename = "accessToken")]
    pub bearer_token: String,

    /// Sent as `X-Spotify-Token` when present
    #[serde(
        rename = "spotifyAccessToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub external_provider_token: Option<String>,

    /// Listener id used in `/users/{id}` paths
    #[serde(rename = "userId", default)]
    pub subject_id: String,

    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
}

impl SessionCredential {
    /// The subject id, `None` when blank.
    pub fn subject(&self) -> Option<&str> {
        let id = self.subject_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// Sign-in state broadcast to whoever renders views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    SignedIn,
    SignedOut,
    /// The backend rejected the credential and it was cleared
    Expired,
}

/// Session persistence errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read session file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to write session file {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Malformed session file: {0}")]
    Parse(String),
}

/// Process-wide session context. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    credential: RwLock<Option<SessionCredential>>,
    store: Box<dyn SessionStore>,
    status: watch::Sender<SessionStatus>,
}

impl Session {
    /// Create a session backed by `store`, restoring whatever it holds.
    ///
    /// An unreadable store is logged and treated as signed out.
    pub fn restore(store: impl SessionStore + 'static) -> Self {
        let credential = match store.load() {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(target: "session", "Ignoring stored session: {}", e);
                None
            }
        };
        let status = if credential.is_some() {
            SessionStatus::SignedIn
        } else {
            SessionStatus::SignedOut
        };
        let (status_tx, _) = watch::channel(status);

        Self {
            inner: Arc::new(Inner {
                credential: RwLock::new(credential),
                store: Box::new(store),
                status: status_tx,
            }),
        }
    }

    /// Snapshot of the current credential.
    pub fn credential(&self) -> Option<SessionCredential> {
        self.inner.credential.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.credential.read().is_some()
    }

    /// The signed-in user's id, if there is one.
    pub fn subject_id(&self) -> Option<String> {
        self.inner
            .credential
            .read()
            .as_ref()
            .and_then(|c| c.subject().map(str::to_string))
    }

    pub fn status(&self) -> SessionStatus {
        *self.inner.status.borrow()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Store a fresh credential after the OAuth callback.
    pub fn sign_in(&self, credential: SessionCredential) -> Result<(), SessionError> {
        self.inner.store.save(&credential)?;
        *self.inner.credential.write() = Some(credential);
        self.inner.status.send_replace(SessionStatus::SignedIn);
        tracing::info!(target: "session", "Signed in");
        Ok(())
    }

    /// Replace the bearer token after a refresh, keeping everything else.
    pub fn update_tokens(
        &self,
        bearer_token: String,
        refresh_token: Option<String>,
    ) -> Result<(), SessionError> {
        let mut guard = self.inner.credential.write();
        let Some(credential) = guard.as_mut() else {
            return Ok(());
        };
        credential.bearer_token = bearer_token;
        if refresh_token.is_some() {
            credential.refresh_token = refresh_token;
        }
        self.inner.store.save(credential)
    }

    /// Explicit logout.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.inner.credential.write().take();
        self.inner.store.clear()?;
        self.inner.status.send_replace(SessionStatus::SignedOut);
        tracing::info!(target: "session", "Signed out");
        Ok(())
    }

    /// Drop the credential because the backend answered 401.
    ///
    /// Only the call that actually removes a credential clears the store and
    /// publishes [`SessionStatus::Expired`]; concurrent or repeated calls
    /// return `false` and do nothing.
    pub fn invalidate(&self) -> bool {
        if self.inner.credential.write().take().is_none() {
            return false;
        }

        tracing::warn!(target: "session", "Backend rejected the session, clearing credential");
        if let Err(e) = self.inner.store.clear() {
            tracing::error!(target: "session", "Failed to clear stored session: {}", e);
        }
        self.inner.status.send_replace(SessionStatus::Expired);
        true
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> SessionCredential {
        SessionCredential {
            bearer_token: "token".into(),
            external_provider_token: None,
            subject_id: "listener42".into(),
            refresh_token: Some("refresh".into()),
        }
    }

    #[test]
    fn test_restore_reads_store() {
        let session = Session::restore(MemorySessionStore::with(credential()));
        assert!(session.is_authenticated());
        assert_eq!(session.subject_id().as_deref(), Some("listener42"));
        assert_eq!(session.status(), SessionStatus::SignedIn);

        let empty = Session::restore(MemorySessionStore::default());
        assert!(!empty.is_authenticated());
        assert_eq!(empty.status(), SessionStatus::SignedOut);
    }

    #[test]
    fn test_blank_subject_is_missing() {
        let mut cred = credential();
        cred.subject_id = "   ".into();
        let session = Session::restore(MemorySessionStore::with(cred));
        assert!(session.is_authenticated());
        assert!(session.subject_id().is_none());
    }

    #[test]
    fn test_sign_in_persists() {
        let store = MemorySessionStore::default();
        let session = Session::restore(store.clone());
        session.sign_in(credential()).unwrap();

        assert_eq!(store.stored(), Some(credential()));
        assert_eq!(session.status(), SessionStatus::SignedIn);
    }

    #[test]
    fn test_invalidate_clears_exactly_once() {
        let store = MemorySessionStore::with(credential());
        let session = Session::restore(store.clone());
        let mut status = session.subscribe();

        assert!(session.invalidate());
        assert!(!session.invalidate());
        assert!(!session.clone().invalidate());

        assert_eq!(store.clear_count(), 1);
        assert!(store.stored().is_none());
        assert!(!session.is_authenticated());
        assert!(status.has_changed().unwrap());
        assert_eq!(*status.borrow_and_update(), SessionStatus::Expired);
    }

    #[test]
    fn test_invalidate_without_credential_is_noop() {
        let store = MemorySessionStore::default();
        let session = Session::restore(store.clone());
        assert!(!session.invalidate());
        assert_eq!(store.clear_count(), 0);
        assert_eq!(session.status(), SessionStatus::SignedOut);
    }

    #[test]
    fn test_update_tokens_keeps_identity() {
        let store = MemorySessionStore::with(credential());
        let session = Session::restore(store.clone());
        session.update_tokens("new-token".into(), None).unwrap();

        let stored = store.stored().unwrap();
        assert_eq!(stored.bearer_token, "new-token");
        assert_eq!(stored.subject_id, "listener42");
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn test_sign_out() {
        let store = MemorySessionStore::with(credential());
        let session = Session::restore(store.clone());
        session.sign_out().unwrap();
        assert!(!session.is_authenticated());
        assert!(store.stored().is_none());
        assert_eq!(session.status(), SessionStatus::SignedOut);
    }
}
