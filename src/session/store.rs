//! Persistence for the signed-in credential.

use std::path::{Path, PathBuf};

use super::{SessionCredential, SessionError};

/// Where the credential lives between runs.
///
/// Implement this trait to keep tests off the real config directory.
pub trait SessionStore: Send + Sync {
    /// Read the stored credential, `None` if nobody is signed in.
    fn load(&self) -> Result<Option<SessionCredential>, SessionError>;

    fn save(&self, credential: &SessionCredential) -> Result<(), SessionError>;

    /// Remove the stored credential. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), SessionError>;
}

/// TOML file next to `config.toml`.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `session.toml` in the application's config directory.
    pub fn default_location() -> Result<Self, SessionError> {
        crate::config::config_dir()
            .map(|dir| Self::new(dir.join("session.toml")))
            .ok_or(SessionError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionCredential>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| SessionError::Read(self.path.clone(), e))?;
        let credential: SessionCredential =
            toml::from_str(&contents).map_err(|e| SessionError::Parse(e.to_string()))?;
        if credential.bearer_token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(credential))
    }

    fn save(&self, credential: &SessionCredential) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| SessionError::Write(dir.to_path_buf(), e))?;
        }
        let contents = toml::to_string_pretty(credential)
            .map_err(|e| SessionError::Parse(e.to_string()))?;

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&temp_path, contents)
            .map_err(|e| SessionError::Write(temp_path.clone(), e))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| SessionError::Write(self.path.clone(), e))?;

        tracing::debug!(target: "session", "Saved session to {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Write(self.path.clone(), e)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> SessionCredential {
        SessionCredential {
            bearer_token: "backend-token".into(),
            external_provider_token: Some("spotify-token".into()),
            subject_id: "listener42".into(),
            refresh_token: None,
        }
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("feedback-fm").join("session.toml"));

        assert!(store.load().unwrap().is_none());
        store.save(&credential()).unwrap();
        assert_eq!(store.load().unwrap(), Some(credential()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_uses_browser_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.toml"));
        store.save(&credential()).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("accessToken = \"backend-token\""));
        assert!(raw.contains("spotifyAccessToken = \"spotify-token\""));
        assert!(raw.contains("userId = \"listener42\""));
        assert!(!raw.contains("refreshToken"));
    }

    #[test]
    fn test_file_without_user_id_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "accessToken = \"abc\"\n").unwrap();

        let loaded = FileSessionStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded.bearer_token, "abc");
        assert!(loaded.subject().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "accessToken = ").unwrap();

        let result = FileSessionStore::new(&path).load();
        assert!(matches!(result, Err(SessionError::Parse(_))));
    }
}
