use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// The authenticated identity used to authorize backend calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
}

/// Holds the current session, optionally persisted as a small TOML file in the
/// user config dir. Consumers read the token per request rather than caching
/// it, so a rotated token takes effect on the next call.
///
/// Writes go through one store instance owned by the workflow task; readers
/// only ever get clones.
pub struct SessionStore {
    inner: Mutex<Option<Session>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("sos-client").join("session.toml"))
    }

    /// Load the persisted session if one exists. A missing or unreadable file
    /// yields an empty store, never an error.
    pub fn load() -> Self {
        let path = Self::default_path();
        let session = path.as_deref().and_then(|p| {
            let text = fs::read_to_string(p).ok()?;
            toml::from_str::<Session>(&text).ok()
        });
        Self {
            inner: Mutex::new(session),
            path,
        }
    }

    /// Load from an explicit file path (embedders, tests).
    pub fn at_path(path: PathBuf) -> Self {
        let session = fs::read_to_string(&path)
            .ok()
            .and_then(|text| toml::from_str::<Session>(&text).ok());
        Self {
            inner: Mutex::new(session),
            path: Some(path),
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(None),
            path: None,
        }
    }

    pub fn token(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.access_token.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.user_id.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.lock().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().is_some()
    }

    /// Replace the session and persist it best-effort.
    pub fn store(&self, session: Session) {
        *self.lock() = Some(session.clone());
        if let Some(path) = &self.path {
            if let Err(e) = persist(path, &session) {
                log::warn!("failed to persist session: {}", e);
            }
        }
    }

    /// Logout: drop the session and remove the file wholesale.
    pub fn clear(&self) {
        *self.lock() = None;
        if let Some(path) = &self.path {
            let _ = fs::remove_file(path);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        // A poisoned lock only means a panic elsewhere; the session data is a
        // plain value and still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn persist(path: &std::path::Path, session: &Session) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(session)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    fs::write(path, text)
}
