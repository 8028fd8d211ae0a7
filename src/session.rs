//! Client session: the issued token and the optional user payload.
//!
//! The session is an explicit context object handed to whatever needs it (the API
//! client for the bearer header, the auth gateway, the navbar). It is persisted as a
//! small JSON document under the fixed keys `token` and `user`; there is no expiry
//! handling on the client.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::auth::user_display_name,
};

/// Persisted shape of the session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

/// Where session data lives between runs
#[derive(Debug, Clone)]
pub enum SessionStore {
    File(PathBuf),
    Memory,
}

impl SessionStore {
    fn load(&self) -> AppResult<SessionData> {
        let SessionStore::File(path) = self else {
            return Ok(SessionData::default());
        };
        if !path.exists() {
            return Ok(SessionData::default());
        }
        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(SessionData::default());
        }
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Storage(format!("Corrupt session file {}: {}", path.display(), e)))
    }

    fn save(&self, data: &SessionData) -> AppResult<()> {
        let SessionStore::File(path) = self else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(data)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        fs::write(path, raw)?;
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        if let SessionStore::File(path) = self {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// Live session shared across the client
#[derive(Debug)]
pub struct Session {
    store: SessionStore,
    data: RwLock<SessionData>,
}

pub type SharedSession = Arc<Session>;

impl Session {
    /// Start a session from whatever the store already holds
    pub fn start(store: SessionStore) -> AppResult<SharedSession> {
        let data = store.load()?;
        tracing::debug!(signed_in = data.token.is_some(), "Session started");
        Ok(Arc::new(Self {
            store,
            data: RwLock::new(data),
        }))
    }

    /// Session backed by a file
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<SharedSession> {
        Self::start(SessionStore::File(path.as_ref().to_path_buf()))
    }

    /// Session that never touches the disk
    pub fn in_memory() -> SharedSession {
        Arc::new(Self {
            store: SessionStore::Memory,
            data: RwLock::new(SessionData::default()),
        })
    }

    fn read(&self) -> SessionData {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.read().token
    }

    pub fn user(&self) -> Option<serde_json::Value> {
        self.read().user
    }

    pub fn is_signed_in(&self) -> bool {
        self.read().token.is_some()
    }

    /// Name shown in the navbar
    pub fn username(&self) -> String {
        self.read()
            .user
            .as_ref()
            .and_then(user_display_name)
            .unwrap_or_else(|| "Guest".to_string())
    }

    /// Record a freshly issued token (and user payload) and persist it
    pub fn sign_in(&self, token: String, user: Option<serde_json::Value>) -> AppResult<()> {
        let data = SessionData {
            token: Some(token),
            user,
        };
        self.store.save(&data)?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| AppError::Internal("Session lock poisoned".to_string()))?;
        *guard = data;
        tracing::info!("Session token stored");
        Ok(())
    }

    /// Drop the token and user payload
    pub fn end(&self) -> AppResult<()> {
        self.store.clear()?;
        let mut guard = self
            .data
            .write()
            .map_err(|_| AppError::Internal("Session lock poisoned".to_string()))?;
        *guard = SessionData::default();
        tracing::info!("Session ended");
        Ok(())
    }
}
