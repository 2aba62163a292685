use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Name of the storage slot holding the session token
pub const TOKEN_SLOT: &str = "token";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionData {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: String, username: String) -> Self {
        Self {
            token,
            username,
            created_at: Utc::now(),
        }
    }
}

/// Persistent slot for the session. At most one session is stored at a time.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionData>>;
    fn save(&self, data: &SessionData) -> Result<()>;
    /// Remove the stored session. Succeeds when nothing is stored.
    fn clear(&self) -> Result<()>;
}

/// Session stored as JSON in `<dir>/token.json`
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", TOKEN_SLOT))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SessionData>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data = serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(data))
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Process-local store. Does not survive a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<SessionData>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<SessionData>>> {
        self.slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SessionData>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        *self.lock()? = Some(data.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

/// Handle on the persisted session.
///
/// Clones share the same store, so the controller and the resource client
/// always see the same token. The store is read on every access; nothing is
/// cached in memory here.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Session backed by a file in `dir`
    pub fn file(dir: PathBuf) -> Self {
        Self::new(Arc::new(FileTokenStore::new(dir)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Current session data. An unreadable slot counts as logged out.
    pub fn data(&self) -> Option<SessionData> {
        match self.store.load() {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Failed to load session, treating as logged out");
                None
            }
        }
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<String> {
        self.data().map(|d| d.token)
    }

    pub fn username(&self) -> Option<String> {
        self.data().map(|d| d.username)
    }

    pub fn is_active(&self) -> bool {
        self.data().is_some()
    }

    /// Persist a freshly issued token, replacing any previous session
    pub fn start(&self, token: String, username: String) -> Result<SessionData> {
        let data = SessionData::new(token, username);
        self.store.save(&data)?;
        debug!(username = %data.username, "Session stored");
        Ok(data)
    }

    /// Remove the persisted token. Idempotent.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        debug!("Session cleared");
        Ok(())
    }
}
