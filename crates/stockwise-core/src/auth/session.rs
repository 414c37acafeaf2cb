use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// What survives between runs once a user has logged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub written_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            role: None,
            user_id: None,
            written_at: Utc::now(),
        }
    }

    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role = role;
        self
    }

    pub fn with_user_id(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// Where the bearer token lives.
///
/// The API client only talks to storage through this trait so tests can
/// swap in [`MemorySessionStore`].
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<SessionData>;

    fn save(&self, data: &SessionData) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn token(&self) -> Option<String> {
        self.load().map(|d| d.token).filter(|t| !t.is_empty())
    }

    /// End the session after a 401 unless a newer login has replaced it.
    ///
    /// `sent` is the token the rejected request carried and `started_at`
    /// when that request began. A stored session wins when its token differs
    /// from `sent`, or when no token was sent and it was written after
    /// `started_at`.
    fn end_if_current(&self, sent: Option<&str>, started_at: DateTime<Utc>) -> Result<Teardown> {
        let teardown = Teardown::decide(sent, started_at, self.load().as_ref());
        if teardown == Teardown::Cleared {
            self.clear()?;
        }
        Ok(teardown)
    }
}

/// What a 401 did to the stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The session was current and has been cleared.
    Cleared,
    /// The sent token was already gone; another call ended the session.
    AlreadyCleared,
    /// A newer login replaced the session and it was kept.
    Superseded,
}

impl Teardown {
    fn decide(sent: Option<&str>, started_at: DateTime<Utc>, stored: Option<&SessionData>) -> Self {
        match (sent, stored) {
            (Some(_), None) => Teardown::AlreadyCleared,
            (None, None) => Teardown::Cleared,
            (Some(sent), Some(current)) if current.token != sent => {
                debug!("Stored token changed since request was sent, keeping it");
                Teardown::Superseded
            }
            (None, Some(current)) if current.written_at >= started_at => {
                debug!("Session written after request started, keeping it");
                Teardown::Superseded
            }
            _ => Teardown::Cleared,
        }
    }
}

/// In-process store. Nothing touches disk.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: Mutex<Option<SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            data: Mutex::new(Some(SessionData::new(token))),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<SessionData> {
        self.data.lock().ok().and_then(|d| d.clone())
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = Some(data.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = None;
        Ok(())
    }

    // Compare and clear under one lock so a concurrent login can't slip in
    fn end_if_current(&self, sent: Option<&str>, started_at: DateTime<Utc>) -> Result<Teardown> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        let teardown = Teardown::decide(sent, started_at, guard.as_ref());
        if teardown == Teardown::Cleared {
            *guard = None;
        }
        Ok(teardown)
    }
}

/// Session persisted as JSON in the cache directory.
///
/// Teardown is the trait's load-then-clear and is not atomic across
/// processes: a login from another `stockwise` process that lands between
/// the two steps gets cleared.
pub struct FileSessionStore {
    cache_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn read(&self) -> Result<Option<SessionData>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data = serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(data))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<SessionData> {
        match self.read() {
            Ok(data) => data,
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}
