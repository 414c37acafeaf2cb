use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use super::{SessionData, SessionStore};

const SERVICE_NAME: &str = "stockwise";

/// Keyring account the session is filed under
const SESSION_ACCOUNT: &str = "session";

/// Session kept in the OS keychain instead of a plain file.
pub struct KeyringSessionStore {
    account: String,
}

impl KeyringSessionStore {
    pub fn new() -> Self {
        Self {
            account: SESSION_ACCOUNT.to_string(),
        }
    }

    /// Separate keychain slot, e.g. one per backend origin
    pub fn for_account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Option<SessionData> {
        let secret = self.entry().ok()?.get_password().ok()?;
        match serde_json::from_str(&secret) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(error = %e, "Ignoring malformed keychain session");
                None
            }
        }
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        let secret = serde_json::to_string(data)?;
        self.entry()?
            .set_password(&secret)
            .context("Failed to store session in keychain")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}
