//! Persistence for the session between runs.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use keyring::Entry;

use super::SessionState;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name
const SERVICE_NAME: &str = "carerota";

/// Keychain account the session is stored under
const KEYRING_ACCOUNT: &str = "session";

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionState>>;
    fn save(&self, state: &SessionState) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Session stored as JSON in the cache directory.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SessionState>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let state: SessionState =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(state.is_authenticated().then_some(state))
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state)?;
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

/// Session stored in the OS keychain.
#[derive(Default)]
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, KEYRING_ACCOUNT).context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<SessionState>> {
        match Self::entry()?.get_password() {
            Ok(contents) => {
                let state: SessionState = serde_json::from_str(&contents)
                    .context("Failed to parse session from keychain")?;
                Ok(state.is_authenticated().then_some(state))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve session from keychain"),
        }
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let contents = serde_json::to_string(state)?;
        Self::entry()?
            .set_password(&contents)
            .context("Failed to store session in keychain")
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}

/// Process-local store; nothing survives a restart. Clones share storage.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    state: Arc<Mutex<Option<SessionState>>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SessionState>> {
        let guard = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        *guard = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
