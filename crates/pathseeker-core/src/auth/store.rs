use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::tokens::TokenKey;

/// Token file name in the data directory
const TOKENS_FILE: &str = "tokens.json";

/// Client-local persistent storage for named token entries.
///
/// Each call is atomic on its own; callers that need to update both entries
/// (login/logout) issue one call per entry.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: TokenKey) -> Result<Option<String>>;
    fn set(&self, key: TokenKey, value: &str) -> Result<()>;
    /// Removing a missing entry is not an error
    fn remove(&self, key: TokenKey) -> Result<()>;
}

fn lock_poisoned() -> anyhow::Error {
    anyhow::anyhow!("Token store lock poisoned")
}

/// In-process store, used for tests and sessions that should not outlive the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: Mutex<BTreeMap<&'static str, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: TokenKey) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| lock_poisoned())?;
        Ok(entries.get(key.as_str()).cloned())
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| lock_poisoned())?;
        entries.insert(key.as_str(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| lock_poisoned())?;
        entries.remove(key.as_str());
        Ok(())
    }
}

/// Store backed by a JSON object file (`{"access": "...", "refresh": "..."}`).
///
/// The whole file is rewritten on every change while holding the lock.
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join(TOKENS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read token file")?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse token file")
    }

    /// Entries to build a write on. An unreadable file is discarded so
    /// login and logout can always overwrite it.
    fn entries_for_update(&self) -> BTreeMap<String, String> {
        self.read_entries().unwrap_or_else(|e| {
            warn!(path = ?self.path, error = %e, "Discarding unreadable token file");
            BTreeMap::new()
        })
    }

    /// Replace the file through a temp file in the same directory, so a
    /// crash leaves either the old or the new contents.
    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove token file")?;
            }
            return Ok(());
        }
        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Token file has no parent directory"))?;
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir).context("Failed to create temp token file")?;
        serde_json::to_writer_pretty(&mut file, entries)?;
        file.flush()?;
        file.persist(&self.path)
            .map_err(|e| e.error)
            .context("Failed to write token file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: TokenKey) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| lock_poisoned())?;
        Ok(self.read_entries()?.remove(key.as_str()))
    }

    fn set(&self, key: TokenKey, value: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| lock_poisoned())?;
        let mut entries = self.entries_for_update();
        entries.insert(key.as_str().to_string(), value.to_string());
        self.write_entries(&entries)?;
        debug!(key = %key, path = ?self.path, "Token saved");
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| lock_poisoned())?;
        let corrupt = self.path.exists() && self.read_entries().is_err();
        let mut entries = self.entries_for_update();
        if entries.remove(key.as_str()).is_some() || corrupt {
            self.write_entries(&entries)?;
            debug!(key = %key, "Token removed");
        }
        Ok(())
    }
}
