//! Token persistence. The store holds a single string entry under
//! [`TOKEN_KEY`]; values are bearer tokens and must never be logged.

use super::error::StoreError;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "authToken";

/// Key-value persistence for the bearer token.
pub trait TokenStore: Send + Sync {
    /// Returns the persisted token, if any.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn get(&self) -> Result<Option<SecretString>, StoreError>;

    /// Persists `token`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, token: &SecretString) -> Result<(), StoreError>;

    /// Deletes the persisted token. Removing an absent token is not an error.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self) -> Result<(), StoreError>;
}

/// JSON key-value file shared with other entries; only [`TOKEN_KEY`] is touched.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<config_dir>/authsession/storage.json`, when the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("storage.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Corrupt("expected a JSON object".to_string())),
            Err(err) => Err(StoreError::Corrupt(err.to_string())),
        }
    }

    /// Like `load`, but an unreadable file yields an empty map to overwrite.
    /// The flag reports whether the file content was discarded.
    fn load_for_write(&self) -> Result<(Map<String, Value>, bool), StoreError> {
        match self.load() {
            Ok(map) => Ok((map, false)),
            Err(StoreError::Corrupt(reason)) => {
                warn!("discarding corrupt storage file: {reason}");
                Ok((Map::new(), true))
            }
            Err(err) => Err(err),
        }
    }

    // temp file + rename so readers never observe a partial write
    fn save(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(map)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;

        // created 0600 on unix with a unique name
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn get(&self) -> Result<Option<SecretString>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let map = self.load()?;

        match map.get(TOKEN_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(token)) => Ok(Some(SecretString::from(token.clone()))),
            Some(_) => Err(StoreError::Corrupt(format!("{TOKEN_KEY} is not a string"))),
        }
    }

    #[instrument(skip(self, token), fields(path = %self.path.display()))]
    fn set(&self, token: &SecretString) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut map, _) = self.load_for_write()?;
        map.insert(
            TOKEN_KEY.to_string(),
            Value::String(token.expose_secret().to_string()),
        );
        self.save(&map)?;

        debug!("token persisted");

        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut map, discarded) = self.load_for_write()?;
        if map.remove(TOKEN_KEY).is_none() && !discarded {
            return Ok(());
        }
        self.save(&map)?;

        debug!("token removed");

        Ok(())
    }
}

/// In-process store, useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<SecretString>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(SecretString::from(token.to_string()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<SecretString>, StoreError> {
        let token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_string())))
    }

    fn set(&self, token: &SecretString) -> Result<(), StoreError> {
        let mut slot = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(SecretString::from(token.expose_secret().to_string()));
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        let mut slot = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        Ok(())
    }
}
