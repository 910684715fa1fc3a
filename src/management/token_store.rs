use std::{fmt, io::Error, io::ErrorKind, path::PathBuf};

use chrono::Utc;
use serde::Deserialize;

use crate::types::{CachedToken, Credential};

pub const TOKEN_FILE_NAME: &str = "token.json";

/// Read side of [`CachedToken`]. Only the token matters when loading, so
/// records written with any timestamp format still load.
#[derive(Deserialize)]
struct StoredToken {
    token: String,
}

#[derive(Debug)]
pub enum StoreError {
    IoError(Error),
    SerdeError(serde_json::Error),
}

impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerdeError(err)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::IoError(e) => write!(f, "token file I/O failed: {}", e),
            StoreError::SerdeError(e) => write!(f, "token file is not valid JSON: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persists the single cached token record under a base directory.
#[derive(Debug, Clone)]
pub struct TokenStore {
    base_dir: PathBuf,
}

impl TokenStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        TokenStore {
            base_dir: base_dir.into(),
        }
    }

    /// Reads the cached token.
    ///
    /// Missing, unreadable or malformed files all count as "no token".
    pub async fn load(&self) -> Option<Credential> {
        let content = async_fs::read_to_string(self.path()).await.ok()?;
        let record: StoredToken = serde_json::from_str(&content).ok()?;
        let token = record.token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Credential::new(token))
    }

    pub async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        async_fs::create_dir_all(&self.base_dir).await?;

        let record = CachedToken {
            token: credential.as_str().to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record)?;
        async_fs::write(self.path(), json).await?;
        Ok(())
    }

    /// Removes the cached token. Clearing an empty store is a no-op.
    pub async fn clear(&self) -> Result<(), StoreError> {
        match async_fs::remove_file(self.path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::IoError(e)),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.base_dir.join(TOKEN_FILE_NAME)
    }
}
