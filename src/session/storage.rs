use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConsoleError;

/// The two persisted tokens, stored under `accessToken` and `refreshToken`.
/// They are written and cleared together, never independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedTokens {
    #[serde(rename = "accessToken", default)]
    pub access_token: String,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: String,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            saved_at: Some(Utc::now()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty() && self.refresh_token.is_empty()
    }
}

/// Durable token storage scoped to one backend origin.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<PersistedTokens, ConsoleError>;
    fn save(&self, tokens: &PersistedTokens) -> Result<(), ConsoleError>;
    /// Remove both tokens. Must succeed when nothing is stored.
    fn clear(&self) -> Result<(), ConsoleError>;
}

/// JSON file under the console config directory, one file per origin.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `tokens-<host>_<port>.json` inside `dir`.
    pub fn for_origin(dir: &Path, origin: &Url) -> Self {
        let host = origin.host_str().unwrap_or("localhost");
        let port = origin.port_or_known_default().unwrap_or(80);
        let file_name = format!("tokens-{}_{}.json", sanitize(host), port);
        Self::new(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn sanitize(host: &str) -> String {
    host.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<PersistedTokens, ConsoleError> {
        if !self.path.exists() {
            return Ok(PersistedTokens::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let tokens: PersistedTokens = serde_json::from_str(&content)?;
        Ok(tokens)
    }

    fn save(&self, tokens: &PersistedTokens) -> Result<(), ConsoleError> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = serde_json::to_string_pretty(tokens)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ConsoleError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, used by tests and embedders without a filesystem.
#[derive(Default)]
pub struct MemoryTokenStorage {
    tokens: Mutex<Option<PersistedTokens>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: PersistedTokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_none()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<PersistedTokens, ConsoleError> {
        let guard = self.tokens.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, tokens: &PersistedTokens) -> Result<(), ConsoleError> {
        *self.tokens.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ConsoleError> {
        *self.tokens.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}
