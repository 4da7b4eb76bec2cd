pub mod storage;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConsoleError;
use crate::menu::MenuNode;
pub use storage::{FileTokenStorage, MemoryTokenStorage, PersistedTokens, TokenStorage};

/// Response of the login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    /// Older backends only return an access token.
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET /users/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Option<RoleSummary>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

const DEFAULT_AVATAR: &str = "https://primefaces.org/cdn/primevue/images/avatar/amyelsner.png";

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.username)
    }

    /// Absolute avatar URL; relative paths are served by the backend origin.
    pub fn avatar_url(&self, base_url: &str) -> String {
        match self.avatar.as_deref() {
            None | Some("") => DEFAULT_AVATAR.to_string(),
            Some(url) if url.starts_with("http") => url.to_string(),
            Some(path) => format!("{}{}", base_url.trim_end_matches('/'), path),
        }
    }
}

/// In-memory state of one login session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_profile: Option<UserProfile>,
    pub menu_tree: Vec<MenuNode>,
    /// Set once the menu tree has been fetched and routes materialized.
    pub menus_loaded: bool,
    /// Bumped whenever a session ends or a new one starts on these tokens.
    /// Work started under an older generation must not write its results.
    pub generation: u64,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// Shared handle to the session and its persisted token copy.
///
/// Cloning the handle shares the same session. Locks are never held across
/// an await point.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<RwLock<Session>>,
    storage: Arc<dyn TokenStorage>,
}

impl SessionHandle {
    /// Empty session rehydrated from whatever tokens `storage` holds.
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let mut session = Session::default();
        match storage.load() {
            Ok(tokens) => {
                if !tokens.access_token.is_empty() {
                    debug!("Rehydrated session from persisted tokens");
                }
                session.access_token = tokens.access_token;
                session.refresh_token = tokens.refresh_token;
            }
            Err(e) => warn!("Ignoring unreadable persisted tokens: {}", e),
        }

        Self {
            inner: Arc::new(RwLock::new(session)),
            storage,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn access_token(&self) -> Option<String> {
        let session = self.read();
        (!session.access_token.is_empty()).then(|| session.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        let session = self.read();
        (!session.refresh_token.is_empty()).then(|| session.refresh_token.clone())
    }

    /// Store a fresh token pair in durable storage, then in memory. A pair
    /// without a refresh token keeps the current one. When the save fails
    /// the in-memory tokens are left as they were.
    pub fn set_tokens(&self, tokens: &TokenPair) -> Result<(), ConsoleError> {
        let refresh_token = if tokens.refresh_token.is_empty() {
            self.read().refresh_token.clone()
        } else {
            tokens.refresh_token.clone()
        };
        let persisted = PersistedTokens::new(tokens.access_token.clone(), refresh_token);
        self.storage.save(&persisted)?;

        let mut session = self.write();
        session.access_token = persisted.access_token;
        session.refresh_token = persisted.refresh_token;
        Ok(())
    }

    /// Start a new session on the current tokens: drop profile and menus.
    pub fn reset_profile(&self) {
        let mut session = self.write();
        session.user_profile = None;
        session.menu_tree.clear();
        session.menus_loaded = false;
        session.generation += 1;
    }

    /// Clear every field and the persisted copy. Idempotent, never fails;
    /// a storage error is logged.
    pub fn clear(&self) {
        {
            let mut session = self.write();
            let generation = session.generation + 1;
            *session = Session {
                generation,
                ..Session::default()
            };
        }
        if let Err(e) = self.storage.clear() {
            warn!("Failed to clear persisted tokens: {}", e);
        }
    }

    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.read().generation == generation
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().user_profile.clone()
    }

    /// Store the profile unless the session changed since `generation`.
    pub fn set_user_for(&self, generation: u64, profile: UserProfile) -> bool {
        let mut session = self.write();
        if session.generation != generation {
            return false;
        }
        session.user_profile = Some(profile);
        true
    }

    pub fn menus(&self) -> Vec<MenuNode> {
        self.read().menu_tree.clone()
    }

    /// Store the menu tree unless the session changed since `generation`.
    pub fn set_menus_for(&self, generation: u64, menus: Vec<MenuNode>) -> bool {
        let mut session = self.write();
        if session.generation != generation {
            return false;
        }
        session.menu_tree = menus;
        true
    }

    pub fn menus_loaded(&self) -> bool {
        self.read().menus_loaded
    }

    pub fn mark_menus_loaded_for(&self, generation: u64) -> bool {
        let mut session = self.write();
        if session.generation != generation {
            return false;
        }
        session.menus_loaded = true;
        true
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.read();
        f.debug_struct("SessionHandle")
            .field("authenticated", &session.is_authenticated())
            .field("menus_loaded", &session.menus_loaded)
            .finish()
    }
}
