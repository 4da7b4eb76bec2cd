use tracing::{debug, error, info};

use crate::api::{AuthApi, UsersApi};
use crate::error::ConsoleError;
use crate::http::HttpClient;
use crate::menu::{self, MenuNode};
use crate::session::{SessionHandle, UserProfile};

/// Session lifecycle operations: login, logout and the lazy profile/menu
/// loads that follow the first protected navigation.
#[derive(Clone)]
pub struct AuthService {
    session: SessionHandle,
    auth: AuthApi,
    users: UsersApi,
}

impl AuthService {
    pub fn new(http: HttpClient) -> Self {
        Self {
            session: http.session().clone(),
            auth: AuthApi::new(http.clone()),
            users: UsersApi::new(http),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Exchange credentials for a token pair and store it. Menus are not
    /// loaded here; that waits for the first protected navigation.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ConsoleError> {
        let tokens = self.auth.access_token(username, password).await.map_err(|e| {
            error!("Login failed: {}", e);
            e
        })?;

        self.session.set_tokens(&tokens)?;
        self.session.reset_profile();
        info!("Logged in as {}", username);
        Ok(())
    }

    /// Clear the session and the persisted tokens. Always succeeds.
    pub fn logout(&self) {
        self.session.clear();
        info!("Logged out");
    }

    /// Populate the user profile. On failure the previous profile stays.
    pub async fn fetch_user_info(&self) -> Result<UserProfile, ConsoleError> {
        let generation = self.session.generation();
        let profile = self.users.me().await.map_err(|e| {
            error!("Fetch user info failed: {}", e);
            e
        })?;
        if !self.session.set_user_for(generation, profile.clone()) {
            debug!("Session changed while the profile was loading, discarding it");
        }
        Ok(profile)
    }

    /// Populate the menu tree as public entries followed by the server tree.
    /// On failure the tree is reset to the public entries only. Results
    /// arriving after the session ended or restarted are not stored.
    pub async fn fetch_menus(&self) -> Result<Vec<MenuNode>, ConsoleError> {
        let generation = self.session.generation();
        match self.users.menu().await {
            Ok(server) => {
                let menus = menu::merge_with_public(server);
                if !self.session.set_menus_for(generation, menus.clone()) {
                    debug!("Session changed while menus were loading, discarding them");
                }
                Ok(menus)
            }
            Err(e) => {
                error!("Fetch menus failed: {}", e);
                self.session.set_menus_for(generation, menu::public_menu());
                Err(e)
            }
        }
    }
}
