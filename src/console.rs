use std::sync::{Arc, PoisonError, RwLock};

use crate::api::{AuthApi, Resource, ResourceKind, UsersApi};
use crate::config::AppConfig;
use crate::error::ConsoleError;
use crate::guard::{Arrival, NavState, NavigationGuard};
use crate::http::{HttpClient, ReqwestTransport, Transport};
use crate::router::{ComponentRegistry, Router};
use crate::services::AuthService;
use crate::session::{FileTokenStorage, SessionHandle, TokenStorage};

/// Application context: one session, one route table, one guard.
///
/// Everything that used to be ambient state is owned here and passed
/// explicitly to the parts that need it.
#[derive(Clone)]
pub struct Console {
    config: AppConfig,
    http: HttpClient,
    auth: AuthService,
    router: Arc<RwLock<Router>>,
    guard: NavigationGuard,
}

impl Console {
    /// Console talking to the configured backend over HTTP, with tokens
    /// persisted under the config directory.
    pub fn new(config: AppConfig) -> Result<Self, ConsoleError> {
        let origin = config.base_url()?;
        let storage = Arc::new(FileTokenStorage::for_origin(&config.config_dir()?, &origin));
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_parts(config, transport, storage, ComponentRegistry::builtin()))
    }

    pub fn with_parts(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn TokenStorage>,
        registry: ComponentRegistry,
    ) -> Self {
        let session = SessionHandle::new(storage);
        let http = HttpClient::new(transport, session, config.navigation.login_path.clone());
        let auth = AuthService::new(http.clone());
        let router = Arc::new(RwLock::new(Router::with_static_routes()));
        let guard = NavigationGuard::new(
            auth.clone(),
            router.clone(),
            Arc::new(registry),
            config.navigation.clone(),
        );

        Self {
            config,
            http,
            auth,
            router,
            guard,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionHandle {
        self.http.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn nav_state(&self) -> NavState {
        self.guard.state()
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn auth_api(&self) -> AuthApi {
        AuthApi::new(self.http.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.http.clone())
    }

    pub fn resource(&self, kind: ResourceKind) -> Resource {
        Resource::new(self.http.clone(), kind)
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Snapshot of the current route table.
    pub fn router(&self) -> Router {
        self.router.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Log in and start a fresh session with only the public routes.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ConsoleError> {
        self.auth.login(username, password).await?;
        self.reset_routes();
        Ok(())
    }

    /// Log out and drop every materialized route. Idempotent.
    pub fn logout(&self) {
        self.auth.logout();
        self.reset_routes();
    }

    pub async fn navigate(&self, to: &str) -> Result<Arrival, ConsoleError> {
        let arrival = self.guard.navigate(to).await;
        if !self.is_authenticated() {
            // Session ended during this navigation (logout or failed refresh)
            self.reset_routes();
        }
        arrival
    }

    fn reset_routes(&self) {
        *self.router.write().unwrap_or_else(PoisonError::into_inner) = Router::with_static_routes();
    }
}
