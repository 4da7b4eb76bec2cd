//! Navigation guard: decides, for every navigation, whether to proceed,
//! redirect, or bootstrap the session's menus and routes first.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::config::NavigationConfig;
use crate::error::ConsoleError;
use crate::router::{self, normalize_path, ComponentRegistry, Resolved, Router};
use crate::services::AuthService;
use crate::session::SessionHandle;

/// Upper bound on redirects followed for one navigation.
const MAX_HOPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Unauthenticated,
    AuthenticatedNoMenus,
    AuthenticatedReady,
}

impl NavState {
    pub fn of(session: &SessionHandle) -> Self {
        if !session.is_authenticated() {
            NavState::Unauthenticated
        } else if !session.menus_loaded() {
            NavState::AuthenticatedNoMenus
        } else {
            NavState::AuthenticatedReady
        }
    }
}

/// What to do with one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Redirect(String),
    /// Load profile and menus, register routes, then retry the same target.
    Bootstrap,
}

/// Where a navigation ended up.
#[derive(Debug)]
pub struct Arrival {
    pub requested: String,
    pub route: Resolved,
    /// Bootstrap failure that forced a redirect to the login page.
    pub error: Option<ConsoleError>,
}

impl Arrival {
    pub fn path(&self) -> &str {
        &self.route.path
    }

    pub fn redirected(&self) -> bool {
        normalize_path(&self.requested) != self.route.path
    }
}

#[derive(Clone)]
pub struct NavigationGuard {
    auth: AuthService,
    router: Arc<RwLock<Router>>,
    registry: Arc<ComponentRegistry>,
    paths: NavigationConfig,
}

impl NavigationGuard {
    pub fn new(
        auth: AuthService,
        router: Arc<RwLock<Router>>,
        registry: Arc<ComponentRegistry>,
        paths: NavigationConfig,
    ) -> Self {
        Self {
            auth,
            router,
            registry,
            paths,
        }
    }

    pub fn state(&self) -> NavState {
        NavState::of(self.auth.session())
    }

    fn resolve(&self, path: &str) -> Option<Resolved> {
        self.router
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(path)
    }

    /// Evaluate the guard for `to` without side effects.
    pub fn decide(&self, to: &str) -> Decision {
        if self.resolve(to).map_or(false, |r| r.is_public()) {
            return Decision::Proceed;
        }

        match self.state() {
            NavState::Unauthenticated => Decision::Redirect(self.paths.login_path.clone()),
            NavState::AuthenticatedNoMenus => Decision::Bootstrap,
            NavState::AuthenticatedReady => Decision::Proceed,
        }
    }

    /// Fetch profile and menus, then materialize and register routes.
    ///
    /// Two overlapping bootstraps within one session both complete;
    /// registration replaces by name so the table ends up the same. A
    /// bootstrap that outlives its session (logout, or logout then login)
    /// installs nothing and returns `Ok(false)`.
    pub async fn bootstrap(&self) -> Result<bool, ConsoleError> {
        let session = self.auth.session();
        let generation = session.generation();
        self.auth.fetch_user_info().await?;
        let menus = self.auth.fetch_menus().await?;

        let routes = router::materialize(&menus, &self.registry, &self.paths.empty_path);
        let registered = routes.children.len();
        let skipped = routes.skipped.len();
        {
            // Checked under the router lock so a concurrent logout either
            // sees these routes installed and resets them, or wins first.
            let mut router = self.router.write().unwrap_or_else(PoisonError::into_inner);
            if !session.is_current(generation) {
                debug!("Session changed during menu bootstrap, discarding {} routes", registered);
                return Ok(false);
            }
            router::install(&mut router, routes);
        }
        if !session.mark_menus_loaded_for(generation) {
            debug!("Session changed while routes were installed");
            return Ok(false);
        }

        info!("Registered {} menu routes ({} skipped)", registered, skipped);
        Ok(true)
    }

    /// Run a navigation to completion, following redirects.
    pub async fn navigate(&self, to: &str) -> Result<Arrival, ConsoleError> {
        let requested = to.to_string();
        let mut target = normalize_path(to);
        let mut bootstrap_error = None;

        for _ in 0..MAX_HOPS {
            match self.decide(&target) {
                Decision::Redirect(next) => {
                    debug!("Guard redirected {} -> {}", target, next);
                    target = normalize_path(&next);
                }
                Decision::Bootstrap => {
                    let generation = self.auth.session().generation();
                    match self.bootstrap().await {
                        Err(e) if self.auth.session().is_current(generation) => {
                            warn!("Menu bootstrap failed, returning to login: {}", e);
                            self.auth.logout();
                            bootstrap_error = Some(e);
                            target = normalize_path(&self.paths.login_path);
                        }
                        Err(e) => {
                            debug!("Bootstrap failure from an ended session: {}", e);
                            // The session was ended by this failure (refresh rejected)
                            if e.is_session_fatal() {
                                bootstrap_error = Some(e);
                            }
                        }
                        // Installed or discarded, the same target is
                        // evaluated again against the current session.
                        Ok(_) => {}
                    }
                }
                Decision::Proceed => match self.resolve(&target) {
                    Some(route) => match route.redirect() {
                        Some(next) => target = normalize_path(next),
                        None => {
                            return Ok(Arrival {
                                requested,
                                route,
                                error: bootstrap_error,
                            })
                        }
                    },
                    None => {
                        let not_found = normalize_path(&self.paths.not_found_path);
                        if target == not_found {
                            break;
                        }
                        target = not_found;
                    }
                },
            }
        }

        Err(ConsoleError::Navigation(format!(
            "could not settle navigation to {}",
            requested
        )))
    }
}
