use super::registry::Component;
use super::RouteRecord;

/// Pages reachable without authentication. Fixed at build time, never
/// derived from server data.
pub const STATIC_ROUTES: &[(&str, &str, &str)] = &[
    ("/landing", "landing", "/src/views/pages/Landing.vue"),
    ("/auth/login", "login", "/src/views/pages/auth/Login.vue"),
    ("/auth/register", "register", "/src/views/pages/auth/Register.vue"),
    ("/auth/forgot-password", "forgotPassword", "/src/views/pages/auth/ForgotPassword.vue"),
    ("/auth/reset-password", "resetPassword", "/src/views/pages/auth/ResetPassword.vue"),
    ("/pages/empty", "empty", "/src/views/pages/Empty.vue"),
    ("/auth/error", "error", "/src/views/pages/auth/Error.vue"),
    ("/auth/access", "accessDenied", "/src/views/pages/auth/Access.vue"),
    ("/pages/notfound", "notfound", "/src/views/pages/NotFound.vue"),
];

pub fn static_routes() -> Vec<RouteRecord> {
    STATIC_ROUTES
        .iter()
        .map(|(path, name, component)| RouteRecord::public(*path, *name, Component::new(*component)))
        .collect()
}
