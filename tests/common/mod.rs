#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use admin_console::config::AppConfig;
use admin_console::http::ReqwestTransport;
use admin_console::router::ComponentRegistry;
use admin_console::session::{MemoryTokenStorage, TokenStorage};
use admin_console::Console;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "changethis";
/// Second account whose menu only grants the items page.
pub const VIEWER: &str = "viewer";
pub const VIEWER_PASSWORD: &str = "readonly";
/// Recovery token the backend accepts for resetting the admin password.
pub const RESET_TOKEN: &str = "reset-admin";

/// In-process stand-in for the admin backend, with counters for the calls
/// the tests care about.
#[derive(Default)]
pub struct MockState {
    access_token: Mutex<String>,
    refresh_token: Mutex<String>,
    issued: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub menu_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub fail_refresh: AtomicBool,
    pub fail_menu: AtomicBool,
    menu: Mutex<Value>,
    items: Mutex<BTreeMap<u64, Value>>,
    next_item: AtomicUsize,
    current_user: Mutex<String>,
    passwords: Mutex<BTreeMap<String, String>>,
    profiles: Mutex<BTreeMap<String, Value>>,
    hold_menu: AtomicBool,
    /// Signalled when a held menu request has been received.
    pub menu_arrived: Notify,
    menu_release: Notify,
}

impl MockState {
    fn new() -> Self {
        let state = Self::default();
        state.set_menu(default_menu());
        *state.passwords.lock().unwrap() = BTreeMap::from([
            (USERNAME.to_string(), PASSWORD.to_string()),
            (VIEWER.to_string(), VIEWER_PASSWORD.to_string()),
        ]);
        *state.profiles.lock().unwrap() = BTreeMap::from([
            (
                USERNAME.to_string(),
                json!({
                    "id": "5f0c3a52-1d44-4b8e-9a53-2f4b0b7e0001",
                    "username": USERNAME,
                    "email": "admin@example.com",
                    "full_name": "Admin User",
                    "avatar": "/static/avatars/admin.png",
                    "is_active": true,
                    "is_superuser": true,
                    "role": { "id": "r1", "name": "admin" }
                }),
            ),
            (
                VIEWER.to_string(),
                json!({
                    "id": "5f0c3a52-1d44-4b8e-9a53-2f4b0b7e0002",
                    "username": VIEWER,
                    "email": "viewer@example.com",
                    "is_active": true,
                    "is_superuser": false,
                    "role": { "id": "r2", "name": "viewer" }
                }),
            ),
        ]);
        state
    }

    fn issue(&self, username: &str) -> Value {
        *self.current_user.lock().unwrap() = username.to_string();
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        *self.access_token.lock().unwrap() = access.clone();
        *self.refresh_token.lock().unwrap() = refresh.clone();
        json!({ "access_token": access, "refresh_token": refresh, "token_type": "bearer" })
    }

    /// Invalidate the current access token; the refresh token stays valid.
    pub fn expire_access_token(&self) {
        *self.access_token.lock().unwrap() = "no-longer-issued".to_string();
    }

    pub fn set_menu(&self, menu: Value) {
        *self.menu.lock().unwrap() = menu;
    }

    /// Keep menu responses pending until [`MockState::release_menu`].
    pub fn hold_menu(&self) {
        self.hold_menu.store(true, Ordering::SeqCst);
    }

    pub fn release_menu(&self) {
        self.hold_menu.store(false, Ordering::SeqCst);
        self.menu_release.notify_one();
    }

    pub fn password_of(&self, username: &str) -> Option<String> {
        self.passwords.lock().unwrap().get(username).cloned()
    }

    fn current_user(&self) -> String {
        self.current_user.lock().unwrap().clone()
    }

    fn profile(&self) -> Value {
        let user = self.current_user();
        self.profiles.lock().unwrap().get(&user).cloned().unwrap_or(Value::Null)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn menu_calls(&self) -> usize {
        self.menu_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.access_token.lock().unwrap());
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v == expected)
    }
}

pub fn viewer_menu() -> Value {
    json!([
        {
            "id": "2b1e4c0e-0000-4000-8000-000000000010",
            "label": "Viewer",
            "items": [
                { "id": "v-items", "label": "Items", "to": "/items", "component": "business/Items.vue" }
            ]
        }
    ])
}

pub fn default_menu() -> Value {
    json!([
        {
            "id": "2b1e4c0e-0000-4000-8000-000000000001",
            "label": "Business",
            "icon": "pi pi-briefcase",
            "is_hidden": false,
            "items": [
                { "id": "m-items", "label": "Items", "to": "/items", "component": "business/Items.vue" },
                { "id": "m-groups", "label": "Groups", "to": "/groups", "component": "@/views/business/Groups.vue" },
                { "id": "m-ghost", "label": "Ghost", "to": "/ghost", "component": "business/Ghost.vue" },
                { "id": "m-apps", "label": "Applications", "to": "/applications",
                  "component": "/src/views/business/Applications.vue", "is_hidden": true }
            ]
        },
        {
            "id": "2b1e4c0e-0000-4000-8000-000000000002",
            "label": "Admin",
            "items": [
                { "id": "m-roles", "label": "Roles", "to": "/admin/roles", "component": "views/pages/admin/Roles.vue", "items": null }
            ]
        }
    ])
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Could not validate credentials" })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshQuery {
    refresh_token: String,
}

type Shared = State<Arc<MockState>>;

async fn login(State(state): Shared, Form(form): Form<LoginForm>) -> Response {
    if state.password_of(&form.username).as_deref() == Some(form.password.as_str()) {
        Json(state.issue(&form.username)).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Incorrect username or password" })),
        )
            .into_response()
    }
}

async fn refresh(State(state): Shared, Query(query): Query<RefreshQuery>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let valid = *state.refresh_token.lock().unwrap() == query.refresh_token;
    if state.fail_refresh.load(Ordering::SeqCst) || !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid refresh token" })),
        )
            .into_response();
    }
    let user = state.current_user();
    Json(state.issue(&user)).into_response()
}

async fn me(State(state): Shared, headers: HeaderMap) -> Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(state.profile()).into_response()
}

async fn test_token(State(state): Shared, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    Json(state.profile()).into_response()
}

async fn update_me(State(state): Shared, headers: HeaderMap, Json(changes): Json<Value>) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let user = state.current_user();
    let mut profiles = state.profiles.lock().unwrap();
    let Some(profile) = profiles.get_mut(&user) else {
        return unauthorized();
    };
    if let (Some(target), Value::Object(fields)) = (profile.as_object_mut(), changes) {
        target.extend(fields);
    }
    Json(profile.clone()).into_response()
}

#[derive(Deserialize)]
struct PasswordChange {
    current_password: String,
    new_password: String,
}

async fn update_password(State(state): Shared, headers: HeaderMap, Json(change): Json<PasswordChange>) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let user = state.current_user();
    let mut passwords = state.passwords.lock().unwrap();
    if passwords.get(&user) != Some(&change.current_password) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "Incorrect password" }))).into_response();
    }
    passwords.insert(user, change.new_password);
    Json(json!({ "message": "Password updated successfully" })).into_response()
}

#[derive(Deserialize)]
struct PasswordReset {
    token: String,
    new_password: String,
}

async fn reset_password(State(state): Shared, Json(reset): Json<PasswordReset>) -> Response {
    if reset.token != RESET_TOKEN {
        return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "Invalid token" }))).into_response();
    }
    state
        .passwords
        .lock()
        .unwrap()
        .insert(USERNAME.to_string(), reset.new_password);
    Json(json!({ "message": "Password updated successfully" })).into_response()
}

async fn my_menu(State(state): Shared, headers: HeaderMap) -> Response {
    state.menu_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if state.fail_menu.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "menu store unavailable" })),
        )
            .into_response();
    }
    // Captured before any hold so a delayed response still carries the
    // menu of the user who asked for it.
    let menu = if state.current_user() == VIEWER {
        viewer_menu()
    } else {
        state.menu.lock().unwrap().clone()
    };
    if state.hold_menu.load(Ordering::SeqCst) {
        state.menu_arrived.notify_one();
        state.menu_release.notified().await;
    }
    Json(menu).into_response()
}

async fn always_unauthorized() -> Response {
    unauthorized()
}

async fn list_items(State(state): Shared, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let items: Vec<Value> = state.items.lock().unwrap().values().cloned().collect();
    Json(json!({ "data": items, "count": items.len() })).into_response()
}

async fn create_item(State(state): Shared, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let id = state.next_item.fetch_add(1, Ordering::SeqCst) as u64 + 1;
    body["id"] = json!(id.to_string());
    state.items.lock().unwrap().insert(id, body.clone());
    Json(body).into_response()
}

fn item_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Item not found" }))).into_response()
}

async fn get_item(State(state): Shared, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    match state.items.lock().unwrap().get(&id) {
        Some(item) => Json(item.clone()).into_response(),
        None => item_not_found(),
    }
}

async fn update_item(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(mut body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let mut items = state.items.lock().unwrap();
    if !items.contains_key(&id) {
        return item_not_found();
    }
    body["id"] = json!(id.to_string());
    items.insert(id, body.clone());
    Json(body).into_response()
}

async fn delete_item(State(state): Shared, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    match state.items.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => item_not_found(),
    }
}

fn app(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/v1/login/access-token", post(login))
        .route("/api/v1/login/refresh-token", post(refresh))
        .route("/api/v1/login/test-token", post(test_token))
        .route("/api/v1/login/reset-password/", post(reset_password))
        .route("/api/v1/users/me", get(me).patch(update_me))
        .route("/api/v1/users/me/password", patch(update_password))
        .route("/api/v1/users/me/menu", get(my_menu))
        .route("/api/v1/always-401", get(always_unauthorized))
        .route("/api/v1/items/", get(list_items).post(create_item))
        .route(
            "/api/v1/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(state)
}

static TRACING: Once = Once::new();

/// Route client logs through the test harness; `RUST_LOG` overrides.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_test_writer()
            .try_init();
    });
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        init_tracing();
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock backend")?;

        let state = Arc::new(MockState::new());

        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        })
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::for_base_url(self.base_url.clone())
    }

    pub fn console(&self) -> Console {
        self.console_with(Arc::new(MemoryTokenStorage::new()))
    }

    pub fn console_with(&self, storage: Arc<dyn TokenStorage>) -> Console {
        let config = self.config();
        let transport = Arc::new(ReqwestTransport::new(&config).expect("transport"));
        Console::with_parts(config, transport, storage, ComponentRegistry::builtin())
    }

    pub async fn logged_in(&self) -> Result<Console> {
        let console = self.console();
        console.login(USERNAME, PASSWORD).await?;
        Ok(console)
    }
}
