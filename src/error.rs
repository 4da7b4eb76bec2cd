// Client-side error taxonomy
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the console core to its callers (CLI actions, the
/// navigation guard). Presentation is left to the caller.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Credentials rejected by the login endpoint (400 or 401). Session is
    /// untouched.
    #[error("Authentication failed: {detail}")]
    Authentication { status: u16, detail: String },

    /// Refresh token expired or rejected. Session has been cleared and the
    /// caller should navigate to `redirect`.
    #[error("Session expired, please log in again")]
    SessionExpired { redirect: String },

    /// No access token present for an operation that needs one.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Any other non-2xx response.
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] std::io::Error),
}

impl ConsoleError {
    /// True for failures that end the session (refresh rejected).
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, ConsoleError::SessionExpired { .. })
    }

    /// Stable code for JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Authentication { .. } => "AUTHENTICATION_FAILED",
            ConsoleError::SessionExpired { .. } => "SESSION_EXPIRED",
            ConsoleError::NotAuthenticated => "NOT_AUTHENTICATED",
            ConsoleError::Api { .. } => "API_ERROR",
            ConsoleError::InvalidConfig(_) => "INVALID_CONFIG",
            ConsoleError::UnknownResource(_) => "UNKNOWN_RESOURCE",
            ConsoleError::Navigation(_) => "NAVIGATION_FAILED",
            ConsoleError::Transport(_) => "TRANSPORT_ERROR",
            ConsoleError::Decode(_) => "DECODE_ERROR",
            ConsoleError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Extract a human-readable message from a backend error body.
///
/// The backend reports `{"detail": "..."}` for most errors and
/// `{"detail": [{"msg": "..."}, ...]}` for validation failures.
pub fn error_detail(body: Option<&Value>) -> String {
    const FALLBACK: &str = "Request failed";

    let Some(detail) = body.and_then(|b| b.get("detail")) else {
        return FALLBACK.to_string();
    };

    match detail {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                FALLBACK.to_string()
            } else {
                messages.join(", ")
            }
        }
        _ => FALLBACK.to_string(),
    }
}
