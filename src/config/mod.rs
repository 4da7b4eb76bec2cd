use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use url::Url;

use crate::error::ConsoleError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub navigation: NavigationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub prefix: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted token file. `None` means the default
    /// location under `$HOME/.config/admin-console`.
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub login_path: String,
    pub not_found_path: String,
    pub empty_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Configuration pointing at an explicit backend, used by tests and
    /// embedders that don't read the environment.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.api.base_url = base_url.into();
        config
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("CONSOLE_API_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = env::var("CONSOLE_API_PREFIX") {
            self.api.prefix = v;
        }
        if let Ok(v) = env::var("CONSOLE_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }

        if let Ok(v) = env::var("CONSOLE_CONFIG_DIR") {
            self.storage.config_dir = Some(PathBuf::from(v));
        }

        if let Ok(v) = env::var("CONSOLE_LOGIN_PATH") {
            self.navigation.login_path = v;
        }
        if let Ok(v) = env::var("CONSOLE_NOT_FOUND_PATH") {
            self.navigation.not_found_path = v;
        }
        if let Ok(v) = env::var("CONSOLE_EMPTY_PATH") {
            self.navigation.empty_path = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                prefix: "/api/v1".to_string(),
                request_timeout_secs: 30,
            },
            storage: StorageConfig { config_dir: None },
            navigation: NavigationConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.example.com".to_string(),
                prefix: "/api/v1".to_string(),
                request_timeout_secs: 15,
            },
            storage: StorageConfig { config_dir: None },
            navigation: NavigationConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://app.example.com".to_string(),
                prefix: "/api/v1".to_string(),
                request_timeout_secs: 10,
            },
            storage: StorageConfig { config_dir: None },
            navigation: NavigationConfig::default(),
        }
    }

    /// Parsed backend origin. Fails on anything that isn't an absolute http(s) URL.
    pub fn base_url(&self) -> Result<Url, ConsoleError> {
        let url = Url::parse(&self.api.base_url)
            .map_err(|e| ConsoleError::InvalidConfig(format!("CONSOLE_API_URL '{}': {}", self.api.base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConsoleError::InvalidConfig(format!(
                "CONSOLE_API_URL must be http or https, got '{}'",
                other
            ))),
        }
    }

    /// Full URL for an API endpoint such as `/users/me`.
    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.api.base_url.trim_end_matches('/');
        let prefix = self.api.prefix.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}{}", base, prefix, path)
        } else {
            format!("{}{}/{}", base, prefix, path)
        }
    }

    pub fn config_dir(&self) -> Result<PathBuf, ConsoleError> {
        if let Some(dir) = &self.storage.config_dir {
            return Ok(dir.clone());
        }
        let home = env::var("HOME")
            .map_err(|_| ConsoleError::InvalidConfig("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home).join(".config").join("admin-console"))
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            login_path: "/auth/login".to_string(),
            not_found_path: "/pages/notfound".to_string(),
            empty_path: "/pages/empty".to_string(),
        }
    }
}

// Global config for the binary - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.prefix, "/api/v1");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.navigation.login_path, "/auth/login");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api.request_timeout_secs, 10);
        assert!(config.api.base_url.starts_with("https://"));
    }

    #[test]
    fn endpoint_url_joins_prefix() {
        let config = AppConfig::for_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.endpoint_url("/users/me"), "http://127.0.0.1:9000/api/v1/users/me");
        assert_eq!(config.endpoint_url("items/"), "http://127.0.0.1:9000/api/v1/items/");
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        let config = AppConfig::for_base_url("ftp://example.com");
        assert!(matches!(config.base_url(), Err(ConsoleError::InvalidConfig(_))));
        assert!(AppConfig::for_base_url("http://example.com").base_url().is_ok());
    }
}
