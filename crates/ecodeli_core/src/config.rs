//! Startup configuration read from the process environment.
//!
//! # Responsibility
//! - Resolve API base URL and client-wide request timeout.
//! - Resolve OpenID Connect endpoints handed to the identity library.
//!
//! # Invariants
//! - Configuration is read once; there is no runtime reconfiguration.
//! - A malformed timeout falls back to the default instead of failing.

use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3002/api/v1";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_KEYCLOAK_URL: &str = "http://localhost:8081";
const DEFAULT_KEYCLOAK_REALM: &str = "ecodeli";
const DEFAULT_KEYCLOAK_CLIENT_ID: &str = "ecodeli";
const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";

pub const ENV_API_BASE_URL: &str = "ECODELI_API_BASE_URL";
pub const ENV_API_TIMEOUT_MS: &str = "ECODELI_API_TIMEOUT_MS";
pub const ENV_KEYCLOAK_URL: &str = "ECODELI_KEYCLOAK_URL";
pub const ENV_KEYCLOAK_REALM: &str = "ECODELI_KEYCLOAK_REALM";
pub const ENV_KEYCLOAK_CLIENT_ID: &str = "ECODELI_KEYCLOAK_CLIENT_ID";
pub const ENV_OIDC_REDIRECT_URI: &str = "ECODELI_OIDC_REDIRECT_URI";
pub const ENV_OIDC_SILENT_REDIRECT_URI: &str = "ECODELI_OIDC_SILENT_REDIRECT_URI";
pub const ENV_OIDC_POST_LOGOUT_REDIRECT_URI: &str = "ECODELI_OIDC_POST_LOGOUT_REDIRECT_URI";
pub const ENV_APP_ORIGIN: &str = "ECODELI_APP_ORIGIN";

/// REST collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:3002/api/v1`.
    pub base_url: String,
    /// Client-wide request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
        }
    }
}

/// Authorization-code flow settings for the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcConfig {
    pub authority: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub silent_redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub response_type: &'static str,
    pub scope: &'static str,
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub oidc: OidcConfig,
}

/// Configuration errors that cannot be recovered with a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is not an `http(s)://` URL.
    InvalidBaseUrl(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => {
                write!(f, "api base url must start with http:// or https://, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = read(ENV_API_BASE_URL)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let timeout_ms = parse_timeout_ms(read(ENV_API_TIMEOUT_MS).as_deref());

        let keycloak = read(ENV_KEYCLOAK_URL)
            .unwrap_or_else(|| DEFAULT_KEYCLOAK_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let realm = read(ENV_KEYCLOAK_REALM).unwrap_or_else(|| DEFAULT_KEYCLOAK_REALM.to_string());
        let origin = read(ENV_APP_ORIGIN)
            .unwrap_or_else(|| DEFAULT_APP_ORIGIN.to_string())
            .trim_end_matches('/')
            .to_string();

        let config = Self {
            api: ApiConfig {
                base_url,
                timeout: Duration::from_millis(timeout_ms),
            },
            oidc: OidcConfig {
                authority: format!("{keycloak}/realms/{realm}"),
                client_id: read(ENV_KEYCLOAK_CLIENT_ID)
                    .unwrap_or_else(|| DEFAULT_KEYCLOAK_CLIENT_ID.to_string()),
                redirect_uri: read(ENV_OIDC_REDIRECT_URI)
                    .unwrap_or_else(|| format!("{origin}/auth/callback")),
                silent_redirect_uri: read(ENV_OIDC_SILENT_REDIRECT_URI)
                    .unwrap_or_else(|| format!("{origin}/auth/silent-renew")),
                post_logout_redirect_uri: read(ENV_OIDC_POST_LOGOUT_REDIRECT_URI)
                    .unwrap_or_else(|| format!("{origin}/")),
                response_type: "code",
                scope: "openid profile email",
            },
        };

        info!(
            "event=config_load module=config status=ok base_url={} timeout_ms={}",
            config.api.base_url, timeout_ms
        );
        Ok(config)
    }
}

fn parse_timeout_ms(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_API_TIMEOUT_MS;
    };
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => value,
        _ => {
            warn!(
                "event=config_load module=config status=fallback key={} \
                 reason=not_a_positive_number",
                ENV_API_TIMEOUT_MS
            );
            DEFAULT_API_TIMEOUT_MS
        }
    }
}
