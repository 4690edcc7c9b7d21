//! Portal configuration.
//!
//! Loaded from `PORTAL_*` environment variables with defaults matching a
//! local development setup (backend on `:8000`, frontend on `:5173`).

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_PAGE_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_DEV_BACKEND_ORIGIN: &str = "http://127.0.0.1:8000";
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);
/// Hard limit on a client-site login round trip.
pub const CLIENT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// How the token is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    /// `Authorization: Token <token>` (Django REST framework token auth).
    #[default]
    Token,
    /// `Authorization: Bearer <token>`.
    Bearer,
}

impl AuthScheme {
    /// Parse `token` or `bearer`, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "token" => Some(Self::Token),
            "bearer" => Some(Self::Bearer),
            _ => None,
        }
    }

    /// Full `Authorization` header value for `token`.
    #[must_use]
    pub fn header_value(self, token: &str) -> String {
        match self {
            Self::Token => format!("Token {token}"),
            Self::Bearer => format!("Bearer {token}"),
        }
    }
}

/// Portal configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the primary backend API, without a trailing `/`.
    pub api_url: String,
    /// Origin the portal itself is served from. Decides whether a client-site
    /// redirect can stay relative.
    pub page_origin: String,
    /// Backend origin substituted for local development hosts when picking
    /// the token scope of an outgoing request.
    pub dev_backend_origin: String,
    /// Header scheme for outgoing tokens.
    pub auth_scheme: AuthScheme,
    /// Timeout for primary-backend calls.
    pub api_timeout: Duration,
    /// Timeout for client-site login calls.
    pub client_login_timeout: Duration,
    /// Where to send the user when the primary session expires.
    pub login_page: String,
    /// Where to send the user when a client-site session expires.
    pub client_login_page: String,
    /// Optional JSON file replacing the built-in client-site catalog.
    pub sites_file: Option<PathBuf>,
    /// Location of the on-disk token store.
    pub storage_path: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            page_origin: DEFAULT_PAGE_ORIGIN.to_owned(),
            dev_backend_origin: DEFAULT_DEV_BACKEND_ORIGIN.to_owned(),
            auth_scheme: AuthScheme::default(),
            api_timeout: DEFAULT_API_TIMEOUT,
            client_login_timeout: CLIENT_LOGIN_TIMEOUT,
            login_page: "/login".to_owned(),
            client_login_page: "/client-login".to_owned(),
            sites_file: None,
            storage_path: None,
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PORTAL_API_URL` — primary backend base URL (default: `http://localhost:8000/api`)
    /// - `PORTAL_PAGE_ORIGIN` — origin the portal is served from (default: `http://localhost:5173`)
    /// - `PORTAL_DEV_BACKEND_ORIGIN` — canonical origin for local hosts (default: `http://127.0.0.1:8000`)
    /// - `PORTAL_AUTH_SCHEME` — `token` or `bearer` (default: `token`)
    /// - `PORTAL_API_TIMEOUT_SECS` — primary backend timeout (default: `30`)
    /// - `PORTAL_SITES_FILE` — JSON client-site catalog (default: built-in)
    /// - `PORTAL_STORAGE_PATH` — token store file (default: `$HOME/.portal/tokens.redb`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading values from `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(url) = var("PORTAL_API_URL") {
            cfg.api_url = trim_url(&url);
        }
        if let Some(origin) = var("PORTAL_PAGE_ORIGIN") {
            cfg.page_origin = trim_url(&origin);
        }
        if let Some(origin) = var("PORTAL_DEV_BACKEND_ORIGIN") {
            cfg.dev_backend_origin = trim_url(&origin);
        }
        if let Some(raw) = var("PORTAL_AUTH_SCHEME") {
            match AuthScheme::parse(&raw) {
                Some(scheme) => cfg.auth_scheme = scheme,
                None => warn!(value = %raw, "unknown PORTAL_AUTH_SCHEME, using 'token'"),
            }
        }
        if let Some(raw) = var("PORTAL_API_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => cfg.api_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "invalid PORTAL_API_TIMEOUT_SECS, using default"),
            }
        }
        cfg.sites_file = var("PORTAL_SITES_FILE").map(PathBuf::from);
        cfg.storage_path = var("PORTAL_STORAGE_PATH")
            .map(PathBuf::from)
            .or_else(|| var("HOME").map(|home| default_storage_path(&home)));

        cfg
    }
}

/// `<home>/.portal/tokens.redb`.
#[must_use]
pub fn default_storage_path(home: &str) -> PathBuf {
    PathBuf::from(home).join(".portal").join("tokens.redb")
}

fn trim_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}
