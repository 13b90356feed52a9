//! Client configuration.
//!
//! The base address is fixed when the transport is built. `from_env` is meant
//! to be called once at startup; nothing re-reads the environment per request.

use std::env;

/// Environment variable holding the API base URL prefix.
pub const API_PREFIX_ENV: &str = "SYNC_VIEWER_API_PREFIX";

/// Environment variable holding a session token from a previous `login`.
pub const TOKEN_ENV: &str = "SYNC_VIEWER_TOKEN";

pub const DEFAULT_API_PREFIX: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Prefix every endpoint path is appended to, e.g. `http://host:8080/api`.
    pub base_url: String,
    pub user_agent: String,
    /// Session token attached as the `token` cookie on every request.
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: format!("sync-viewer/{}", env!("CARGO_PKG_VERSION")),
            token: None,
        }
    }

    /// Read [`API_PREFIX_ENV`] and [`TOKEN_ENV`]; empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v: &String| !v.is_empty());
        let mut config = Self::new(var(API_PREFIX_ENV).unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()));
        config.token = var(TOKEN_ENV);
        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Join an endpoint path onto the base prefix.
    ///
    /// Appends rather than resolving, so a prefix path like `/api` is kept.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_PREFIX)
    }
}
