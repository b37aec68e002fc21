//! Client configuration.

use crate::Routes;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Where the API lives and where redirects go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub routes: Routes,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            routes: Routes::default(),
        }
    }

    /// Read `ERPDASH_API_URL`, `ERPDASH_LOGIN_ROUTE` and
    /// `ERPDASH_DASHBOARD_ROUTE`, falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Routes::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_url: var("ERPDASH_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            routes: Routes {
                login: var("ERPDASH_LOGIN_ROUTE").unwrap_or(defaults.login),
                dashboard: var("ERPDASH_DASHBOARD_ROUTE").unwrap_or(defaults.dashboard),
            },
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.routes.login, "/login");
        assert_eq!(config.routes.dashboard, "/");
    }

    #[test]
    fn reads_overrides_and_ignores_blank_values() {
        let env: HashMap<&str, &str> = [
            ("ERPDASH_API_URL", "https://erp.example.com/api"),
            ("ERPDASH_LOGIN_ROUTE", "  "),
            ("ERPDASH_DASHBOARD_ROUTE", "/home"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_url, "https://erp.example.com/api");
        assert_eq!(config.routes.login, "/login");
        assert_eq!(config.routes.dashboard, "/home");
    }
}
