//! Application-level redirects.

use serde::{Deserialize, Serialize};

/// Route targets the controller redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes {
    pub login: String,
    pub dashboard: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            dashboard: "/".to_string(),
        }
    }
}

/// Performs a client-side redirect.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator for hosts without a router; only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "redirect requested");
    }
}

/// Full-page navigation through `window.location`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

#[cfg(target_arch = "wasm32")]
impl Navigator for BrowserNavigator {
    fn navigate(&self, route: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(err) = window.location().set_href(route) {
            tracing::warn!("failed to navigate to {route}: {err:?}");
        }
    }
}
