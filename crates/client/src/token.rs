//! Access-token presence, as seen by the session core.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStorage;

/// Storage key of persisted tokens when a [`TokenStore`] is storage-backed.
pub const TOKEN_KEY: &str = "auth_tokens";

/// Synchronous view of the token storage owned by the HTTP collaborator.
pub trait TokenAccessor: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn has_token(&self) -> bool {
        self.access_token().is_some()
    }
}

/// Tokens issued by `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl core::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Token holder, optionally mirrored into tab-scoped storage.
///
/// Mirroring is best-effort: a storage failure only costs the tokens on the
/// next page load.
#[derive(Default)]
pub struct TokenStore {
    tokens: RwLock<Option<TokenPair>>,
    backing: Option<Arc<dyn KeyValueStorage>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that survives reloads by mirroring into `storage` under [`TOKEN_KEY`].
    pub fn backed_by(storage: Arc<dyn KeyValueStorage>) -> Self {
        let restored = match storage.get(TOKEN_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .inspect_err(|err| tracing::debug!("ignoring unreadable stored tokens: {err}"))
                .ok(),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!("failed to restore tokens: {err}");
                None
            }
        };
        Self {
            tokens: RwLock::new(restored),
            backing: Some(storage),
        }
    }

    pub fn with_access_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.store(TokenPair {
            access_token: token.into(),
            refresh_token: None,
        });
        store
    }

    pub fn store(&self, tokens: TokenPair) {
        if let Some(storage) = &self.backing {
            let written = serde_json::to_string(&tokens)
                .map_err(|err| err.to_string())
                .and_then(|raw| storage.set(TOKEN_KEY, &raw).map_err(|err| err.to_string()));
            if let Err(err) = written {
                tracing::warn!("failed to persist tokens: {err}");
            }
        }
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
    }

    pub fn clear(&self) {
        if let Some(storage) = &self.backing {
            if let Err(err) = storage.remove(TOKEN_KEY) {
                tracing::warn!("failed to remove persisted tokens: {err}");
            }
        }
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }
}

impl core::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.has_token())
            .field("persistent", &self.backing.is_some())
            .finish()
    }
}

impl TokenAccessor for TokenStore {
    fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.access_token.clone())
            .filter(|token| !token.is_empty())
    }
}
