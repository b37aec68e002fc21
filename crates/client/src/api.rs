//! Contract of the identity endpoints the session core consumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use erpdash_auth::{PermissionSnapshot, User};

/// Login form payload for `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("API error ({0}): {1}")]
    Status(u16, String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Identity endpoints, owned by the HTTP collaborator.
///
/// All four calls are idempotent from the client's point of view. Timeouts
/// and token refresh are the implementor's business.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait AuthApi: Send + Sync {
    /// `GET /auth/me`
    async fn current_user(&self) -> Result<User, ApiError>;

    /// `GET /auth/permissions`
    async fn current_permissions(&self) -> Result<PermissionSnapshot, ApiError>;

    /// `POST /auth/login`; persisting the issued tokens is the implementor's job.
    async fn login(&self, credentials: &Credentials) -> Result<(), ApiError>;

    /// `POST /auth/logout`
    async fn logout(&self) -> Result<(), ApiError>;
}
