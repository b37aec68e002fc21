//! Reference HTTP collaborator for the identity endpoints.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use erpdash_auth::{PermissionSnapshot, User};

use crate::api::{ApiError, AuthApi, Credentials};
use crate::token::{TokenAccessor, TokenPair, TokenStore};

/// `AuthApi` over reqwest with bearer tokens from a shared [`TokenStore`].
pub struct HttpAuthApi {
    api_url: String,
    client: reqwest::Client,
    tokens: Arc<TokenStore>,
}

impl HttpAuthApi {
    pub fn new(api_url: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.tokens.access_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .authorized(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16(), resp.text().await.unwrap_or_default()));
    }
    Ok(resp)
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl AuthApi for HttpAuthApi {
    async fn current_user(&self) -> Result<User, ApiError> {
        self.get_json("/auth/me").await
    }

    async fn current_permissions(&self) -> Result<PermissionSnapshot, ApiError> {
        self.get_json("/auth/permissions").await
    }

    async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;
        let tokens: TokenPair = resp.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        self.tokens.store(tokens);
        Ok(())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let result = async {
            let resp = self
                .authorized(self.client.post(self.url("/auth/logout")))
                .send()
                .await
                .map_err(transport)?;
            check_status(resp).await.map(|_| ())
        }
        .await;

        self.tokens.clear();
        result
    }
}
