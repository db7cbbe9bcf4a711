//! Exchanges a long-lived refresh token for short-lived access tokens.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::Method;
use serde::Deserialize;

use super::{CredentialManager, Credentials};
use crate::http::{HttpTransport, RequestExecutor};

/// Path of the token endpoint, relative to the API base URL.
const TOKEN_PATH: &str = "token";

/// Lifetime assumed when the token response has no `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize, Debug)]
struct TokenResponse {
    token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// [`CredentialManager`] backed by the vendor's token endpoint.
///
/// The token request itself is sent unauthenticated and is never retried.
pub struct RefreshTokenManager {
    executor: RequestExecutor,
    refresh_token: String,
    cached: Mutex<Option<CachedToken>>,
}

impl RefreshTokenManager {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        api_url: &str,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            executor: RequestExecutor::new(transport, api_url, Credentials::None),
            refresh_token: refresh_token.into(),
            cached: Mutex::new(None),
        }
    }

    fn cached_token(&self) -> Option<String> {
        let cached = self.cached.lock().ok()?;
        cached
            .as_ref()
            .filter(|c| Instant::now() < c.refresh_at)
            .map(|c| c.token.clone())
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let payload = serde_json::json!({ "refreshtoken": self.refresh_token });
        let body = self
            .executor
            .execute(Method::POST, TOKEN_PATH, Some(&payload), &[])
            .await
            .context("Failed to refresh access token")?
            .ok_or_else(|| anyhow!("Token endpoint returned an empty response"))?;

        let response: TokenResponse =
            serde_json::from_value(body).context("Failed to parse token response")?;

        let lifetime =
            Duration::from_secs(response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        debug!("Obtained access token valid for {}s", lifetime.as_secs());

        Ok(CachedToken {
            token: response.token,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

#[async_trait]
impl CredentialManager for RefreshTokenManager {
    #[tracing::instrument(skip(self))]
    async fn get_access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        if let Ok(mut cached) = self.cached.lock() {
            *cached = Some(fresh);
        }
        Ok(token)
    }
}
