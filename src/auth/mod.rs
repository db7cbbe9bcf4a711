//! Bearer token sources.

mod refresh;

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

pub use refresh::RefreshTokenManager;

/// Supplies access tokens on demand.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialManager: Send + Sync {
    async fn get_access_token(&self) -> Result<String>;
}

/// How a client authenticates. Fixed for the lifetime of the client.
#[derive(Clone, Default)]
pub enum Credentials {
    /// Requests carry no Authorization header.
    #[default]
    None,
    /// A static bearer token.
    Token(String),
    /// Tokens fetched from a manager on every call.
    Manager(Arc<dyn CredentialManager>),
}

impl Credentials {
    /// A static token wins over a manager; neither means unauthenticated.
    pub fn from_parts(
        token: Option<String>,
        manager: Option<Arc<dyn CredentialManager>>,
    ) -> Self {
        match (token, manager) {
            (Some(token), _) => Credentials::Token(token),
            (None, Some(manager)) => Credentials::Manager(manager),
            (None, None) => Credentials::None,
        }
    }

    /// The token to send, if any.
    pub async fn bearer_token(&self) -> Result<Option<String>> {
        match self {
            Credentials::None => Ok(None),
            Credentials::Token(token) => Ok(Some(token.clone())),
            Credentials::Manager(manager) => {
                debug!("Requesting access token from credential manager");
                let token = manager
                    .get_access_token()
                    .await
                    .context("Failed to obtain access token")?;
                Ok(Some(token))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => write!(f, "None"),
            Credentials::Token(_) => write!(f, "Token(<redacted>)"),
            Credentials::Manager(_) => write!(f, "Manager"),
        }
    }
}
