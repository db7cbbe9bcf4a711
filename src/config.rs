//! Client configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialManager, Credentials};
use crate::http::DEFAULT_MAX_RETRIES;

/// Default API root. Relative resource paths are appended to it.
pub const DEFAULT_API_URL: &str = "https://api.chartmetric.com/api/";

/// User agent sent by the default transport.
pub const DEFAULT_USER_AGENT: &str = concat!("chartmetric-rs/", env!("CHARTMETRIC_VERSION"));

/// Proxy routes for the default transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    /// Used for every scheme.
    pub all: Option<String>,
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxySettings {
    pub fn is_empty(&self) -> bool {
        self.all.is_none() && self.http.is_none() && self.https.is_none()
    }
}

/// Everything needed to build a [`Chartmetric`](crate::Chartmetric) client.
/// Not mutated once the client exists.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    /// Takes precedence over `credential_manager` when both are set.
    pub token: Option<String>,
    pub credential_manager: Option<Arc<dyn CredentialManager>>,
    pub proxy: ProxySettings,
    pub timeout: Option<Duration>,
    pub max_retries: usize,
    /// Log request headers, status, payloads and responses.
    pub trace: bool,
    /// Log every resolved URL before it is requested.
    pub trace_out: bool,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            credential_manager: None,
            proxy: ProxySettings::default(),
            timeout: None,
            max_retries: DEFAULT_MAX_RETRIES,
            trace: false,
            trace_out: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_credential_manager(mut self, manager: Arc<dyn CredentialManager>) -> Self {
        self.credential_manager = Some(manager);
        self
    }

    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_trace(mut self, trace: bool, trace_out: bool) -> Self {
        self.trace = trace;
        self.trace_out = trace_out;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Resolves the configured token sources into [`Credentials`].
    pub fn credentials(&self) -> Credentials {
        Credentials::from_parts(self.token.clone(), self.credential_manager.clone())
    }
}
