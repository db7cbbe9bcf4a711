//! Chartmetric API client with retry/backoff for read calls.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{
    HttpTransport, ReqwestTransport, RequestExecutor, RetryState, Sleeper, TokioSleeper,
};

/// Chartmetric API client.
///
/// GET calls are retried on rate limiting (429) and server errors (5xx);
/// every other method is sent exactly once.
#[derive(Clone)]
pub struct Chartmetric {
    executor: RequestExecutor,
    sleeper: Arc<dyn Sleeper>,
    max_retries: usize,
}

impl Chartmetric {
    /// Builds a client on top of the default reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::from_settings(&config.user_agent, &config.proxy)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Builds a client that sends every request through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let executor = RequestExecutor::new(transport, &config.api_url, config.credentials())
            .with_timeout(config.timeout)
            .with_trace(config.trace, config.trace_out);

        Self {
            executor,
            sleeper: Arc::new(TokioSleeper),
            max_retries: config.max_retries,
        }
    }

    /// Replaces the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// GET with retry. Returns `None` when the API answers with no content.
    #[tracing::instrument(skip(self, params, payload))]
    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, &str)],
        payload: Option<&Value>,
    ) -> Result<Option<Value>> {
        let mut state = RetryState::new(self.max_retries);

        loop {
            let error = match self.executor.execute(Method::GET, path, payload, params).await {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };

            let (status, retry_after) = match error.downcast_ref::<ApiError>() {
                Some(api_error) if api_error.is_transient() => {
                    (api_error.http_status, api_error.retry_after())
                }
                _ => {
                    debug!("GET {}: non-retryable error: {}", path, error);
                    return Err(error);
                }
            };

            match state.next_wait(retry_after) {
                Some(wait) => {
                    warn!(
                        "GET {}: HTTP {}, {} attempt(s) left, retrying in {}s...",
                        path,
                        status,
                        state.remaining_attempts(),
                        wait.as_secs()
                    );
                    self.sleeper.sleep(wait).await;
                }
                None => {
                    warn!(
                        "GET {}: HTTP {}, giving up after {} attempt(s)",
                        path,
                        status,
                        self.max_retries.max(1)
                    );
                    return Err(error);
                }
            }
        }
    }

    /// GET with retry, converting the body into `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<T>> {
        self.get(path, params, None)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .with_context(|| format!("Failed to decode response from {}", path))
    }

    /// POST once; never retried.
    #[tracing::instrument(skip(self, payload, params))]
    pub async fn post<P: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &P,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        let payload = serde_json::to_value(payload).context("Failed to serialize request payload")?;
        self.executor
            .execute(Method::POST, path, Some(&payload), params)
            .await
    }

    /// Sends any method. GET goes through the retry loop; everything else is sent once.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        if method == Method::GET {
            self.get(path, params, payload).await
        } else {
            self.executor.execute(method, path, payload, params).await
        }
    }
}
