//! Transport seam between the request executor and the network.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, Proxy, header::HeaderMap};
use serde_json::Value;

use crate::config::ProxySettings;

/// One outgoing HTTP call, built fresh for every attempt.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

/// A fully read HTTP response. The body has already been drained, so no
/// connection is held once this value exists.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub status: u16,
    /// Final URL of the request, including the encoded query string.
    pub url: String,
    pub headers: HeaderMap,
    pub text: String,
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body text, or `None` when the body is empty or the literal `null`.
    pub fn content(&self) -> Option<&str> {
        if self.text.is_empty() || self.text == "null" {
            None
        } else {
            Some(&self.text)
        }
    }

    /// Parses the body as JSON. An absent body is `Ok(None)`.
    pub fn json(&self) -> Result<Option<Value>> {
        self.content()
            .map(|text| serde_json::from_str(text).context("Failed to parse JSON response"))
            .transpose()
    }
}

/// Issues HTTP calls on behalf of the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<ResponseEnvelope>;
}

/// [`HttpTransport`] backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wraps an existing reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client with the given user agent and proxy routes.
    pub fn from_settings(user_agent: &str, proxy: &ProxySettings) -> Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent);

        if let Some(url) = &proxy.all {
            builder = builder.proxy(Proxy::all(url).context("Invalid proxy URL")?);
        }
        if let Some(url) = &proxy.http {
            builder = builder.proxy(Proxy::http(url).context("Invalid HTTP proxy URL")?);
        }
        if let Some(url) = &proxy.https {
            builder = builder.proxy(Proxy::https(url).context("Invalid HTTPS proxy URL")?);
        }
        if !proxy.is_empty() {
            debug!("HTTP client configured with proxy settings");
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<ResponseEnvelope> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.context("Failed to send request")?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(ResponseEnvelope {
            status,
            url,
            headers,
            text,
        })
    }
}
