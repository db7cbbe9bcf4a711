//! Classified failures returned by the Chartmetric API.

use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::http::is_transient_status;

/// Vendor error code used when the API does not surface a distinct one.
pub const UNKNOWN_ERROR_CODE: i32 = -1;

/// A non-2xx response, translated into a structured error.
///
/// Carried inside `anyhow::Error` and recovered with
/// `err.downcast_ref::<ApiError>()`.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub http_status: u16,
    pub code: i32,
    pub message: String,
    pub headers: HeaderMap,
}

impl ApiError {
    pub fn new(http_status: u16, message: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            http_status,
            code: UNKNOWN_ERROR_CODE,
            message: message.into(),
            headers,
        }
    }

    /// Rate limiting (429) and server errors (5xx) are worth another attempt.
    pub fn is_transient(&self) -> bool {
        is_transient_status(self.http_status)
    }

    /// The `Retry-After` header in whole seconds, if present and numeric.
    pub fn retry_after(&self) -> Option<u64> {
        self.headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "http status: {}, code:{} - {}",
            self.http_status, self.code, self.message
        )
    }
}

impl std::error::Error for ApiError {}
