//! Client for the Chartmetric REST API.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod id;

pub use auth::{CredentialManager, Credentials, RefreshTokenManager};
pub use client::Chartmetric;
pub use config::{ClientConfig, DEFAULT_API_URL, ProxySettings};
pub use error::ApiError;
