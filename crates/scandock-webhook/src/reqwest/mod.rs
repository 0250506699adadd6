//! Reqwest-based HTTP client for webhook delivery.
//!
//! This module provides a reqwest-based implementation of the
//! [`WebhookProvider`](crate::WebhookProvider) trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use scandock_webhook::reqwest::{ReqwestClient, ReqwestConfig};
//! use scandock_webhook::WebhookRequest;
//!
//! let client = ReqwestClient::default();
//! let response = client.deliver(&request).await?;
//! ```

mod client;
mod config;
mod error;

pub use client::ReqwestClient;
pub use config::ReqwestConfig;
pub use error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "scandock_webhook::reqwest";
