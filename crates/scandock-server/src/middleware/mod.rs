//! Middleware for `axum::Router` and HTTP request processing.
//!
//! This module provides middleware for:
//! - Observability (tracing, request IDs, sensitive header redaction)
//! - Error handling (panics, timeouts, service errors)
//! - Cross-origin resource sharing
//! - OpenAPI documentation with Scalar UI

mod cors;
mod observability;
mod recovery;
mod specification;

pub use cors::{CorsConfig, RouterCorsExt};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
