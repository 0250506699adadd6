//! Enhanced HTTP request extractors with improved error handling and validation.
//!
//! This module provides custom Axum extractors that enhance the default
//! functionality with better error messages, validation, and type safety. All
//! extractors are drop-in replacements for their standard Axum counterparts
//! and convert rejections into the handler [`Error`] type so every failure
//! surfaces as a structured error response.
//!
//! - [`Json`] - JSON deserialization with better error messages
//! - [`ValidateJson`] - JSON extraction with automatic validation
//! - [`Path`] - Path parameter extraction with detailed error context
//! - [`Query`] - Query parameter extraction with enhanced error messages
//! - [`Multipart`] - Multipart form extraction with proper error responses
//!
//! [`Error`]: crate::handler::Error

pub mod reject;

pub use crate::extract::reject::{Json, Multipart, Path, Query, ValidateJson};
