#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Scandock Core
//!
//! This crate provides the foundational abstractions for the scandock scan
//! orchestration service. It defines the domain model (pages, documents,
//! categories), the shared error type, and the capability traits for the
//! scanner, OCR engine, and print spooler backends without depending on any
//! concrete implementation.

/// Tracing target for scanner operations.
pub const TRACING_TARGET_SCAN: &str = "scandock_core::scan";

/// Tracing target for OCR operations.
pub const TRACING_TARGET_OCR: &str = "scandock_core::ocr";

/// Tracing target for print spooler operations.
pub const TRACING_TARGET_PRINT: &str = "scandock_core::print";

mod error;
mod health;

pub mod document;
pub mod ocr;
pub mod print;
pub mod scan;

#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

// Re-export key types for convenience
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
