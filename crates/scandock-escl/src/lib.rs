#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;

pub use client::EsclClient;
pub use config::EsclConfig;
pub use error::{Error, Result};
pub use scandock_core::scan::{ScanOptions, ScannedImage, ScannerProvider};

/// Tracing target for eSCL client operations.
pub const TRACING_TARGET: &str = "scandock_escl::client";
