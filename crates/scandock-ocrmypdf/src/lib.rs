#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod engine;

pub use config::OcrmypdfConfig;
pub use engine::OcrmypdfEngine;
pub use scandock_core::ocr::{OcrOptions, OcrProvider};

/// Tracing target for OCR engine operations.
pub const TRACING_TARGET: &str = "scandock_ocrmypdf::engine";
