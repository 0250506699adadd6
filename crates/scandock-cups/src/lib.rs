#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod spooler;

pub use config::CupsConfig;
pub use scandock_core::print::{PrintJob, PrintProvider};
pub use spooler::CupsSpooler;

/// Tracing target for print spooler operations.
pub const TRACING_TARGET: &str = "scandock_cups::spooler";
