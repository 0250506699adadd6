//! Error types for eSCL transport failures.

use thiserror::Error;

/// Result type alias for eSCL transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for eSCL transport operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<Error> for scandock_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    scandock_core::Error::scanner_timeout()
                        .with_message("scanner did not respond in time")
                        .with_source(e)
                } else if e.is_connect() {
                    scandock_core::Error::scanner_unreachable()
                        .with_message("connection to scanner failed")
                        .with_source(e)
                } else {
                    scandock_core::Error::scanner_protocol()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
        }
    }
}
