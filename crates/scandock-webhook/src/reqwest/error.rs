/// Result type for reqwest client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while delivering a webhook over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure reported by reqwest.
    #[error("webhook delivery failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Payload could not be serialized to JSON.
    #[error("webhook payload serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<Error> for scandock_core::Error {
    fn from(error: Error) -> Self {
        match &error {
            Error::Reqwest(source) if source.is_timeout() => {
                scandock_core::Error::notify_failed()
                    .with_message("webhook endpoint did not respond in time")
                    .with_source(error)
            }
            Error::Reqwest(source) if source.is_connect() => {
                scandock_core::Error::notify_failed()
                    .with_message("connection to webhook endpoint failed")
                    .with_source(error)
            }
            _ => scandock_core::Error::notify_failed()
                .with_message("webhook delivery failed")
                .with_source(error),
        }
    }
}
