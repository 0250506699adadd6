//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// This type is commonly used as a source error in structured error types,
/// providing a way to wrap any error that implements the standard `Error` trait
/// while maintaining Send and Sync bounds for multi-threaded contexts.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors that can occur in scandock operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Scanner endpoint could not be reached.
    ScannerUnreachable,
    /// Scanner did not respond within the configured deadline.
    ScannerTimeout,
    /// Scanner responded outside the expected protocol contract.
    ScannerProtocol,
    /// Scanner is busy with another job.
    ScannerBusy,
    /// A page file referenced by a session is missing or unreadable.
    MissingPage,
    /// A page file could not be decoded as an image.
    DecodeFailed,
    /// The OCR engine failed or timed out; recorded as document status,
    /// never fatal to the pipeline.
    OcrFailed,
    /// The requested storage category is not part of the configured set.
    InvalidCategory,
    /// Collision-safe name generation ran out of attempts.
    StorageExhausted,
    /// Filesystem operation failed.
    Io,
    /// Webhook delivery failed; swallowed at the pipeline boundary.
    NotifyFailed,
    /// Print spooler could not be reached or its tools are missing.
    QueueUnreachable,
    /// Print spooler rejected the submitted job.
    PrintRejected,
    /// Uploaded file exceeds the configured print size limit.
    FileTooLarge,
    /// Uploaded file type is not in the allowed set.
    UnsupportedFileType,
    /// No session exists for the given identifier.
    SessionNotFound,
    /// The session is finalizing and no longer accepts pages.
    SessionClosed,
    /// Input validation failed.
    InvalidInput,
    /// Configuration error.
    Configuration,
    /// Internal service error.
    Internal,
}

impl ErrorKind {
    /// Returns true when retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ScannerUnreachable
                | Self::ScannerTimeout
                | Self::ScannerBusy
                | Self::NotifyFailed
                | Self::QueueUnreachable
        )
    }
}

/// A structured error type for scandock operations.
#[derive(Debug, Error)]
#[error("{kind:?}{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new scanner unreachable error.
    pub fn scanner_unreachable() -> Self {
        Self::new(ErrorKind::ScannerUnreachable)
    }

    /// Creates a new scanner timeout error.
    pub fn scanner_timeout() -> Self {
        Self::new(ErrorKind::ScannerTimeout)
    }

    /// Creates a new scanner protocol error.
    pub fn scanner_protocol() -> Self {
        Self::new(ErrorKind::ScannerProtocol)
    }

    /// Creates a new scanner busy error.
    pub fn scanner_busy() -> Self {
        Self::new(ErrorKind::ScannerBusy)
    }

    /// Creates a new missing page error.
    pub fn missing_page() -> Self {
        Self::new(ErrorKind::MissingPage)
    }

    /// Creates a new decode failed error.
    pub fn decode_failed() -> Self {
        Self::new(ErrorKind::DecodeFailed)
    }

    /// Creates a new OCR failure error.
    pub fn ocr_failed() -> Self {
        Self::new(ErrorKind::OcrFailed)
    }

    /// Creates a new invalid category error.
    pub fn invalid_category() -> Self {
        Self::new(ErrorKind::InvalidCategory)
    }

    /// Creates a new storage exhausted error.
    pub fn storage_exhausted() -> Self {
        Self::new(ErrorKind::StorageExhausted)
    }

    /// Creates a new I/O error.
    pub fn io() -> Self {
        Self::new(ErrorKind::Io)
    }

    /// Creates a new notification failure error.
    pub fn notify_failed() -> Self {
        Self::new(ErrorKind::NotifyFailed)
    }

    /// Creates a new queue unreachable error.
    pub fn queue_unreachable() -> Self {
        Self::new(ErrorKind::QueueUnreachable)
    }

    /// Creates a new print rejected error.
    pub fn print_rejected() -> Self {
        Self::new(ErrorKind::PrintRejected)
    }

    /// Creates a new file too large error.
    pub fn file_too_large() -> Self {
        Self::new(ErrorKind::FileTooLarge)
    }

    /// Creates a new unsupported file type error.
    pub fn unsupported_file_type() -> Self {
        Self::new(ErrorKind::UnsupportedFileType)
    }

    /// Creates a new session not found error.
    pub fn session_not_found() -> Self {
        Self::new(ErrorKind::SessionNotFound)
    }

    /// Creates a new session closed error.
    pub fn session_closed() -> Self {
        Self::new(ErrorKind::SessionClosed)
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new internal error.
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns true when retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::io().with_source(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_message() {
        let error = Error::scanner_timeout().with_message("no response after 30s");
        assert_eq!(error.to_string(), "ScannerTimeout: no response after 30s");
    }

    #[test]
    fn error_display_without_message() {
        let error = Error::session_not_found();
        assert_eq!(error.to_string(), "SessionNotFound");
    }

    #[test]
    fn kind_str_is_snake_case() {
        assert_eq!(Error::invalid_category().kind_str(), "invalid_category");
        assert_eq!(Error::queue_unreachable().kind_str(), "queue_unreachable");
    }

    #[test]
    fn retryable_kinds() {
        assert!(Error::scanner_busy().is_retryable());
        assert!(Error::scanner_timeout().is_retryable());
        assert!(!Error::invalid_category().is_retryable());
        assert!(!Error::session_not_found().is_retryable());
    }

    #[test]
    fn io_error_converts_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = Error::from(io);
        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.source.is_some());
    }
}
