//! Core service error to HTTP error conversion implementation.
//!
//! This module provides conversion from scan pipeline errors to appropriate
//! HTTP errors with proper status codes and user-friendly messages.

use scandock_core::{Error as ServiceError, ErrorKind as ServiceErrorKind};

use super::http_error::{Error, ErrorKind};

/// Tracing target for service error conversion.
const TRACING_TARGET: &str = "scandock_server::handler::error";

impl From<ServiceError> for Error<'static> {
    fn from(error: ServiceError) -> Self {
        let http_error = match error.kind() {
            // Scanner failures -> Bad Gateway or Conflict
            ServiceErrorKind::ScannerUnreachable => ErrorKind::BadGateway
                .with_message("Scanner is unreachable")
                .with_resource("scanner"),

            ServiceErrorKind::ScannerTimeout => ErrorKind::BadGateway
                .with_message("Scanner did not respond in time")
                .with_resource("scanner"),

            ServiceErrorKind::ScannerProtocol => ErrorKind::BadGateway
                .with_message("Scanner returned an unexpected response")
                .with_resource("scanner"),

            ServiceErrorKind::ScannerBusy => ErrorKind::Conflict
                .with_message("Scanner is busy with another job")
                .with_resource("scanner"),

            // Session lifecycle -> Not Found or Conflict
            ServiceErrorKind::SessionNotFound => ErrorKind::NotFound
                .with_message("Scan session not found")
                .with_resource("session"),

            ServiceErrorKind::SessionClosed => ErrorKind::Conflict
                .with_message("Scan session no longer accepts pages")
                .with_resource("session"),

            // Request validation -> Bad Request or Unprocessable Entity
            ServiceErrorKind::InvalidCategory => ErrorKind::BadRequest
                .with_message("Unknown document category")
                .with_resource("category"),

            ServiceErrorKind::InvalidInput => {
                ErrorKind::BadRequest.with_message("Invalid request data")
            }

            ServiceErrorKind::DecodeFailed => ErrorKind::UnprocessableEntity
                .with_message("A scanned page could not be decoded as an image"),

            ServiceErrorKind::UnsupportedFileType => {
                ErrorKind::UnprocessableEntity.with_message("Uploaded file type is not allowed")
            }

            ServiceErrorKind::FileTooLarge => {
                ErrorKind::PayloadTooLarge.with_message("Uploaded file exceeds the size limit")
            }

            // Print spooler failures -> Bad Gateway or Unprocessable Entity
            ServiceErrorKind::QueueUnreachable => ErrorKind::BadGateway
                .with_message("Print spooler is unreachable")
                .with_resource("printer"),

            ServiceErrorKind::PrintRejected => ErrorKind::UnprocessableEntity
                .with_message("Print spooler rejected the job")
                .with_resource("printer"),

            // Webhook delivery failures -> Bad Gateway
            ServiceErrorKind::NotifyFailed => ErrorKind::BadGateway
                .with_message("Webhook endpoint could not be reached")
                .with_resource("webhook"),

            // Pipeline and storage failures -> Internal Server Error
            ServiceErrorKind::MissingPage => ErrorKind::InternalServerError
                .with_message("A scanned page went missing before assembly"),

            ServiceErrorKind::OcrFailed => {
                ErrorKind::InternalServerError.with_message("Text recognition failed")
            }

            ServiceErrorKind::StorageExhausted => ErrorKind::InternalServerError
                .with_message("Could not allocate a unique document name"),

            ServiceErrorKind::Io => {
                ErrorKind::InternalServerError.with_message("Storage operation failed")
            }

            ServiceErrorKind::Configuration => {
                ErrorKind::InternalServerError.with_message("Service is misconfigured")
            }

            ServiceErrorKind::Internal => {
                ErrorKind::InternalServerError.with_message("An internal error occurred")
            }
        };

        if http_error.kind().status_code().is_server_error() {
            tracing::error!(
                target: TRACING_TARGET,
                kind = error.kind_str(),
                error = %error,
                "service error surfaced as server error"
            );
        }

        match error.message {
            Some(message) => http_error.with_context(message),
            None => http_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_timeout_maps_to_bad_gateway() {
        let error: Error = ServiceError::scanner_timeout()
            .with_message("no response after 30s")
            .into();

        assert_eq!(error.kind(), ErrorKind::BadGateway);
        assert_eq!(error.resource(), Some("scanner"));
        assert_eq!(error.context(), Some("no response after 30s"));
    }

    #[test]
    fn scanner_busy_maps_to_conflict() {
        let error: Error = ServiceError::scanner_busy().into();
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn session_not_found_maps_to_not_found() {
        let error: Error = ServiceError::session_not_found().into();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.resource(), Some("session"));
    }

    #[test]
    fn session_closed_maps_to_conflict() {
        let error: Error = ServiceError::session_closed().into();
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn invalid_category_maps_to_bad_request() {
        let error: Error = ServiceError::invalid_category()
            .with_message("no such category: taxes")
            .into();

        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert!(error.context().unwrap().contains("taxes"));
    }

    #[test]
    fn file_too_large_maps_to_payload_too_large() {
        let error: Error = ServiceError::file_too_large().into();
        assert_eq!(error.kind(), ErrorKind::PayloadTooLarge);
    }

    #[test]
    fn unsupported_file_type_maps_to_unprocessable() {
        let error: Error = ServiceError::unsupported_file_type().into();
        assert_eq!(error.kind(), ErrorKind::UnprocessableEntity);
    }

    #[test]
    fn storage_failures_map_to_internal() {
        let error: Error = ServiceError::storage_exhausted().into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);

        let error: Error = ServiceError::io().into();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
    }

    #[test]
    fn notify_failed_maps_to_bad_gateway() {
        let error: Error = ServiceError::notify_failed().into();
        assert_eq!(error.kind(), ErrorKind::BadGateway);
        assert_eq!(error.resource(), Some("webhook"));
    }
}
