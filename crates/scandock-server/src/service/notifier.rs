//! Outbound webhook notifications for stored documents.
//!
//! The notifier wraps an optional [`WebhookProvider`]. Without a configured
//! endpoint every call short-circuits, so the rest of the pipeline never has
//! to check whether notifications are enabled.
//!
//! [`WebhookProvider`]: scandock_webhook::WebhookProvider

use std::sync::Arc;
use std::time::Duration;

use scandock_core::document::Document;
use scandock_core::{Error, Result, ServiceHealth};
use scandock_webhook::reqwest::ReqwestClient;
use scandock_webhook::{BoxedWebhookProvider, WebhookRequest, WebhookResponse};
use url::Url;

use crate::service::NotifierConfig;

/// Tracing target for notifier operations.
const TRACING_TARGET: &str = "scandock_server::service::notifier";

/// Delivers `document:stored` events to the configured webhook endpoint.
///
/// Stored-document notifications are advisory. Delivery failures are logged
/// and never surface to the caller; explicit test deliveries report errors.
#[derive(Clone)]
pub struct Notifier {
    provider: Option<BoxedWebhookProvider>,
    endpoint: Option<Url>,
    secret: Option<String>,
    test_timeout: Duration,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.is_enabled())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Notifier {
    /// Creates a notifier from configuration.
    ///
    /// Without a `webhook_url` the notifier is disabled and every delivery
    /// becomes a no-op.
    pub fn from_config(config: &NotifierConfig) -> Self {
        let Some(endpoint) = config.webhook_url.clone() else {
            return Self::disabled();
        };

        let provider: BoxedWebhookProvider = Arc::new(ReqwestClient::new(config.transport.clone()));

        Self {
            provider: Some(provider),
            endpoint: Some(endpoint),
            secret: config.webhook_secret.clone(),
            test_timeout: config.test_timeout(),
        }
    }

    /// Creates a notifier that drops every event.
    pub fn disabled() -> Self {
        Self {
            provider: None,
            endpoint: None,
            secret: None,
            test_timeout: NotifierConfig::default().test_timeout(),
        }
    }

    /// Creates a notifier around an explicit provider.
    pub fn with_provider(provider: BoxedWebhookProvider, endpoint: Url) -> Self {
        Self {
            provider: Some(provider),
            endpoint: Some(endpoint),
            secret: None,
            test_timeout: NotifierConfig::default().test_timeout(),
        }
    }

    /// Returns whether an endpoint is configured.
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Announces a stored document to the configured endpoint.
    ///
    /// Failures are logged at warn level and swallowed. A document that
    /// already landed on disk must not be reported as an error because a
    /// listener was unreachable.
    pub async fn notify_document_stored(&self, document: &Document) {
        let (Some(provider), Some(endpoint)) = (&self.provider, &self.endpoint) else {
            return;
        };

        let mut request = WebhookRequest::document_stored(endpoint.clone(), document);
        if let Some(secret) = &self.secret {
            request = request.with_secret(secret.clone());
        }

        match provider.deliver(&request).await {
            Ok(response) if response.is_success() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    file_name = %document.file_name,
                    category = %document.category,
                    status_code = response.status_code,
                    "Delivered stored-document notification"
                );
            }
            Ok(response) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    file_name = %document.file_name,
                    status_code = response.status_code,
                    "Webhook endpoint rejected stored-document notification"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    file_name = %document.file_name,
                    error = %error,
                    "Failed to deliver stored-document notification"
                );
            }
        }
    }

    /// Sends a synthetic test event and reports the outcome.
    pub async fn send_test(&self) -> Result<WebhookResponse> {
        let (Some(provider), Some(endpoint)) = (&self.provider, &self.endpoint) else {
            return Err(Error::invalid_input().with_message("no webhook endpoint is configured"));
        };

        let mut request = WebhookRequest::test(endpoint.clone()).with_timeout(self.test_timeout);
        if let Some(secret) = &self.secret {
            request = request.with_secret(secret.clone());
        }

        provider.deliver(&request).await
    }

    /// Checks the provider's health, or `None` when disabled.
    pub async fn health_check(&self) -> Option<Result<ServiceHealth>> {
        let provider = self.provider.as_ref()?;
        Some(provider.health_check().await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use jiff::Timestamp;
    use scandock_core::ErrorKind;
    use scandock_core::document::OcrStatus;
    use scandock_webhook::WebhookProvider;

    use super::*;

    struct RecordingProvider {
        deliveries: AtomicUsize,
        status_code: u16,
    }

    impl RecordingProvider {
        fn new(status_code: u16) -> Arc<Self> {
            Arc::new(Self {
                deliveries: AtomicUsize::new(0),
                status_code,
            })
        }
    }

    #[async_trait::async_trait]
    impl WebhookProvider for RecordingProvider {
        async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            Ok(WebhookResponse::new(
                request.request_id,
                self.status_code,
                Timestamp::now(),
            ))
        }

        async fn health_check(&self) -> Result<ServiceHealth> {
            Ok(ServiceHealth::healthy())
        }
    }

    struct UnreachableProvider;

    #[async_trait::async_trait]
    impl WebhookProvider for UnreachableProvider {
        async fn deliver(&self, _request: &WebhookRequest) -> Result<WebhookResponse> {
            Err(Error::notify_failed().with_message("connection refused"))
        }

        async fn health_check(&self) -> Result<ServiceHealth> {
            Ok(ServiceHealth::unhealthy("connection refused"))
        }
    }

    fn endpoint() -> Url {
        "https://hooks.example.com/scandock"
            .parse()
            .expect("valid url")
    }

    fn document() -> Document {
        Document {
            file_name: "scan-20260211-101500.pdf".into(),
            path: "/data/scan/invoices/scan-20260211-101500.pdf".into(),
            category: "invoices".into(),
            page_count: 2,
            ocr_status: OcrStatus::Done,
            byte_len: 12_345,
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn disabled_notifier_drops_events() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled());

        notifier.notify_document_stored(&document()).await;

        let error = notifier.send_test().await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert!(notifier.health_check().await.is_none());
    }

    #[tokio::test]
    async fn stored_document_reaches_provider() {
        let provider = RecordingProvider::new(200);
        let notifier = Notifier::with_provider(provider.clone(), endpoint());

        notifier.notify_document_stored(&document()).await;
        assert_eq!(provider.deliveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delivery_failures_are_swallowed() {
        let notifier = Notifier::with_provider(Arc::new(UnreachableProvider), endpoint());

        // Must not panic or propagate anything.
        notifier.notify_document_stored(&document()).await;

        let error = notifier.send_test().await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::NotifyFailed);
    }

    #[tokio::test]
    async fn rejected_delivery_is_not_an_error() {
        let provider = RecordingProvider::new(500);
        let notifier = Notifier::with_provider(provider.clone(), endpoint());

        notifier.notify_document_stored(&document()).await;
        assert_eq!(provider.deliveries.load(Ordering::SeqCst), 1);

        let response = notifier.send_test().await.unwrap();
        assert!(!response.is_success());
        assert_eq!(response.status_code, 500);
    }

    #[test]
    fn from_config_without_url_is_disabled() {
        let notifier = Notifier::from_config(&NotifierConfig::default());
        assert!(!notifier.is_enabled());
    }
}
