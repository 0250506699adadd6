//! Scan-to-document pipeline.
//!
//! Chains the scanner, the PDF assembler, the OCR engine, and the document
//! store into the operations the API exposes: appending pages to a session,
//! finishing a session into a stored document, and single-shot scans.

use std::path::{Path, PathBuf};

use scandock_core::document::{Document, OcrStatus, Page};
use scandock_core::ocr::{BoxedOcrProvider, OcrOptions};
use scandock_core::scan::{BoxedScannerProvider, ScanOptions};
use scandock_core::{Error, Result};
use uuid::Uuid;

use crate::service::{
    DocumentStore, Notifier, ScanSession, ServiceConfig, SessionStatus, SessionStore, assembler,
};

/// Tracing target for pipeline operations.
const TRACING_TARGET: &str = "scandock_server::service::pipeline";

/// File name of the assembled draft within a scratch directory.
const DRAFT_NAME: &str = "document.pdf";

/// File name of the searchable OCR output within a scratch directory.
const SEARCHABLE_NAME: &str = "document.ocr.pdf";

/// Orchestrates scan acquisition, assembly, OCR, storage, and notification.
#[derive(Clone)]
pub struct ScanPipeline {
    scanner: BoxedScannerProvider,
    ocr: BoxedOcrProvider,
    sessions: SessionStore,
    storage: DocumentStore,
    notifier: Notifier,
    ocr_enabled: bool,
    ocr_options: OcrOptions,
    default_options: ScanOptions,
}

impl std::fmt::Debug for ScanPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanPipeline")
            .field("ocr_enabled", &self.ocr_enabled)
            .field("default_options", &self.default_options)
            .finish_non_exhaustive()
    }
}

impl ScanPipeline {
    /// Creates a pipeline over the given providers and stores.
    pub fn new(
        config: &ServiceConfig,
        scanner: BoxedScannerProvider,
        ocr: BoxedOcrProvider,
        sessions: SessionStore,
        storage: DocumentStore,
        notifier: Notifier,
    ) -> Self {
        Self {
            scanner,
            ocr,
            sessions,
            storage,
            notifier,
            ocr_enabled: config.ocr.enabled,
            ocr_options: config.ocr_options(),
            default_options: config.default_scan_options(),
        }
    }

    /// Returns the configured default scan options.
    pub fn default_options(&self) -> ScanOptions {
        self.default_options
    }

    /// Scans one page from the device into the session.
    ///
    /// The scanner call happens outside the session lock, so a slow device
    /// does not serialize unrelated sessions. Returns the new page's number
    /// and the session's page count.
    pub async fn scan_page(&self, session_id: Uuid) -> Result<(u32, u32)> {
        let session = self.sessions.snapshot(session_id).await?;
        if session.status != SessionStatus::Active {
            return Err(Error::session_closed());
        }

        let image = self.scanner.scan_page(&session.options).await?;
        self.sessions.append_scanned(session_id, image).await
    }

    /// Finishes a session into a stored, categorized document.
    ///
    /// The category is validated before the session leaves the active state,
    /// so a bad category does not disturb the session. Any later failure
    /// reverts the session to active; only a stored document removes it.
    pub async fn finalize(
        &self,
        session_id: Uuid,
        category: &str,
        file_name: Option<&str>,
    ) -> Result<Document> {
        let category = self.storage.validate_category(category)?;
        let session = self.sessions.begin_finalize(session_id).await?;

        match self.finalize_session(&session, &category, file_name).await {
            Ok(document) => {
                self.sessions.complete_finalize(session_id).await;
                self.notifier.notify_document_stored(&document).await;
                Ok(document)
            }
            Err(error) => {
                self.sessions.abort_finalize(session_id).await;
                Err(error)
            }
        }
    }

    async fn finalize_session(
        &self,
        session: &ScanSession,
        category: &str,
        file_name: Option<&str>,
    ) -> Result<Document> {
        if session.pages.is_empty() {
            return Err(Error::invalid_input().with_message("session has no pages to assemble"));
        }

        let scratch = self.sessions.session_dir(session.session_id);
        let page_count = session.pages.len() as u32;

        let document = self
            .assemble_and_store(
                session.pages.clone(),
                &scratch,
                session.options.resolution,
                category,
                file_name,
            )
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            session_id = %session.session_id,
            file_name = %document.file_name,
            category = %document.category,
            page_count,
            "Session finished into stored document"
        );
        Ok(document)
    }

    /// Captures one page and stores it as a document in a single call.
    ///
    /// Works through a throwaway scratch directory outside the session
    /// store; the directory is removed on success and on failure.
    pub async fn scan_single(
        &self,
        category: &str,
        file_name: Option<&str>,
        options: ScanOptions,
    ) -> Result<Document> {
        let category = self.storage.validate_category(category)?;

        let scratch = self.storage.scratch_root().join(Uuid::now_v7().to_string());
        tokio::fs::create_dir_all(&scratch).await.map_err(|e| {
            Error::io()
                .with_message("failed to create scratch directory")
                .with_source(e)
        })?;

        let result = self
            .scan_single_inner(&category, file_name, options, &scratch)
            .await;

        if let Err(error) = tokio::fs::remove_dir_all(&scratch).await
            && error.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %scratch.display(),
                error = %error,
                "Failed to remove scratch directory"
            );
        }

        let document = result?;
        self.notifier.notify_document_stored(&document).await;

        tracing::info!(
            target: TRACING_TARGET,
            file_name = %document.file_name,
            category = %document.category,
            "Single-page scan stored"
        );
        Ok(document)
    }

    async fn scan_single_inner(
        &self,
        category: &str,
        file_name: Option<&str>,
        options: ScanOptions,
        scratch: &Path,
    ) -> Result<Document> {
        let image = self.scanner.scan_page(&options).await?;

        let path = scratch.join(format!("page-001.{}", image.format.extension()));
        tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
            Error::io()
                .with_message("failed to write page file")
                .with_source(e)
        })?;

        let page = Page {
            number: 1,
            path,
            byte_len: image.bytes.len() as u64,
            format: image.format,
        };

        self.assemble_and_store(vec![page], scratch, options.resolution, category, file_name)
            .await
    }

    /// Assembles pages into a PDF, applies OCR when enabled, and stores the
    /// result.
    ///
    /// An OCR failure downgrades the document to its non-searchable draft
    /// instead of failing the operation; the outcome is recorded on the
    /// stored document.
    async fn assemble_and_store(
        &self,
        pages: Vec<Page>,
        scratch: &Path,
        resolution: u32,
        category: &str,
        file_name: Option<&str>,
    ) -> Result<Document> {
        let page_count = pages.len() as u32;
        let draft = scratch.join(DRAFT_NAME);
        assembler::assemble(pages, resolution, draft.clone()).await?;

        let (stored_from, ocr_status): (PathBuf, OcrStatus) = if self.ocr_enabled {
            let searchable = scratch.join(SEARCHABLE_NAME);
            match self
                .ocr
                .process(&draft, &searchable, &self.ocr_options)
                .await
            {
                Ok(()) => (searchable, OcrStatus::Done),
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        error = %error,
                        "OCR failed, storing document without a text layer"
                    );
                    (draft, OcrStatus::Failed)
                }
            }
        } else {
            (draft, OcrStatus::None)
        };

        self.storage
            .store(&stored_from, category, file_name, page_count, ocr_status)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use jiff::Timestamp;
    use scandock_core::mock::MockProvider;
    use scandock_core::{ErrorKind, ServiceHealth};
    use scandock_webhook::{WebhookProvider, WebhookRequest, WebhookResponse};
    use tempfile::TempDir;
    use url::Url;

    use super::*;
    use crate::service::StorageConfig;

    struct FailingWebhook;

    #[async_trait::async_trait]
    impl WebhookProvider for FailingWebhook {
        async fn deliver(&self, _request: &WebhookRequest) -> Result<WebhookResponse> {
            Err(Error::notify_failed().with_message("connection refused"))
        }

        async fn health_check(&self) -> Result<ServiceHealth> {
            Ok(ServiceHealth::unhealthy("connection refused"))
        }
    }

    struct CountingWebhook {
        deliveries: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl WebhookProvider for CountingWebhook {
        async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            Ok(WebhookResponse::new(request.request_id, 200, Timestamp::now()))
        }

        async fn health_check(&self) -> Result<ServiceHealth> {
            Ok(ServiceHealth::healthy())
        }
    }

    async fn pipeline_with(
        root: &TempDir,
        provider: MockProvider,
        notifier: Notifier,
    ) -> (ScanPipeline, SessionStore, DocumentStore) {
        let config = ServiceConfig::builder()
            .with_storage(StorageConfig {
                storage_root: root.path().to_path_buf(),
                ..StorageConfig::default()
            })
            .build()
            .unwrap();

        let storage = DocumentStore::new(&config.storage).await.unwrap();
        let sessions = SessionStore::new(config.sessions, config.storage.scratch_root());
        let provider = Arc::new(provider);
        let pipeline = ScanPipeline::new(
            &config,
            provider.clone(),
            provider,
            sessions.clone(),
            storage.clone(),
            notifier,
        );
        (pipeline, sessions, storage)
    }

    async fn pipeline(root: &TempDir) -> (ScanPipeline, SessionStore, DocumentStore) {
        pipeline_with(root, MockProvider::default(), Notifier::disabled()).await
    }

    fn endpoint() -> Url {
        "https://hooks.example.com/scandock"
            .parse()
            .expect("valid url")
    }

    #[tokio::test]
    async fn two_page_session_becomes_stored_document() {
        let root = TempDir::new().unwrap();
        let (pipeline, sessions, _storage) = pipeline(&root).await;

        let session = sessions.create(ScanOptions::default()).await.unwrap();
        let id = session.session_id;

        assert_eq!(pipeline.scan_page(id).await.unwrap(), (1, 1));
        assert_eq!(pipeline.scan_page(id).await.unwrap(), (2, 2));

        let document = pipeline
            .finalize(id, "invoices", Some("utility-bill"))
            .await
            .unwrap();

        assert_eq!(document.category, "invoices");
        assert_eq!(document.file_name, "utility-bill.pdf");
        assert_eq!(document.page_count, 2);
        assert_eq!(document.ocr_status, OcrStatus::Done);

        let stored = tokio::fs::read(&document.path).await.unwrap();
        assert!(stored.starts_with(b"%PDF-"));

        // The session and its scratch directory are gone.
        let error = sessions.snapshot(id).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::SessionNotFound);
        assert!(!sessions.session_dir(id).exists());
    }

    #[tokio::test]
    async fn invalid_category_leaves_session_active() {
        let root = TempDir::new().unwrap();
        let (pipeline, sessions, _storage) = pipeline(&root).await;

        let session = sessions.create(ScanOptions::default()).await.unwrap();
        let id = session.session_id;
        pipeline.scan_page(id).await.unwrap();

        let error = pipeline.finalize(id, "no-such", None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidCategory);

        // Still active: another page and a proper finish both work.
        pipeline.scan_page(id).await.unwrap();
        let document = pipeline.finalize(id, "receipts", None).await.unwrap();
        assert_eq!(document.page_count, 2);
    }

    #[tokio::test]
    async fn empty_session_cannot_be_finished() {
        let root = TempDir::new().unwrap();
        let (pipeline, sessions, _storage) = pipeline(&root).await;

        let session = sessions.create(ScanOptions::default()).await.unwrap();
        let id = session.session_id;

        let error = pipeline.finalize(id, "misc", None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);

        // The failed attempt reverted the session to active.
        let snapshot = sessions.snapshot(id).await.unwrap();
        assert_eq!(snapshot.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn second_finish_reports_session_not_found() {
        let root = TempDir::new().unwrap();
        let (pipeline, sessions, _storage) = pipeline(&root).await;

        let session = sessions.create(ScanOptions::default()).await.unwrap();
        let id = session.session_id;
        pipeline.scan_page(id).await.unwrap();

        pipeline.finalize(id, "misc", None).await.unwrap();
        let error = pipeline.finalize(id, "misc", None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::SessionNotFound);
    }

    #[tokio::test]
    async fn ocr_failure_stores_document_without_text_layer() {
        let root = TempDir::new().unwrap();
        let (pipeline, sessions, _storage) =
            pipeline_with(&root, MockProvider::default().failing_ocr(), Notifier::disabled()).await;

        let session = sessions.create(ScanOptions::default()).await.unwrap();
        let id = session.session_id;
        pipeline.scan_page(id).await.unwrap();

        let document = pipeline.finalize(id, "letters", None).await.unwrap();
        assert_eq!(document.ocr_status, OcrStatus::Failed);
        assert!(document.path.exists());
    }

    #[tokio::test]
    async fn scanner_failure_appends_no_page() {
        let root = TempDir::new().unwrap();
        let (pipeline, sessions, _storage) = pipeline_with(
            &root,
            MockProvider::default().failing_scanner(ErrorKind::ScannerTimeout),
            Notifier::disabled(),
        )
        .await;

        let session = sessions.create(ScanOptions::default()).await.unwrap();
        let id = session.session_id;

        let error = pipeline.scan_page(id).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::ScannerTimeout);

        let snapshot = sessions.snapshot(id).await.unwrap();
        assert!(snapshot.pages.is_empty());
    }

    #[tokio::test]
    async fn webhook_failure_does_not_fail_the_finish() {
        let root = TempDir::new().unwrap();
        let notifier = Notifier::with_provider(Arc::new(FailingWebhook), endpoint());
        let (pipeline, sessions, _storage) =
            pipeline_with(&root, MockProvider::default(), notifier).await;

        let session = sessions.create(ScanOptions::default()).await.unwrap();
        let id = session.session_id;
        pipeline.scan_page(id).await.unwrap();

        let document = pipeline.finalize(id, "documents", None).await.unwrap();
        assert!(document.path.exists());
    }

    #[tokio::test]
    async fn stored_documents_are_announced() {
        let root = TempDir::new().unwrap();
        let webhook = Arc::new(CountingWebhook {
            deliveries: AtomicUsize::new(0),
        });
        let notifier = Notifier::with_provider(webhook.clone(), endpoint());
        let (pipeline, sessions, _storage) =
            pipeline_with(&root, MockProvider::default(), notifier).await;

        let session = sessions.create(ScanOptions::default()).await.unwrap();
        let id = session.session_id;
        pipeline.scan_page(id).await.unwrap();
        pipeline.finalize(id, "misc", None).await.unwrap();

        assert_eq!(webhook.deliveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_shot_scan_stores_and_cleans_up() {
        let root = TempDir::new().unwrap();
        let (pipeline, _sessions, storage) = pipeline(&root).await;

        let document = pipeline
            .scan_single("receipts", Some("parking"), ScanOptions::default())
            .await
            .unwrap();

        assert_eq!(document.file_name, "parking.pdf");
        assert_eq!(document.page_count, 1);
        assert!(document.path.exists());

        // No leftover scratch directory.
        let mut entries = tokio::fs::read_dir(storage.scratch_root()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn single_shot_scanner_failure_leaves_no_scratch() {
        let root = TempDir::new().unwrap();
        let (pipeline, _sessions, storage) = pipeline_with(
            &root,
            MockProvider::default().failing_scanner(ErrorKind::ScannerUnreachable),
            Notifier::disabled(),
        )
        .await;

        let error = pipeline
            .scan_single("misc", None, ScanOptions::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::ScannerUnreachable);

        let mut entries = tokio::fs::read_dir(storage.scratch_root()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
