//! Application state and dependency injection.

mod assembler;
mod config;
mod notifier;
mod pipeline;
mod sessions;
mod storage;

use jiff::Timestamp;
use scandock_core::ocr::BoxedOcrProvider;
use scandock_core::print::BoxedPrintProvider;
use scandock_core::scan::BoxedScannerProvider;

pub use crate::service::config::{
    NotifierConfig, PrintConfig, ServiceConfig, ServiceConfigBuilder, SessionConfig, StorageConfig,
};
pub use crate::service::notifier::Notifier;
pub use crate::service::pipeline::ScanPipeline;
pub use crate::service::sessions::{ScanSession, SessionStatus, SessionStore};
pub use crate::service::storage::{DocumentFile, DocumentStore, StoredEntry};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub scanner: BoxedScannerProvider,
    pub ocr: BoxedOcrProvider,
    pub spooler: BoxedPrintProvider,
    pub notifier: Notifier,

    // Internal services:
    pub sessions: SessionStore,
    pub storage: DocumentStore,
    pub pipeline: ScanPipeline,
    pub config: ServiceConfig,

    /// When this state was initialized, for uptime reporting.
    pub started_at: Timestamp,
}

impl ServiceState {
    /// Initializes application state from configuration and providers.
    ///
    /// Prepares the storage layout and wires the scan pipeline over the
    /// given providers.
    pub async fn new(
        service_config: ServiceConfig,
        scanner: BoxedScannerProvider,
        ocr: BoxedOcrProvider,
        spooler: BoxedPrintProvider,
    ) -> Result<Self> {
        let storage = DocumentStore::new(&service_config.storage).await?;
        let sessions = SessionStore::new(
            service_config.sessions,
            service_config.storage.scratch_root(),
        );
        let notifier = service_config.create_notifier();
        let pipeline = ScanPipeline::new(
            &service_config,
            scanner.clone(),
            ocr.clone(),
            sessions.clone(),
            storage.clone(),
            notifier.clone(),
        );

        let service_state = Self {
            scanner,
            ocr,
            spooler,
            notifier,

            sessions,
            storage,
            pipeline,
            config: service_config,

            started_at: Timestamp::now(),
        };

        Ok(service_state)
    }

    /// Initializes application state with providers built from configuration.
    pub async fn from_config(service_config: ServiceConfig) -> Result<Self> {
        let scanner = service_config.create_scanner();
        let ocr = service_config.create_ocr();
        let spooler = service_config.create_spooler();
        Self::new(service_config, scanner, ocr, spooler).await
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(scanner: BoxedScannerProvider);
impl_di!(ocr: BoxedOcrProvider);
impl_di!(spooler: BoxedPrintProvider);
impl_di!(notifier: Notifier);

// Internal services:
impl_di!(sessions: SessionStore);
impl_di!(storage: DocumentStore);
impl_di!(pipeline: ScanPipeline);
impl_di!(config: ServiceConfig);
