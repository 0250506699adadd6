//! Stored document browsing handlers.
//!
//! The storage directory tree is the only catalog; every listing and
//! download resolves against the filesystem at request time.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{Json, Path, Query};
use crate::handler::request::{DocumentFilter, DocumentPathParams};
use crate::handler::response::{
    CategoryListing, DocumentEntries, DocumentEntry, ErrorResponse, PdfAttachment,
};
use crate::handler::{ErrorKind, Result};
use crate::service::{DocumentStore, ServiceState};

/// Tracing target for stored document operations.
const TRACING_TARGET: &str = "scandock_server::handler::documents";

/// Lists stored documents, newest first.
#[tracing::instrument(skip_all)]
async fn list_documents(
    State(storage): State<DocumentStore>,
    Query(filter): Query<DocumentFilter>,
) -> Result<(StatusCode, Json<DocumentEntries>)> {
    let entries = storage.list(filter.category.as_deref()).await?;
    let entries: DocumentEntries = entries.into_iter().map(DocumentEntry::from).collect();

    tracing::debug!(
        target: TRACING_TARGET,
        document_count = entries.len(),
        category = filter.category.as_deref().unwrap_or("*"),
        "Stored documents listed"
    );

    Ok((StatusCode::OK, Json(entries)))
}

fn list_documents_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List documents")
        .description(
            "Lists stored documents, newest first. Pass `category` to \
             restrict the listing to one category.",
        )
        .response::<200, Json<DocumentEntries>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Downloads a stored document.
#[tracing::instrument(
    skip_all,
    fields(category = %path_params.category, file_name = %path_params.file_name)
)]
async fn download_document(
    State(storage): State<DocumentStore>,
    Path(path_params): Path<DocumentPathParams>,
) -> Result<PdfAttachment> {
    let Some(file) = storage
        .open(&path_params.category, &path_params.file_name)
        .await?
    else {
        return Err(ErrorKind::NotFound
            .with_message("Document not found")
            .with_resource("document"));
    };

    let content = tokio::fs::read(&file.path).await.map_err(|error| {
        tracing::error!(
            target: TRACING_TARGET,
            path = %file.path.display(),
            error = %error,
            "Failed to read stored document"
        );
        ErrorKind::InternalServerError.with_message("Failed to read stored document")
    })?;

    tracing::info!(
        target: TRACING_TARGET,
        byte_len = content.len(),
        "Document downloaded"
    );

    Ok(PdfAttachment::new(file.file_name, content))
}

fn download_document_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Download document")
        .description("Returns the stored PDF as an attachment.")
        .response::<200, PdfAttachment>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns the categories documents can be filed into.
#[tracing::instrument(skip_all)]
async fn list_categories(
    State(storage): State<DocumentStore>,
) -> Result<(StatusCode, Json<CategoryListing>)> {
    let categories = storage.categories().await?;

    Ok((
        StatusCode::OK,
        Json(CategoryListing {
            categories,
            allow_ad_hoc: storage.allows_ad_hoc(),
        }),
    ))
}

fn list_categories_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List categories")
        .description(
            "Returns the configured categories, plus any directories created \
             on demand when ad hoc categories are enabled.",
        )
        .response::<200, Json<CategoryListing>>()
}

/// Returns routes for browsing stored documents.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/documents", get_with(list_documents, list_documents_docs))
        .api_route(
            "/documents/{category}/{file_name}",
            get_with(download_document, download_document_docs),
        )
        .api_route(
            "/categories",
            get_with(list_categories, list_categories_docs),
        )
        .with_path_items(|item| item.tag("Documents"))
}

#[cfg(test)]
mod test {
    use scandock_core::mock::MockProvider;
    use serde_json::{Value, json};

    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn stored_documents_are_listed() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        // Stores one document in each of two categories
        server
            .post("/api/scans")
            .json(&json!({ "category": "invoices", "fileName": "electricity" }))
            .await;
        server
            .post("/api/scans")
            .json(&json!({ "category": "receipts", "fileName": "hardware-store" }))
            .await;

        // The unfiltered listing sees both
        let response = server.get("/api/documents").await;
        response.assert_status_ok();
        let documents: Vec<Value> = response.json();
        assert_eq!(documents.len(), 2);

        // Filtering narrows it down
        let response = server.get("/api/documents").add_query_param("category", "invoices").await;
        response.assert_status_ok();
        let documents: Vec<Value> = response.json();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["fileName"], "electricity.pdf");
        assert_eq!(documents[0]["category"], "invoices");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_category_filter_is_rejected() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server.get("/api/documents").add_query_param("category", "attic").await;
        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn stored_document_downloads_as_pdf() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        server
            .post("/api/scans")
            .json(&json!({ "category": "letters", "fileName": "contract" }))
            .await;

        // Downloads the stored file
        let response = server.get("/api/documents/letters/contract.pdf").await;
        response.assert_status_ok();
        assert!(response.as_bytes().starts_with(b"%PDF-"));

        let disposition = response.header("content-disposition");
        let disposition = disposition.to_str().unwrap_or_default();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("contract.pdf"));

        let content_type = response.header("content-type");
        assert_eq!(content_type.to_str().unwrap_or_default(), "application/pdf");

        Ok(())
    }

    #[tokio::test]
    async fn missing_document_reports_not_found() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server.get("/api/documents/letters/absent.pdf").await;
        response.assert_status_not_found();

        Ok(())
    }

    #[tokio::test]
    async fn traversal_attempts_are_rejected() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        // ".." never reaches the filesystem
        let response = server.get("/api/documents/letters/..secret.pdf").await;
        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn categories_reflect_the_configuration() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server.get("/api/categories").await;
        response.assert_status_ok();

        let listing: Value = response.json();
        assert_eq!(listing["allowAdHoc"], false);
        let categories = listing["categories"].as_array().cloned().unwrap_or_default();
        assert!(categories.contains(&Value::String("invoices".to_owned())));
        assert!(categories.contains(&Value::String("misc".to_owned())));

        Ok(())
    }
}
