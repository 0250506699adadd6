//! Single-shot scan handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::CreateScan;
use crate::handler::response::{DocumentStored, ErrorResponse};
use crate::service::{ScanPipeline, ServiceState};

/// Tracing target for single-shot scan operations.
const TRACING_TARGET: &str = "scandock_server::handler::scans";

/// Scans one page and stores it as a document in a single call.
///
/// Shortcut for the common single-page case: no session bookkeeping, one
/// request from glass to archive.
#[tracing::instrument(skip_all, fields(category = %request.category))]
async fn create_scan(
    State(pipeline): State<ScanPipeline>,
    ValidateJson(request): ValidateJson<CreateScan>,
) -> Result<(StatusCode, Json<DocumentStored>)> {
    tracing::debug!(target: TRACING_TARGET, "Running single-shot scan");

    let options = request.scan_options(pipeline.default_options());
    let document = pipeline
        .scan_single(&request.category, request.file_name.as_deref(), options)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        file_name = %document.file_name,
        category = %document.category,
        "Single-shot scan stored"
    );

    Ok((StatusCode::CREATED, Json(document.into())))
}

fn create_scan_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Scan to document")
        .description(
            "Scans a single page and runs it through assembly, OCR, and \
             storage in one call.",
        )
        .response::<201, Json<DocumentStored>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
}

/// Returns routes for single-shot scans.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/scans", post_with(create_scan, create_scan_docs))
        .with_path_items(|item| item.tag("Scans"))
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use scandock_core::ErrorKind;
    use scandock_core::mock::MockProvider;
    use serde_json::{Value, json};

    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn single_shot_scan_stores_a_document() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        // Scans one page straight into a category
        let response = server
            .post("/api/scans")
            .json(&json!({ "category": "receipts" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let document: Value = response.json();
        assert_eq!(document["category"], "receipts");
        assert_eq!(document["pageCount"], 1);
        let file_name = document["fileName"].as_str().unwrap_or_default();
        assert!(file_name.ends_with(".pdf"));

        Ok(())
    }

    #[tokio::test]
    async fn requested_file_name_is_kept() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server
            .post("/api/scans")
            .json(&json!({ "category": "misc", "fileName": "meter-reading" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let document: Value = response.json();
        assert_eq!(document["fileName"], "meter-reading.pdf");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server
            .post("/api/scans")
            .json(&json!({ "category": "not-configured" }))
            .await;
        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn scanner_failure_surfaces_as_bad_gateway() -> anyhow::Result<()> {
        let provider = MockProvider::default().failing_scanner(ErrorKind::ScannerTimeout);
        let (server, _root) = create_test_server(provider).await?;

        let response = server
            .post("/api/scans")
            .json(&json!({ "category": "misc" }))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        Ok(())
    }
}
