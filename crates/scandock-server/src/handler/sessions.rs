//! Scan session handlers.
//!
//! Sessions accumulate pages one scanner pass at a time until the client
//! finishes them into a stored document or cancels. All session state lives
//! in memory; the handlers here only sequence the service calls.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::{Json, Path, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{CreateSession, FinishSession, SessionPathParams};
use crate::handler::response::{
    DocumentStored, ErrorResponse, PageScanned, SessionCreated, SessionDiscarded, SessionView,
};
use crate::service::{ScanPipeline, ServiceState, SessionStore};

/// Tracing target for scan session operations.
const TRACING_TARGET: &str = "scandock_server::handler::sessions";

/// Opens a new scan session.
///
/// Scan options resolve against the configured scanner defaults and are
/// fixed for the session's lifetime.
#[tracing::instrument(skip_all)]
async fn create_session(
    State(pipeline): State<ScanPipeline>,
    State(sessions): State<SessionStore>,
    ValidateJson(request): ValidateJson<CreateSession>,
) -> Result<(StatusCode, Json<SessionCreated>)> {
    tracing::debug!(target: TRACING_TARGET, "Opening scan session");

    let options = request.scan_options(pipeline.default_options());
    let session = sessions.create(options).await?;

    tracing::info!(
        target: TRACING_TARGET,
        session_id = %session.session_id,
        resolution = options.resolution,
        color_mode = %options.color_mode,
        "Scan session opened"
    );

    Ok((StatusCode::CREATED, Json(SessionCreated::from(&session))))
}

fn create_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Open session")
        .description(
            "Opens a multi-page scan session. Send an empty object to use the \
             configured scanner defaults.",
        )
        .response::<201, Json<SessionCreated>>()
        .response::<400, Json<ErrorResponse>>()
}

/// Returns the session's status and ordered page list.
#[tracing::instrument(skip_all, fields(session_id = %path_params.session_id))]
async fn read_session(
    State(sessions): State<SessionStore>,
    Path(path_params): Path<SessionPathParams>,
) -> Result<(StatusCode, Json<SessionView>)> {
    let session = sessions.snapshot(path_params.session_id).await?;
    Ok((StatusCode::OK, Json(SessionView::from(&session))))
}

fn read_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get session")
        .description("Returns the session state with its pages in scan order.")
        .response::<200, Json<SessionView>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Scans one page from the device into the session.
#[tracing::instrument(skip_all, fields(session_id = %path_params.session_id))]
async fn scan_page(
    State(pipeline): State<ScanPipeline>,
    Path(path_params): Path<SessionPathParams>,
) -> Result<(StatusCode, Json<PageScanned>)> {
    tracing::debug!(target: TRACING_TARGET, "Scanning page into session");

    let (page_number, page_count) = pipeline.scan_page(path_params.session_id).await?;

    tracing::info!(
        target: TRACING_TARGET,
        page_number,
        page_count,
        "Page scanned into session"
    );

    Ok((
        StatusCode::CREATED,
        Json(PageScanned {
            session_id: path_params.session_id,
            page_number,
            page_count,
        }),
    ))
}

fn scan_page_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Scan page")
        .description(
            "Acquires one page from the scanner and appends it to the session. \
             Responds 409 once the session is finishing and 502 when the \
             scanner fails.",
        )
        .response::<201, Json<PageScanned>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
}

/// Finishes the session into a stored, categorized document.
#[tracing::instrument(skip_all, fields(session_id = %path_params.session_id))]
async fn finish_session(
    State(pipeline): State<ScanPipeline>,
    Path(path_params): Path<SessionPathParams>,
    ValidateJson(request): ValidateJson<FinishSession>,
) -> Result<(StatusCode, Json<DocumentStored>)> {
    tracing::debug!(
        target: TRACING_TARGET,
        category = %request.category,
        "Finishing scan session"
    );

    let document = pipeline
        .finalize(
            path_params.session_id,
            &request.category,
            request.file_name.as_deref(),
        )
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        file_name = %document.file_name,
        category = %document.category,
        page_count = document.page_count,
        "Session finished into stored document"
    );

    Ok((StatusCode::CREATED, Json(document.into())))
}

fn finish_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Finish session")
        .description(
            "Assembles the captured pages into a PDF, applies OCR, stores the \
             document under the given category, and notifies the configured \
             webhook. A failed finish leaves the session active with its \
             pages intact.",
        )
        .response::<201, Json<DocumentStored>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Cancels the session and discards its pages.
#[tracing::instrument(skip_all, fields(session_id = %path_params.session_id))]
async fn delete_session(
    State(sessions): State<SessionStore>,
    Path(path_params): Path<SessionPathParams>,
) -> Result<(StatusCode, Json<SessionDiscarded>)> {
    let session = sessions.close(path_params.session_id).await?;

    tracing::info!(
        target: TRACING_TARGET,
        pages_discarded = session.pages.len(),
        "Scan session cancelled"
    );

    Ok((
        StatusCode::OK,
        Json(SessionDiscarded {
            session_id: session.session_id,
            pages_discarded: session.pages.len() as u32,
        }),
    ))
}

fn delete_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Cancel session")
        .description("Discards the session and removes its captured pages.")
        .response::<200, Json<SessionDiscarded>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Returns routes for scan session management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/sessions", post_with(create_session, create_session_docs))
        .api_route(
            "/sessions/{session_id}",
            get_with(read_session, read_session_docs)
                .delete_with(delete_session, delete_session_docs),
        )
        .api_route(
            "/sessions/{session_id}/pages",
            post_with(scan_page, scan_page_docs),
        )
        .api_route(
            "/sessions/{session_id}/finish",
            post_with(finish_session, finish_session_docs),
        )
        .with_path_items(|item| item.tag("Sessions"))
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use scandock_core::ErrorKind;
    use scandock_core::mock::MockProvider;
    use serde_json::{Value, json};

    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn session_flow_stores_a_document() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        // Opens a session
        let response = server.post("/api/sessions").json(&json!({})).await;
        response.assert_status(StatusCode::CREATED);
        let session: Value = response.json();
        let session_id = session["sessionId"].as_str().unwrap_or_default().to_owned();
        assert_eq!(session["status"], "active");

        // Scans two pages
        let response = server.post(&format!("/api/sessions/{session_id}/pages")).await;
        response.assert_status(StatusCode::CREATED);
        let response = server.post(&format!("/api/sessions/{session_id}/pages")).await;
        response.assert_status(StatusCode::CREATED);
        let page: Value = response.json();
        assert_eq!(page["pageNumber"], 2);
        assert_eq!(page["pageCount"], 2);

        // Reads the session back
        let response = server.get(&format!("/api/sessions/{session_id}")).await;
        response.assert_status_ok();
        let view: Value = response.json();
        assert_eq!(view["pageCount"], 2);

        // Finishes into a category
        let response = server
            .post(&format!("/api/sessions/{session_id}/finish"))
            .json(&json!({ "category": "invoices" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let document: Value = response.json();
        assert_eq!(document["category"], "invoices");
        assert_eq!(document["pageCount"], 2);
        assert_eq!(document["ocrStatus"], "done");

        // The session is gone afterwards
        let response = server.get(&format!("/api/sessions/{session_id}")).await;
        response.assert_status_not_found();

        Ok(())
    }

    #[tokio::test]
    async fn finishing_twice_reports_not_found() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server.post("/api/sessions").json(&json!({})).await;
        let session: Value = response.json();
        let session_id = session["sessionId"].as_str().unwrap_or_default().to_owned();

        server.post(&format!("/api/sessions/{session_id}/pages")).await;

        // First finish succeeds
        let response = server
            .post(&format!("/api/sessions/{session_id}/finish"))
            .json(&json!({ "category": "letters" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        // Second finish hits a session that no longer exists
        let response = server
            .post(&format!("/api/sessions/{session_id}/finish"))
            .json(&json!({ "category": "letters" }))
            .await;
        response.assert_status_not_found();

        Ok(())
    }

    #[tokio::test]
    async fn unknown_category_keeps_the_session_alive() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server.post("/api/sessions").json(&json!({})).await;
        let session: Value = response.json();
        let session_id = session["sessionId"].as_str().unwrap_or_default().to_owned();

        server.post(&format!("/api/sessions/{session_id}/pages")).await;

        // Finishing into an unconfigured category is rejected
        let response = server
            .post(&format!("/api/sessions/{session_id}/finish"))
            .json(&json!({ "category": "no-such-category" }))
            .await;
        response.assert_status_bad_request();

        // The session stays usable
        let response = server.get(&format!("/api/sessions/{session_id}")).await;
        response.assert_status_ok();
        let view: Value = response.json();
        assert_eq!(view["status"], "active");

        Ok(())
    }

    #[tokio::test]
    async fn scanner_failure_surfaces_as_bad_gateway() -> anyhow::Result<()> {
        let provider = MockProvider::default().failing_scanner(ErrorKind::ScannerUnreachable);
        let (server, _root) = create_test_server(provider).await?;

        let response = server.post("/api/sessions").json(&json!({})).await;
        let session: Value = response.json();
        let session_id = session["sessionId"].as_str().unwrap_or_default().to_owned();

        // The page request fails without adding a page
        let response = server.post(&format!("/api/sessions/{session_id}/pages")).await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        let response = server.get(&format!("/api/sessions/{session_id}")).await;
        let view: Value = response.json();
        assert_eq!(view["pageCount"], 0);

        Ok(())
    }

    #[tokio::test]
    async fn discarding_a_session_reports_dropped_pages() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server.post("/api/sessions").json(&json!({})).await;
        let session: Value = response.json();
        let session_id = session["sessionId"].as_str().unwrap_or_default().to_owned();

        server.post(&format!("/api/sessions/{session_id}/pages")).await;
        server.post(&format!("/api/sessions/{session_id}/pages")).await;

        // Discards the session
        let response = server.delete(&format!("/api/sessions/{session_id}")).await;
        response.assert_status_ok();
        let discarded: Value = response.json();
        assert_eq!(discarded["pagesDiscarded"], 2);

        // Reading it afterwards fails
        let response = server.get(&format!("/api/sessions/{session_id}")).await;
        response.assert_status_not_found();

        Ok(())
    }

    #[tokio::test]
    async fn missing_session_reports_not_found() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server
            .get("/api/sessions/00000000-0000-0000-0000-000000000000")
            .await;
        response.assert_status_not_found();

        Ok(())
    }
}
