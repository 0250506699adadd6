//! Print queue handlers.
//!
//! Uploads are validated against the configured type and size limits before
//! anything reaches the spooler, then handed over through a scratch file the
//! spooler can read.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use scandock_core::print::BoxedPrintProvider;
use uuid::Uuid;

use crate::extract::{Json, Multipart};
use crate::handler::response::{ErrorResponse, PrintJobCreated, PrinterListing};
use crate::handler::{Error, ErrorKind, Result};
use crate::service::{DocumentStore, ServiceConfig, ServiceState};

/// Tracing target for print operations.
const TRACING_TARGET: &str = "scandock_server::handler::printers";

/// Lists the print queues known to the spooler.
#[tracing::instrument(skip_all)]
async fn list_printers(
    State(spooler): State<BoxedPrintProvider>,
) -> Result<(StatusCode, Json<PrinterListing>)> {
    let printers = spooler.queues().await?;

    tracing::debug!(
        target: TRACING_TARGET,
        printer_count = printers.len(),
        "Print queues listed"
    );

    Ok((StatusCode::OK, Json(PrinterListing { printers })))
}

fn list_printers_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List printers")
        .description("Returns the print queue names reported by the spooler.")
        .response::<200, Json<PrinterListing>>()
        .response::<502, Json<ErrorResponse>>()
}

/// Accepts a file upload and submits it to a print queue.
///
/// Expects a multipart form with a `file` part and a `printer` part naming
/// the target queue. The upload is checked against the configured type and
/// size limits before it is handed to the spooler.
#[tracing::instrument(skip_all)]
async fn submit_print_job(
    State(spooler): State<BoxedPrintProvider>,
    State(storage): State<DocumentStore>,
    State(config): State<ServiceConfig>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PrintJobCreated>)> {
    tracing::debug!(target: TRACING_TARGET, "Receiving print upload");

    let mut upload: Option<(String, axum::body::Bytes)> = None;
    let mut printer: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_owned)
                    .filter(|name| !name.trim().is_empty())
                    .ok_or_else(|| {
                        ErrorKind::BadRequest.with_message("The 'file' part has no file name")
                    })?;
                let content = field.bytes().await.map_err(read_error)?;
                upload = Some((file_name, content));
            }
            Some("printer") => {
                printer = Some(field.text().await.map_err(read_error)?);
            }
            _ => continue,
        }
    }

    let Some((file_name, content)) = upload else {
        return Err(ErrorKind::BadRequest.with_message("Multipart part 'file' is required"));
    };
    let queue = printer
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ErrorKind::BadRequest.with_message("Multipart part 'printer' is required")
        })?;

    if !config.print.is_allowed_type(&file_name) {
        return Err(ErrorKind::UnprocessableEntity
            .with_message("Uploaded file type is not allowed")
            .with_context(format!("file name: {file_name}")));
    }
    if content.len() as u64 > config.print.max_upload_bytes {
        return Err(ErrorKind::PayloadTooLarge
            .with_message("Uploaded file exceeds the size limit")
            .with_context(format!(
                "limit is {} bytes, upload is {} bytes",
                config.print.max_upload_bytes,
                content.len()
            )));
    }

    // The spooler reads from a path, so the upload passes through scratch.
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_owned());
    let spool_path = storage
        .scratch_root()
        .join(format!("print-{}.{extension}", Uuid::now_v7()));

    tokio::fs::write(&spool_path, &content).await.map_err(|error| {
        tracing::error!(
            target: TRACING_TARGET,
            path = %spool_path.display(),
            error = %error,
            "Failed to stage print upload"
        );
        ErrorKind::InternalServerError.with_message("Failed to stage the upload")
    })?;

    let submitted = spooler.submit(&spool_path, &queue).await;

    if let Err(error) = tokio::fs::remove_file(&spool_path).await
        && error.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(
            target: TRACING_TARGET,
            path = %spool_path.display(),
            error = %error,
            "Failed to remove staged print upload"
        );
    }

    let job = submitted?;

    tracing::info!(
        target: TRACING_TARGET,
        job_id = %job.id,
        queue = %job.queue,
        byte_len = content.len(),
        "Print job submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(PrintJobCreated {
            job_id: job.id,
            queue: job.queue,
        }),
    ))
}

fn submit_print_job_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Print upload")
        .description(
            "Submits an uploaded file to a print queue. Expects a multipart \
             form with a 'file' part and a 'printer' part naming the queue.",
        )
        .response::<201, Json<PrintJobCreated>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<413, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
}

/// Maps a failed multipart read to a client error.
fn read_error(error: axum::extract::multipart::MultipartError) -> Error<'static> {
    ErrorKind::BadRequest
        .with_message("Failed to read multipart request")
        .with_context(error.to_string())
}

/// Returns routes for print queue access.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/printers", get_with(list_printers, list_printers_docs))
        .api_route(
            "/printers/jobs",
            post_with(submit_print_job, submit_print_job_docs),
        )
        .with_path_items(|item| item.tag("Printers"))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use scandock_core::ErrorKind;
    use scandock_core::mock::MockProvider;
    use serde_json::Value;
    use tempfile::TempDir;

    use crate::handler::test::{create_test_server, create_test_server_with_state};
    use crate::service::{PrintConfig, ServiceConfig, ServiceState, StorageConfig};

    fn pdf_upload(bytes: &'static [u8], file_name: &str) -> Part {
        Part::bytes(bytes)
            .file_name(file_name)
            .mime_type("application/pdf")
    }

    #[tokio::test]
    async fn queues_are_listed() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let response = server.get("/api/printers").await;
        response.assert_status_ok();

        let listing: Value = response.json();
        assert_eq!(listing["printers"][0], "Office_Laser");

        Ok(())
    }

    #[tokio::test]
    async fn unreachable_spooler_surfaces_as_bad_gateway() -> anyhow::Result<()> {
        let provider = MockProvider::default().failing_printer(ErrorKind::QueueUnreachable);
        let (server, _root) = create_test_server(provider).await?;

        let response = server.get("/api/printers").await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        Ok(())
    }

    #[tokio::test]
    async fn upload_reaches_the_queue() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let form = MultipartForm::new()
            .add_text("printer", "Office_Laser")
            .add_part("file", pdf_upload(b"%PDF-1.4 print me", "report.pdf"));
        let response = server.post("/api/printers/jobs").multipart(form).await;
        response.assert_status(StatusCode::CREATED);

        let job: Value = response.json();
        assert_eq!(job["queue"], "Office_Laser");
        assert_eq!(job["jobId"], "Office_Laser-1");

        Ok(())
    }

    #[tokio::test]
    async fn missing_printer_part_is_rejected() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let form =
            MultipartForm::new().add_part("file", pdf_upload(b"%PDF-1.4 orphan", "report.pdf"));
        let response = server.post("/api/printers/jobs").multipart(form).await;
        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn disallowed_file_type_is_rejected() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        let form = MultipartForm::new()
            .add_text("printer", "Office_Laser")
            .add_part("file", Part::bytes(&b"MZ"[..]).file_name("setup.exe"));
        let response = server.post("/api/printers/jobs").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        Ok(())
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let config = ServiceConfig::builder()
            .with_storage(StorageConfig {
                storage_root: root.path().to_path_buf(),
                ..StorageConfig::default()
            })
            .with_print(PrintConfig {
                max_upload_bytes: 16,
                ..PrintConfig::default()
            })
            .build()?;
        let provider = Arc::new(MockProvider::default());
        let state =
            ServiceState::new(config, provider.clone(), provider.clone(), provider).await?;
        let server = create_test_server_with_state(state)?;

        let form = MultipartForm::new()
            .add_text("printer", "Office_Laser")
            .add_part(
                "file",
                pdf_upload(b"%PDF-1.4 far too many bytes for this limit", "big.pdf"),
            );
        let response = server.post("/api/printers/jobs").multipart(form).await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

        Ok(())
    }
}
