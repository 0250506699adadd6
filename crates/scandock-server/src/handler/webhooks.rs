//! Webhook test handler.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;

use crate::extract::Json;
use crate::handler::response::{ErrorResponse, WebhookTestResult};
use crate::handler::Result;
use crate::service::{Notifier, ServiceState};

/// Tracing target for webhook operations.
const TRACING_TARGET: &str = "scandock_server::handler::webhooks";

/// Sends a test event to the configured webhook endpoint.
#[tracing::instrument(skip_all)]
async fn test_webhook(
    State(notifier): State<Notifier>,
) -> Result<(StatusCode, Json<WebhookTestResult>)> {
    tracing::debug!(target: TRACING_TARGET, "Sending webhook test event");

    let response = notifier.send_test().await?;

    tracing::info!(
        target: TRACING_TARGET,
        request_id = %response.request_id,
        status_code = response.status_code,
        delivered = response.is_success(),
        "Webhook test event finished"
    );

    let result = WebhookTestResult {
        delivered: response.is_success(),
        status_code: response.status_code,
        request_id: response.request_id,
    };

    Ok((StatusCode::OK, Json(result)))
}

fn test_webhook_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Test webhook")
        .description(
            "Delivers a test event to the configured webhook endpoint and \
             reports the outcome.",
        )
        .response::<200, Json<WebhookTestResult>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<502, Json<ErrorResponse>>()
}

/// Returns routes for webhook management.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/webhooks/test", post_with(test_webhook, test_webhook_docs))
        .with_path_items(|item| item.tag("Webhooks"))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use jiff::Timestamp;
    use scandock_core::mock::MockProvider;
    use scandock_core::{Result, ServiceHealth};
    use scandock_webhook::{WebhookProvider, WebhookRequest, WebhookResponse};
    use serde_json::Value;
    use url::Url;

    use crate::handler::test::{
        create_test_server, create_test_server_with_state, create_test_state,
    };
    use crate::service::Notifier;

    struct AcceptingEndpoint;

    #[async_trait::async_trait]
    impl WebhookProvider for AcceptingEndpoint {
        async fn deliver(&self, request: &WebhookRequest) -> Result<WebhookResponse> {
            Ok(WebhookResponse::new(request.request_id, 204, Timestamp::now()))
        }

        async fn health_check(&self) -> Result<ServiceHealth> {
            Ok(ServiceHealth::healthy())
        }
    }

    #[tokio::test]
    async fn unconfigured_webhook_is_rejected() -> anyhow::Result<()> {
        let (server, _root) = create_test_server(MockProvider::default()).await?;

        // No endpoint is configured by default
        let response = server.post("/api/webhooks/test").await;
        response.assert_status_bad_request();

        Ok(())
    }

    #[tokio::test]
    async fn test_event_reports_the_endpoint_status() -> anyhow::Result<()> {
        let (mut state, _root) = create_test_state(MockProvider::default()).await?;
        let endpoint = Url::parse("https://hooks.example.com/scan")?;
        state.notifier = Notifier::with_provider(Arc::new(AcceptingEndpoint), endpoint);
        let server = create_test_server_with_state(state)?;

        let response = server.post("/api/webhooks/test").await;
        response.assert_status_ok();

        let result: Value = response.json();
        assert_eq!(result["delivered"], true);
        assert_eq!(result["statusCode"], 204);

        Ok(())
    }
}
