use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use serde_json::{Value, json};

use crate::context::{AdapterBase, MOCK_PROJECT_ID, ServiceContext};
use crate::core::error::ToolError;
use crate::core::types::{
    ArtifactContent, ArtifactRef, GenerationResult, OperationState, OperationStatus,
    ResultMetadata, StatusReport,
};
use crate::providers::media::Executor;

/// Prefix of operation ids minted by mock adapters (`mock-veo-…`, `mock-lyria-…`).
pub const MOCK_OPERATION_PREFIX: &str = "mock-";
const MOCK_FAILURE_MESSAGE: &str = "Mock operation failed for testing purposes";

/// Resolves long-running operation handles.
///
/// Handles are opaque and nothing is stored locally. In mock mode, or for a
/// handle minted by a mock adapter, the outcome is drawn at random on every
/// call: polling one handle twice can report `DONE` and then `PROCESSING`.
/// Otherwise the remote operation resource is fetched and returned verbatim.
#[derive(Debug, Clone)]
pub struct StatusResolver {
    base: AdapterBase,
    executor: Executor,
}

impl StatusResolver {
    pub fn new(context: &Arc<ServiceContext>) -> Self {
        let base = context.adapter_base("operations");
        let executor = if base.is_mock_mode() {
            Executor::Mock
        } else {
            Executor::Live
        };
        Self { base, executor }
    }

    /// True for handles this crate fabricated: the operation id starts with
    /// [`MOCK_OPERATION_PREFIX`] or the handle names the placeholder project.
    pub fn is_mock_handle(handle: &str) -> bool {
        let handle = handle.trim().trim_start_matches('/');
        let operation_id = handle.rsplit('/').next().unwrap_or(handle);
        operation_id.starts_with(MOCK_OPERATION_PREFIX)
            || handle.starts_with(&format!("projects/{MOCK_PROJECT_ID}/"))
    }

    pub async fn get_status(&self, handle: &str) -> Result<StatusReport, ToolError> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(ToolError::invalid_argument("operationName cannot be empty"));
        }

        if self.executor == Executor::Mock || Self::is_mock_handle(handle) {
            let status = self.fabricate_with(handle, &mut rand::thread_rng());
            self.base
                .log("mock_status", json!({ "name": handle, "state": status.state }));
            return Ok(StatusReport::Fabricated(status));
        }

        let url = self.base.operation_url(handle);
        self.base.log("fetch_status", json!({ "url": url }));
        let token = self.base.access_token().await?;
        let ctx = self.base.authorized_context(token);
        let body: Value = self
            .base
            .transport()
            .get_json(None, &url, &ctx)
            .await
            .map_err(|error| self.base.translate_transport_error(&error))?;

        Ok(StatusReport::Remote(body))
    }

    /// Fabricates one status for `handle`, picking the outcome uniformly.
    pub fn fabricate_with<R: Rng + ?Sized>(&self, handle: &str, rng: &mut R) -> OperationStatus {
        let now = Utc::now();
        let create_time = now - ChronoDuration::minutes(1);
        let state = match rng.gen_range(0..3) {
            0 => OperationState::Processing,
            1 => OperationState::Done,
            _ => OperationState::Failed,
        };

        let mut status = OperationStatus {
            name: handle.to_string(),
            state,
            done: state == OperationState::Done,
            progress: None,
            result: None,
            error: None,
            create_time,
            update_time: now,
        };

        match state {
            OperationState::Processing => status.progress = Some(rng.gen_range(0..100)),
            OperationState::Done => status.result = Some(mock_result(handle)),
            OperationState::Failed => {
                status.error = Some(ToolError::internal(MOCK_FAILURE_MESSAGE).to_body());
            }
        }

        status
    }
}

fn mock_result(handle: &str) -> GenerationResult {
    let operation_id = handle.rsplit('/').next().unwrap_or(handle);
    GenerationResult {
        items: vec![ArtifactRef {
            id: format!("{operation_id}-output"),
            content: ArtifactContent::Remote {
                uri: format!("gs://mock-bucket/output/{operation_id}"),
                preview_uri: None,
            },
            metadata: None,
        }],
        metadata: ResultMetadata {
            model_id: "mock".to_string(),
            generated_at: Utc::now(),
            count: 1,
            is_mock: true,
        },
        operation_name: Some(handle.to_string()),
    }
}
