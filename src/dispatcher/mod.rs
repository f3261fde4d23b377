use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::ServiceContext;
use crate::core::error::ToolError;
use crate::core::traits::GenerationAdapter;
use crate::core::types::ToolResponse;
use crate::operations::StatusResolver;
use crate::providers::{
    ImageAdapter, ImageProvider, MusicAdapter, MusicProvider, TextAdapter, VideoAdapter,
    VideoProvider,
};
use crate::registry::{
    IMAGE_TOOL, MUSIC_TOOL, STATUS_TOOL, TEXT_TOOL, ToolDefinition, ToolRegistry, VIDEO_TOOL,
};

/// Routes tool calls to adapters and wraps every outcome in a [`ToolResponse`].
///
/// Generation failures are reported in-band as error text. Only a remote
/// operation-status failure comes back as `Err`.
pub struct ToolDispatcher {
    registry: ToolRegistry,
    image: ImageAdapter,
    video: VideoAdapter,
    music: MusicAdapter,
    text: TextAdapter,
    operations: StatusResolver,
}

impl ToolDispatcher {
    pub fn new(context: Arc<ServiceContext>) -> Self {
        Self {
            registry: ToolRegistry::builtin(),
            image: ImageAdapter::new(ImageProvider, &context),
            video: VideoAdapter::new(VideoProvider, &context),
            music: MusicAdapter::new(MusicProvider, &context),
            text: TextAdapter::new(&context),
            operations: StatusResolver::new(&context),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        self.registry.list()
    }

    pub async fn handle(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<ToolResponse, ToolError> {
        let Some(definition) = self.registry.get(name) else {
            tracing::warn!(tool = name, "unknown tool requested");
            return Ok(error_response(&ToolError::invalid_argument(format!(
                "Unknown tool: {name}"
            ))));
        };

        let normalized = match definition.input_schema.validate(args) {
            Ok(normalized) => normalized,
            Err(error) => return Ok(error_response(&error)),
        };

        tracing::debug!(tool = name, "dispatching tool call");
        match name {
            IMAGE_TOOL => Ok(run(&self.image, normalized).await),
            VIDEO_TOOL => Ok(run(&self.video, normalized).await),
            MUSIC_TOOL => Ok(run(&self.music, normalized).await),
            TEXT_TOOL => Ok(run(&self.text, normalized).await),
            STATUS_TOOL => self.check_status(&normalized).await,
            other => Ok(error_response(&ToolError::internal(format!(
                "tool {other} is registered but has no handler"
            )))),
        }
    }

    async fn check_status(&self, args: &Map<String, Value>) -> Result<ToolResponse, ToolError> {
        let handle = args
            .get("operationName")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match self.operations.get_status(handle).await {
            Ok(report) => Ok(success_response(&report)),
            Err(error) => {
                tracing::error!(operation = handle, error = %error, "status lookup failed");
                Err(error)
            }
        }
    }
}

async fn run<A: GenerationAdapter>(adapter: &A, args: Map<String, Value>) -> ToolResponse {
    let request: A::Request = match serde_json::from_value(Value::Object(args)) {
        Ok(request) => request,
        Err(error) => {
            return error_response(&ToolError::invalid_argument(error.to_string()));
        }
    };

    match adapter.generate(&request).await {
        Ok(output) => success_response(&output),
        Err(error) => {
            tracing::warn!(adapter = adapter.name(), error = %error, "tool call failed");
            error_response(&error)
        }
    }
}

fn success_response<T: Serialize>(output: &T) -> ToolResponse {
    match serde_json::to_string_pretty(output) {
        Ok(text) => ToolResponse::text(text),
        Err(error) => error_response(&ToolError::internal(format!(
            "failed to serialize result: {error}"
        ))),
    }
}

fn error_response(error: &ToolError) -> ToolResponse {
    ToolResponse::error(error.to_string())
}

#[cfg(test)]
mod tests;
