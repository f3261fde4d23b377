//! MCP front end: an `rmcp` server handler over the tool dispatcher.
//!
//! Tool listing and calls go straight to [`ToolDispatcher`]. Tool failures
//! stay inside the result envelope; only a failed status lookup becomes a
//! protocol error.

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::stdio;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::error::{ErrorKind, ToolError};
use crate::core::types::{ContentBlock, ToolResponse};
use crate::dispatcher::ToolDispatcher;

pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "Image, video, music and text generation on Vertex AI. \
Video and music calls return an operation name; poll it with check_operation_status.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to start MCP service: {0}")]
    Start(String),
    #[error("MCP service task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub struct McpServer {
    dispatcher: ToolDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Registry entries as MCP tools, in listing order.
    pub fn tools(&self) -> Vec<Tool> {
        self.dispatcher
            .list_tools()
            .into_iter()
            .map(|definition| {
                let schema = match definition.input_schema.to_json_schema() {
                    Value::Object(schema) => schema,
                    _ => Map::new(),
                };
                Tool::new(definition.name, definition.description, schema)
            })
            .collect()
    }

    /// Runs one tool call through the dispatcher.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = arguments.unwrap_or_default();
        match self.dispatcher.handle(name, &arguments).await {
            Ok(response) => Ok(into_call_result(response)),
            Err(error) => {
                tracing::warn!(tool = name, kind = ?error.kind(), error = %error, "tool call failed");
                Err(to_error_data(&error))
            }
        }
    }

    /// Serves MCP over stdin/stdout until the client closes input.
    pub async fn serve_stdio(self) -> Result<(), ServerError> {
        let service = self
            .serve(stdio())
            .await
            .map_err(|error| ServerError::Start(error.to_string()))?;
        tracing::info!("stdio MCP server running");

        let reason = service.waiting().await?;
        tracing::info!(reason = ?reason, "stdio MCP server stopped");
        Ok(())
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.call(&request.name, request.arguments).await
    }
}

fn into_call_result(response: ToolResponse) -> CallToolResult {
    let content = response
        .content
        .into_iter()
        .map(|block| match block {
            ContentBlock::Text { text } => Content::text(text),
        })
        .collect();

    if response.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

/// Bad arguments map to `invalid_params`; everything else is an internal
/// error. The error body rides along as data.
pub fn to_error_data(error: &ToolError) -> ErrorData {
    let data = serde_json::to_value(error.to_body()).ok();
    match error.kind() {
        ErrorKind::InvalidArgument => ErrorData::invalid_params(error.to_string(), data),
        _ => ErrorData::internal_error(error.to_string(), data),
    }
}
