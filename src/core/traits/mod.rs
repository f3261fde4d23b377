use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::error::ToolError;

/// Source of bearer credentials for outbound calls.
///
/// Credential loading itself (service accounts, metadata server, gcloud) lives
/// outside this crate; implementations only hand out a token on demand.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, ToolError>;
}

/// A tool backend: takes a typed request and produces a serializable result.
///
/// Implemented by every adapter so the dispatcher can route arguments without
/// knowing which provider sits behind a tool name.
#[async_trait]
pub trait GenerationAdapter: Send + Sync {
    type Request: DeserializeOwned + Send + Sync;
    type Output: Serialize + Send;

    /// Short provider label used in logs.
    fn name(&self) -> &'static str;

    /// Whether results are fabricated locally instead of fetched remotely.
    fn is_mock(&self) -> bool;

    async fn generate(&self, request: &Self::Request) -> Result<Self::Output, ToolError>;
}
