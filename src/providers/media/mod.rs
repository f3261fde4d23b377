use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::context::{AdapterBase, ServiceContext, next_mock_seed};
use crate::core::error::{ConfigError, ToolError};
use crate::core::traits::GenerationAdapter;
use crate::core::types::{ArtifactRef, GenerationResult, ResultMetadata};
use crate::transport::retry::{RetryPolicy, execute_with_retry};

/// Body of a `:predict` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub instances: Vec<Value>,
    pub parameters: Value,
}

/// Answer of a `:predict` call. Long-running models may also report the
/// operation they started.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Value>,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl PredictResponse {
    pub fn operation(&self) -> Option<String> {
        self.operation_name.clone().or_else(|| self.name.clone())
    }
}

/// Artifacts produced by one call, before result metadata is attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifacts {
    pub items: Vec<ArtifactRef>,
    pub operation_name: Option<String>,
}

/// Values a provider needs while fabricating a mock result.
#[derive(Debug, Clone, Copy)]
pub struct MockSeed<'a> {
    /// Strictly increasing across the process.
    pub seed: u64,
    pub base: &'a AdapterBase,
}

impl MockSeed<'_> {
    pub fn artifact_id(&self, prefix: &str, index: usize) -> String {
        format!("{prefix}-{}-{index}", self.seed)
    }
}

/// Per-provider plug-in points of the shared media pipeline.
///
/// The pipeline runs `validate`, then either `fabricate` (mock executor) or
/// `build_payload` → remote call with retry → `normalize` (live executor).
pub trait MediaProvider: Send + Sync {
    type Request: DeserializeOwned + Send + Sync;

    /// Label used in logs and retry warnings.
    fn name(&self) -> &'static str;

    /// Model id used when the config carries no override.
    fn default_model(&self) -> &'static str;

    /// Config setting that overrides the model id.
    fn model_setting(&self) -> &'static str;

    fn default_retry_policy(&self) -> RetryPolicy;

    fn validate(&self, request: &Self::Request) -> Result<(), ToolError>;

    fn build_payload(&self, request: &Self::Request) -> PredictRequest;

    fn normalize(
        &self,
        request: &Self::Request,
        response: PredictResponse,
    ) -> Result<Artifacts, ToolError>;

    fn fabricate(&self, request: &Self::Request, seed: MockSeed<'_>) -> Artifacts;
}

/// Chosen once at construction from the context's mock flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Executor {
    Mock,
    Live,
}

#[derive(Debug, Clone)]
pub struct MediaAdapter<P> {
    provider: P,
    base: AdapterBase,
    model_id: String,
    retry_policy: RetryPolicy,
    executor: Executor,
}

impl<P: MediaProvider> MediaAdapter<P> {
    pub fn new(provider: P, context: &Arc<ServiceContext>) -> Self {
        let base = context.adapter_base(provider.name());
        let model_id = base.get_config(provider.model_setting(), provider.default_model());
        let executor = if base.is_mock_mode() {
            Executor::Mock
        } else {
            Executor::Live
        };

        Self {
            retry_policy: provider.default_retry_policy(),
            provider,
            base,
            model_id,
            executor,
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Result<Self, ConfigError> {
        retry_policy.validate()?;
        self.retry_policy = retry_policy;
        Ok(self)
    }

    pub fn executor(&self) -> Executor {
        self.executor
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn base(&self) -> &AdapterBase {
        &self.base
    }

    pub async fn generate(&self, request: &P::Request) -> Result<GenerationResult, ToolError> {
        self.provider.validate(request)?;

        let artifacts = match self.executor {
            Executor::Mock => self.fabricate(request),
            Executor::Live => self.call_remote(request).await?,
        };

        if artifacts.items.is_empty() {
            return Err(ToolError::internal("no artifacts produced"));
        }

        let is_mock = self.executor == Executor::Mock;
        self.base.log(
            "generated",
            json!({ "model": self.model_id, "count": artifacts.items.len(), "mock": is_mock }),
        );

        Ok(GenerationResult {
            metadata: ResultMetadata {
                model_id: self.model_id.clone(),
                generated_at: Utc::now(),
                count: artifacts.items.len(),
                is_mock,
            },
            items: artifacts.items,
            operation_name: artifacts.operation_name,
        })
    }

    fn fabricate(&self, request: &P::Request) -> Artifacts {
        let seed = MockSeed {
            seed: next_mock_seed(),
            base: &self.base,
        };
        self.base.log("mock_generate", json!({ "seed": seed.seed }));
        self.provider.fabricate(request, seed)
    }

    async fn call_remote(&self, request: &P::Request) -> Result<Artifacts, ToolError> {
        let payload = self.provider.build_payload(request);
        let url = self.base.model_url(&self.model_id, "predict")?;
        self.base.log(
            "predict",
            json!({ "url": url, "instances": payload.instances.len() }),
        );

        let base = &self.base;
        let model_id = self.model_id.as_str();
        let url = url.as_str();
        let payload = &payload;

        let response: PredictResponse =
            execute_with_retry(&self.retry_policy, self.provider.name(), move |attempt| async move {
                base.log("attempt", json!({ "attempt": attempt }));
                let token = base.access_token().await?;
                let ctx = base.authorized_context(token);
                base.transport()
                    .post_json::<_, PredictResponse>(Some(model_id), url, payload, &ctx)
                    .await
                    .map_err(|error| base.translate_transport_error(&error))
            })
            .await?;

        self.provider.normalize(request, response)
    }
}

#[async_trait]
impl<P: MediaProvider> GenerationAdapter for MediaAdapter<P> {
    type Request = P::Request;
    type Output = GenerationResult;

    fn name(&self) -> &'static str {
        self.provider.name()
    }

    fn is_mock(&self) -> bool {
        self.executor == Executor::Mock
    }

    async fn generate(&self, request: &Self::Request) -> Result<Self::Output, ToolError> {
        MediaAdapter::generate(self, request).await
    }
}

/// String field of a prediction, trying each key in order.
pub(crate) fn prediction_str<'a>(prediction: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        prediction
            .get(*key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    })
}
