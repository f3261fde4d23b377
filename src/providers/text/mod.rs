use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::context::{AdapterBase, ServiceContext};
use crate::core::error::ToolError;
use crate::core::traits::GenerationAdapter;
use crate::core::types::{SafetySummary, TextRequest, TextResult, TokenUsage};
use crate::providers::media::Executor;
use crate::registry::{self, bounds};

pub const TEXT_MODEL_SETTING: &str = "gemini.model";

const DEFAULT_FINISH_REASON: &str = "STOP";
const HELLO_REPLY: &str = "Hello! How can I assist you today?";
const TEST_REPLY: &str =
    "This is a mock response from Gemini. In production, this would be a real AI-generated response.";

/// Chat-style text generation. Unlike the media adapters there is no retry:
/// one remote call per request, and its error is returned as-is.
#[derive(Debug, Clone)]
pub struct TextAdapter {
    base: AdapterBase,
    executor: Executor,
}

impl TextAdapter {
    pub fn new(context: &Arc<ServiceContext>) -> Self {
        let base = context.adapter_base("gemini");
        let executor = if base.is_mock_mode() {
            Executor::Mock
        } else {
            Executor::Live
        };
        Self { base, executor }
    }

    pub fn executor(&self) -> Executor {
        self.executor
    }

    pub fn validate(&self, request: &TextRequest) -> Result<(), ToolError> {
        registry::check_prompt("prompt", &request.prompt)?;
        registry::check_one_of("model", &request.model, bounds::TEXT_MODELS)?;
        registry::check_range(
            "temperature",
            request.temperature,
            bounds::TEXT_MIN_TEMPERATURE,
            bounds::TEXT_MAX_TEMPERATURE,
            "",
        )?;
        registry::check_range(
            "maxTokens",
            request.max_tokens,
            bounds::TEXT_MIN_MAX_TOKENS,
            bounds::TEXT_MAX_MAX_TOKENS,
            "",
        )
    }

    pub async fn generate(&self, request: &TextRequest) -> Result<TextResult, ToolError> {
        self.validate(request)?;
        let request = self.with_configured_model(request);
        match self.executor {
            Executor::Mock => Ok(mock_reply(&request)),
            Executor::Live => self.call_remote(&request).await,
        }
    }

    /// A request left on the default model picks up the `gemini.model`
    /// override. An explicitly chosen model is kept.
    fn with_configured_model<'a>(&self, request: &'a TextRequest) -> Cow<'a, TextRequest> {
        let model = self.base.get_config(TEXT_MODEL_SETTING, bounds::TEXT_DEFAULT_MODEL);
        if request.model != bounds::TEXT_DEFAULT_MODEL || model == request.model {
            return Cow::Borrowed(request);
        }
        Cow::Owned(TextRequest {
            model,
            ..request.clone()
        })
    }

    async fn call_remote(&self, request: &TextRequest) -> Result<TextResult, ToolError> {
        let url = self.base.model_url(&request.model, "generateContent")?;
        let payload = build_payload(request);
        self.base
            .log("generate_content", json!({ "model": request.model, "url": url }));

        let token = self.base.access_token().await?;
        let ctx = self.base.authorized_context(token);
        let response: GenerateContentResponse = self
            .base
            .transport()
            .post_json(Some(&request.model), &url, &payload, &ctx)
            .await
            .map_err(|error| self.base.translate_transport_error(&error))?;

        normalize(request, response)
    }
}

#[async_trait]
impl GenerationAdapter for TextAdapter {
    type Request = TextRequest;
    type Output = TextResult;

    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn is_mock(&self) -> bool {
        self.executor == Executor::Mock
    }

    async fn generate(&self, request: &Self::Request) -> Result<Self::Output, ToolError> {
        TextAdapter::generate(self, request).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SafetyRating {
    #[serde(default)]
    category: String,
    #[serde(default)]
    blocked: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

pub fn build_payload(request: &TextRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(request.prompt.clone()),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
        },
        system_instruction: request.system_instruction.as_ref().map(|instruction| Content {
            role: None,
            parts: vec![Part {
                text: Some(instruction.clone()),
            }],
        }),
    }
}

fn normalize(
    request: &TextRequest,
    response: GenerateContentResponse,
) -> Result<TextResult, ToolError> {
    let prompt_blocked = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.clone());

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(match prompt_blocked {
            Some(reason) => ToolError::invalid_argument(format!("prompt blocked: {reason}")),
            None => ToolError::internal("no candidates returned"),
        });
    };

    let text = candidate
        .content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect::<String>();
    let finish_reason = candidate
        .finish_reason
        .unwrap_or_else(|| DEFAULT_FINISH_REASON.to_string());
    let categories = candidate
        .safety_ratings
        .iter()
        .filter(|rating| rating.blocked)
        .map(|rating| rating.category.clone())
        .collect::<Vec<_>>();
    let blocked = !categories.is_empty() || finish_reason == "SAFETY";

    let usage = response
        .usage_metadata
        .map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        })
        .unwrap_or_default();

    Ok(TextResult {
        text,
        model: request.model.clone(),
        usage,
        finish_reason,
        safety: SafetySummary {
            categories,
            blocked,
        },
        is_mock: false,
    })
}

/// Canned reply keyed by the lower-cased prompt. Token counts are character
/// lengths, which is enough for callers that only check the shape.
pub fn mock_reply(request: &TextRequest) -> TextResult {
    let text = match request.prompt.to_lowercase().as_str() {
        "hello" => HELLO_REPLY.to_string(),
        "test" => TEST_REPLY.to_string(),
        _ => format!(
            "Based on your prompt \"{}\", here's a mock Gemini response. When connected to the real API, Gemini will provide intelligent, contextual responses.",
            request.prompt
        ),
    };

    let prompt_tokens = request.prompt.chars().count() as u64;
    let completion_tokens = text.chars().count() as u64;

    TextResult {
        usage: TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
        text,
        model: request.model.clone(),
        finish_reason: DEFAULT_FINISH_REASON.to_string(),
        safety: SafetySummary::default(),
        is_mock: true,
    }
}
