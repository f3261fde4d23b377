use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::ErrorBody;
use crate::registry::bounds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default = "default_image_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default = "default_person_generation")]
    pub person_generation: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_storage_uri: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: default_image_aspect_ratio(),
            sample_count: default_sample_count(),
            negative_prompt: None,
            person_generation: default_person_generation(),
            language: default_language(),
            output_storage_uri: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default = "default_video_duration")]
    pub duration: u32,
    #[serde(default = "default_video_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default = "default_person_generation")]
    pub person_generation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_storage_uri: Option<String>,
}

impl VideoRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_base64: None,
            duration: default_video_duration(),
            aspect_ratio: default_video_aspect_ratio(),
            sample_count: default_sample_count(),
            negative_prompt: None,
            person_generation: default_person_generation(),
            output_storage_uri: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicRequest {
    pub text_prompt: String,
    #[serde(default = "default_music_duration")]
    pub duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(default = "default_musical_structure")]
    pub musical_structure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_storage_uri: Option<String>,
}

impl MusicRequest {
    pub fn new(text_prompt: impl Into<String>) -> Self {
        Self {
            text_prompt: text_prompt.into(),
            duration_seconds: default_music_duration(),
            genre: None,
            mood: None,
            tempo: None,
            musical_structure: default_musical_structure(),
            output_storage_uri: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub prompt: String,
    #[serde(default = "default_text_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: default_text_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_instruction: None,
        }
    }
}

/// Normalized output of the image, video and music adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub items: Vec<ArtifactRef>,
    pub metadata: ResultMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub model_id: String,
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub is_mock: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: String,
    #[serde(flatten)]
    pub content: ArtifactContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArtifactMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ArtifactContent {
    /// Base64-encoded bytes returned in the response body.
    Inline {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Remote {
        uri: String,
        #[serde(
            rename = "previewUri",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        preview_uri: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactMetadata {
    Video(VideoMetadata),
    Audio(AudioMetadata),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub duration: u32,
    pub aspect_ratio: String,
    pub format: String,
    pub has_audio: bool,
    pub resolution: String,
    pub frame_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    pub duration: u32,
    pub format: String,
    pub sample_rate: u32,
    pub bitrate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResult {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: String,
    pub safety: SafetySummary,
    pub is_mock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SafetySummary {
    pub categories: Vec<String>,
    pub blocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationState {
    Processing,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    pub name: String,
    pub state: OperationState,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Answer of the status resolver: a fabricated status, or the remote body as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusReport {
    Fabricated(OperationStatus),
    Remote(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Uniform envelope returned for every tool call, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: format!("Error: {}", message.into()),
            }],
            is_error: true,
        }
    }

    /// Concatenated text of every content block.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

/// Per-call metadata handed to the transport (bearer token, extra headers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AdapterContext {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

fn default_image_aspect_ratio() -> String {
    bounds::IMAGE_DEFAULT_ASPECT_RATIO.to_string()
}

fn default_video_aspect_ratio() -> String {
    bounds::VIDEO_DEFAULT_ASPECT_RATIO.to_string()
}

fn default_sample_count() -> u32 {
    bounds::DEFAULT_SAMPLE_COUNT
}

fn default_person_generation() -> String {
    bounds::DEFAULT_PERSON_GENERATION.to_string()
}

fn default_language() -> String {
    bounds::IMAGE_DEFAULT_LANGUAGE.to_string()
}

fn default_video_duration() -> u32 {
    bounds::VIDEO_DEFAULT_DURATION
}

fn default_music_duration() -> u32 {
    bounds::MUSIC_DEFAULT_DURATION
}

fn default_musical_structure() -> String {
    bounds::MUSIC_DEFAULT_STRUCTURE.to_string()
}

fn default_text_model() -> String {
    bounds::TEXT_DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    bounds::TEXT_DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    bounds::TEXT_DEFAULT_MAX_TOKENS
}
