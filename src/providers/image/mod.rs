use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};

use crate::core::error::ToolError;
use crate::core::types::{ArtifactContent, ArtifactRef, ImageRequest};
use crate::providers::media::{
    Artifacts, MediaAdapter, MediaProvider, MockSeed, PredictRequest, PredictResponse,
    prediction_str,
};
use crate::registry::{self, bounds};
use crate::transport::retry::RetryPolicy;

pub const IMAGE_MODEL: &str = "imagen-3.0-generate-001";
pub const IMAGE_MODEL_SETTING: &str = "imagen.model";
const DEFAULT_MIME_TYPE: &str = "image/png";
const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(1_000);

pub type ImageAdapter = MediaAdapter<ImageProvider>;

/// Still images. Predictions arrive as inline base64 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageProvider;

impl MediaProvider for ImageProvider {
    type Request = ImageRequest;

    fn name(&self) -> &'static str {
        "imagen"
    }

    fn default_model(&self) -> &'static str {
        IMAGE_MODEL
    }

    fn model_setting(&self) -> &'static str {
        IMAGE_MODEL_SETTING
    }

    fn default_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(MAX_ATTEMPTS, BASE_DELAY)
    }

    fn validate(&self, request: &ImageRequest) -> Result<(), ToolError> {
        registry::check_prompt("prompt", &request.prompt)?;
        registry::check_one_of(
            "aspectRatio",
            &request.aspect_ratio,
            bounds::IMAGE_ASPECT_RATIOS,
        )?;
        registry::check_range(
            "sampleCount",
            request.sample_count,
            bounds::IMAGE_MIN_SAMPLES,
            bounds::IMAGE_MAX_SAMPLES,
            "",
        )?;
        registry::check_one_of(
            "personGeneration",
            &request.person_generation,
            bounds::PERSON_GENERATION,
        )?;
        registry::check_language_code("language", &request.language)
    }

    fn build_payload(&self, request: &ImageRequest) -> PredictRequest {
        let safety_setting = if request.person_generation == "disallow" {
            "block_all"
        } else {
            "default"
        };

        let mut parameters = Map::new();
        parameters.insert("sampleCount".to_string(), json!(request.sample_count));
        parameters.insert("aspectRatio".to_string(), json!(request.aspect_ratio));
        parameters.insert("addWatermark".to_string(), json!(false));
        parameters.insert("safetySetting".to_string(), json!(safety_setting));
        parameters.insert("personGeneration".to_string(), json!(request.person_generation));
        parameters.insert("language".to_string(), json!(request.language));
        if let Some(negative_prompt) = &request.negative_prompt {
            parameters.insert("negativePrompt".to_string(), json!(negative_prompt));
        }
        if let Some(storage_uri) = &request.output_storage_uri {
            parameters.insert("storageUri".to_string(), json!(storage_uri));
        }

        PredictRequest {
            instances: vec![json!({ "prompt": request.prompt })],
            parameters: Value::Object(parameters),
        }
    }

    fn normalize(
        &self,
        _request: &ImageRequest,
        response: PredictResponse,
    ) -> Result<Artifacts, ToolError> {
        let generated_at = chrono::Utc::now().timestamp_millis();
        let items = response
            .predictions
            .iter()
            .enumerate()
            .filter_map(|(index, prediction)| {
                let content = if let Some(data) = prediction_str(prediction, &["bytesBase64Encoded"]) {
                    ArtifactContent::Inline {
                        data: data.to_string(),
                        mime_type: prediction_str(prediction, &["mimeType"])
                            .unwrap_or(DEFAULT_MIME_TYPE)
                            .to_string(),
                    }
                } else {
                    ArtifactContent::Remote {
                        uri: prediction_str(prediction, &["gcsUri", "uri"])?.to_string(),
                        preview_uri: None,
                    }
                };
                Some(ArtifactRef {
                    id: format!("imagen-{generated_at}-{index}"),
                    content,
                    metadata: None,
                })
            })
            .collect();

        Ok(Artifacts {
            items,
            operation_name: None,
        })
    }

    fn fabricate(&self, request: &ImageRequest, seed: MockSeed<'_>) -> Artifacts {
        let prompt_head: String = request.prompt.chars().take(20).collect();
        let items = (0..request.sample_count as usize)
            .map(|index| ArtifactRef {
                id: seed.artifact_id("mock-imagen", index),
                content: ArtifactContent::Inline {
                    data: STANDARD.encode(format!(
                        "mock-image-data-{index}-for-prompt-{prompt_head}"
                    )),
                    mime_type: DEFAULT_MIME_TYPE.to_string(),
                },
                metadata: None,
            })
            .collect();

        Artifacts {
            items,
            operation_name: None,
        }
    }
}
