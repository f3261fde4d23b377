use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};

use crate::core::error::ToolError;
use crate::core::types::{
    ArtifactContent, ArtifactMetadata, ArtifactRef, GenerationResult, VideoMetadata, VideoRequest,
};
use crate::providers::media::{
    Artifacts, MediaAdapter, MediaProvider, MockSeed, PredictRequest, PredictResponse,
    prediction_str,
};
use crate::registry::{self, bounds};
use crate::transport::retry::RetryPolicy;

pub const VIDEO_MODEL: &str = "videogeneration@001";
pub const VIDEO_MODEL_SETTING: &str = "veo.model";
const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(2_000);
const MOCK_BUCKET: &str = "mock-bucket/veo-output";

pub type VideoAdapter = MediaAdapter<VideoProvider>;

/// Video clips. The remote answers with storage URIs and an operation name.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoProvider;

impl VideoProvider {
    fn metadata(request: &VideoRequest) -> ArtifactMetadata {
        ArtifactMetadata::Video(VideoMetadata {
            duration: request.duration,
            aspect_ratio: request.aspect_ratio.clone(),
            format: "mp4".to_string(),
            has_audio: true,
            resolution: resolution(&request.aspect_ratio).to_string(),
            frame_rate: 30,
        })
    }
}

impl MediaProvider for VideoProvider {
    type Request = VideoRequest;

    fn name(&self) -> &'static str {
        "veo"
    }

    fn default_model(&self) -> &'static str {
        VIDEO_MODEL
    }

    fn model_setting(&self) -> &'static str {
        VIDEO_MODEL_SETTING
    }

    fn default_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(MAX_ATTEMPTS, BASE_DELAY)
    }

    fn validate(&self, request: &VideoRequest) -> Result<(), ToolError> {
        registry::check_prompt("prompt", &request.prompt)?;
        registry::check_range(
            "duration",
            request.duration,
            bounds::VIDEO_MIN_DURATION,
            bounds::VIDEO_MAX_DURATION,
            " seconds",
        )?;
        registry::check_one_of(
            "aspectRatio",
            &request.aspect_ratio,
            bounds::VIDEO_ASPECT_RATIOS,
        )?;
        registry::check_range(
            "sampleCount",
            request.sample_count,
            bounds::VIDEO_MIN_SAMPLES,
            bounds::VIDEO_MAX_SAMPLES,
            "",
        )?;
        registry::check_one_of(
            "personGeneration",
            &request.person_generation,
            bounds::PERSON_GENERATION,
        )
    }

    fn build_payload(&self, request: &VideoRequest) -> PredictRequest {
        let mut instance = Map::new();
        instance.insert("prompt".to_string(), json!(request.prompt));
        if let Some(image) = &request.image_base64 {
            instance.insert("image".to_string(), json!({ "bytesBase64Encoded": image }));
        }

        let mut parameters = Map::new();
        parameters.insert("sampleCount".to_string(), json!(request.sample_count));
        parameters.insert("aspectRatio".to_string(), json!(request.aspect_ratio));
        parameters.insert("duration".to_string(), json!(request.duration));
        parameters.insert("personGeneration".to_string(), json!(request.person_generation));
        if let Some(negative_prompt) = &request.negative_prompt {
            parameters.insert("negativePrompt".to_string(), json!(negative_prompt));
        }
        if let Some(storage_uri) = &request.output_storage_uri {
            parameters.insert("outputStorageUri".to_string(), json!(storage_uri));
        }

        PredictRequest {
            instances: vec![Value::Object(instance)],
            parameters: Value::Object(parameters),
        }
    }

    fn normalize(
        &self,
        request: &VideoRequest,
        response: PredictResponse,
    ) -> Result<Artifacts, ToolError> {
        let operation_name = response.operation();
        let generated_at = chrono::Utc::now().timestamp_millis();
        let items = response
            .predictions
            .iter()
            .enumerate()
            .filter_map(|(index, prediction)| {
                let content = match prediction_str(prediction, &["videoUri", "gcsUri", "uri"]) {
                    Some(uri) => ArtifactContent::Remote {
                        uri: uri.to_string(),
                        preview_uri: prediction_str(prediction, &["previewUri"]).map(str::to_string),
                    },
                    None => ArtifactContent::Inline {
                        data: prediction_str(prediction, &["bytesBase64Encoded"])?.to_string(),
                        mime_type: prediction_str(prediction, &["mimeType"])
                            .unwrap_or("video/mp4")
                            .to_string(),
                    },
                };
                Some(ArtifactRef {
                    id: format!("veo-{generated_at}-{index}"),
                    content,
                    metadata: Some(Self::metadata(request)),
                })
            })
            .collect();

        Ok(Artifacts {
            items,
            operation_name,
        })
    }

    fn fabricate(&self, request: &VideoRequest, seed: MockSeed<'_>) -> Artifacts {
        let operation_id = format!("mock-veo-{}", seed.seed);
        let items = (0..request.sample_count as usize)
            .map(|index| ArtifactRef {
                id: seed.artifact_id("mock-veo", index),
                content: ArtifactContent::Remote {
                    uri: format!("gs://{MOCK_BUCKET}/{operation_id}/video_{index}.mp4"),
                    preview_uri: Some(format!(
                        "https://storage.googleapis.com/{MOCK_BUCKET}/{operation_id}/preview_{index}.gif"
                    )),
                },
                metadata: Some(Self::metadata(request)),
            })
            .collect();

        Artifacts {
            items,
            operation_name: Some(seed.base.operation_name(&operation_id)),
        }
    }
}

pub fn resolution(aspect_ratio: &str) -> &'static str {
    match aspect_ratio {
        "9:16" => "1080x1920",
        "1:1" => "1080x1080",
        _ => "1920x1080",
    }
}

/// Writes each artifact of `result` under `dir`, creating it if needed.
///
/// Inline artifacts are decoded to `.mp4` files. Remote artifacts are not
/// downloaded; a `.placeholder` text file records their URI instead.
pub async fn save_locally(
    result: &GenerationResult,
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ToolError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|error| ToolError::internal(format!("failed to create {}: {error}", dir.display())))?;

    let stamp = chrono::Utc::now().timestamp_millis();
    let mut written = Vec::with_capacity(result.items.len());

    for (index, item) in result.items.iter().enumerate() {
        let stem = format!("veo-video-{stamp}-{index}.mp4");
        let (path, contents) = match &item.content {
            ArtifactContent::Inline { data, .. } => {
                let bytes = STANDARD.decode(data).map_err(|error| {
                    ToolError::internal(format!("artifact {} is not valid base64: {error}", item.id))
                })?;
                (dir.join(stem), bytes)
            }
            ArtifactContent::Remote { uri, .. } => {
                let mut text = format!("Remote video artifact\nURI: {uri}\n");
                if let Some(ArtifactMetadata::Video(metadata)) = &item.metadata {
                    text.push_str(&format!(
                        "Duration: {}s\nAspect Ratio: {}\n",
                        metadata.duration, metadata.aspect_ratio
                    ));
                }
                (dir.join(format!("{stem}.placeholder")), text.into_bytes())
            }
        };

        tokio::fs::write(&path, contents)
            .await
            .map_err(|error| ToolError::internal(format!("failed to write {}: {error}", path.display())))?;
        tracing::info!(path = %path.display(), "saved video artifact");
        written.push(path);
    }

    Ok(written)
}
