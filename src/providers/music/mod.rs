use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::core::error::ToolError;
use crate::core::types::{
    ArtifactContent, ArtifactMetadata, ArtifactRef, AudioMetadata, MusicRequest,
};
use crate::providers::media::{
    Artifacts, MediaAdapter, MediaProvider, MockSeed, PredictRequest, PredictResponse,
    prediction_str,
};
use crate::registry::{self, bounds};
use crate::transport::retry::RetryPolicy;

pub const MUSIC_MODEL: &str = "musicgeneration@001";
pub const MUSIC_MODEL_SETTING: &str = "lyria.model";
const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(1_000);
const DEFAULT_TEMPO: &str = "medium";

pub type MusicAdapter = MediaAdapter<MusicProvider>;

/// One audio track per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct MusicProvider;

impl MusicProvider {
    fn metadata(request: &MusicRequest) -> ArtifactMetadata {
        ArtifactMetadata::Audio(AudioMetadata {
            duration: request.duration_seconds,
            format: "mp3".to_string(),
            sample_rate: 44_100,
            bitrate: "320kbps".to_string(),
            genre: request.genre.clone(),
            mood: request.mood.clone(),
            tempo: request.tempo.clone(),
            structure: Some(request.musical_structure.clone()),
        })
    }
}

impl MediaProvider for MusicProvider {
    type Request = MusicRequest;

    fn name(&self) -> &'static str {
        "lyria"
    }

    fn default_model(&self) -> &'static str {
        MUSIC_MODEL
    }

    fn model_setting(&self) -> &'static str {
        MUSIC_MODEL_SETTING
    }

    fn default_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(MAX_ATTEMPTS, BASE_DELAY)
    }

    fn validate(&self, request: &MusicRequest) -> Result<(), ToolError> {
        registry::check_prompt("textPrompt", &request.text_prompt)?;
        registry::check_range(
            "durationSeconds",
            request.duration_seconds,
            bounds::MUSIC_MIN_DURATION,
            bounds::MUSIC_MAX_DURATION,
            " seconds",
        )?;
        registry::check_one_of(
            "musicalStructure",
            &request.musical_structure,
            bounds::MUSICAL_STRUCTURES,
        )?;
        if let Some(tempo) = &request.tempo {
            registry::check_one_of("tempo", tempo, bounds::TEMPOS)?;
        }
        Ok(())
    }

    fn build_payload(&self, request: &MusicRequest) -> PredictRequest {
        let mut instance = Map::new();
        instance.insert("prompt".to_string(), json!(request.text_prompt));
        if let Some(genre) = &request.genre {
            instance.insert("genre".to_string(), json!(genre));
        }
        if let Some(mood) = &request.mood {
            instance.insert("mood".to_string(), json!(mood));
        }

        let mut parameters = Map::new();
        parameters.insert("sampleCount".to_string(), json!(1));
        parameters.insert("durationSeconds".to_string(), json!(request.duration_seconds));
        parameters.insert(
            "tempo".to_string(),
            json!(request.tempo.as_deref().unwrap_or(DEFAULT_TEMPO)),
        );
        parameters.insert("musicalStructure".to_string(), json!(request.musical_structure));
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
        request: &MusicRequest,
        response: PredictResponse,
    ) -> Result<Artifacts, ToolError> {
        let operation_name = response.operation();
        // Only the first usable prediction counts; the track is single-sample.
        let item = response.predictions.iter().find_map(|prediction| {
            let content = match prediction_str(prediction, &["audioUri", "gcsUri", "uri"]) {
                Some(uri) => ArtifactContent::Remote {
                    uri: uri.to_string(),
                    preview_uri: None,
                },
                None => ArtifactContent::Inline {
                    data: prediction_str(prediction, &["bytesBase64Encoded"])?.to_string(),
                    mime_type: prediction_str(prediction, &["mimeType"])
                        .unwrap_or("audio/mpeg")
                        .to_string(),
                },
            };
            Some(ArtifactRef {
                id: format!("lyria-{}", chrono::Utc::now().timestamp_millis()),
                content,
                metadata: Some(Self::metadata(request)),
            })
        });

        Ok(Artifacts {
            items: item.into_iter().collect(),
            operation_name,
        })
    }

    fn fabricate(&self, request: &MusicRequest, seed: MockSeed<'_>) -> Artifacts {
        let operation_id = format!("mock-lyria-{}", seed.seed);
        let item = ArtifactRef {
            id: seed.artifact_id("mock-lyria", 0),
            content: ArtifactContent::Remote {
                uri: format!("gs://mock-bucket/lyria-output/{operation_id}/audio.mp3"),
                preview_uri: None,
            },
            metadata: Some(Self::metadata(request)),
        };

        Artifacts {
            items: vec![item],
            operation_name: Some(seed.base.operation_name(&operation_id)),
        }
    }
}
