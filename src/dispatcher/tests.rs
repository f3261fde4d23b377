use serde_json::json;

use super::*;
use crate::core::types::{ContentBlock, MusicRequest, TextRequest, VideoRequest};
use crate::providers::MediaProvider;
use crate::test_support::{MockResponse, MockServer, live_context, mock_context};

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn assert_envelope(response: &ToolResponse) {
    assert_eq!(response.content.len(), 1);
    let ContentBlock::Text { text } = &response.content[0];
    if response.is_error {
        assert!(text.starts_with("Error: "), "error text: {text}");
    } else {
        serde_json::from_str::<Value>(text).expect("success text is json");
    }
}

#[tokio::test]
async fn test_unknown_tool_is_reported_in_band() {
    let dispatcher = ToolDispatcher::new(mock_context());
    let response = dispatcher
        .handle("does_not_exist", &Map::new())
        .await
        .expect("no hard error");

    assert!(response.is_error);
    assert!(response.joined_text().contains("Unknown tool: does_not_exist"));
    assert_envelope(&response);
}

#[tokio::test]
async fn test_image_call_returns_serialized_result() {
    let dispatcher = ToolDispatcher::new(mock_context());
    let response = dispatcher
        .handle(
            IMAGE_TOOL,
            &args(json!({ "prompt": "a cat", "aspectRatio": "1:1", "sampleCount": 3 })),
        )
        .await
        .expect("no hard error");

    assert!(!response.is_error);
    let body: Value = serde_json::from_str(&response.joined_text()).expect("json");
    assert_eq!(body["items"].as_array().expect("items").len(), 3);
    assert_eq!(body["metadata"]["count"], 3);
    assert_eq!(body["metadata"]["isMock"], true);
}

#[tokio::test]
async fn test_validation_failure_becomes_error_text() {
    let dispatcher = ToolDispatcher::new(mock_context());
    let response = dispatcher
        .handle(VIDEO_TOOL, &args(json!({ "prompt": "waves", "duration": 10 })))
        .await
        .expect("no hard error");

    assert!(response.is_error);
    assert!(response.joined_text().contains("5 and 8"));
}

#[tokio::test]
async fn test_every_tool_honours_the_envelope() {
    let dispatcher = ToolDispatcher::new(mock_context());
    let calls = vec![
        (IMAGE_TOOL, json!({ "prompt": "a cat" })),
        (IMAGE_TOOL, json!({ "prompt": "" })),
        (VIDEO_TOOL, json!({ "prompt": "waves", "sampleCount": "2" })),
        (VIDEO_TOOL, json!({ "prompt": 12 })),
        (MUSIC_TOOL, json!({ "textPrompt": "lofi", "durationSeconds": 45 })),
        (MUSIC_TOOL, json!({ "textPrompt": "lofi", "tempo": "presto" })),
        (TEXT_TOOL, json!({ "prompt": "hello" })),
        (TEXT_TOOL, json!({ "prompt": "hello", "temperature": 3 })),
        (STATUS_TOOL, json!({ "operationName": "operations/mock-1" })),
        (STATUS_TOOL, json!({})),
        ("nope", json!({})),
    ];

    for (name, arguments) in calls {
        let response = dispatcher
            .handle(name, &args(arguments))
            .await
            .expect("mock calls never fail hard");
        assert_envelope(&response);
    }
}

#[tokio::test]
async fn test_text_tool_applies_defaults() {
    let dispatcher = ToolDispatcher::new(mock_context());
    let response = dispatcher
        .handle(TEXT_TOOL, &args(json!({ "prompt": "hello" })))
        .await
        .expect("no hard error");

    let body: Value = serde_json::from_str(&response.joined_text()).expect("json");
    assert_eq!(body["text"], "Hello! How can I assist you today?");
    assert_eq!(body["model"], "gemini-1.5-flash");
    assert_eq!(body["finishReason"], "STOP");
}

#[tokio::test]
async fn test_mock_status_reports_a_known_state() {
    let dispatcher = ToolDispatcher::new(mock_context());
    let response = dispatcher
        .handle(
            STATUS_TOOL,
            &args(json!({ "operationName": "projects/p/locations/l/operations/mock-lyria-1" })),
        )
        .await
        .expect("no hard error");

    let body: Value = serde_json::from_str(&response.joined_text()).expect("json");
    let state = body["state"].as_str().expect("state");
    assert!(["PROCESSING", "DONE", "FAILED"].contains(&state));
}

#[tokio::test]
async fn test_remote_status_failure_is_a_hard_error() {
    let server = MockServer::start(vec![MockResponse::status(500, "boom")]);
    let dispatcher = ToolDispatcher::new(live_context(&server.url()));

    let error = dispatcher
        .handle(
            STATUS_TOOL,
            &args(json!({ "operationName": "projects/p/locations/l/operations/9" })),
        )
        .await
        .expect_err("hard error");
    assert!(matches!(error, ToolError::Internal(_)));
}

#[tokio::test]
async fn test_live_generation_failure_is_in_band() {
    let server = MockServer::start(vec![MockResponse::status(401, "expired token")]);
    let dispatcher = ToolDispatcher::new(live_context(&server.url()));

    let response = dispatcher
        .handle(TEXT_TOOL, &args(json!({ "prompt": "hello" })))
        .await
        .expect("no hard error");
    assert!(response.is_error);
    assert!(response.joined_text().contains("unauthenticated"));
}

#[test]
fn test_listing_matches_registry_order() {
    let dispatcher = ToolDispatcher::new(mock_context());
    let names: Vec<&str> = dispatcher.list_tools().iter().map(|tool| tool.name).collect();
    assert_eq!(names, dispatcher.registry().names());
}

#[test]
fn test_schema_and_adapter_validation_agree() {
    let dispatcher = ToolDispatcher::new(mock_context());
    let registry = dispatcher.registry();

    let video_schema = &registry.get(VIDEO_TOOL).expect("video").input_schema;
    for duration in 0..=12_u32 {
        for sample_count in 0..=6_u32 {
            let schema_ok = video_schema
                .validate(&args(json!({
                    "prompt": "waves",
                    "duration": duration,
                    "sampleCount": sample_count
                })))
                .is_ok();
            let adapter_ok = VideoProvider
                .validate(&VideoRequest {
                    duration,
                    sample_count,
                    ..VideoRequest::new("waves")
                })
                .is_ok();
            assert_eq!(schema_ok, adapter_ok, "duration {duration}, samples {sample_count}");
        }
    }

    let music_schema = &registry.get(MUSIC_TOOL).expect("music").input_schema;
    for duration in 0..=70_u32 {
        let schema_ok = music_schema
            .validate(&args(json!({ "textPrompt": "lofi", "durationSeconds": duration })))
            .is_ok();
        let adapter_ok = MusicProvider
            .validate(&MusicRequest {
                duration_seconds: duration,
                ..MusicRequest::new("lofi")
            })
            .is_ok();
        assert_eq!(schema_ok, adapter_ok, "duration {duration}");
    }

    let text_schema = &registry.get(TEXT_TOOL).expect("text").input_schema;
    let text = TextAdapter::new(&mock_context());
    for temperature in [-0.5, 0.0, 0.7, 2.0, 2.01] {
        let schema_ok = text_schema
            .validate(&args(json!({ "prompt": "hi", "temperature": temperature })))
            .is_ok();
        let adapter_ok = text
            .validate(&TextRequest {
                temperature,
                ..TextRequest::new("hi")
            })
            .is_ok();
        assert_eq!(schema_ok, adapter_ok, "temperature {temperature}");
    }
}
