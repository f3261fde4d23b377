use super::*;

fn status(status_code: u16, message: &str) -> ProviderError {
    ProviderError::Status {
        model: Some("imagen-3.0-generate-001".to_string()),
        status_code,
        request_id: None,
        message: message.to_string(),
    }
}

#[test]
fn test_translate_transport_error_covers_status_table() {
    let cases = [
        (400, ErrorKind::InvalidArgument),
        (401, ErrorKind::Unauthenticated),
        (403, ErrorKind::PermissionDenied),
        (404, ErrorKind::NotFound),
        (429, ErrorKind::RateLimited),
        (500, ErrorKind::Internal),
        (503, ErrorKind::Unavailable),
        (418, ErrorKind::Unknown),
        (504, ErrorKind::Unknown),
    ];

    for (status_code, expected) in cases {
        let translated = translate_transport_error(&status(status_code, "boom"));
        assert_eq!(translated.kind(), expected, "status {status_code}");
    }
}

#[test]
fn test_unknown_status_keeps_code() {
    let translated = translate_transport_error(&status(418, "teapot"));
    assert_eq!(
        translated,
        ToolError::Unknown {
            status: 418,
            message: "teapot".to_string(),
        }
    );
    assert_eq!(translated.status_code(), 418);
    assert_eq!(translated.to_string(), "unknown error (status 418): teapot");
}

#[test]
fn test_translation_extracts_json_error_message() {
    let translated = translate_transport_error(&status(
        400,
        r#"{"error":{"code":400,"message":"prompt was rejected"}}"#,
    ));
    assert_eq!(
        translated,
        ToolError::InvalidArgument("bad request: prompt was rejected".to_string())
    );
}

#[test]
fn test_transport_failures_map_to_unavailable() {
    let timed_out = ProviderError::Transport {
        model: None,
        message: "deadline elapsed".to_string(),
        timed_out: true,
    };
    let translated = ToolError::from(timed_out);
    assert_eq!(translated.kind(), ErrorKind::Unavailable);
    assert!(translated.message().contains("timeout"));

    let serialization = ProviderError::Serialization {
        model: None,
        request_id: None,
        message: "expected value".to_string(),
    };
    assert_eq!(ToolError::from(serialization).kind(), ErrorKind::Internal);
}

#[test]
fn test_retry_classification_uses_kind_and_message_markers() {
    assert!(ToolError::RateLimited("slow down".to_string()).is_retryable());
    assert!(ToolError::Unavailable("down".to_string()).is_retryable());
    assert!(ToolError::Internal("Quota Exceeded for project".to_string()).is_retryable());
    assert!(
        ToolError::Unknown {
            status: 504,
            message: "gateway timeout".to_string(),
        }
        .is_retryable()
    );
    assert!(ToolError::PermissionDenied("Temporarily Unavailable".to_string()).is_retryable());

    assert!(!ToolError::InvalidArgument("bad prompt".to_string()).is_retryable());
    assert!(!ToolError::NotFound("missing model".to_string()).is_retryable());
    assert!(!ToolError::Internal("no artifacts produced".to_string()).is_retryable());
}

#[test]
fn test_error_display_messages() {
    let provider_error = ProviderError::Status {
        model: Some("videogeneration@001".to_string()),
        status_code: 429,
        request_id: Some("req_abc".to_string()),
        message: "rate limited".to_string(),
    };
    assert_eq!(
        provider_error.to_string(),
        "status error [model=videogeneration@001, request_id=req_abc, status_code=429]: rate limited"
    );

    let protocol = ProviderError::Protocol {
        model: None,
        request_id: None,
        message: "invalid header".to_string(),
    };
    assert_eq!(protocol.to_string(), "protocol error: invalid header");

    assert_eq!(
        ConfigError::MissingCredentials.to_string(),
        "no mock mode and no credential available"
    );
    assert_eq!(
        ToolError::invalid_argument("Unknown tool: nope").to_string(),
        "invalid argument: Unknown tool: nope"
    );
}

#[test]
fn test_error_body_serializes_kind_and_code() {
    let body = ToolError::internal("Mock operation failed").to_body();
    let json = serde_json::to_value(&body).expect("serialize body");
    assert_eq!(
        json,
        serde_json::json!({
            "code": 500,
            "kind": "INTERNAL",
            "message": "Mock operation failed",
        })
    );
}
