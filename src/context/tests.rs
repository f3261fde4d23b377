use std::collections::HashSet;

use super::*;

fn live_config() -> ServiceConfig {
    ServiceConfig::live("demo-project", "europe-west4").with_base_url("http://127.0.0.1:9/")
}

#[test]
fn test_mock_context_needs_no_credentials() {
    let context = ServiceContext::new(ServiceConfig::mock(), None).expect("mock context");
    assert!(context.is_mock_mode());
    assert!(ServiceContext::mock().is_mock_mode());
}

#[test]
fn test_live_context_without_credentials_is_rejected() {
    let error = ServiceContext::new(live_config(), None).expect_err("must fail");
    assert_eq!(error, ConfigError::MissingCredentials);
    assert_eq!(error.to_string(), "no mock mode and no credential available");
}

#[test]
fn test_live_context_without_project_is_rejected() {
    let mut config = live_config();
    config.project_id = None;
    let credentials: Arc<dyn TokenProvider> =
        Arc::new(StaticTokenProvider::new("token").expect("token"));

    let error = ServiceContext::new(config, Some(credentials)).expect_err("must fail");
    assert!(matches!(error, ConfigError::MissingProjectId { .. }));
}

#[test]
fn test_from_config_uses_static_access_token() {
    let context = ServiceContext::from_config(live_config().with_access_token("ya29.abc"))
        .expect("live context");
    assert!(!context.is_mock_mode());

    let blank = ServiceContext::from_config(live_config().with_access_token("   "));
    assert_eq!(blank.err(), Some(ConfigError::MissingCredentials));
}

#[test]
fn test_get_config_reads_settings_with_default() {
    let context = Arc::new(
        ServiceContext::new(
            ServiceConfig::mock().with_setting("imagen.model", "imagen-test"),
            None,
        )
        .expect("context"),
    );
    let base = context.adapter_base("image");

    assert_eq!(base.get_config("imagen.model", "fallback"), "imagen-test");
    assert_eq!(base.get_config("veo.model", "fallback"), "fallback");
    assert_eq!(base.name(), "image");
}

#[test]
fn test_endpoint_urls() {
    let context = Arc::new(
        ServiceContext::from_config(live_config().with_access_token("token")).expect("context"),
    );
    let base = context.adapter_base("video");

    assert_eq!(
        base.model_url("videogeneration@001", "predict").expect("url"),
        "http://127.0.0.1:9/v1/projects/demo-project/locations/europe-west4/publishers/google/models/videogeneration@001:predict"
    );
    assert_eq!(
        base.operation_url("/projects/demo-project/locations/europe-west4/operations/42"),
        "http://127.0.0.1:9/v1/projects/demo-project/locations/europe-west4/operations/42"
    );
    assert_eq!(
        base.operation_name("op-1"),
        "projects/demo-project/locations/europe-west4/operations/op-1"
    );
}

#[test]
fn test_mock_base_has_placeholder_project_but_no_model_url() {
    let base = Arc::new(ServiceContext::mock()).adapter_base("music");
    assert_eq!(base.project_or_placeholder(), "mock-project");
    assert!(matches!(
        base.model_url("musicgeneration@001", "predict"),
        Err(ToolError::Internal(_))
    ));
}

#[tokio::test]
async fn test_access_token_without_provider_is_unauthenticated() {
    let base = Arc::new(ServiceContext::mock()).adapter_base("text");
    let error = base.access_token().await.expect_err("no provider");
    assert!(matches!(error, ToolError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_env_token_provider_reports_missing_variable() {
    let provider = EnvTokenProvider::new("GENAI_TOOLBOX_TEST_TOKEN_THAT_IS_NEVER_SET");
    let error = provider.access_token().await.expect_err("unset");
    assert!(error.message().contains("GENAI_TOOLBOX_TEST_TOKEN_THAT_IS_NEVER_SET"));
}

#[test]
fn test_live_authorized_context_names_quota_project() {
    let context = Arc::new(
        ServiceContext::from_config(live_config().with_access_token("token")).expect("context"),
    );
    let ctx = context.adapter_base("veo").authorized_context("abc".to_string());
    assert_eq!(
        ctx.metadata.get(QUOTA_PROJECT_KEY).map(String::as_str),
        Some("demo-project")
    );
}

#[test]
fn test_authorized_context_carries_bearer_token() {
    let base = Arc::new(ServiceContext::mock()).adapter_base("image");
    let ctx = base.authorized_context("abc".to_string());
    assert_eq!(
        ctx.metadata.get(AUTH_BEARER_TOKEN_KEY).map(String::as_str),
        Some("abc")
    );
    assert!(ctx.metadata.get(QUOTA_PROJECT_KEY).is_none());
}

#[test]
fn test_generate_id_shape_and_uniqueness() {
    let ids: HashSet<String> = (0..100).map(|_| generate_id("img")).collect();
    assert_eq!(ids.len(), 100);

    let sample = generate_id("img");
    let parts: Vec<&str> = sample.split('_').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "img");
    assert!(parts[1].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    assert_eq!(parts[2].len(), 9);
}

#[test]
fn test_mock_seed_strictly_increases() {
    let mut previous = next_mock_seed();
    for _ in 0..1_000 {
        let next = next_mock_seed();
        assert!(next > previous);
        previous = next;
    }
}

#[test]
fn test_format_bytes() {
    assert_eq!(format_bytes(0), "0 Bytes");
    assert_eq!(format_bytes(512), "512 Bytes");
    assert_eq!(format_bytes(1024), "1 KB");
    assert_eq!(format_bytes(1536), "1.5 KB");
    assert_eq!(format_bytes(5 * 1024 * 1024), "5 MB");
}

#[test]
fn test_base36() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "z");
    assert_eq!(to_base36(36), "10");
}
