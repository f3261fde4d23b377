use std::sync::Arc;
use std::time::Duration;

use genai_toolbox::core::traits::GenerationAdapter;
use genai_toolbox::providers::{ImageAdapter, ImageProvider, MediaAdapter, TextAdapter};
use genai_toolbox::registry::ToolRegistry;
use genai_toolbox::transport::retry::RetryPolicy;
use genai_toolbox::{
    ErrorKind, GenerationResult, ImageRequest, ServiceConfig, ServiceContext, StatusResolver,
    ToolDispatcher, ToolError, ToolResponse,
};

#[test]
fn test_public_api_compiles() {
    let context = Arc::new(ServiceContext::mock());
    let _registry: ToolRegistry = ToolRegistry::builtin();
    let _dispatcher = ToolDispatcher::new(Arc::clone(&context));
    let _resolver = StatusResolver::new(&context);
    let _text = TextAdapter::new(&context);

    let image: ImageAdapter = MediaAdapter::new(ImageProvider, &context);
    assert!(image.is_mock());
    let _tuned = MediaAdapter::new(ImageProvider, &context)
        .with_retry_policy(RetryPolicy::exponential(2, Duration::from_millis(10)))
        .expect("valid policy");

    let _request = ImageRequest::new("a cat");
    let _envelope: ToolResponse = ToolResponse::text("{}");
    assert_eq!(
        ToolError::invalid_argument("bad").kind(),
        ErrorKind::InvalidArgument
    );

    let config = ServiceConfig::live("p", "us-central1").with_access_token("t");
    let _live = ServiceContext::from_config(config).expect("live context");
}

#[tokio::test]
async fn test_adapters_are_usable_through_the_trait() {
    let context = Arc::new(ServiceContext::mock());
    let image = ImageAdapter::new(ImageProvider, &context);

    let result: GenerationResult = image
        .generate(&ImageRequest::new("a cat"))
        .await
        .expect("mock image");
    assert_eq!(result.items.len(), 1);
}
