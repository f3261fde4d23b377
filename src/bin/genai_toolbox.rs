use std::sync::Arc;

use genai_toolbox::config::ServiceConfig;
use genai_toolbox::context::{EnvTokenProvider, ServiceContext, StaticTokenProvider};
use genai_toolbox::core::traits::TokenProvider;
use genai_toolbox::dispatcher::ToolDispatcher;
use genai_toolbox::server::McpServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let config = ServiceConfig::from_env()?;
    init_tracing(config.debug);

    let credentials = if config.mock_mode {
        None
    } else {
        let provider: Arc<dyn TokenProvider> =
            match config.access_token.clone().and_then(StaticTokenProvider::new) {
                Some(provider) => Arc::new(provider),
                None => Arc::new(EnvTokenProvider::default()),
            };
        Some(provider)
    };

    let context = Arc::new(ServiceContext::new(config, credentials)?);
    let config = context.config();
    let mode = config.mode_label();
    tracing::info!(
        mode,
        project = config.project_id.as_deref().unwrap_or("<unset>"),
        region = %config.region,
        "starting genai-toolbox"
    );

    let server = McpServer::new(ToolDispatcher::new(Arc::clone(&context)));
    let tools = server.dispatcher().registry().names();
    tracing::info!(count = tools.len(), tools = ?tools, "tools registered");

    server.serve_stdio().await?;
    Ok(())
}

/// Logs go to stderr; stdout carries protocol traffic only.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
