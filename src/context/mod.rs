//! Shared service context and the base contract every adapter builds on.
//!
//! A [`ServiceContext`] is constructed once at startup from a [`ServiceConfig`]
//! and handed to each adapter; there is no ambient global configuration.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::Value;

use crate::config::{ACCESS_TOKEN_ENV, PROJECT_ENV, ServiceConfig};
use crate::core::error::{ConfigError, ProviderError, ToolError, translate_transport_error};
use crate::core::traits::TokenProvider;
use crate::core::types::AdapterContext;
use crate::transport::http::{AUTH_BEARER_TOKEN_KEY, HttpTransport, QUOTA_PROJECT_KEY};

/// Project id used in fabricated handles when no project is configured.
pub const MOCK_PROJECT_ID: &str = "mock-project";

static LAST_MOCK_SEED: AtomicU64 = AtomicU64::new(0);

pub struct ServiceContext {
    config: ServiceConfig,
    credentials: Option<Arc<dyn TokenProvider>>,
    transport: HttpTransport,
}

impl ServiceContext {
    /// Validates the configuration once. A live context needs both a credential
    /// provider and a project id; a mock context needs neither.
    pub fn new(
        config: ServiceConfig,
        credentials: Option<Arc<dyn TokenProvider>>,
    ) -> Result<Self, ConfigError> {
        if !config.mock_mode {
            if credentials.is_none() {
                return Err(ConfigError::MissingCredentials);
            }
            if config.project_id.is_none() {
                return Err(ConfigError::MissingProjectId {
                    env_var: PROJECT_ENV.to_string(),
                });
            }
        }

        let transport = HttpTransport::new(config.timeout_ms)?;
        Ok(Self {
            config,
            credentials,
            transport,
        })
    }

    /// Builds the context using the static token carried by the config, if any.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ConfigError> {
        let credentials = config
            .access_token
            .clone()
            .and_then(StaticTokenProvider::new)
            .map(|provider| Arc::new(provider) as Arc<dyn TokenProvider>);
        Self::new(config, credentials)
    }

    pub fn mock() -> Self {
        Self {
            config: ServiceConfig::mock(),
            credentials: None,
            transport: HttpTransport::default(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn is_mock_mode(&self) -> bool {
        self.config.mock_mode
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn adapter_base(self: &Arc<Self>, name: &'static str) -> AdapterBase {
        AdapterBase {
            name,
            context: Arc::clone(self),
        }
    }
}

impl fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContext")
            .field("config", &self.config)
            .field("has_credentials", &self.credentials.is_some())
            .field("transport", &self.transport)
            .finish()
    }
}

/// Behavior shared by every provider adapter: configuration access, debug
/// logging, error translation, endpoint construction and id generation.
#[derive(Debug, Clone)]
pub struct AdapterBase {
    name: &'static str,
    context: Arc<ServiceContext>,
}

impl AdapterBase {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_mock_mode(&self) -> bool {
        self.context.is_mock_mode()
    }

    pub fn get_config(&self, key: &str, default: &str) -> String {
        self.context
            .config
            .settings
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Emits a debug event; silent unless debug is enabled in the config.
    pub fn log(&self, event: &str, data: Value) {
        if self.context.config.debug {
            tracing::debug!(adapter = self.name, event, data = %data, "adapter event");
        }
    }

    pub fn translate_transport_error(&self, error: &ProviderError) -> ToolError {
        let translated = translate_transport_error(error);
        tracing::error!(adapter = self.name, error = %error, kind = ?translated.kind(), "remote call failed");
        translated
    }

    pub fn transport(&self) -> &HttpTransport {
        self.context.transport()
    }

    pub fn region(&self) -> &str {
        &self.context.config.region
    }

    pub fn project_id(&self) -> Result<&str, ToolError> {
        self.context
            .config
            .project_id
            .as_deref()
            .ok_or_else(|| ToolError::internal(format!("{PROJECT_ENV} is not configured")))
    }

    /// Project id for fabricated handles, which must exist even without a project.
    pub fn project_or_placeholder(&self) -> &str {
        self.context
            .config
            .project_id
            .as_deref()
            .unwrap_or(MOCK_PROJECT_ID)
    }

    pub async fn access_token(&self) -> Result<String, ToolError> {
        let provider = self.context.credentials.as_ref().ok_or_else(|| {
            ToolError::Unauthenticated(format!(
                "no credential provider configured; set {ACCESS_TOKEN_ENV}"
            ))
        })?;
        provider.access_token().await
    }

    /// Transport context for one outbound call: the bearer token, and the
    /// configured project as quota project when there is one.
    pub fn authorized_context(&self, token: String) -> AdapterContext {
        let mut ctx = AdapterContext::default();
        ctx.metadata
            .insert(AUTH_BEARER_TOKEN_KEY.to_string(), token);
        if let Ok(project) = self.project_id() {
            ctx.metadata
                .insert(QUOTA_PROJECT_KEY.to_string(), project.to_string());
        }
        ctx
    }

    pub fn model_url(&self, model: &str, method: &str) -> Result<String, ToolError> {
        let project = self.project_id()?;
        let region = self.region();
        Ok(format!(
            "{}/v1/projects/{project}/locations/{region}/publishers/google/models/{model}:{method}",
            self.context.config.endpoint_base()
        ))
    }

    pub fn operation_url(&self, operation_name: &str) -> String {
        format!(
            "{}/v1/{}",
            self.context.config.endpoint_base(),
            operation_name.trim_start_matches('/')
        )
    }

    /// Fully qualified operation name for a locally minted id.
    pub fn operation_name(&self, id: &str) -> String {
        format!(
            "projects/{}/locations/{}/operations/{id}",
            self.project_or_placeholder(),
            self.region()
        )
    }

    pub fn generate_id(&self, prefix: &str) -> String {
        generate_id(prefix)
    }
}

/// `prefix_<base36 millis>_<random>`
pub fn generate_id(prefix: &str) -> String {
    let timestamp = to_base36(chrono::Utc::now().timestamp_millis().max(0) as u64);
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("{prefix}_{timestamp}_{suffix}")
}

/// Clock-seeded value that strictly increases across calls in this process, so
/// fabricated artifact ids never collide.
pub fn next_mock_seed() -> u64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let previous = LAST_MOCK_SEED
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    now.max(previous + 1)
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Hands out a fixed bearer token.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Returns `None` for blank tokens.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                token: trimmed.to_string(),
            })
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ToolError> {
        Ok(self.token.clone())
    }
}

/// Re-reads an environment variable on every call, so externally refreshed
/// tokens are picked up without a restart.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(ACCESS_TOKEN_ENV)
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn access_token(&self) -> Result<String, ToolError> {
        std::env::var(&self.var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ToolError::Unauthenticated(format!("failed to obtain access token from {}", self.var))
            })
    }
}

#[cfg(test)]
mod tests;
