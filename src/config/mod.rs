use std::collections::BTreeMap;

use crate::core::error::ConfigError;

pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
pub const LOCATION_ENV: &str = "GOOGLE_CLOUD_LOCATION";
pub const REGION_ENV: &str = "GOOGLE_CLOUD_REGION";
pub const MOCK_ENV: &str = "USE_MOCK";
pub const DEBUG_ENV: &str = "DEBUG";
pub const BASE_URL_ENV: &str = "GENAI_TOOLBOX_BASE_URL";
pub const TIMEOUT_ENV: &str = "GENAI_TOOLBOX_TIMEOUT_MS";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_ACCESS_TOKEN";

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Model overrides read from the environment into [`ServiceConfig::settings`].
const MODEL_OVERRIDES: [(&str, &str); 4] = [
    ("IMAGEN_MODEL", "imagen.model"),
    ("VEO_MODEL", "veo.model"),
    ("LYRIA_MODEL", "lyria.model"),
    ("GEMINI_MODEL", "gemini.model"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub project_id: Option<String>,
    pub region: String,
    pub mock_mode: bool,
    pub debug: bool,
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub access_token: Option<String>,
    pub settings: BTreeMap<String, String>,
}

impl ServiceConfig {
    pub fn mock() -> Self {
        Self {
            project_id: None,
            region: DEFAULT_REGION.to_string(),
            mock_mode: true,
            debug: false,
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            access_token: None,
            settings: BTreeMap::new(),
        }
    }

    pub fn live(project_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            region: region.into(),
            mock_mode: false,
            ..Self::mock()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Mock mode is forced when no
    /// project id is available.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).and_then(non_empty);

        let project_id = read(PROJECT_ENV);
        let region = read(LOCATION_ENV)
            .or_else(|| read(REGION_ENV))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mock_requested = match read(MOCK_ENV) {
            Some(value) => parse_flag(MOCK_ENV, &value)?,
            None => false,
        };
        let debug = match read(DEBUG_ENV) {
            Some(value) => parse_flag(DEBUG_ENV, &value)?,
            None => false,
        };

        let timeout_ms = match read(TIMEOUT_ENV) {
            Some(value) => value
                .parse::<u64>()
                .map_err(|error| ConfigError::InvalidSetting {
                    key: TIMEOUT_ENV.to_string(),
                    value: value.clone(),
                    reason: error.to_string(),
                })?,
            None => DEFAULT_TIMEOUT_MS,
        };
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout { timeout_ms });
        }

        let settings = MODEL_OVERRIDES
            .iter()
            .filter_map(|(env_key, setting_key)| {
                read(*env_key).map(|value| (setting_key.to_string(), value))
            })
            .collect();

        Ok(Self {
            mock_mode: mock_requested || project_id.is_none(),
            project_id,
            region,
            debug,
            base_url: read(BASE_URL_ENV),
            timeout_ms,
            access_token: read(ACCESS_TOKEN_ENV),
            settings,
        })
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Scheme and host that prediction and operation paths hang off.
    pub fn endpoint_base(&self) -> String {
        match &self.base_url {
            Some(base_url) => base_url.trim().trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.region),
        }
    }

    pub fn mode_label(&self) -> &'static str {
        if self.mock_mode { "MOCK" } else { "PRODUCTION" }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
