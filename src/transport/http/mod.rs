use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::error::{ConfigError, ProviderError};
use crate::config::DEFAULT_TIMEOUT_MS;
use crate::core::types::AdapterContext;

pub const AUTH_BEARER_TOKEN_KEY: &str = "transport.auth.bearer_token";
/// Project billed for the call, sent as `x-goog-user-project`.
pub const QUOTA_PROJECT_KEY: &str = "transport.quota_project";
const QUOTA_PROJECT_HEADER: &str = "x-goog-user-project";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Issues one JSON request per call. Retrying is left to the caller, since the
/// backoff shape differs between adapters.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpTransport {
    pub fn new(timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::with_client(reqwest::Client::new(), timeout_ms)
    }

    pub fn with_client(client: reqwest::Client, timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::validate_timeout(timeout_ms)?;
        Ok(Self { client, timeout_ms })
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub async fn get_json<TResp>(
        &self,
        model: Option<&str>,
        url: &str,
        ctx: &AdapterContext,
    ) -> Result<TResp, ProviderError>
    where
        TResp: DeserializeOwned,
    {
        self.execute_json_request(model, Method::GET, url, None, ctx)
            .await
    }

    pub async fn post_json<TReq, TResp>(
        &self,
        model: Option<&str>,
        url: &str,
        body: &TReq,
        ctx: &AdapterContext,
    ) -> Result<TResp, ProviderError>
    where
        TReq: Serialize + ?Sized,
        TResp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|error| ProviderError::Serialization {
            model: model.map(str::to_string),
            request_id: None,
            message: error.to_string(),
        })?;

        self.execute_json_request(model, Method::POST, url, Some(payload), ctx)
            .await
    }

    async fn execute_json_request<TResp>(
        &self,
        model: Option<&str>,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        ctx: &AdapterContext,
    ) -> Result<TResp, ProviderError>
    where
        TResp: DeserializeOwned,
    {
        let headers = build_headers(model, ctx)?;

        let mut request_builder = self
            .client
            .request(method, url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .headers(headers);

        if let Some(payload) = body {
            request_builder = request_builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(payload);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|error| ProviderError::Transport {
                model: model.map(str::to_string),
                message: error.to_string(),
                timed_out: error.is_timeout(),
            })?;

        let status_code = response.status().as_u16();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if !response.status().is_success() {
            return Err(build_status_error(model, status_code, request_id, response).await);
        }

        response
            .json::<TResp>()
            .await
            .map_err(|error| ProviderError::Serialization {
                model: model.map(str::to_string),
                request_id,
                message: error.to_string(),
            })
    }

    fn validate_timeout(timeout_ms: u64) -> Result<(), ConfigError> {
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout { timeout_ms });
        }
        Ok(())
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

async fn build_status_error(
    model: Option<&str>,
    status_code: u16,
    request_id: Option<String>,
    response: Response,
) -> ProviderError {
    let message = match response.text().await {
        Ok(body) if !body.trim().is_empty() => body,
        Ok(_) => format!("http status {status_code}"),
        Err(error) => {
            format!("http status {status_code}; failed to read response body: {error}")
        }
    };

    ProviderError::Status {
        model: model.map(str::to_string),
        status_code,
        request_id,
        message,
    }
}

/// Bearer and quota-project headers taken from the adapter context.
fn build_headers(model: Option<&str>, ctx: &AdapterContext) -> Result<HeaderMap, ProviderError> {
    let header_value = |raw: &str, what: &str| {
        HeaderValue::from_str(raw).map_err(|error| ProviderError::Protocol {
            model: model.map(str::to_string),
            request_id: None,
            message: format!("invalid {what} header value: {error}"),
        })
    };

    let mut headers = HeaderMap::new();
    if let Some(token) = ctx.metadata.get(AUTH_BEARER_TOKEN_KEY) {
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"), "bearer token")?);
    }
    if let Some(project) = ctx.metadata.get(QUOTA_PROJECT_KEY) {
        headers.insert(QUOTA_PROJECT_HEADER, header_value(project, "quota project")?);
    }
    Ok(headers)
}
