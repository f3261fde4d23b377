use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Substrings that mark an error as transient even when the remote status code
/// does not. Remote error shapes are inconsistent, so the message is checked too.
const RETRYABLE_MESSAGE_MARKERS: [&str; 4] = [
    "rate limit",
    "temporarily unavailable",
    "timeout",
    "quota exceeded",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no mock mode and no credential available")]
    MissingCredentials,
    #[error("missing project id: set {env_var} or enable mock mode")]
    MissingProjectId { env_var: String },
    #[error("invalid timeout: {timeout_ms} ms")]
    InvalidTimeout { timeout_ms: u64 },
    #[error("invalid retry policy: {reason}")]
    InvalidRetryPolicy { reason: String },
    #[error("invalid setting {key}={value}: {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },
}

/// Raw failure of a single outbound call, before domain classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error(
        "transport error{context}: {message}",
        context = format_context(.model.as_deref(), None, None)
    )]
    Transport {
        model: Option<String>,
        message: String,
        timed_out: bool,
    },
    #[error(
        "status error{context}: {message}",
        context = format_context(.model.as_deref(), .request_id.as_deref(), Some(*.status_code))
    )]
    Status {
        model: Option<String>,
        status_code: u16,
        request_id: Option<String>,
        message: String,
    },
    #[error(
        "protocol error{context}: {message}",
        context = format_context(.model.as_deref(), .request_id.as_deref(), None)
    )]
    Protocol {
        model: Option<String>,
        request_id: Option<String>,
        message: String,
    },
    #[error(
        "serialization error{context}: {message}",
        context = format_context(.model.as_deref(), .request_id.as_deref(), None)
    )]
    Serialization {
        model: Option<String>,
        request_id: Option<String>,
        message: String,
    },
}

/// Closed error taxonomy surfaced by adapters, the dispatcher and the status resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    RateLimited,
    Unavailable,
    Internal,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("unknown error (status {status}): {message}")]
    Unknown { status: u16, message: String },
}

impl ToolError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// HTTP-style code for the error, used when the error is reported as data.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::Unauthenticated(_) => 401,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::RateLimited(_) => 429,
            Self::Unavailable(_) => 503,
            Self::Internal(_) => 500,
            Self::Unknown { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(message)
            | Self::Unauthenticated(message)
            | Self::PermissionDenied(message)
            | Self::NotFound(message)
            | Self::RateLimited(message)
            | Self::Unavailable(message)
            | Self::Internal(message)
            | Self::Unknown { message, .. } => message,
        }
    }

    pub fn is_retryable(&self) -> bool {
        if matches!(self.kind(), ErrorKind::RateLimited | ErrorKind::Unavailable) {
            return true;
        }

        let message = self.message().to_ascii_lowercase();
        RETRYABLE_MESSAGE_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.status_code(),
            kind: self.kind(),
            message: self.message().to_string(),
        }
    }
}

/// Serializable form of a [`ToolError`], embedded in operation status payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub kind: ErrorKind,
    pub message: String,
}

/// Maps a raw transport failure onto the domain taxonomy.
pub fn translate_transport_error(error: &ProviderError) -> ToolError {
    match error {
        ProviderError::Status {
            status_code,
            message,
            ..
        } => translate_status(*status_code, message),
        ProviderError::Transport {
            message, timed_out, ..
        } => {
            if *timed_out {
                ToolError::Unavailable(format!("request timeout: {message}"))
            } else {
                ToolError::Unavailable(format!("transport failure: {message}"))
            }
        }
        ProviderError::Protocol { message, .. } => {
            ToolError::Internal(format!("protocol error: {message}"))
        }
        ProviderError::Serialization { message, .. } => {
            ToolError::Internal(format!("malformed response: {message}"))
        }
    }
}

fn translate_status(status_code: u16, raw_message: &str) -> ToolError {
    let detail = remote_error_message(raw_message);
    match status_code {
        400 => ToolError::InvalidArgument(format!("bad request: {detail}")),
        401 => ToolError::Unauthenticated(format!("check your credentials: {detail}")),
        403 => ToolError::PermissionDenied(format!("check your permissions: {detail}")),
        404 => ToolError::NotFound(format!("resource does not exist: {detail}")),
        429 => ToolError::RateLimited(format!("too many requests: {detail}")),
        500 => ToolError::Internal(format!("remote server error: {detail}")),
        503 => ToolError::Unavailable(format!("service unavailable, try again later: {detail}")),
        status => ToolError::Unknown {
            status,
            message: detail,
        },
    }
}

/// Pulls `error.message` out of a JSON error body, falling back to the raw text.
fn remote_error_message(raw: &str) -> String {
    let trimmed = raw.trim();
    serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|body| {
            body.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| trimmed.to_string())
}

impl From<ProviderError> for ToolError {
    fn from(error: ProviderError) -> Self {
        translate_transport_error(&error)
    }
}

impl From<ConfigError> for ToolError {
    fn from(error: ConfigError) -> Self {
        ToolError::Internal(error.to_string())
    }
}

fn format_context(
    model: Option<&str>,
    request_id: Option<&str>,
    status_code: Option<u16>,
) -> String {
    let mut context = Vec::new();

    if let Some(model) = model {
        context.push(format!("model={model}"));
    }
    if let Some(request_id) = request_id {
        context.push(format!("request_id={request_id}"));
    }
    if let Some(status_code) = status_code {
        context.push(format!("status_code={status_code}"));
    }

    if context.is_empty() {
        String::new()
    } else {
        format!(" [{}]", context.join(", "))
    }
}

#[cfg(test)]
mod tests;
