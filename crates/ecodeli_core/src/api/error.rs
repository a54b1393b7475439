//! REST error taxonomy.
//!
//! # Invariants
//! - Only `Status { status: 404, .. }` counts as "not found".
//! - Response bodies are truncated before being stored.

use crate::logging::single_line;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BODY_SUMMARY_MAX_CHARS: usize = 300;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of one REST call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection, TLS or protocol failure before a status was received.
    Transport(String),
    /// Client-wide timeout elapsed.
    Timeout,
    /// Non-2xx response.
    Status { status: u16, body: String },
    /// Response body did not match the expected shape.
    Decode(String),
    /// Request URL could not be built.
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: single_line(body, BODY_SUMMARY_MAX_CHARS),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout => "timeout",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Status { status, body } if body.is_empty() => {
                write!(f, "server answered with status {status}")
            }
            Self::Status { status, body } => {
                write!(f, "server answered with status {status}: {body}")
            }
            Self::Decode(message) => write!(f, "unexpected response payload: {message}"),
            Self::InvalidUrl(message) => write!(f, "invalid request url: {message}"),
        }
    }
}

impl Error for ApiError {}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout;
        }
        if value.is_decode() {
            return Self::Decode(value.to_string());
        }
        if let Some(status) = value.status() {
            return Self::status(status.as_u16(), "");
        }
        Self::Transport(value.to_string())
    }
}

/// Localized, user-facing failure re-thrown by feature loaders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureError {
    /// French message shown by the UI shell.
    pub message: String,
    pub source: ApiError,
}

impl FeatureError {
    pub fn new(message: impl Into<String>, source: ApiError) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }
}

impl Display for FeatureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for FeatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
