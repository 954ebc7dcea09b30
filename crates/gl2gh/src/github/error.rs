//! GitHub API error types.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpResponse;
use crate::platform::{PlatformError, RateLimitInfo};

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request error: {0}")]
    Http(String),

    #[error("JSON deserialization error: {0}")]
    Deserialize(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// GitHub error payload: `{"message": ..., "errors": [{"message": ...}]}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Flatten a GitHub error body into one line; falls back to the raw body.
fn error_message(body: &[u8]) -> String {
    let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) else {
        return String::from_utf8_lossy(body).trim().to_string();
    };

    let details: Vec<String> = parsed
        .errors
        .iter()
        .filter_map(|d| d.message.clone().or_else(|| d.code.clone()))
        .collect();

    if details.is_empty() {
        parsed.message
    } else {
        format!("{} ({})", parsed.message, details.join(", "))
    }
}

/// Extract rate limit info from GitHub response headers.
pub fn parse_rate_limit_headers(response: &HttpResponse) -> Option<RateLimitInfo> {
    let limit = response.header("x-ratelimit-limit")?.parse::<usize>().ok()?;
    let remaining = response
        .header("x-ratelimit-remaining")?
        .parse::<usize>()
        .ok()?;
    let reset_epoch = response.header("x-ratelimit-reset")?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_epoch, 0).unwrap_or_else(Utc::now);
    Some(RateLimitInfo {
        limit,
        remaining,
        reset_at,
    })
}

impl GitHubError {
    /// Classify a non-success response.
    ///
    /// 429, and 403 with an exhausted quota or a `Retry-After` header, are
    /// rate limits; other 401/403 responses are authentication failures.
    pub fn from_response(response: &HttpResponse, resource: &str) -> Self {
        let message = error_message(&response.body);
        match response.status {
            429 => Self::RateLimited {
                reset_at: rate_limit_reset(response),
            },
            403 if is_quota_exhausted(response) => Self::RateLimited {
                reset_at: rate_limit_reset(response),
            },
            401 | 403 => Self::Auth(message),
            404 => Self::NotFound(resource.to_string()),
            422 => Self::Validation(message),
            status => Self::Api { status, message },
        }
    }
}

fn is_quota_exhausted(response: &HttpResponse) -> bool {
    response.header("x-ratelimit-remaining") == Some("0") || response.header("retry-after").is_some()
}

fn rate_limit_reset(response: &HttpResponse) -> DateTime<Utc> {
    if let Some(secs) = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<i64>().ok())
    {
        return Utc::now() + chrono::Duration::seconds(secs);
    }
    parse_rate_limit_headers(response)
        .map(|info| info.reset_at)
        .unwrap_or_else(|| Utc::now() + chrono::Duration::minutes(1))
}

/// Convert GitHubError to platform-agnostic PlatformError.
impl From<GitHubError> for PlatformError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Api { status, message } => PlatformError::api(status, message),
            GitHubError::Validation(message) => PlatformError::api(422, message),
            GitHubError::RateLimited { reset_at } => PlatformError::RateLimited { reset_at },
            GitHubError::Auth(message) => PlatformError::Auth { message },
            GitHubError::NotFound(resource) => PlatformError::not_found(resource),
            GitHubError::Http(msg) => PlatformError::network(msg),
            GitHubError::Deserialize(msg) | GitHubError::Config(msg) => {
                PlatformError::internal(msg)
            }
        }
    }
}
