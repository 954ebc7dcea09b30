//! GitLab API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::HttpResponse;
use crate::platform::PlatformError;

/// Errors that can occur when interacting with the GitLab API.
#[derive(Debug, Error)]
pub enum GitLabError {
    #[error("GitLab API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("No group found with name {0}")]
    GroupNotFound(String),

    #[error("No project found in the path {0}")]
    ProjectNotFound(String),

    #[error("HTTP request error: {0}")]
    Http(String),

    #[error("Incomplete listing: {0}")]
    Pagination(String),

    #[error("JSON deserialization error: {0}")]
    Deserialize(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GitLabError {
    /// Classify a non-success response. 404 is left to the caller, which
    /// knows what was being looked up.
    pub fn from_response(response: &HttpResponse) -> Self {
        let body = response.body_text();
        match response.status {
            401 | 403 => Self::Auth(format!("{}: {}", response.status, body)),
            429 => Self::RateLimited {
                reset_at: rate_limit_reset(response),
            },
            status => Self::Api {
                status,
                message: body,
            },
        }
    }
}

/// Reset time from the `RateLimit-Reset` header (Unix seconds), or one minute
/// from now.
fn rate_limit_reset(response: &HttpResponse) -> DateTime<Utc> {
    response
        .header("ratelimit-reset")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
        .unwrap_or_else(|| Utc::now() + chrono::Duration::minutes(1))
}

/// Convert GitLabError to platform-agnostic PlatformError.
impl From<GitLabError> for PlatformError {
    fn from(err: GitLabError) -> Self {
        match err {
            GitLabError::Api { status, message } => PlatformError::api(status, message),
            GitLabError::RateLimited { reset_at } => PlatformError::RateLimited { reset_at },
            GitLabError::Auth(message) => PlatformError::Auth { message },
            GitLabError::GroupNotFound(g) => PlatformError::not_found(format!("group: {g}")),
            GitLabError::ProjectNotFound(p) => PlatformError::not_found(format!("project: {p}")),
            GitLabError::Http(msg) => PlatformError::network(msg),
            GitLabError::Deserialize(msg)
            | GitLabError::Config(msg)
            | GitLabError::Pagination(msg) => {
                PlatformError::internal(msg)
            }
        }
    }
}
