//! Version-control error types.

use thiserror::Error;

/// Errors that can occur while driving the version-control backend.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("invalid repository URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}
