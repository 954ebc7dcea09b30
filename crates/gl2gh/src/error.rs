//! Error taxonomy for migration operations.
//!
//! Namespace-level errors ([`MigrationError::NamespaceNotFound`],
//! [`MigrationError::UpstreamFetchFailed`]) abort a bulk operation.
//! Project-level errors are recorded in the
//! [`MigrationOutcome`](crate::migrate::MigrationOutcome) and never escape it.

use std::fmt;

use thiserror::Error;

use crate::mirror::MirrorStage;
use crate::platform::{PlatformError, short_error_message};

/// Why archiving a source project failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveFailure {
    /// No project exists at the given path.
    NotFound,
    /// Transport or platform error; the project may exist.
    Upstream(String),
}

impl fmt::Display for ArchiveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Upstream(message) => write!(f, "{message}"),
        }
    }
}

/// Errors surfaced by the migration core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// The root group does not exist on the source platform.
    #[error("No group found with name {group}")]
    NamespaceNotFound { group: String },

    /// A group, subgroup or subgroup list could not be resolved.
    #[error("Error while fetching {namespace}: {message}")]
    UpstreamFetchFailed { namespace: String, message: String },

    /// The destination repository could not be created.
    #[error("Error while creating destination repository for {project}: {message}")]
    ProvisionFailed { project: String, message: String },

    /// One mirror stage failed for a project (or for one of its branches).
    #[error("Error while mirroring {project} at stage {stage}{}: {message}", branch_suffix(.branch))]
    MirrorFailed {
        project: String,
        stage: MirrorStage,
        branch: Option<String>,
        message: String,
    },

    /// Branch protection could not be applied.
    #[error("Error while configuring branch protection for {owner}/{repo} branch {branch}: {message}")]
    ProtectionConfigFailed {
        owner: String,
        repo: String,
        branch: String,
        message: String,
    },

    /// The per-project task ended without reporting (panic or cancellation).
    #[error("Migration task for {project} did not complete: {message}")]
    TaskFailed { project: String, message: String },

    /// The source project could not be archived.
    #[error("{}", archive_message(.project_path, .reason))]
    ArchiveFailed {
        project_path: String,
        reason: ArchiveFailure,
    },
}

fn branch_suffix(branch: &Option<String>) -> String {
    match branch {
        Some(branch) => format!(" (branch {branch})"),
        None => String::new(),
    }
}

fn archive_message(project_path: &str, reason: &ArchiveFailure) -> String {
    match reason {
        ArchiveFailure::NotFound => {
            format!("No project found in the path {project_path}, for archiving")
        }
        ArchiveFailure::Upstream(message) => {
            format!("Error while archiving project {project_path}: {message}")
        }
    }
}

impl MigrationError {
    /// Build an [`MigrationError::UpstreamFetchFailed`] from a platform error.
    pub fn upstream(namespace: impl Into<String>, err: &PlatformError) -> Self {
        Self::UpstreamFetchFailed {
            namespace: namespace.into(),
            message: short_error_message(err),
        }
    }

    /// Build a [`MigrationError::MirrorFailed`] for a project-wide stage.
    pub fn mirror(
        project: impl Into<String>,
        stage: MirrorStage,
        message: impl Into<String>,
    ) -> Self {
        Self::MirrorFailed {
            project: project.into(),
            stage,
            branch: None,
            message: message.into(),
        }
    }

    /// Build a [`MigrationError::MirrorFailed`] for a single branch.
    pub fn branch(
        project: impl Into<String>,
        stage: MirrorStage,
        branch: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MirrorFailed {
            project: project.into(),
            stage,
            branch: Some(branch.into()),
            message: message.into(),
        }
    }

    /// Whether this error aborts a whole bulk operation.
    #[must_use]
    pub fn is_namespace_level(&self) -> bool {
        matches!(
            self,
            Self::NamespaceNotFound { .. } | Self::UpstreamFetchFailed { .. }
        )
    }
}
