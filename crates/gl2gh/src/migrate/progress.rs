//! Progress events emitted during migration.
//!
//! Library code never prints; the CLI turns these events into spinners or
//! log lines.

/// Progress events emitted by the [`Migrator`](super::Migrator) and the
/// mirror pipeline.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum MigrationProgress {
    /// The group tree was walked and filtered.
    NamespaceResolved {
        /// Root group name.
        group: String,
        /// Projects found before filtering.
        total: usize,
        /// Projects left after the prefix filter.
        matched: usize,
    },

    /// Starting to migrate the resolved projects.
    MigrationStarted {
        /// Number of projects to migrate.
        count: usize,
        /// Number of projects migrated at the same time.
        concurrency: usize,
    },

    /// Work began on one project.
    ProjectStarted {
        /// `path_with_namespace` of the project.
        project: String,
    },

    /// The destination repository was created.
    RepositoryProvisioned {
        project: String,
        /// `owner/name` of the new repository.
        full_name: String,
    },

    /// One branch reached the destination.
    BranchPushed { project: String, branch: String },

    /// One branch could not be checked out or pushed.
    BranchFailed {
        project: String,
        branch: String,
        error: String,
    },

    /// A project finished, successfully or not.
    ProjectFinished {
        project: String,
        /// Number of branches pushed.
        pushed: usize,
        /// First error, if the project failed.
        error: Option<String>,
    },

    /// Every project has been processed.
    MigrationComplete {
        /// Number of projects migrated.
        succeeded: usize,
        /// Number of projects that failed.
        failed: usize,
    },

    /// Rate limited, backing off before retrying.
    RateLimitBackoff {
        /// What was being attempted (e.g. `owner/repo`).
        target: String,
        /// Delay before the next attempt in milliseconds.
        retry_after_ms: u64,
        /// Attempt number (1-indexed).
        attempt: u32,
    },

    /// A non-fatal condition worth surfacing.
    Warning { message: String },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(MigrationProgress) + Send + Sync>;

/// Helper to emit progress events.
#[inline]
pub fn emit(callback: Option<&ProgressCallback>, event: MigrationProgress) {
    if let Some(cb) = callback {
        cb(event);
    }
}
