use gl2gh::MigrationProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: MigrationProgress) {
        match event {
            MigrationProgress::NamespaceResolved {
                group,
                total,
                matched,
            } => {
                tracing::info!(group = %group, total, matched, "Resolved namespace");
            }

            MigrationProgress::MigrationStarted { count, concurrency } => {
                tracing::info!(count, concurrency, "Migrating projects");
            }

            MigrationProgress::ProjectStarted { project } => {
                tracing::debug!(project = %project, "Migrating project");
            }

            MigrationProgress::RepositoryProvisioned { project, full_name } => {
                tracing::info!(project = %project, repo = %full_name, "Created destination repository");
            }

            MigrationProgress::BranchPushed { project, branch } => {
                tracing::debug!(project = %project, branch = %branch, "Pushed branch");
            }

            MigrationProgress::BranchFailed {
                project,
                branch,
                error,
            } => {
                tracing::warn!(project = %project, branch = %branch, error = %error, "Failed to mirror branch");
            }

            MigrationProgress::ProjectFinished {
                project,
                pushed,
                error,
            } => match error {
                None => tracing::info!(project = %project, branches = pushed, "Project migrated"),
                Some(error) => {
                    tracing::error!(project = %project, branches = pushed, error = %error, "Project failed")
                }
            },

            MigrationProgress::MigrationComplete { succeeded, failed } => {
                tracing::info!(succeeded, failed, "Migration complete");
            }

            MigrationProgress::RateLimitBackoff {
                target,
                retry_after_ms,
                attempt,
            } => {
                tracing::warn!(
                    target_name = %target,
                    retry_after_ms,
                    attempt,
                    "Rate limited, backing off"
                );
            }

            MigrationProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
