//! Options and constants shared by the migration pipeline.

use crate::mirror::StageTimeouts;

/// Default number of projects migrated at the same time.
///
/// Each project holds a clone on disk and a push in flight, so this stays
/// small.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Maximum backoff delay in milliseconds when rate limited.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum retries for one rate-limited API call.
pub const MAX_RETRIES: u32 = 5;

/// Options for bulk migration.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Destination organization. `None` creates repositories under the
    /// authenticated account.
    pub destination_owner: Option<String>,
    /// Maximum projects migrated at the same time (at least 1).
    pub concurrency: usize,
    /// Create destination repositories as private.
    pub private: bool,
    /// Per-stage time limits.
    pub timeouts: StageTimeouts,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            destination_owner: None,
            concurrency: DEFAULT_CONCURRENCY,
            private: true,
            timeouts: StageTimeouts::default(),
        }
    }
}

impl MigrateOptions {
    /// Set the destination organization.
    #[must_use]
    pub fn with_destination_owner(mut self, owner: impl Into<String>) -> Self {
        self.destination_owner = Some(owner.into());
        self
    }

    /// Set the concurrency level.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set repository visibility.
    #[must_use]
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// Set stage timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Concurrency actually used for `projects` projects: clamped to
    /// `1..=projects` (and at least 1 when there are none).
    #[must_use]
    pub fn effective_concurrency(&self, projects: usize) -> usize {
        self.concurrency.min(projects).max(1)
    }
}
