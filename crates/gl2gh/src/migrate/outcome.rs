use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use crate::error::MigrationError;

/// Aggregate result of one bulk migration.
///
/// A project listed by several groups is attempted once per listing. A
/// path is in `succeeded` only if every attempt succeeded; otherwise it is
/// in `failed` with the errors of every failed attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// `path_with_namespace` of every fully mirrored project.
    pub succeeded: BTreeSet<String>,
    /// Errors per failed project.
    pub failed: BTreeMap<String, Vec<MigrationError>>,
    /// Set when the namespace could not be resolved; nothing was migrated.
    pub aborted: Option<MigrationError>,
}

impl MigrationOutcome {
    /// Outcome of a migration that never got past namespace resolution.
    #[must_use]
    pub fn aborted(error: MigrationError) -> Self {
        Self {
            aborted: Some(error),
            ..Self::default()
        }
    }

    /// `0` when the namespace resolved and every project succeeded, `1`
    /// otherwise.
    #[must_use]
    pub fn status_code(&self) -> i32 {
        if self.aborted.is_none() && self.failed.is_empty() {
            0
        } else {
            1
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code() == 0
    }

    pub fn record_success(&mut self, project: impl Into<String>) {
        let project = project.into();
        if !self.failed.contains_key(&project) {
            self.succeeded.insert(project);
        }
    }

    pub fn record_failure(&mut self, project: impl Into<String>, errors: Vec<MigrationError>) {
        let project = project.into();
        self.succeeded.remove(&project);
        self.failed.entry(project).or_default().extend(errors);
    }
}

/// Shared accumulator the per-project tasks write into.
#[derive(Debug, Clone, Default)]
pub(crate) struct OutcomeRecorder {
    inner: Arc<Mutex<MigrationOutcome>>,
}

impl OutcomeRecorder {
    pub(crate) fn record_success(&self, project: &str) {
        self.lock().record_success(project);
    }

    pub(crate) fn record_failure(&self, project: &str, errors: Vec<MigrationError>) {
        self.lock().record_failure(project, errors);
    }

    pub(crate) fn snapshot(&self) -> MigrationOutcome {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MigrationOutcome> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
