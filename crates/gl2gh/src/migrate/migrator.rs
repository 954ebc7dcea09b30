use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;

use crate::error::{ArchiveFailure, MigrationError};
use crate::mirror::{BranchMirrorReport, DestinationProvisioner, RepositoryMirror};
use crate::namespace::{Project, filter_by_prefix, walk};
use crate::platform::{
    ArchiveConfirmation, BranchProtectionRules, DestinationPlatform, PlatformError,
    ProtectionConfirmation, SourcePlatform, short_error_message,
};
use crate::retry::with_retry;
use crate::vcs::VersionControl;

use super::outcome::{MigrationOutcome, OutcomeRecorder};
use super::progress::{MigrationProgress, ProgressCallback, emit};
use super::types::MigrateOptions;

/// Moves a GitLab group tree to GitHub.
///
/// Composes namespace resolution, prefix filtering, provisioning and
/// branch mirroring; also exposes branch protection and archival as
/// standalone operations.
pub struct Migrator {
    source: Arc<dyn SourcePlatform>,
    destination: Arc<dyn DestinationPlatform>,
    vcs: Arc<dyn VersionControl>,
    options: MigrateOptions,
    on_progress: Option<Arc<ProgressCallback>>,
}

impl Migrator {
    pub fn new(
        source: Arc<dyn SourcePlatform>,
        destination: Arc<dyn DestinationPlatform>,
        vcs: Arc<dyn VersionControl>,
        options: MigrateOptions,
    ) -> Self {
        Self {
            source,
            destination,
            vcs,
            options,
            on_progress: None,
        }
    }

    /// Report progress through `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn options(&self) -> &MigrateOptions {
        &self.options
    }

    fn progress(&self) -> Option<&ProgressCallback> {
        self.on_progress.as_deref()
    }

    /// Every project under `group` (subgroups and shared projects included),
    /// sorted by name and narrowed to names starting with `prefix`.
    pub async fn list_projects_to_migrate(
        &self,
        group: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<Project>, MigrationError> {
        let all = walk(self.source.as_ref(), group).await?;
        let total = all.len();
        let projects = filter_by_prefix(all, prefix);

        emit(
            self.progress(),
            MigrationProgress::NamespaceResolved {
                group: group.to_string(),
                total,
                matched: projects.len(),
            },
        );
        tracing::info!(group, total, matched = projects.len(), "Resolved projects to migrate");

        Ok(projects)
    }

    /// Provision a destination repository for every project under `group`
    /// and push all of its branches there.
    ///
    /// Repositories are created under `destination_owner`, or under the
    /// authenticated account when it is `None`. A namespace that cannot be
    /// resolved aborts before anything is created; a failing project is
    /// recorded and the others still run. Returns only once every project
    /// has finished.
    #[tracing::instrument(skip(self))]
    pub async fn copy_content(
        &self,
        group: &str,
        destination_owner: Option<&str>,
        prefix: Option<&str>,
    ) -> MigrationOutcome {
        let projects = match self.list_projects_to_migrate(group, prefix).await {
            Ok(projects) => projects,
            Err(e) => {
                tracing::warn!("Aborting migration: {e}");
                emit(
                    self.progress(),
                    MigrationProgress::Warning {
                        message: e.to_string(),
                    },
                );
                return MigrationOutcome::aborted(e);
            }
        };

        let outcome = self.migrate_projects(projects, destination_owner).await;

        emit(
            self.progress(),
            MigrationProgress::MigrationComplete {
                succeeded: outcome.succeeded.len(),
                failed: outcome.failed.len(),
            },
        );
        tracing::info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Migration finished"
        );

        outcome
    }

    /// [`copy_content`](Self::copy_content) with the destination owner
    /// taken from [`MigrateOptions::destination_owner`].
    pub async fn migrate_to_github(&self, group: &str, prefix: Option<&str>) -> MigrationOutcome {
        let owner = self.options.destination_owner.clone();
        self.copy_content(group, owner.as_deref(), prefix).await
    }

    /// Run provision + mirror for each project, bounded by the configured
    /// concurrency.
    ///
    /// Projects sharing a name target the same destination repository, so
    /// they form one task and run in list order. Distinct names run in
    /// parallel.
    async fn migrate_projects(
        &self,
        projects: Vec<Project>,
        destination_owner: Option<&str>,
    ) -> MigrationOutcome {
        let recorder = OutcomeRecorder::default();

        if projects.is_empty() {
            return recorder.snapshot();
        }

        let count = projects.len();
        let batches = batch_by_name(projects);
        let concurrency = self.options.effective_concurrency(batches.len());
        let semaphore = Arc::new(Semaphore::new(concurrency));

        emit(
            self.progress(),
            MigrationProgress::MigrationStarted { count, concurrency },
        );

        let provisioner = DestinationProvisioner::new(
            Arc::clone(&self.destination),
            self.options.private,
            self.options.timeouts.provision,
        );
        let mirror = RepositoryMirror::new(Arc::clone(&self.vcs), self.options.timeouts);
        let owner = destination_owner.map(str::to_string);

        let mut handles = Vec::with_capacity(batches.len());

        for batch in batches {
            let semaphore = Arc::clone(&semaphore);
            let provisioner = provisioner.clone();
            let mirror = mirror.clone();
            let owner = owner.clone();
            let on_progress = self.on_progress.clone();
            let recorder = recorder.clone();
            let paths: Vec<String> = batch
                .iter()
                .map(|p| p.path_with_namespace.clone())
                .collect();
            let finished = Arc::new(AtomicUsize::new(0));
            let progress = Arc::clone(&finished);

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        for project in &batch {
                            let path = project.path_with_namespace.as_str();
                            recorder.record_failure(
                                path,
                                vec![MigrationError::TaskFailed {
                                    project: path.to_string(),
                                    message: "semaphore closed unexpectedly".to_string(),
                                }],
                            );
                        }
                        return;
                    }
                };

                for project in &batch {
                    let path = project.path_with_namespace.as_str();
                    let result = migrate_project(
                        &provisioner,
                        &mirror,
                        project,
                        owner.as_deref(),
                        on_progress.as_deref(),
                    )
                    .await;

                    match result {
                        Ok(_) => recorder.record_success(path),
                        Err(errors) => recorder.record_failure(path, errors),
                    }
                    progress.fetch_add(1, Ordering::SeqCst);
                }
            });

            handles.push((paths, finished, handle));
        }

        for (paths, finished, handle) in handles {
            if let Err(e) = handle.await {
                // The panicking project and every one queued after it in
                // the same batch.
                let done = finished.load(Ordering::SeqCst);
                for path in &paths[done..] {
                    tracing::warn!(project = %path, "Migration task panicked: {e}");
                    recorder.record_failure(
                        path,
                        vec![MigrationError::TaskFailed {
                            project: path.clone(),
                            message: e.to_string(),
                        }],
                    );
                }
            }
        }

        recorder.snapshot()
    }

    /// Apply `rules` to one destination branch and return what the platform
    /// echoed back.
    pub async fn configure_branch_protection_rule(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        rules: &BranchProtectionRules,
    ) -> Result<ProtectionConfirmation, MigrationError> {
        let target = format!("{owner}/{repo}:{branch}");
        with_retry(
            || {
                self.destination
                    .configure_branch_protection(owner, repo, branch, rules)
            },
            |e: &PlatformError| e.is_rate_limited(),
            |e: &PlatformError| short_error_message(e),
            &target,
            self.progress(),
        )
        .await
        .map_err(|e| MigrationError::ProtectionConfigFailed {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            message: short_error_message(&e),
        })
    }

    /// Mark a source project archived.
    pub async fn archive_project(
        &self,
        project_path: &str,
    ) -> Result<ArchiveConfirmation, MigrationError> {
        with_retry(
            || self.source.archive_project(project_path),
            |e: &PlatformError| e.is_rate_limited(),
            |e: &PlatformError| short_error_message(e),
            project_path,
            self.progress(),
        )
        .await
        .map_err(|e| MigrationError::ArchiveFailed {
            project_path: project_path.to_string(),
            reason: if e.is_not_found() {
                ArchiveFailure::NotFound
            } else {
                ArchiveFailure::Upstream(short_error_message(&e))
            },
        })
    }
}

/// Split a name-sorted project list into runs of equal `name`, keeping
/// list order inside each run.
fn batch_by_name(projects: Vec<Project>) -> Vec<Vec<Project>> {
    let mut batches: Vec<Vec<Project>> = Vec::new();
    for project in projects {
        match batches.last_mut() {
            Some(batch) if batch[0].name == project.name => batch.push(project),
            _ => batches.push(vec![project]),
        }
    }
    batches
}

/// Provision then mirror one project.
///
/// `Err` carries every error that made the project fail: the provision or
/// stage error, or one error per failed branch.
async fn migrate_project(
    provisioner: &DestinationProvisioner,
    mirror: &RepositoryMirror,
    project: &Project,
    owner: Option<&str>,
    on_progress: Option<&ProgressCallback>,
) -> Result<BranchMirrorReport, Vec<MigrationError>> {
    let path = project.path_with_namespace.clone();

    emit(
        on_progress,
        MigrationProgress::ProjectStarted {
            project: path.clone(),
        },
    );

    let mirrored = async {
        let handle = provisioner.provision(project, owner, on_progress).await?;

        emit(
            on_progress,
            MigrationProgress::RepositoryProvisioned {
                project: path.clone(),
                full_name: handle.full_name.clone(),
            },
        );

        mirror.mirror(project, &handle, on_progress).await
    }
    .await;

    let (pushed, result) = match mirrored {
        Ok(report) if report.is_complete() => (report.pushed.len(), Ok(report)),
        Ok(report) => (report.pushed.len(), Err(report.failures)),
        Err(e) => (0, Err(vec![e])),
    };

    let error = match &result {
        Ok(_) => {
            tracing::info!(project = %path, branches = pushed, "Project migrated");
            None
        }
        Err(errors) => {
            let first = errors.first().map(ToString::to_string);
            tracing::warn!(
                project = %path,
                errors = errors.len(),
                "Project failed: {}",
                first.as_deref().unwrap_or("unknown error")
            );
            first
        }
    };

    emit(
        on_progress,
        MigrationProgress::ProjectFinished {
            project: path,
            pushed,
            error,
        },
    );

    result
}
