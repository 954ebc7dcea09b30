use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::MigrationError;
use crate::migrate::{MigrationProgress, ProgressCallback, emit};
use crate::namespace::Project;
use crate::platform::RepoHandle;
use crate::vcs::{DESTINATION_REMOTE, VersionControl};

use super::types::{BranchMirrorReport, MirrorStage, StageTimeouts};

/// Prefix of the per-project scratch directories.
const WORKDIR_PREFIX: &str = "gl2gh-";

/// Directory name of the working copy inside the scratch directory.
const WORKING_COPY_DIR: &str = "repo";

/// Await `fut` for at most `limit`, flattening a timeout into the error
/// message.
async fn bounded<T, E, F>(limit: Duration, fut: F) -> Result<T, String>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", limit.as_secs())),
    }
}

/// Replays every branch of a source project onto its destination repository.
#[derive(Clone)]
pub struct RepositoryMirror {
    vcs: Arc<dyn VersionControl>,
    timeouts: StageTimeouts,
}

impl RepositoryMirror {
    pub fn new(vcs: Arc<dyn VersionControl>, timeouts: StageTimeouts) -> Self {
        Self { vcs, timeouts }
    }

    /// Clone `project`, attach `handle` as the `destination` remote and push
    /// every source branch to it.
    ///
    /// Clone, add-remote and branch listing failures abort with `Err`.
    /// Checkout and push failures are recorded per branch in the returned
    /// report and the remaining branches are still attempted. The working
    /// copy lives in a scratch directory removed when this call returns.
    #[tracing::instrument(skip(self, project, handle, on_progress), fields(project = %project.path_with_namespace))]
    pub async fn mirror(
        &self,
        project: &Project,
        handle: &RepoHandle,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<BranchMirrorReport, MigrationError> {
        let path = project.path_with_namespace.as_str();
        let abort = |stage: MirrorStage, message: String| MigrationError::mirror(path, stage, message);

        let scratch = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()
            .map_err(|e| abort(MirrorStage::Clone, format!("cannot create working directory: {e}")))?;
        let target = scratch.path().join(WORKING_COPY_DIR);

        let copy = bounded(
            self.timeouts.clone,
            self.vcs.clone_to_local(&project.source_clone_url, &target),
        )
        .await
        .map_err(|m| abort(MirrorStage::Clone, m))?;

        bounded(
            self.timeouts.add_remote,
            self.vcs.add_remote(&copy, DESTINATION_REMOTE, &handle.clone_url),
        )
        .await
        .map_err(|m| abort(MirrorStage::AddRemote, m))?;

        let branches = bounded(self.timeouts.list_branches, self.vcs.list_branches(&copy))
            .await
            .map_err(|m| abort(MirrorStage::ListBranches, m))?;

        tracing::debug!(count = branches.len(), "Listed source branches");

        let mut report = BranchMirrorReport {
            project: path.to_string(),
            branches: branches.clone(),
            ..Default::default()
        };

        for branch in branches {
            let replayed = match bounded(
                self.timeouts.checkout,
                self.vcs.checkout_branch(&copy, &branch),
            )
            .await
            {
                Ok(()) => bounded(
                    self.timeouts.push,
                    self.vcs.push_branch(&copy, DESTINATION_REMOTE, &branch),
                )
                .await
                .map_err(|m| (MirrorStage::Push, m)),
                Err(m) => Err((MirrorStage::Checkout, m)),
            };

            match replayed {
                Ok(()) => {
                    emit(
                        on_progress,
                        MigrationProgress::BranchPushed {
                            project: path.to_string(),
                            branch: branch.clone(),
                        },
                    );
                    report.pushed.push(branch);
                }
                Err((stage, message)) => {
                    tracing::warn!(branch = %branch, stage = %stage, "Branch mirror failed: {message}");
                    let err = MigrationError::branch(path, stage, branch.clone(), message);
                    emit(
                        on_progress,
                        MigrationProgress::BranchFailed {
                            project: path.to_string(),
                            branch,
                            error: err.to_string(),
                        },
                    );
                    report.failures.push(err);
                }
            }
        }

        Ok(report)
    }
}
