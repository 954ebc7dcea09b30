use std::sync::Arc;
use std::time::Duration;

use crate::error::MigrationError;
use crate::migrate::ProgressCallback;
use crate::namespace::Project;
use crate::platform::{
    CreateRepository, DestinationPlatform, PlatformError, RepoHandle, short_error_message,
};
use crate::retry::with_retry;

/// Creates one destination repository per source project.
#[derive(Clone)]
pub struct DestinationProvisioner {
    destination: Arc<dyn DestinationPlatform>,
    private: bool,
    timeout: Duration,
}

impl DestinationProvisioner {
    pub fn new(destination: Arc<dyn DestinationPlatform>, private: bool, timeout: Duration) -> Self {
        Self {
            destination,
            private,
            timeout,
        }
    }

    /// Build the creation request for `project`.
    #[must_use]
    pub fn request_for(&self, project: &Project) -> CreateRepository {
        CreateRepository {
            name: project.name.clone(),
            description: project.description.clone(),
            private: self.private,
        }
    }

    /// Create the destination repository for `project` under `owner`, or under
    /// the authenticated account when `owner` is `None`.
    ///
    /// Rate-limited responses are retried with backoff; everything else,
    /// including "already exists", fails with
    /// [`MigrationError::ProvisionFailed`].
    #[tracing::instrument(skip(self, project, on_progress), fields(project = %project.path_with_namespace))]
    pub async fn provision(
        &self,
        project: &Project,
        owner: Option<&str>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<RepoHandle, MigrationError> {
        if project.path_with_namespace.is_empty() {
            return Err(MigrationError::ProvisionFailed {
                project: project.name.clone(),
                message: "project has no path_with_namespace".to_string(),
            });
        }

        let failed = |message: String| MigrationError::ProvisionFailed {
            project: project.path_with_namespace.clone(),
            message,
        };

        let request = self.request_for(project);
        let target = match owner {
            Some(owner) => format!("{owner}/{}", request.name),
            None => request.name.clone(),
        };

        let create = with_retry(
            || self.destination.create_repository(owner, &request),
            |e: &PlatformError| e.is_rate_limited(),
            |e: &PlatformError| short_error_message(e),
            &target,
            on_progress,
        );

        let handle = tokio::time::timeout(self.timeout, create)
            .await
            .map_err(|_| failed(format!("timed out after {}s", self.timeout.as_secs())))?
            .map_err(|e| failed(short_error_message(&e)))?;

        tracing::debug!(full_name = %handle.full_name, "Provisioned destination repository");
        Ok(handle)
    }
}
