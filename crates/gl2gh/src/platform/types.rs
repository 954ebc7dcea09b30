use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::namespace::GroupDetail;

use super::errors::Result;

/// Rate limit information parsed from response headers.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Maximum requests allowed per period.
    pub limit: usize,
    /// Remaining requests in current period.
    pub remaining: usize,
    /// When the rate limit resets.
    pub reset_at: DateTime<Utc>,
}

/// A repository created on the destination platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// HTTPS URL the mirror pushes to.
    pub clone_url: String,
    /// Browser URL.
    pub html_url: String,
}

/// Parameters for creating a destination repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepository {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private: bool,
}

/// Branch protection rule set applied to a single destination branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchProtectionRules {
    /// Status checks that must pass before merging.
    pub required_status_checks_contexts: Vec<String>,
    /// Number of approving reviews required.
    pub required_approving_review_count: u32,
    /// Invalidate approvals when new commits are pushed.
    pub dismiss_stale_reviews: bool,
    /// Apply the rules to administrators too.
    pub enforce_admins: bool,
    /// Require branches to be up to date before merging.
    pub strict_status_checks: bool,
}

impl BranchProtectionRules {
    /// Add a required status check, ignoring duplicates.
    #[must_use]
    pub fn with_status_check(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        if !self.required_status_checks_contexts.contains(&context) {
            self.required_status_checks_contexts.push(context);
        }
        self
    }
}

/// Confirmation returned after applying branch protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectionConfirmation {
    /// HTTP status returned by the platform.
    pub status: u16,
    /// The rule set as echoed back by the platform.
    pub rules: BranchProtectionRules,
}

/// Confirmation returned after archiving a source project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfirmation {
    /// HTTP status returned by the platform.
    pub status: u16,
    /// Path of the archived project.
    pub path_with_namespace: String,
    /// Archive flag as reported by the platform after the call.
    pub archived: bool,
}

/// Source platform: resolves the group namespace and archives projects.
///
/// Implementations map a missing group/subgroup/project to
/// [`PlatformError::NotFound`](super::PlatformError::NotFound) and connection
/// failures to [`PlatformError::Network`](super::PlatformError::Network).
#[async_trait]
pub trait SourcePlatform: Send + Sync {
    /// Fetch a top-level group with its direct and shared projects.
    async fn fetch_group(&self, group: &str) -> Result<GroupDetail>;

    /// Fetch the subgroup `subgroup` of the group at `group_path`.
    async fn fetch_subgroup(&self, group_path: &str, subgroup: &str) -> Result<GroupDetail>;

    /// List the names of the direct subgroups of `group_path`, in the order
    /// the platform reports them.
    async fn fetch_subgroup_names(&self, group_path: &str) -> Result<Vec<String>>;

    /// Mark a project archived.
    async fn archive_project(&self, project_path: &str) -> Result<ArchiveConfirmation>;
}

/// Destination platform: provisions repositories and protects branches.
#[async_trait]
pub trait DestinationPlatform: Send + Sync {
    /// Create a repository under `owner`, or under the authenticated
    /// account when `owner` is `None`.
    async fn create_repository(
        &self,
        owner: Option<&str>,
        request: &CreateRepository,
    ) -> Result<RepoHandle>;

    /// Apply a protection rule set to one branch.
    async fn configure_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        rules: &BranchProtectionRules,
    ) -> Result<ProtectionConfirmation>;
}
