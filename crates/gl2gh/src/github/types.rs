//! GitHub API data types.

use serde::{Deserialize, Serialize};

use crate::platform::{BranchProtectionRules, RepoHandle};

/// Repository owner as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

/// Repository as returned by `POST /orgs/:org/repos` and `POST /user/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub full_name: String,
    pub owner: GitHubOwner,
    pub clone_url: String,
    pub html_url: String,
}

impl From<GitHubRepo> for RepoHandle {
    fn from(repo: GitHubRepo) -> Self {
        Self {
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
            clone_url: repo.clone_url,
            html_url: repo.html_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequiredStatusChecks {
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub contexts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequiredPullRequestReviews {
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
    #[serde(default)]
    pub required_approving_review_count: u32,
}

/// Body of `PUT /repos/:owner/:repo/branches/:branch/protection`.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectionRequest {
    pub required_status_checks: RequiredStatusChecks,
    pub enforce_admins: bool,
    pub required_pull_request_reviews: RequiredPullRequestReviews,
    /// Always `null`: no push restrictions.
    pub restrictions: Option<()>,
}

impl From<&BranchProtectionRules> for ProtectionRequest {
    fn from(rules: &BranchProtectionRules) -> Self {
        Self {
            required_status_checks: RequiredStatusChecks {
                strict: rules.strict_status_checks,
                contexts: rules.required_status_checks_contexts.clone(),
            },
            enforce_admins: rules.enforce_admins,
            required_pull_request_reviews: RequiredPullRequestReviews {
                dismiss_stale_reviews: rules.dismiss_stale_reviews,
                required_approving_review_count: rules.required_approving_review_count,
            },
            restrictions: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EnabledFlag {
    #[serde(default)]
    pub enabled: bool,
}

/// Protection settings as echoed back by GitHub.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProtectionResponse {
    #[serde(default)]
    pub required_status_checks: Option<RequiredStatusChecks>,
    #[serde(default)]
    pub enforce_admins: Option<EnabledFlag>,
    #[serde(default)]
    pub required_pull_request_reviews: Option<RequiredPullRequestReviews>,
}

impl From<ProtectionResponse> for BranchProtectionRules {
    fn from(resp: ProtectionResponse) -> Self {
        let checks = resp.required_status_checks.unwrap_or_default();
        let reviews = resp.required_pull_request_reviews.unwrap_or_default();
        Self {
            required_status_checks_contexts: checks.contexts,
            required_approving_review_count: reviews.required_approving_review_count,
            dismiss_stale_reviews: reviews.dismiss_stale_reviews,
            enforce_admins: resp.enforce_admins.map(|f| f.enabled).unwrap_or(false),
            strict_status_checks: checks.strict,
        }
    }
}
