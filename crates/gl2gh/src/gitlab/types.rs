//! GitLab API data types.
//!
//! Only the fields the migration reads are modelled; everything else in the
//! response is ignored.

use serde::Deserialize;

use crate::namespace::{GroupDetail, Project};
use crate::platform::ArchiveConfirmation;

/// GitLab project as embedded in a group detail response.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabProject {
    /// Project name.
    pub name: String,
    /// Full path including namespace (e.g., "group/subgroup/project").
    pub path_with_namespace: String,
    /// HTTP clone URL.
    pub http_url_to_repo: String,
    /// Whether the project is archived.
    #[serde(default)]
    pub archived: bool,
    /// Project description.
    #[serde(default)]
    pub description: Option<String>,
}

impl From<GitLabProject> for Project {
    fn from(p: GitLabProject) -> Self {
        Self {
            name: p.name,
            path_with_namespace: p.path_with_namespace,
            source_clone_url: p.http_url_to_repo,
            archived: p.archived,
            description: p.description.filter(|d| !d.trim().is_empty()),
        }
    }
}

/// `GET /groups/:id` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabGroupDetail {
    /// Group name.
    pub name: String,
    /// Full path (e.g., "group/subgroup").
    #[serde(default)]
    pub full_path: Option<String>,
    /// Projects owned by the group.
    #[serde(default)]
    pub projects: Vec<GitLabProject>,
    /// Projects shared with the group.
    #[serde(default)]
    pub shared_projects: Vec<GitLabProject>,
}

impl From<GitLabGroupDetail> for GroupDetail {
    fn from(g: GitLabGroupDetail) -> Self {
        Self {
            name: g.name,
            projects: g.projects.into_iter().map(Project::from).collect(),
            shared_projects: g.shared_projects.into_iter().map(Project::from).collect(),
        }
    }
}

/// Entry of `GET /groups/:id/subgroups`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabSubgroup {
    /// Subgroup display name.
    pub name: String,
    /// URL slug; what the subgroup is addressed by.
    #[serde(default)]
    pub path: Option<String>,
    /// Full path (e.g., "group/subgroup").
    #[serde(default)]
    pub full_path: Option<String>,
}

impl GitLabSubgroup {
    /// Segment appended to the parent path to address this subgroup.
    pub fn segment(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// `POST /projects/:id/archive` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabArchivedProject {
    pub path_with_namespace: String,
    #[serde(default)]
    pub archived: bool,
}

impl GitLabArchivedProject {
    pub fn into_confirmation(self, status: u16) -> ArchiveConfirmation {
        ArchiveConfirmation {
            status,
            path_with_namespace: self.path_with_namespace,
            archived: self.archived,
        }
    }
}
