use serde::Serialize;

/// One source-control repository on the source platform.
///
/// Fetched once during namespace resolution and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    /// Display name. Not unique across a namespace.
    pub name: String,
    /// Full path including namespace (e.g. "group/subgroup/project").
    pub path_with_namespace: String,
    /// HTTPS clone URL of the source repository.
    pub source_clone_url: String,
    /// Whether the project is archived on the source platform.
    pub archived: bool,
    /// Project description, forwarded to the destination repository.
    pub description: Option<String>,
}

/// What a single group or subgroup lookup returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDetail {
    /// Group display name.
    pub name: String,
    /// Projects owned directly by the group.
    pub projects: Vec<Project>,
    /// Projects shared into the group from elsewhere.
    pub shared_projects: Vec<Project>,
}

/// One resolved group or subgroup.
///
/// Children are referenced by name only; the walker resolves them on demand
/// and drops each node once its projects have been taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceNode {
    pub name: String,
    /// Full path used to address the node (e.g. "FOO/subgroup1").
    pub full_path: String,
    pub direct_projects: Vec<Project>,
    pub shared_projects: Vec<Project>,
    /// Direct subgroup names in platform order.
    pub child_subgroup_names: Vec<String>,
}

impl NamespaceNode {
    pub(crate) fn from_detail(
        full_path: String,
        detail: GroupDetail,
        child_subgroup_names: Vec<String>,
    ) -> Self {
        Self {
            name: detail.name,
            full_path,
            direct_projects: detail.projects,
            shared_projects: detail.shared_projects,
            child_subgroup_names,
        }
    }

    /// Full path of the named child subgroup.
    #[must_use]
    pub fn child_path(&self, child: &str) -> String {
        format!("{}/{}", self.full_path, child)
    }

    /// Consume the node, yielding its projects (direct first, then shared)
    /// and its child subgroup names.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Project>, Vec<String>) {
        let mut projects = self.direct_projects;
        projects.extend(self.shared_projects);
        (projects, self.child_subgroup_names)
    }
}
