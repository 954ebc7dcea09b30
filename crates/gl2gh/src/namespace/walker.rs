use std::future::Future;
use std::pin::Pin;

use crate::error::MigrationError;
use crate::platform::SourcePlatform;

use super::types::{GroupDetail, NamespaceNode, Project};

type VisitFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Project>, MigrationError>> + Send + 'a>>;

/// Resolve `root_group` into the flat, sorted list of every project it
/// contains, including shared projects and all subgroups transitively.
///
/// The result is sorted by project name (byte order); projects with equal
/// names keep their discovery order: root direct projects, root shared
/// projects, then subgroups depth-first in the order the platform lists
/// them. Projects reported by several nodes appear once per occurrence.
///
/// Any lookup failure aborts the walk: a missing root group is
/// [`MigrationError::NamespaceNotFound`], everything else (including a
/// missing subgroup) is [`MigrationError::UpstreamFetchFailed`].
#[tracing::instrument(skip(source))]
pub async fn walk(
    source: &dyn SourcePlatform,
    root_group: &str,
) -> Result<Vec<Project>, MigrationError> {
    let detail = source.fetch_group(root_group).await.map_err(|e| {
        if e.is_not_found() {
            MigrationError::NamespaceNotFound {
                group: root_group.to_string(),
            }
        } else {
            MigrationError::upstream(format!("group {root_group}"), &e)
        }
    })?;

    let root = resolve_node(source, root_group.to_string(), detail).await?;
    let mut projects = visit(source, root).await?;

    // Stable sort: equal names stay in discovery order.
    projects.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::debug!(count = projects.len(), "Namespace resolved");
    Ok(projects)
}

/// Pair a fetched group detail with its subgroup names.
async fn resolve_node(
    source: &dyn SourcePlatform,
    full_path: String,
    detail: GroupDetail,
) -> Result<NamespaceNode, MigrationError> {
    let children = source
        .fetch_subgroup_names(&full_path)
        .await
        .map_err(|e| MigrationError::upstream(format!("subgroups of {full_path}"), &e))?;

    Ok(NamespaceNode::from_detail(full_path, detail, children))
}

/// Collect the projects of `node` and of every subgroup below it.
fn visit(source: &dyn SourcePlatform, node: NamespaceNode) -> VisitFuture<'_> {
    Box::pin(async move {
        let parent_path = node.full_path.clone();
        tracing::debug!(
            namespace = %parent_path,
            direct = node.direct_projects.len(),
            shared = node.shared_projects.len(),
            subgroups = node.child_subgroup_names.len(),
            "Visiting namespace"
        );

        let child_paths: Vec<String> = node
            .child_subgroup_names
            .iter()
            .map(|child| node.child_path(child))
            .collect();
        let (mut projects, children) = node.into_parts();

        for (child, child_path) in children.into_iter().zip(child_paths) {
            let detail = source
                .fetch_subgroup(&parent_path, &child)
                .await
                .map_err(|e| MigrationError::upstream(format!("subgroup {child_path}"), &e))?;

            let child_node = resolve_node(source, child_path, detail).await?;
            projects.extend(visit(source, child_node).await?);
        }

        Ok(projects)
    })
}
