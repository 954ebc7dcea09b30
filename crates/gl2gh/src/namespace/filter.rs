use super::types::Project;

/// Keep only projects whose name starts with `prefix`.
///
/// The match is literal and case-sensitive. An absent or empty prefix keeps
/// everything. Relative order is preserved.
#[must_use]
pub fn filter_by_prefix(projects: Vec<Project>, prefix: Option<&str>) -> Vec<Project> {
    match prefix {
        None | Some("") => projects,
        Some(prefix) => projects
            .into_iter()
            .filter(|project| project.name.starts_with(prefix))
            .collect(),
    }
}
