//! Bulk migration of a GitLab group tree to GitHub.
//!
//! [`Migrator`] resolves the namespace, filters it, then provisions and
//! mirrors each project in its own task. Project failures are isolated and
//! collected into a [`MigrationOutcome`]; only a namespace that cannot be
//! resolved stops the whole run.
//!
//! # Example
//!
//! ```ignore
//! let migrator = Migrator::new(source, destination, vcs, MigrateOptions::default())
//!     .with_progress(Box::new(|event| println!("{event:?}")));
//!
//! let outcome = migrator.copy_content("FOO", Some("BAR"), None).await;
//! std::process::exit(outcome.status_code());
//! ```

mod migrator;
mod outcome;
mod progress;
mod types;

pub use migrator::Migrator;
pub use outcome::MigrationOutcome;
pub use progress::{MigrationProgress, ProgressCallback, emit};
pub use types::{
    DEFAULT_CONCURRENCY, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_RETRIES, MigrateOptions,
};

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{ArchiveFailure, MigrationError};
    use crate::mirror::MirrorStage;
    use crate::namespace::{GroupDetail, Project};
    use crate::platform::{
        ArchiveConfirmation, BranchProtectionRules, CreateRepository, DestinationPlatform,
        PlatformError, ProtectionConfirmation, RepoHandle, Result as PlatformResult,
        SourcePlatform,
    };
    use crate::vcs::{VcsError, VersionControl, WorkingCopy};

    fn project(name: &str, path: &str) -> Project {
        Project {
            name: name.to_string(),
            path_with_namespace: path.to_string(),
            source_clone_url: format!("https://gitlab.com/{path}.git"),
            archived: false,
            description: Some(format!("{name} description")),
        }
    }

    /// Group tree keyed by full path, plus archivable project paths.
    #[derive(Default)]
    struct FakeSource {
        groups: HashMap<String, (GroupDetail, Vec<String>)>,
        archivable: HashSet<String>,
        archive_down: bool,
    }

    impl FakeSource {
        /// `FOO` with one direct project and a subgroup holding two more.
        fn foo() -> Self {
            Self::default()
                .group("FOO", vec![project("shared-project1", "FOO/shared-project1")], &["subgroup1"])
                .group(
                    "FOO/subgroup1",
                    vec![
                        project("repository-2", "FOO/subgroup1/repository-2"),
                        project("repository-1", "FOO/subgroup1/repository-1"),
                    ],
                    &[],
                )
        }

        fn group(mut self, path: &str, projects: Vec<Project>, children: &[&str]) -> Self {
            let detail = GroupDetail {
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                projects,
                shared_projects: Vec::new(),
            };
            let children = children.iter().map(|c| c.to_string()).collect();
            self.groups.insert(path.to_string(), (detail, children));
            self
        }

        fn lookup(&self, path: &str) -> PlatformResult<&(GroupDetail, Vec<String>)> {
            self.groups
                .get(path)
                .ok_or_else(|| PlatformError::not_found(format!("group: {path}")))
        }
    }

    #[async_trait]
    impl SourcePlatform for FakeSource {
        async fn fetch_group(&self, group: &str) -> PlatformResult<GroupDetail> {
            Ok(self.lookup(group)?.0.clone())
        }

        async fn fetch_subgroup(&self, group_path: &str, subgroup: &str) -> PlatformResult<GroupDetail> {
            Ok(self.lookup(&format!("{group_path}/{subgroup}"))?.0.clone())
        }

        async fn fetch_subgroup_names(&self, group_path: &str) -> PlatformResult<Vec<String>> {
            Ok(self.lookup(group_path)?.1.clone())
        }

        async fn archive_project(&self, project_path: &str) -> PlatformResult<ArchiveConfirmation> {
            if self.archive_down {
                return Err(PlatformError::network("connection refused"));
            }
            if !self.archivable.contains(project_path) {
                return Err(PlatformError::not_found(format!("project: {project_path}")));
            }
            Ok(ArchiveConfirmation {
                status: 201,
                path_with_namespace: project_path.to_string(),
                archived: true,
            })
        }
    }

    /// Records every repository creation; fails for configured names.
    ///
    /// `delay` stalls creation for requests with a given description, and
    /// `reject_repeats` refuses a name that was already created.
    #[derive(Default)]
    struct FakeDestination {
        created: Mutex<Vec<(Option<String>, CreateRepository)>>,
        reject: HashSet<String>,
        delay: HashMap<String, Duration>,
        reject_repeats: bool,
        taken: Mutex<HashMap<String, Option<String>>>,
    }

    impl FakeDestination {
        fn created(&self) -> Vec<(Option<String>, CreateRepository)> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DestinationPlatform for FakeDestination {
        async fn create_repository(
            &self,
            owner: Option<&str>,
            request: &CreateRepository,
        ) -> PlatformResult<RepoHandle> {
            if let Some(delay) = request.description.as_ref().and_then(|d| self.delay.get(d)) {
                tokio::time::sleep(*delay).await;
            }
            if self.reject_repeats {
                let mut taken = self.taken.lock().unwrap();
                if taken.contains_key(&request.name) {
                    return Err(PlatformError::api(422, "name already exists on this account"));
                }
                taken.insert(request.name.clone(), request.description.clone());
            }
            self.created
                .lock()
                .unwrap()
                .push((owner.map(str::to_string), request.clone()));
            if self.reject.contains(&request.name) {
                return Err(PlatformError::api(422, "name already exists on this account"));
            }
            let owner = owner.unwrap_or("me").to_string();
            Ok(RepoHandle {
                full_name: format!("{owner}/{}", request.name),
                clone_url: format!("https://github.com/{owner}/{}.git", request.name),
                html_url: format!("https://github.com/{owner}/{}", request.name),
                name: request.name.clone(),
                owner,
            })
        }

        async fn configure_branch_protection(
            &self,
            owner: &str,
            repo: &str,
            branch: &str,
            rules: &BranchProtectionRules,
        ) -> PlatformResult<ProtectionConfirmation> {
            if repo == "missing" {
                return Err(PlatformError::not_found(format!("branch: {owner}/{repo}:{branch}")));
            }
            Ok(ProtectionConfirmation {
                status: 200,
                rules: rules.clone(),
            })
        }
    }

    /// Every clone has the same branches; calls are counted per source URL.
    struct FakeVcs {
        branches: Vec<String>,
        sources: Mutex<HashMap<PathBuf, String>>,
        clones: Mutex<HashMap<String, usize>>,
        checkouts: AtomicUsize,
        pushes: Mutex<Vec<(String, String)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        panic_on: Option<String>,
    }

    impl FakeVcs {
        fn new(branches: &[&str]) -> Self {
            Self {
                branches: branches.iter().map(|b| b.to_string()).collect(),
                sources: Mutex::default(),
                clones: Mutex::default(),
                checkouts: AtomicUsize::new(0),
                pushes: Mutex::default(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                panic_on: None,
            }
        }

        fn clones_of(&self, url: &str) -> usize {
            self.clones.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        fn source_of(&self, copy: &WorkingCopy) -> String {
            self.sources
                .lock()
                .unwrap()
                .get(copy.path())
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl VersionControl for FakeVcs {
        async fn clone_to_local(&self, url: &str, into: &Path) -> Result<WorkingCopy, VcsError> {
            if self.panic_on.as_deref() == Some(url) {
                panic!("scripted panic for {url}");
            }

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            *self.clones.lock().unwrap().entry(url.to_string()).or_default() += 1;
            self.sources
                .lock()
                .unwrap()
                .insert(into.to_path_buf(), url.to_string());
            Ok(WorkingCopy::new(into))
        }

        async fn add_remote(&self, _copy: &WorkingCopy, _name: &str, _url: &str) -> Result<(), VcsError> {
            Ok(())
        }

        async fn list_branches(&self, _copy: &WorkingCopy) -> Result<Vec<String>, VcsError> {
            Ok(self.branches.clone())
        }

        async fn checkout_branch(&self, _copy: &WorkingCopy, _branch: &str) -> Result<(), VcsError> {
            self.checkouts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn push_branch(
            &self,
            copy: &WorkingCopy,
            _remote: &str,
            branch: &str,
        ) -> Result<(), VcsError> {
            let source = self.source_of(copy);
            self.pushes
                .lock()
                .unwrap()
                .push((source, branch.to_string()));
            Ok(())
        }
    }

    struct Harness {
        source: Arc<FakeSource>,
        destination: Arc<FakeDestination>,
        vcs: Arc<FakeVcs>,
    }

    impl Harness {
        fn new(source: FakeSource, destination: FakeDestination, vcs: FakeVcs) -> Self {
            Self {
                source: Arc::new(source),
                destination: Arc::new(destination),
                vcs: Arc::new(vcs),
            }
        }

        fn migrator(&self, options: MigrateOptions) -> Migrator {
            Migrator::new(
                Arc::clone(&self.source) as Arc<dyn SourcePlatform>,
                Arc::clone(&self.destination) as Arc<dyn DestinationPlatform>,
                Arc::clone(&self.vcs) as Arc<dyn VersionControl>,
                options,
            )
        }
    }

    fn default_harness() -> Harness {
        Harness::new(
            FakeSource::foo(),
            FakeDestination::default(),
            FakeVcs::new(&["main", "feature-x"]),
        )
    }

    fn names(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_projects_resolves_and_sorts_foo() {
        let h = default_harness();
        let projects = h
            .migrator(MigrateOptions::default())
            .list_projects_to_migrate("FOO", None)
            .await
            .expect("FOO resolves");
        assert_eq!(
            names(&projects),
            vec!["repository-1", "repository-2", "shared-project1"]
        );
    }

    #[tokio::test]
    async fn test_list_projects_applies_prefix() {
        let h = default_harness();
        let migrator = h.migrator(MigrateOptions::default());

        let projects = migrator
            .list_projects_to_migrate("FOO", Some("repository-"))
            .await
            .unwrap();
        assert_eq!(names(&projects), vec!["repository-1", "repository-2"]);

        let all = migrator.list_projects_to_migrate("FOO", Some("")).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_list_projects_of_missing_group_fails() {
        let h = default_harness();
        let err = h
            .migrator(MigrateOptions::default())
            .list_projects_to_migrate("NOPE", None)
            .await
            .expect_err("missing group");
        assert_eq!(err.to_string(), "No group found with name NOPE");
    }

    #[tokio::test]
    async fn test_copy_content_mirrors_every_project_and_branch() {
        let h = default_harness();
        let outcome = h
            .migrator(MigrateOptions::default())
            .copy_content("FOO", Some("BAR"), None)
            .await;

        assert_eq!(outcome.status_code(), 0);
        assert_eq!(outcome.succeeded.len(), 3);
        assert!(outcome.failed.is_empty());

        let created = h.destination.created();
        assert_eq!(created.len(), 3);
        for (owner, request) in &created {
            assert_eq!(owner.as_deref(), Some("BAR"));
            assert!(request.private);
            assert!(request.description.is_some());
        }

        // Two branches per project.
        assert_eq!(h.vcs.checkouts.load(Ordering::SeqCst), 6);
        assert_eq!(h.vcs.pushes.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_copy_content_missing_group_provisions_nothing() {
        let h = default_harness();
        let outcome = h
            .migrator(MigrateOptions::default())
            .copy_content("NOPE", Some("BAR"), None)
            .await;

        assert_eq!(outcome.status_code(), 1);
        assert!(matches!(
            outcome.aborted,
            Some(MigrationError::NamespaceNotFound { .. })
        ));
        assert!(h.destination.created().is_empty());
    }

    #[tokio::test]
    async fn test_copy_content_isolates_provision_failure() {
        let h = Harness::new(
            FakeSource::foo(),
            FakeDestination {
                reject: HashSet::from(["repository-2".to_string()]),
                ..Default::default()
            },
            FakeVcs::new(&["main"]),
        );
        let outcome = h
            .migrator(MigrateOptions::default())
            .copy_content("FOO", Some("BAR"), None)
            .await;

        assert_eq!(outcome.status_code(), 1);
        let errors = &outcome.failed["FOO/subgroup1/repository-2"];
        assert!(matches!(errors[0], MigrationError::ProvisionFailed { .. }));

        assert_eq!(
            outcome.succeeded,
            ["FOO/shared-project1", "FOO/subgroup1/repository-1"]
                .into_iter()
                .map(String::from)
                .collect()
        );
        assert_eq!(h.vcs.clones_of("https://gitlab.com/FOO/subgroup1/repository-1.git"), 1);
        assert_eq!(h.vcs.clones_of("https://gitlab.com/FOO/shared-project1.git"), 1);
        assert_eq!(h.vcs.clones_of("https://gitlab.com/FOO/subgroup1/repository-2.git"), 0);
    }

    #[tokio::test]
    async fn test_branch_counts_do_not_depend_on_concurrency() {
        for concurrency in [1, 2, 16] {
            let h = Harness::new(
                FakeSource::default().group("G", vec![project("only", "G/only")], &[]),
                FakeDestination::default(),
                FakeVcs::new(&["main", "feature-x"]),
            );
            let outcome = h
                .migrator(MigrateOptions::default().with_concurrency(concurrency))
                .copy_content("G", None, None)
                .await;

            assert_eq!(outcome.status_code(), 0);
            assert_eq!(h.vcs.checkouts.load(Ordering::SeqCst), 2);
            let mut pushed: Vec<String> = h
                .vcs
                .pushes
                .lock()
                .unwrap()
                .iter()
                .map(|(_, b)| b.clone())
                .collect();
            pushed.sort();
            assert_eq!(pushed, vec!["feature-x", "main"]);
        }
    }

    #[tokio::test]
    async fn test_same_name_projects_provision_in_list_order() {
        let mut first = project("project1", "FOO/subgroup1/project1");
        first.description = Some("project1 (subgroup1)".to_string());
        let mut second = project("project1", "FOO/subgroup2/project1");
        second.description = Some("project1 (subgroup2)".to_string());
        let source = FakeSource::default()
            .group("FOO", vec![], &["subgroup1", "subgroup2"])
            .group("FOO/subgroup1", vec![first], &[])
            .group("FOO/subgroup2", vec![second], &[]);
        let h = Harness::new(
            source,
            FakeDestination {
                delay: HashMap::from([("project1 (subgroup1)".to_string(), Duration::from_millis(50))]),
                reject_repeats: true,
                ..Default::default()
            },
            FakeVcs::new(&["main"]),
        );

        let migrator = h.migrator(MigrateOptions::default().with_concurrency(4));
        let order: Vec<String> = migrator
            .list_projects_to_migrate("FOO", None)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.path_with_namespace)
            .collect();
        assert_eq!(order, vec!["FOO/subgroup1/project1", "FOO/subgroup2/project1"]);

        let outcome = migrator.copy_content("FOO", Some("BAR"), None).await;

        assert!(outcome.succeeded.contains("FOO/subgroup1/project1"));
        assert!(matches!(
            outcome.failed["FOO/subgroup2/project1"][0],
            MigrationError::ProvisionFailed { .. }
        ));
        assert_eq!(
            h.destination.taken.lock().unwrap()["project1"].as_deref(),
            Some("project1 (subgroup1)")
        );
    }

    #[tokio::test]
    async fn test_distinct_names_still_run_in_parallel() {
        let projects = vec![
            project("a", "G/x/a"),
            project("a", "G/y/a"),
            project("b", "G/b"),
            project("c", "G/c"),
        ];
        let h = Harness::new(
            FakeSource::default().group("G", projects, &[]),
            FakeDestination::default(),
            FakeVcs::new(&["main"]),
        );
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let outcome = h
            .migrator(MigrateOptions::default().with_concurrency(8))
            .with_progress(Box::new(move |e| captured.lock().unwrap().push(e)))
            .copy_content("G", None, None)
            .await;

        assert_eq!(outcome.succeeded.len(), 4);
        let started = events.lock().unwrap().iter().find_map(|e| match e {
            MigrationProgress::MigrationStarted { count, concurrency } => Some((*count, *concurrency)),
            _ => None,
        });
        // Three distinct names cap the parallelism at three.
        assert_eq!(started, Some((4, 3)));
    }

    #[tokio::test]
    async fn test_concurrency_bounds_projects_in_flight() {
        let projects = (0..8)
            .map(|i| project(&format!("p{i}"), &format!("G/p{i}")))
            .collect();
        let h = Harness::new(
            FakeSource::default().group("G", projects, &[]),
            FakeDestination::default(),
            FakeVcs::new(&["main"]),
        );
        let outcome = h
            .migrator(MigrateOptions::default().with_concurrency(2))
            .copy_content("G", None, None)
            .await;

        assert_eq!(outcome.succeeded.len(), 8);
        assert!(h.vcs.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_project_is_recorded_as_failure() {
        let mut vcs = FakeVcs::new(&["main"]);
        vcs.panic_on = Some("https://gitlab.com/FOO/shared-project1.git".to_string());
        let h = Harness::new(FakeSource::foo(), FakeDestination::default(), vcs);

        let outcome = h
            .migrator(MigrateOptions::default())
            .copy_content("FOO", None, None)
            .await;

        assert_eq!(outcome.status_code(), 1);
        assert!(matches!(
            outcome.failed["FOO/shared-project1"][0],
            MigrationError::TaskFailed { .. }
        ));
        assert_eq!(outcome.succeeded.len(), 2);
    }

    #[tokio::test]
    async fn test_migrate_to_github_uses_configured_owner() {
        let h = default_harness();
        let outcome = h
            .migrator(MigrateOptions::default())
            .migrate_to_github("FOO", Some("repository-1"))
            .await;
        assert_eq!(outcome.status_code(), 0);
        assert_eq!(h.destination.created()[0].0, None);

        let h = default_harness();
        h.migrator(MigrateOptions::default().with_destination_owner("BAR"))
            .migrate_to_github("FOO", Some("repository-1"))
            .await;
        assert_eq!(h.destination.created()[0].0.as_deref(), Some("BAR"));
    }

    #[tokio::test]
    async fn test_progress_events_cover_the_run() {
        let h = default_harness();
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let migrator = h
            .migrator(MigrateOptions::default())
            .with_progress(Box::new(move |e| captured.lock().unwrap().push(e)));

        migrator.copy_content("FOO", Some("BAR"), None).await;

        let events = events.lock().unwrap();
        assert!(matches!(
            events.first(),
            Some(MigrationProgress::NamespaceResolved { total: 3, matched: 3, .. })
        ));
        assert!(matches!(
            events.last(),
            Some(MigrationProgress::MigrationComplete { succeeded: 3, failed: 0 })
        ));
        let finished = events
            .iter()
            .filter(|e| matches!(e, MigrationProgress::ProjectFinished { pushed: 2, error: None, .. }))
            .count();
        assert_eq!(finished, 3);
    }

    #[tokio::test]
    async fn test_branch_protection_echoes_rules() {
        let h = default_harness();
        let rules = BranchProtectionRules {
            required_approving_review_count: 2,
            dismiss_stale_reviews: true,
            enforce_admins: true,
            ..Default::default()
        }
        .with_status_check("ci/build");

        let confirmation = h
            .migrator(MigrateOptions::default())
            .configure_branch_protection_rule("BAR", "bar", "main", &rules)
            .await
            .expect("protection applied");
        assert_eq!(confirmation.status, 200);
        assert_eq!(confirmation.rules, rules);
    }

    #[tokio::test]
    async fn test_branch_protection_failure_names_the_branch() {
        let h = default_harness();
        let err = h
            .migrator(MigrateOptions::default())
            .configure_branch_protection_rule("BAR", "missing", "main", &Default::default())
            .await
            .expect_err("missing repo");
        assert!(matches!(
            err,
            MigrationError::ProtectionConfigFailed { ref repo, ref branch, .. } if repo == "missing" && branch == "main"
        ));
    }

    #[tokio::test]
    async fn test_archive_project_outcomes() {
        let mut source = FakeSource::foo();
        source.archivable.insert("foo/sample-project-site".to_string());
        let h = Harness::new(source, FakeDestination::default(), FakeVcs::new(&[]));
        let migrator = h.migrator(MigrateOptions::default());

        let ok = migrator
            .archive_project("foo/sample-project-site")
            .await
            .expect("archived");
        assert!(ok.archived);

        let err = migrator
            .archive_project("foo/invalid-project")
            .await
            .expect_err("not found");
        assert_eq!(
            err,
            MigrationError::ArchiveFailed {
                project_path: "foo/invalid-project".to_string(),
                reason: ArchiveFailure::NotFound,
            }
        );

        let mut source = FakeSource::foo();
        source.archive_down = true;
        let h = Harness::new(source, FakeDestination::default(), FakeVcs::new(&[]));
        let err = h
            .migrator(MigrateOptions::default())
            .archive_project("foo/sample-project-site")
            .await
            .expect_err("transport failure");
        assert!(matches!(
            err,
            MigrationError::ArchiveFailed { reason: ArchiveFailure::Upstream(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_partial_branch_failure_marks_project_failed() {
        struct RejectingPush(FakeVcs);

        #[async_trait]
        impl VersionControl for RejectingPush {
            async fn clone_to_local(&self, url: &str, into: &Path) -> Result<WorkingCopy, VcsError> {
                self.0.clone_to_local(url, into).await
            }
            async fn add_remote(&self, c: &WorkingCopy, n: &str, u: &str) -> Result<(), VcsError> {
                self.0.add_remote(c, n, u).await
            }
            async fn list_branches(&self, c: &WorkingCopy) -> Result<Vec<String>, VcsError> {
                self.0.list_branches(c).await
            }
            async fn checkout_branch(&self, c: &WorkingCopy, b: &str) -> Result<(), VcsError> {
                self.0.checkout_branch(c, b).await
            }
            async fn push_branch(&self, c: &WorkingCopy, r: &str, b: &str) -> Result<(), VcsError> {
                if b == "feature-x" {
                    return Err(VcsError::CommandFailed {
                        command: "push".to_string(),
                        stderr: "protected branch hook declined".to_string(),
                    });
                }
                self.0.push_branch(c, r, b).await
            }
        }

        let source: Arc<dyn SourcePlatform> =
            Arc::new(FakeSource::default().group("G", vec![project("only", "G/only")], &[]));
        let destination: Arc<dyn DestinationPlatform> = Arc::new(FakeDestination::default());
        let vcs = Arc::new(RejectingPush(FakeVcs::new(&["feature-x", "main"])));
        let migrator = Migrator::new(source, destination, vcs.clone(), MigrateOptions::default());

        let outcome = migrator.copy_content("G", None, None).await;
        assert_eq!(outcome.status_code(), 1);
        let errors = &outcome.failed["G/only"];
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            MigrationError::MirrorFailed { stage: MirrorStage::Push, branch: Some(b), .. } if b == "feature-x"
        ));
        // The later branch was still pushed.
        assert_eq!(vcs.0.pushes.lock().unwrap().len(), 1);
    }
}
