//! gl2gh - migrate a GitLab group namespace to GitHub.
//!
//! The library resolves a GitLab group (its projects, shared projects and
//! nested subgroups), creates a matching repository on GitHub for every
//! project, and replays every branch of the source onto it. It can also apply
//! branch protection on GitHub and archive the source projects afterwards.
//!
//! The migration core is written against three capabilities:
//!
//! - [`SourcePlatform`], implemented by [`gitlab::GitLabClient`]
//! - [`DestinationPlatform`], implemented by [`github::GitHubClient`]
//! - [`VersionControl`], implemented by [`vcs::GitCli`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gl2gh::{GitCli, MigrateOptions, Migrator};
//! use gl2gh::github::GitHubClient;
//! use gl2gh::gitlab::GitLabClient;
//!
//! let source = Arc::new(GitLabClient::new("gitlab.com", &gitlab_token, None)?);
//! let destination = Arc::new(GitHubClient::new("https://api.github.com", &github_token, None)?);
//! let vcs = Arc::new(GitCli::new());
//!
//! let migrator = Migrator::new(source, destination, vcs, MigrateOptions::default());
//! let outcome = migrator.copy_content("FOO", Some("BAR"), None).await;
//! std::process::exit(outcome.status_code());
//! ```

pub mod error;
pub mod github;
pub mod gitlab;
pub mod http;
pub mod migrate;
pub mod mirror;
pub mod namespace;
pub mod platform;
pub mod retry;
pub mod vcs;

pub use error::{ArchiveFailure, MigrationError};
pub use migrate::{
    MigrateOptions, MigrationOutcome, MigrationProgress, Migrator, ProgressCallback,
};
pub use mirror::{BranchMirrorReport, MirrorStage, StageTimeouts};
pub use namespace::{GroupDetail, Project};
pub use platform::{
    ApiRateLimiter, ArchiveConfirmation, BranchProtectionRules, CreateRepository,
    DestinationPlatform, PlatformError, ProtectionConfirmation, RepoHandle, SourcePlatform,
    rate_limits,
};
pub use vcs::{GitCli, HostCredentials, VcsError, VersionControl, WorkingCopy};
