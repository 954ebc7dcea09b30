//! Version-control capability used by the mirror pipeline.
//!
//! [`VersionControl`] is the contract (clone, add remote, list branches,
//! checkout, push); [`GitCli`] implements it on top of the `git` binary.

mod error;
mod git;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use error::VcsError;
pub use git::{GitCli, HostCredentials, host_name};

/// Name of the remote the source is cloned from.
pub const SOURCE_REMOTE: &str = "origin";

/// Name of the remote the mirror pushes to.
pub const DESTINATION_REMOTE: &str = "destination";

/// A local working copy of a cloned repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    path: PathBuf,
}

impl WorkingCopy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Operations the mirror needs from a version-control backend.
///
/// Implementations operate on a working copy inside a directory owned by the
/// caller; they never delete it themselves.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `url` into the (empty or missing) directory `into`.
    async fn clone_to_local(&self, url: &str, into: &Path) -> Result<WorkingCopy, VcsError>;

    /// Add a named remote.
    async fn add_remote(&self, copy: &WorkingCopy, name: &str, url: &str) -> Result<(), VcsError>;

    /// List every branch of the cloned source, in backend order.
    async fn list_branches(&self, copy: &WorkingCopy) -> Result<Vec<String>, VcsError>;

    /// Check out `branch` as a local branch.
    async fn checkout_branch(&self, copy: &WorkingCopy, branch: &str) -> Result<(), VcsError>;

    /// Push the local `branch` to `remote` under the same name.
    async fn push_branch(
        &self,
        copy: &WorkingCopy,
        remote: &str,
        branch: &str,
    ) -> Result<(), VcsError>;
}
