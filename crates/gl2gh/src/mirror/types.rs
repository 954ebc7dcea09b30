use std::fmt;
use std::time::Duration;

use crate::error::MigrationError;

/// Default provisioning timeout in seconds.
pub const DEFAULT_PROVISION_TIMEOUT_SECS: u64 = 60;

/// Default clone timeout in seconds.
pub const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 600;

/// Default add-remote timeout in seconds.
pub const DEFAULT_ADD_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Default branch listing timeout in seconds.
pub const DEFAULT_LIST_BRANCHES_TIMEOUT_SECS: u64 = 30;

/// Default per-branch checkout timeout in seconds.
pub const DEFAULT_CHECKOUT_TIMEOUT_SECS: u64 = 60;

/// Default per-branch push timeout in seconds.
pub const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 600;

/// A step of the per-project mirror pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MirrorStage {
    /// Cloning the source into a local working copy.
    Clone,
    /// Attaching the destination remote.
    AddRemote,
    /// Snapshotting the source branches.
    ListBranches,
    /// Checking out one branch locally.
    Checkout,
    /// Pushing one branch to the destination.
    Push,
}

impl MirrorStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::AddRemote => "add_remote",
            Self::ListBranches => "list_branches",
            Self::Checkout => "checkout",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for MirrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds for each step of provisioning and mirroring.
///
/// An expired timeout is reported as a failure of the stage it guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub provision: Duration,
    pub clone: Duration,
    pub add_remote: Duration,
    pub list_branches: Duration,
    pub checkout: Duration,
    pub push: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            provision: Duration::from_secs(DEFAULT_PROVISION_TIMEOUT_SECS),
            clone: Duration::from_secs(DEFAULT_CLONE_TIMEOUT_SECS),
            add_remote: Duration::from_secs(DEFAULT_ADD_REMOTE_TIMEOUT_SECS),
            list_branches: Duration::from_secs(DEFAULT_LIST_BRANCHES_TIMEOUT_SECS),
            checkout: Duration::from_secs(DEFAULT_CHECKOUT_TIMEOUT_SECS),
            push: Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECS),
        }
    }
}

impl StageTimeouts {
    /// Use the same limit for every stage.
    #[must_use]
    pub fn uniform(limit: Duration) -> Self {
        Self {
            provision: limit,
            clone: limit,
            add_remote: limit,
            list_branches: limit,
            checkout: limit,
            push: limit,
        }
    }

    /// Timeout for a mirror stage.
    #[must_use]
    pub fn for_stage(&self, stage: MirrorStage) -> Duration {
        match stage {
            MirrorStage::Clone => self.clone,
            MirrorStage::AddRemote => self.add_remote,
            MirrorStage::ListBranches => self.list_branches,
            MirrorStage::Checkout => self.checkout,
            MirrorStage::Push => self.push,
        }
    }
}

/// What happened to the branches of one mirrored project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchMirrorReport {
    /// `path_with_namespace` of the mirrored project.
    pub project: String,
    /// Branch snapshot taken right after cloning.
    pub branches: Vec<String>,
    /// Branches pushed to the destination, in push order.
    pub pushed: Vec<String>,
    /// One `MirrorFailed` per branch that could not be checked out or pushed.
    pub failures: Vec<MigrationError>,
}

impl BranchMirrorReport {
    /// Every branch in the snapshot reached the destination.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
