//! Per-project pipeline: provision a destination repository, then replay
//! every source branch onto it.

mod provision;
mod repository;
mod types;

pub use provision::DestinationProvisioner;
pub use repository::RepositoryMirror;
pub use types::{
    BranchMirrorReport, DEFAULT_ADD_REMOTE_TIMEOUT_SECS, DEFAULT_CHECKOUT_TIMEOUT_SECS,
    DEFAULT_CLONE_TIMEOUT_SECS, DEFAULT_LIST_BRANCHES_TIMEOUT_SECS, DEFAULT_PROVISION_TIMEOUT_SECS,
    DEFAULT_PUSH_TIMEOUT_SECS, MirrorStage, StageTimeouts,
};
