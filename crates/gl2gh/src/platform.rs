//! Platform-agnostic traits for the source and destination forges.
//!
//! The migration core only talks to [`SourcePlatform`] and
//! [`DestinationPlatform`]; the GitLab and GitHub clients implement them.
//!
//! # Example
//!
//! ```ignore
//! use gl2gh::platform::{SourcePlatform, PlatformError};
//!
//! async fn count_subgroups<S: SourcePlatform>(source: &S, group: &str) -> Result<usize, PlatformError> {
//!     Ok(source.fetch_subgroup_names(group).await?.len())
//! }
//! ```

mod errors;
mod rate_limit;
mod types;

pub use errors::{PlatformError, Result, short_error_message};
pub use rate_limit::{ApiRateLimiter, rate_limits};
pub use types::{
    ArchiveConfirmation, BranchProtectionRules, CreateRepository, DestinationPlatform,
    ProtectionConfirmation, RateLimitInfo, RepoHandle, SourcePlatform,
};
