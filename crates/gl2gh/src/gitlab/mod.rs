//! GitLab source platform.
//!
//! - [`GitLabClient`] resolves groups, subgroups and subgroup lists and
//!   archives projects; it implements [`SourcePlatform`](crate::platform::SourcePlatform)
//! - [`GitLabError`] converts into [`PlatformError`](crate::platform::PlatformError)
//!
//! ```ignore
//! use gl2gh::gitlab::GitLabClient;
//! use gl2gh::platform::{ApiRateLimiter, rate_limits};
//!
//! let limiter = ApiRateLimiter::new(rate_limits::GITLAB_DEFAULT_RPS);
//! let client = GitLabClient::new("gitlab.com", &token, Some(limiter))?;
//! let group = client.get_group("FOO").await?;
//! ```

mod client;
mod error;
mod types;

pub use client::{GITLAB_HOST, GitLabClient};
pub use error::GitLabError;
pub use types::{GitLabArchivedProject, GitLabGroupDetail, GitLabProject, GitLabSubgroup};
