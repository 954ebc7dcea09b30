//! GitHub destination platform.
//!
//! - [`client`] - [`GitHubClient`], implementing
//!   [`DestinationPlatform`](crate::platform::DestinationPlatform)
//! - [`error`] - [`GitHubError`] and rate limit header parsing
//! - [`types`] - Wire types for repository creation and branch protection
//!
//! ```ignore
//! use gl2gh::github::{GITHUB_API_URL, GitHubClient};
//!
//! let client = GitHubClient::new(GITHUB_API_URL, &token, None)?;
//! let repo = client.create_repo(Some("BAR"), &request).await?;
//! ```

mod client;
mod error;
mod types;

pub use client::{GITHUB_API_URL, GitHubClient, git_host};
pub use error::{GitHubError, parse_rate_limit_headers};
pub use types::{
    GitHubOwner, GitHubRepo, ProtectionRequest, ProtectionResponse, RequiredPullRequestReviews,
    RequiredStatusChecks,
};
