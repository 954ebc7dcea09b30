//! GitLab REST client for namespace lookups and archival.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::error::GitLabError;
use super::types::{GitLabArchivedProject, GitLabGroupDetail, GitLabSubgroup};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, encode_path_segment};
use crate::namespace::GroupDetail;
use crate::platform::{self, ApiRateLimiter, ArchiveConfirmation, SourcePlatform};

/// Default GitLab host.
pub const GITLAB_HOST: &str = "https://gitlab.com";

/// Subgroups requested per page.
const SUBGROUP_PAGE_SIZE: u32 = 100;

/// Upper bound on followed subgroup pages.
const MAX_SUBGROUP_PAGES: u32 = 100;

const USER_AGENT: &str = "gl2gh";

/// GitLab API client.
///
/// Talks to `/api/v4` over an [`HttpTransport`], authenticating with a
/// personal access token in the `Private-Token` header.
#[derive(Clone)]
pub struct GitLabClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    token: String,
    /// Optional rate limiter for pacing API requests.
    rate_limiter: Option<ApiRateLimiter>,
}

impl GitLabClient {
    /// Create a new GitLab client.
    ///
    /// # Arguments
    ///
    /// * `host` - GitLab host, with or without scheme (e.g. "gitlab.com")
    /// * `token` - Personal access token
    /// * `rate_limiter` - Optional request pacing
    pub fn new(
        host: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self, GitLabError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| GitLabError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            host,
            token,
            rate_limiter,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        host: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            host: normalize_host(host),
            token: token.to_string(),
            rate_limiter,
        }
    }

    /// Get the host URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Wait for rate limiter if one is configured.
    async fn wait_for_rate_limit(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    /// Send an authenticated request to `/api/v4{path}`.
    async fn send(&self, method: HttpMethod, path: &str) -> Result<HttpResponse, GitLabError> {
        self.wait_for_rate_limit().await;
        let url = format!("{}/api/v4{}", self.host, path);
        tracing::debug!(method = method.as_str(), %url, "GitLab request");

        let request = HttpRequest {
            method,
            url,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                ("Private-Token".to_string(), self.token.clone()),
            ],
            body: Vec::new(),
        };

        self.transport
            .send(request)
            .await
            .map_err(|e| GitLabError::Http(e.to_string()))
    }

    /// Send a request and decode the JSON body; 404 becomes `not_found()`.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        not_found: impl FnOnce() -> GitLabError,
    ) -> Result<(u16, T, HttpResponse), GitLabError> {
        let response = self.send(method, path).await?;

        if response.status == 404 {
            return Err(not_found());
        }
        if !response.is_success() {
            return Err(GitLabError::from_response(&response));
        }

        let value = serde_json::from_slice(&response.body)
            .map_err(|e| GitLabError::Deserialize(e.to_string()))?;
        Ok((response.status, value, response))
    }

    /// Fetch a top-level group with its projects and shared projects.
    pub async fn get_group(&self, name: &str) -> Result<GroupDetail, GitLabError> {
        let path = format!("/groups/{}", encode_path_segment(name));
        let (_, detail, _) = self
            .request_json::<GitLabGroupDetail>(HttpMethod::Get, &path, || {
                GitLabError::GroupNotFound(name.to_string())
            })
            .await?;
        Ok(detail.into())
    }

    /// Fetch subgroup `subgroup` of the group at `group_path`.
    pub async fn get_subgroup(
        &self,
        group_path: &str,
        subgroup: &str,
    ) -> Result<GroupDetail, GitLabError> {
        let full_path = format!("{group_path}/{subgroup}");
        let path = format!("/groups/{}", encode_path_segment(&full_path));
        let (_, detail, _) = self
            .request_json::<GitLabGroupDetail>(HttpMethod::Get, &path, || {
                GitLabError::GroupNotFound(full_path.clone())
            })
            .await?;
        Ok(detail.into())
    }

    /// List the direct subgroups of `group_path`, following pagination.
    pub async fn get_subgroups(&self, group_path: &str) -> Result<Vec<GitLabSubgroup>, GitLabError> {
        let encoded = encode_path_segment(group_path);
        let mut subgroups = Vec::new();
        let mut page = 1;

        loop {
            let path = format!(
                "/groups/{encoded}/subgroups?per_page={SUBGROUP_PAGE_SIZE}&page={page}"
            );
            let (_, batch, response) = self
                .request_json::<Vec<GitLabSubgroup>>(HttpMethod::Get, &path, || {
                    GitLabError::GroupNotFound(group_path.to_string())
                })
                .await?;
            subgroups.extend(batch);

            let next = response
                .header("x-next-page")
                .and_then(|v| v.trim().parse::<u32>().ok());
            match next {
                None => break,
                Some(next) if next > page && next <= MAX_SUBGROUP_PAGES => page = next,
                Some(next) => {
                    return Err(GitLabError::Pagination(format!(
                        "subgroups of {group_path}: next page {next} after page {page} \
                         (limit {MAX_SUBGROUP_PAGES})"
                    )));
                }
            }
        }

        Ok(subgroups)
    }

    /// Archive the project at `project_path`.
    pub async fn archive(&self, project_path: &str) -> Result<ArchiveConfirmation, GitLabError> {
        let path = format!("/projects/{}/archive", encode_path_segment(project_path));
        let (status, archived, _) = self
            .request_json::<GitLabArchivedProject>(HttpMethod::Post, &path, || {
                GitLabError::ProjectNotFound(project_path.to_string())
            })
            .await?;
        Ok(archived.into_confirmation(status))
    }
}

/// Ensure the host carries a scheme and no trailing slash.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[async_trait]
impl SourcePlatform for GitLabClient {
    async fn fetch_group(&self, group: &str) -> platform::Result<GroupDetail> {
        Ok(self.get_group(group).await?)
    }

    async fn fetch_subgroup(&self, group_path: &str, subgroup: &str) -> platform::Result<GroupDetail> {
        Ok(self.get_subgroup(group_path, subgroup).await?)
    }

    async fn fetch_subgroup_names(&self, group_path: &str) -> platform::Result<Vec<String>> {
        let subgroups = self.get_subgroups(group_path).await?;
        Ok(subgroups
            .iter()
            .map(|s| s.segment().to_string())
            .collect())
    }

    async fn archive_project(&self, project_path: &str) -> platform::Result<ArchiveConfirmation> {
        Ok(self.archive(project_path).await?)
    }
}
