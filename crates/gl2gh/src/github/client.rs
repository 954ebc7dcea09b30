//! GitHub REST client for repository creation and branch protection.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{GitHubError, parse_rate_limit_headers};
use super::types::{GitHubRepo, ProtectionRequest, ProtectionResponse};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, encode_path_segment};
use crate::platform::{
    self, ApiRateLimiter, BranchProtectionRules, CreateRepository, DestinationPlatform,
    ProtectionConfirmation, RepoHandle,
};
use crate::vcs::host_name;

/// Default GitHub API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "gl2gh";

/// Remaining-quota threshold below which a warning is logged.
const LOW_QUOTA_WARNING: usize = 10;

/// Host serving git over HTTPS for a GitHub API base URL.
///
/// `https://api.github.com` maps to `github.com`; Enterprise URLs such as
/// `https://ghe.example.com/api/v3` keep their own host.
pub fn git_host(api_url: &str) -> Option<String> {
    let host = host_name(api_url)?;
    if let Some(public) = host.strip_prefix("api.") {
        return Some(public.to_string());
    }
    Some(host)
}

/// GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_url: String,
    token: String,
    rate_limiter: Option<ApiRateLimiter>,
}

impl GitHubClient {
    /// Create a new GitHub client.
    ///
    /// # Arguments
    ///
    /// * `api_url` - API base URL; `https://api.github.com` for github.com
    /// * `token` - Personal access token with `repo` scope
    /// * `rate_limiter` - Optional request pacing
    pub fn new(
        api_url: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| GitHubError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            api_url,
            token,
            rate_limiter,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        api_url: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            token: token.to_string(),
            rate_limiter,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn send<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpResponse, GitHubError> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let url = format!("{}{}", self.api_url, path);
        tracing::debug!(method = method.as_str(), %url, "GitHub request");

        let body = serde_json::to_vec(body).map_err(|e| GitHubError::Config(e.to_string()))?;
        let request = HttpRequest {
            method,
            url,
            headers: vec![
                ("Authorization".to_string(), format!("token {}", self.token)),
                (
                    "Accept".to_string(),
                    "application/vnd.github+json".to_string(),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
            body,
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        if let Some(info) = parse_rate_limit_headers(&response)
            && info.remaining < LOW_QUOTA_WARNING
        {
            tracing::warn!(
                remaining = info.remaining,
                reset_at = %info.reset_at,
                "GitHub API quota nearly exhausted"
            );
        }

        Ok(response)
    }

    async fn request_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        resource: &str,
    ) -> Result<(u16, T), GitHubError> {
        let response = self.send(method, path, body).await?;
        if !response.is_success() {
            return Err(GitHubError::from_response(&response, resource));
        }
        let value = serde_json::from_slice(&response.body)
            .map_err(|e| GitHubError::Deserialize(e.to_string()))?;
        Ok((response.status, value))
    }

    /// Create a repository in `org`, or for the authenticated user when `org`
    /// is `None`.
    pub async fn create_repo(
        &self,
        org: Option<&str>,
        request: &CreateRepository,
    ) -> Result<RepoHandle, GitHubError> {
        let path = match org {
            Some(org) => format!("/orgs/{}/repos", encode_path_segment(org)),
            None => "/user/repos".to_string(),
        };
        let resource = format!("owner: {}", org.unwrap_or("authenticated user"));

        let (_, repo) = self
            .request_json::<_, GitHubRepo>(HttpMethod::Post, &path, request, &resource)
            .await?;
        tracing::debug!(full_name = %repo.full_name, "Created GitHub repository");
        Ok(repo.into())
    }

    /// Replace the protection settings of `owner/repo:branch`.
    pub async fn protect_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        rules: &BranchProtectionRules,
    ) -> Result<ProtectionConfirmation, GitHubError> {
        let path = format!(
            "/repos/{}/{}/branches/{}/protection",
            encode_path_segment(owner),
            encode_path_segment(repo),
            encode_path_segment(branch),
        );
        let resource = format!("branch: {owner}/{repo}:{branch}");

        let (status, echoed) = self
            .request_json::<_, ProtectionResponse>(
                HttpMethod::Put,
                &path,
                &ProtectionRequest::from(rules),
                &resource,
            )
            .await?;
        Ok(ProtectionConfirmation {
            status,
            rules: echoed.into(),
        })
    }
}

#[async_trait]
impl DestinationPlatform for GitHubClient {
    async fn create_repository(
        &self,
        owner: Option<&str>,
        request: &CreateRepository,
    ) -> platform::Result<RepoHandle> {
        Ok(self.create_repo(owner, request).await?)
    }

    async fn configure_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        rules: &BranchProtectionRules,
    ) -> platform::Result<ProtectionConfirmation> {
        Ok(self.protect_branch(owner, repo, branch, rules).await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::MockTransport;
    use crate::platform::PlatformError;

    const API: &str = "https://api.github.example.com";

    fn client(transport: &MockTransport) -> GitHubClient {
        GitHubClient::new_with_transport(API, "ghp-token", None, Arc::new(transport.clone()))
    }

    fn repo_json(owner: &str, name: &str) -> serde_json::Value {
        json!({
            "id": 1,
            "name": name,
            "full_name": format!("{owner}/{name}"),
            "owner": {"login": owner, "id": 2},
            "private": true,
            "clone_url": format!("https://github.com/{owner}/{name}.git"),
            "html_url": format!("https://github.com/{owner}/{name}")
        })
    }

    fn create(name: &str) -> CreateRepository {
        CreateRepository {
            name: name.to_string(),
            description: Some("Mirror of FOO".to_string()),
            private: true,
        }
    }

    #[tokio::test]
    async fn test_create_repository_in_org() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            format!("{API}/orgs/BAR/repos"),
            201,
            repo_json("BAR", "repository-1"),
        );

        let handle = client(&transport)
            .create_repository(Some("BAR"), &create("repository-1"))
            .await
            .expect("created");
        assert_eq!(handle.full_name, "BAR/repository-1");
        assert_eq!(handle.owner, "BAR");
        assert_eq!(handle.clone_url, "https://github.com/BAR/repository-1.git");

        let requests = transport.requests();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body,
            json!({"name": "repository-1", "description": "Mirror of FOO", "private": true})
        );
        let headers = &requests[0].headers;
        assert!(headers.contains(&("Authorization".to_string(), "token ghp-token".to_string())));
        assert!(headers.contains(&(
            "Accept".to_string(),
            "application/vnd.github+json".to_string()
        )));
    }

    #[tokio::test]
    async fn test_create_repository_for_user() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            format!("{API}/user/repos"),
            201,
            repo_json("octocat", "repository-2"),
        );

        let handle = client(&transport)
            .create_repository(None, &create("repository-2"))
            .await
            .expect("created");
        assert_eq!(handle.full_name, "octocat/repository-2");
        assert_eq!(transport.requests()[0].url, format!("{API}/user/repos"));
    }

    #[tokio::test]
    async fn test_create_existing_repository_is_rejected() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            format!("{API}/orgs/BAR/repos"),
            422,
            json!({
                "message": "Repository creation failed.",
                "errors": [{"resource": "Repository", "code": "custom", "field": "name",
                            "message": "name already exists on this account"}]
            }),
        );

        let err = client(&transport)
            .create_repository(Some("BAR"), &create("repository-1"))
            .await
            .expect_err("422");
        match err {
            PlatformError::Api { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("already exists"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_secondary_rate_limit_on_create() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            format!("{API}/orgs/BAR/repos"),
            HttpResponse {
                status: 403,
                headers: vec![("Retry-After".to_string(), "60".to_string())],
                body: br#"{"message":"You have exceeded a secondary rate limit."}"#.to_vec(),
            },
        );

        let err = client(&transport)
            .create_repository(Some("BAR"), &create("repository-1"))
            .await
            .expect_err("rate limited");
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_configure_branch_protection_echoes_rules() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Put,
            format!("{API}/repos/BAR/bar/branches/main/protection"),
            200,
            json!({
                "url": format!("{API}/repos/BAR/bar/branches/main/protection"),
                "required_status_checks": {"strict": true, "contexts": ["ci/build"]},
                "enforce_admins": {"enabled": true},
                "required_pull_request_reviews": {
                    "dismiss_stale_reviews": true,
                    "required_approving_review_count": 2
                }
            }),
        );

        let rules = BranchProtectionRules {
            required_approving_review_count: 2,
            dismiss_stale_reviews: true,
            enforce_admins: true,
            strict_status_checks: true,
            ..Default::default()
        }
        .with_status_check("ci/build");

        let confirmation = client(&transport)
            .configure_branch_protection("BAR", "bar", "main", &rules)
            .await
            .expect("protected");
        assert_eq!(confirmation.status, 200);
        assert_eq!(confirmation.rules, rules);

        let body: serde_json::Value =
            serde_json::from_slice(&transport.requests()[0].body).unwrap();
        assert_eq!(body["restrictions"], serde_json::Value::Null);
        assert_eq!(
            body["required_pull_request_reviews"]["required_approving_review_count"],
            2
        );
    }

    #[tokio::test]
    async fn test_protect_branch_with_slash_is_encoded() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Put,
            format!("{API}/repos/BAR/bar/branches/release%2F1.0/protection"),
            200,
            json!({}),
        );

        let confirmation = client(&transport)
            .configure_branch_protection("BAR", "bar", "release/1.0", &BranchProtectionRules::default())
            .await
            .expect("protected");
        assert_eq!(confirmation.rules, BranchProtectionRules::default());
    }

    #[tokio::test]
    async fn test_protect_missing_branch_is_not_found() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Put,
            format!("{API}/repos/BAR/missing/branches/main/protection"),
            404,
            json!({"message": "Branch not found"}),
        );

        let err = client(&transport)
            .configure_branch_protection("BAR", "missing", "main", &BranchProtectionRules::default())
            .await
            .expect_err("404");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("BAR/missing:main"));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            format!("{API}/user/repos"),
            401,
            json!({"message": "Bad credentials"}),
        );

        let err = client(&transport)
            .create_repository(None, &create("x"))
            .await
            .expect_err("401");
        assert!(matches!(err, PlatformError::Auth { .. }));
    }

    #[test]
    fn test_git_host_for_api_url() {
        assert_eq!(git_host(GITHUB_API_URL).as_deref(), Some("github.com"));
        assert_eq!(
            git_host("https://ghe.example.com/api/v3").as_deref(),
            Some("ghe.example.com")
        );
        assert_eq!(git_host("").as_deref(), None);
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let client = GitHubClient::new_with_transport(
            "https://ghe.example.com/api/v3/",
            "t",
            None,
            Arc::new(MockTransport::new()),
        );
        assert_eq!(client.api_url(), "https://ghe.example.com/api/v3");
    }
}
