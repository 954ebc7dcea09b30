//! `git` command-line backend.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use url::Url;

use super::{SOURCE_REMOTE, VcsError, VersionControl, WorkingCopy};

/// HTTPS credentials injected into clone and remote URLs for one host.
#[derive(Clone)]
pub struct HostCredentials {
    /// Host name to match (e.g. "gitlab.com", "github.com").
    pub host: String,
    /// User name expected by the host ("oauth2" for GitLab,
    /// "x-access-token" for GitHub).
    pub username: String,
    /// Access token used as the password.
    pub token: String,
}

impl HostCredentials {
    pub fn new(host: impl Into<String>, username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            token: token.into(),
        }
    }

    /// Credentials for a GitLab host.
    pub fn gitlab(host: &str, token: &str) -> Self {
        Self::new(host_or_raw(host), "oauth2", token)
    }

    /// Credentials for GitHub.
    pub fn github(host: &str, token: &str) -> Self {
        Self::new(host_or_raw(host), "x-access-token", token)
    }
}

impl std::fmt::Debug for HostCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("token", &"***")
            .finish()
    }
}

/// Host name of `host`, given either bare ("gitlab.com") or as a URL
/// ("https://gitlab.example.com/api").
pub fn host_name(host: &str) -> Option<String> {
    let host = host.trim();
    let url = Url::parse(host)
        .ok()
        .filter(Url::has_host)
        .or_else(|| Url::parse(&format!("https://{host}")).ok())?;
    url.host_str().map(str::to_string)
}

fn host_or_raw(host: &str) -> String {
    host_name(host).unwrap_or_else(|| host.trim().to_string())
}

/// [`VersionControl`] backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    credentials: Vec<HostCredentials>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Use `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
            credentials: Vec::new(),
        }
    }

    /// Use a specific `git` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Register credentials for a host.
    #[must_use]
    pub fn with_credentials(mut self, credentials: HostCredentials) -> Self {
        self.credentials.push(credentials);
        self
    }

    /// Rewrite an HTTPS URL to carry the credentials registered for its host.
    ///
    /// URLs that are not HTTPS, already carry a user name, have no matching
    /// host, or are plain local paths are returned unchanged.
    pub fn authenticated_url(&self, raw: &str) -> Result<String, VcsError> {
        let Ok(mut url) = Url::parse(raw) else {
            return Ok(raw.to_string());
        };

        if url.scheme() != "https" || !url.username().is_empty() {
            return Ok(raw.to_string());
        }

        let Some(creds) = url
            .host_str()
            .and_then(|host| self.credentials.iter().find(|c| c.host == host))
        else {
            return Ok(raw.to_string());
        };

        let invalid = |message: &str| VcsError::InvalidUrl {
            url: raw.to_string(),
            message: message.to_string(),
        };
        url.set_username(&creds.username)
            .map_err(|()| invalid("cannot set user name"))?;
        url.set_password(Some(&creds.token))
            .map_err(|()| invalid("cannot set password"))?;

        Ok(url.to_string())
    }

    /// Replace every registered token in `text`.
    fn redact(&self, text: &str) -> String {
        self.credentials
            .iter()
            .filter(|c| !c.token.is_empty())
            .fold(text.to_string(), |acc, c| acc.replace(&c.token, "***"))
    }

    /// Run git with `args`, returning stdout on success.
    async fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String, VcsError> {
        let command = self.redact(&args.join(" "));
        tracing::debug!(command = %command, cwd = ?cwd, "Running git");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|source| VcsError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VcsError::CommandFailed {
                command,
                stderr: self.redact(stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_to_local(&self, url: &str, into: &Path) -> Result<WorkingCopy, VcsError> {
        let url = self.authenticated_url(url)?;
        let target = into.to_string_lossy();
        self.run(None, &["clone", "--quiet", "--no-tags", &url, &target])
            .await?;
        Ok(WorkingCopy::new(into))
    }

    async fn add_remote(&self, copy: &WorkingCopy, name: &str, url: &str) -> Result<(), VcsError> {
        let url = self.authenticated_url(url)?;
        self.run(Some(copy.path()), &["remote", "add", name, &url])
            .await?;
        Ok(())
    }

    async fn list_branches(&self, copy: &WorkingCopy) -> Result<Vec<String>, VcsError> {
        let refs = format!("refs/remotes/{SOURCE_REMOTE}");
        let stdout = self
            .run(
                Some(copy.path()),
                &["for-each-ref", "--format=%(refname:lstrip=3)", &refs],
            )
            .await?;

        Ok(parse_branch_list(&stdout))
    }

    async fn checkout_branch(&self, copy: &WorkingCopy, branch: &str) -> Result<(), VcsError> {
        let start_point = format!("refs/remotes/{SOURCE_REMOTE}/{branch}");
        self.run(
            Some(copy.path()),
            &["checkout", "--quiet", "-B", branch, &start_point],
        )
        .await?;
        Ok(())
    }

    async fn push_branch(
        &self,
        copy: &WorkingCopy,
        remote: &str,
        branch: &str,
    ) -> Result<(), VcsError> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        self.run(Some(copy.path()), &["push", "--quiet", remote, &refspec])
            .await?;
        Ok(())
    }
}

/// Parse `for-each-ref` output into branch names, dropping the symbolic
/// `HEAD` pointer.
fn parse_branch_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "HEAD")
        .map(str::to_string)
        .collect()
}
