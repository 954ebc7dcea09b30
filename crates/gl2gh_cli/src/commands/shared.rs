use std::sync::Arc;

use gl2gh::github::{GitHubClient, git_host};
use gl2gh::gitlab::GitLabClient;
use gl2gh::{
    ApiRateLimiter, GitCli, HostCredentials, MigrateOptions, MigrationOutcome, Migrator,
    ProgressCallback, rate_limits,
};

use crate::config::Config;

pub(crate) type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Which tokens a command cannot run without.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Requires {
    pub(crate) gitlab: bool,
    pub(crate) github: bool,
}

/// Create a rate limiter if rate limiting is enabled.
/// Returns None if no_rate_limit is true, Some(limiter) otherwise.
pub(crate) fn maybe_rate_limiter(no_rate_limit: bool, rps: u32) -> Option<ApiRateLimiter> {
    if no_rate_limit {
        None
    } else {
        Some(ApiRateLimiter::new(rps))
    }
}

/// Print a warning when rate limiting is disabled (TTY only).
pub(crate) fn warn_no_rate_limit(is_tty: bool) {
    if is_tty {
        eprintln!("Warning: Rate limiting disabled - you may experience API throttling\n");
    }
}

fn token(value: Option<String>, required: bool, env_var: &str) -> CliResult<String> {
    match value {
        Some(token) => Ok(token),
        None if required => {
            Err(format!("{env_var} must be set in environment, .env file, or config file").into())
        }
        None => Ok(String::new()),
    }
}

/// Build a [`Migrator`] wired to GitLab, GitHub and the `git` binary.
pub(crate) fn build_migrator(
    config: &Config,
    options: MigrateOptions,
    requires: Requires,
    no_rate_limit: bool,
    on_progress: Option<ProgressCallback>,
) -> CliResult<Migrator> {
    let gitlab_token = token(config.gitlab_token(), requires.gitlab, "GL2GH_GITLAB_TOKEN")?;
    let github_token = token(config.github_token(), requires.github, "GL2GH_GITHUB_TOKEN")?;

    let source = GitLabClient::new(
        &config.gitlab.host,
        &gitlab_token,
        maybe_rate_limiter(no_rate_limit, rate_limits::GITLAB_DEFAULT_RPS),
    )?;
    let destination = GitHubClient::new(
        &config.github.api_url,
        &github_token,
        maybe_rate_limiter(no_rate_limit, rate_limits::GITHUB_DEFAULT_RPS),
    )?;

    let mut vcs = GitCli::new();
    if !gitlab_token.is_empty() {
        vcs = vcs.with_credentials(HostCredentials::gitlab(&config.gitlab.host, &gitlab_token));
    }
    if !github_token.is_empty() {
        let host = git_host(&config.github.api_url)
            .ok_or_else(|| format!("invalid GitHub API URL: {}", config.github.api_url))?;
        vcs = vcs.with_credentials(HostCredentials::github(&host, &github_token));
    }

    let migrator = Migrator::new(
        Arc::new(source),
        Arc::new(destination),
        Arc::new(vcs),
        options,
    );
    Ok(match on_progress {
        Some(callback) => migrator.with_progress(callback),
        None => migrator,
    })
}

/// Print the per-project failures of an outcome.
pub(crate) fn display_outcome(outcome: &MigrationOutcome, is_tty: bool) {
    if let Some(ref error) = outcome.aborted {
        if is_tty {
            eprintln!("\nMigration aborted: {error}");
        } else {
            tracing::error!(error = %error, "Migration aborted");
        }
        return;
    }

    if is_tty {
        println!("\nMigration results:");
        println!("  Migrated: {}", outcome.succeeded.len());
        println!("  Failed:   {}", outcome.failed.len());
        for (project, errors) in &outcome.failed {
            eprintln!("\n  {project}:");
            for error in errors {
                eprintln!("    - {error}");
            }
        }
    } else {
        for (project, errors) in &outcome.failed {
            for error in errors {
                tracing::error!(project = %project, error = %error, "Migration failure");
            }
        }
        tracing::info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Migration results"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maybe_rate_limiter() {
        assert!(maybe_rate_limiter(true, 5).is_none());
        assert!(maybe_rate_limiter(false, 5).is_some());
    }

    #[test]
    fn test_missing_required_token_is_an_error() {
        let err = token(None, true, "GL2GH_GITHUB_TOKEN").unwrap_err();
        assert!(err.to_string().contains("GL2GH_GITHUB_TOKEN"));
        assert_eq!(token(None, false, "X").unwrap(), "");
        assert_eq!(token(Some("t".to_string()), true, "X").unwrap(), "t");
    }

    #[test]
    fn test_build_migrator_without_required_token_fails() {
        let config = Config::default();
        let result = build_migrator(
            &config,
            MigrateOptions::default(),
            Requires {
                gitlab: true,
                github: false,
            },
            true,
            None,
        );
        assert!(result.is_err());
    }
}
