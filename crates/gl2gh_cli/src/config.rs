//! Configuration file support for gl2gh.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `GL2GH_`, e.g., `GL2GH_GITLAB_TOKEN`)
//! 3. Config file (./gl2gh.toml, then ~/.config/gl2gh/config.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [gitlab]
//! host = "gitlab.com"  # or self-hosted instance
//! token = "glpat-..."  # or use GL2GH_GITLAB_TOKEN env var
//!
//! [github]
//! api_url = "https://api.github.com"  # or GL2GH_GITHUB_API_URL
//! token = "ghp_..."  # or use GL2GH_GITHUB_TOKEN env var
//! org = "BAR"  # omit to create repositories under your own account
//!
//! [migrate]
//! concurrency = 4
//! private = true
//! prefix = "repository-"
//! no_rate_limit = false
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use gl2gh::github::GITHUB_API_URL;
use gl2gh::migrate::DEFAULT_CONCURRENCY;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitLab (source) configuration.
    pub gitlab: GitLabConfig,
    /// GitHub (destination) configuration.
    pub github: GitHubConfig,
    /// Default migration options.
    pub migrate: MigrateConfig,
}

/// GitLab configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// GitLab host (e.g., "gitlab.com" or "https://gitlab.example.com").
    pub host: String,
    /// Personal access token with `api` scope.
    pub token: Option<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            host: "gitlab.com".to_string(),
            token: None,
        }
    }
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL.
    pub api_url: String,
    /// Personal access token with `repo` scope.
    pub token: Option<String>,
    /// Organization repositories are created in.
    pub org: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            token: None,
            org: None,
        }
    }
}

/// Default migration options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Projects migrated at the same time.
    pub concurrency: usize,
    /// Create destination repositories as private.
    pub private: bool,
    /// Only migrate projects whose name starts with this.
    pub prefix: Option<String>,
    /// Disable proactive request pacing.
    pub no_rate_limit: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            private: true,
            prefix: None,
            no_rate_limit: false,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/gl2gh/config.toml)
    /// 3. Local config file (./gl2gh.toml)
    /// 4. Environment variables with GL2GH_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("gl2gh.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gl2gh.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        match Self::build(builder, std::env::var("GL2GH_GITHUB_API_URL").ok()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}", e);
                Config::default()
            }
        }
    }

    /// Layer the environment over `builder` and deserialize.
    ///
    /// `GL2GH_GITLAB_TOKEN` maps to `gitlab.token`. Keys containing an
    /// underscore cannot be reached that way, so `github.api_url` is passed
    /// in separately.
    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        github_api_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix("GL2GH")
                    .separator("_")
                    .try_parsing(true),
            )
            .set_override_option("github.api_url", github_api_url)?
            .build()?
            .try_deserialize()
    }

    /// Get the GitLab token.
    pub fn gitlab_token(&self) -> Option<String> {
        self.gitlab.token.clone().filter(|t| !t.is_empty())
    }

    /// Get the GitHub token.
    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone().filter(|t| !t.is_empty())
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gl2gh").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
