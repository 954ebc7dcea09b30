//! gl2gh CLI - migrate a GitLab group to GitHub.

mod commands;
mod config;
mod progress;

use clap::{Args, Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gl2gh")]
#[command(version)]
#[command(about = "Migrate GitLab group namespaces to GitHub, preserving every branch")]
#[command(
    long_about = "gl2gh walks a GitLab group (including nested subgroups and shared \
projects), creates one GitHub repository per project and pushes every branch to it. \
It can also protect GitHub branches and archive the migrated GitLab projects."
)]
#[command(after_long_help = r#"EXAMPLES
    List the projects a migration would cover:
        $ gl2gh list FOO --prefix repository-

    Migrate a group into a GitHub organization:
        $ gl2gh copy FOO --org BAR

    Require one approving review on main:
        $ gl2gh protect BAR repository-1 main --approvals 1 --context ci/build

    Archive the source project afterwards:
        $ gl2gh archive FOO/repository-1

CONFIGURATION
    gl2gh reads configuration from:
      1. ~/.config/gl2gh/config.toml (or $XDG_CONFIG_HOME/gl2gh/config.toml)
      2. ./gl2gh.toml
      3. Environment variables (GL2GH_* prefix, e.g., GL2GH_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GL2GH_GITLAB_TOKEN      GitLab personal access token
    GL2GH_GITLAB_HOST       GitLab host (default: gitlab.com)
    GL2GH_GITHUB_TOKEN      GitHub personal access token
    GL2GH_GITHUB_API_URL    GitHub API base URL (default: https://api.github.com)
    GL2GH_GITHUB_ORG        GitHub organization to create repositories in
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the projects of a GitLab group, sorted by name
    List {
        /// GitLab group name
        group: String,

        /// Only list projects whose name starts with this
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// Create a GitHub repository per project and push every branch
    Copy(CopyArgs),
    /// Apply branch protection to a GitHub branch
    Protect(ProtectArgs),
    /// Archive GitLab projects
    Archive {
        /// Project paths (e.g., "FOO/repository-1")
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub(crate) struct CopyArgs {
    /// GitLab group name
    pub(crate) group: String,

    /// GitHub organization (default from config, else your account)
    #[arg(short, long)]
    pub(crate) org: Option<String>,

    /// Only migrate projects whose name starts with this
    #[arg(short, long)]
    pub(crate) prefix: Option<String>,

    /// Projects migrated at the same time (default from config or 4)
    #[arg(short, long)]
    pub(crate) concurrency: Option<usize>,

    /// Create public repositories instead of private ones
    #[arg(long)]
    pub(crate) public: bool,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    pub(crate) no_rate_limit: bool,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ProtectArgs {
    /// Repository owner (user or organization)
    pub(crate) owner: String,

    /// Repository name
    pub(crate) repo: String,

    /// Branch to protect
    pub(crate) branch: String,

    /// Required status check; can be repeated
    #[arg(long = "context")]
    pub(crate) contexts: Vec<String>,

    /// Number of approving reviews required
    #[arg(long, default_value_t = 0)]
    pub(crate) approvals: u32,

    /// Dismiss approvals when new commits are pushed
    #[arg(long)]
    pub(crate) dismiss_stale: bool,

    /// Apply the rules to administrators too
    #[arg(long)]
    pub(crate) enforce_admins: bool,

    /// Require branches to be up to date before merging
    #[arg(long)]
    pub(crate) strict: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Interactive runs get spinners instead of log lines.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("gl2gh=info,gl2gh_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { group, prefix } => {
            commands::list::handle_list(&group, prefix, &config).await?;
        }
        Commands::Copy(args) => {
            let code = commands::copy::handle_copy(args, &config).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Protect(args) => {
            commands::protect::handle_protect(args, &config).await?;
        }
        Commands::Archive { paths } => {
            commands::archive::handle_archive(&paths, &config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_copy() {
        let cli = Cli::try_parse_from([
            "gl2gh", "copy", "FOO", "--org", "BAR", "--prefix", "repository-", "-c", "8",
        ])
        .unwrap();
        let Commands::Copy(args) = cli.command else {
            panic!("expected copy");
        };
        assert_eq!(args.group, "FOO");
        assert_eq!(args.org.as_deref(), Some("BAR"));
        assert_eq!(args.prefix.as_deref(), Some("repository-"));
        assert_eq!(args.concurrency, Some(8));
        assert!(!args.public);
    }

    #[test]
    fn test_parse_protect_with_repeated_context() {
        let cli = Cli::try_parse_from([
            "gl2gh",
            "protect",
            "BAR",
            "bar",
            "main",
            "--context",
            "ci/build",
            "--context",
            "ci/test",
            "--approvals",
            "1",
            "--enforce-admins",
        ])
        .unwrap();
        let Commands::Protect(args) = cli.command else {
            panic!("expected protect");
        };
        assert_eq!(args.contexts, vec!["ci/build", "ci/test"]);
        assert_eq!(args.approvals, 1);
        assert!(args.enforce_admins);
        assert!(!args.dismiss_stale);
    }

    #[test]
    fn test_archive_requires_a_path() {
        assert!(Cli::try_parse_from(["gl2gh", "archive"]).is_err());
    }
}
