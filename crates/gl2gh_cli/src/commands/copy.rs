use std::sync::Arc;

use console::Term;
use gl2gh::MigrateOptions;

use crate::CopyArgs;
use crate::commands::shared::{CliResult, Requires, build_migrator, display_outcome, warn_no_rate_limit};
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Migrate every project of `args.group`; returns the process exit code.
pub(crate) async fn handle_copy(args: CopyArgs, config: &Config) -> CliResult<i32> {
    let owner = args.org.or_else(|| config.github.org.clone());
    let prefix = args.prefix.or_else(|| config.migrate.prefix.clone());
    let concurrency = args.concurrency.unwrap_or(config.migrate.concurrency);
    let private = !args.public && config.migrate.private;
    let no_rate_limit = args.no_rate_limit || config.migrate.no_rate_limit;

    let mut options = MigrateOptions::default()
        .with_concurrency(concurrency)
        .with_private(private);
    if let Some(ref owner) = owner {
        options = options.with_destination_owner(owner);
    }

    let is_tty = Term::stdout().is_term();
    if no_rate_limit {
        warn_no_rate_limit(is_tty);
    }
    if is_tty {
        println!(
            "Migrating {} to {}\n",
            args.group,
            owner.as_deref().unwrap_or("your GitHub account")
        );
    }

    let reporter = Arc::new(ProgressReporter::new());
    let migrator = build_migrator(
        config,
        options,
        Requires {
            gitlab: true,
            github: true,
        },
        no_rate_limit,
        Some(reporter.as_callback()),
    )?;

    let outcome = migrator
        .migrate_to_github(&args.group, prefix.as_deref())
        .await;

    reporter.finish();
    display_outcome(&outcome, is_tty);

    Ok(outcome.status_code())
}
