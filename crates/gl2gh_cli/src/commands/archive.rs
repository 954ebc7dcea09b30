use console::{Term, style};
use gl2gh::MigrateOptions;

use crate::commands::shared::{CliResult, Requires, build_migrator};
use crate::config::Config;

/// Archive GitLab projects once they have been migrated.
///
/// Every path is attempted; the first failure is returned after the rest
/// have run.
pub(crate) async fn handle_archive(paths: &[String], config: &Config) -> CliResult {
    let migrator = build_migrator(
        config,
        MigrateOptions::default(),
        Requires {
            gitlab: true,
            github: false,
        },
        config.migrate.no_rate_limit,
        None,
    )?;
    let is_tty = Term::stdout().is_term();
    let mut first_error = None;

    for path in paths {
        match migrator.archive_project(path).await {
            Ok(confirmation) => {
                if is_tty {
                    println!(
                        "{} {}",
                        style("Archived").bold().green(),
                        confirmation.path_with_namespace
                    );
                } else {
                    tracing::info!(
                        project = %confirmation.path_with_namespace,
                        archived = confirmation.archived,
                        "Project archived"
                    );
                }
            }
            Err(e) => {
                if is_tty {
                    eprintln!("{} {e}", style("error:").bold().red());
                } else {
                    tracing::error!(project = %path, error = %e, "Archive failed");
                }
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
