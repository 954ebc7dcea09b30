use console::{Term, style};
use gl2gh::MigrateOptions;

use crate::commands::shared::{CliResult, Requires, build_migrator};
use crate::config::Config;

/// Print the projects `copy` would migrate, in migration order.
pub(crate) async fn handle_list(
    group: &str,
    prefix: Option<String>,
    config: &Config,
) -> CliResult {
    let prefix = prefix.or_else(|| config.migrate.prefix.clone());
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

    let projects = migrator
        .list_projects_to_migrate(group, prefix.as_deref())
        .await?;

    if Term::stdout().is_term() {
        for project in &projects {
            println!(
                "{:30} {}{}",
                style(&project.name).bold(),
                project.path_with_namespace,
                if project.archived {
                    style(" (archived)").dim().to_string()
                } else {
                    String::new()
                }
            );
        }
        println!("\n{} projects", projects.len());
    } else {
        for project in &projects {
            println!("{}\t{}", project.name, project.path_with_namespace);
        }
    }

    Ok(())
}
