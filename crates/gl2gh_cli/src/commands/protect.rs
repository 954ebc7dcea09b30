use console::{Term, style};
use gl2gh::{BranchProtectionRules, MigrateOptions};

use crate::ProtectArgs;
use crate::commands::shared::{CliResult, Requires, build_migrator};
use crate::config::Config;

pub(crate) fn rules_from_args(args: &ProtectArgs) -> BranchProtectionRules {
    let rules = BranchProtectionRules {
        required_approving_review_count: args.approvals,
        dismiss_stale_reviews: args.dismiss_stale,
        enforce_admins: args.enforce_admins,
        strict_status_checks: args.strict,
        ..Default::default()
    };
    args.contexts
        .iter()
        .fold(rules, |rules, context| rules.with_status_check(context))
}

/// Apply branch protection to one GitHub branch.
pub(crate) async fn handle_protect(args: ProtectArgs, config: &Config) -> CliResult {
    let rules = rules_from_args(&args);
    let migrator = build_migrator(
        config,
        MigrateOptions::default(),
        Requires {
            gitlab: false,
            github: true,
        },
        config.migrate.no_rate_limit,
        None,
    )?;

    let confirmation = migrator
        .configure_branch_protection_rule(&args.owner, &args.repo, &args.branch, &rules)
        .await?;

    if Term::stdout().is_term() {
        println!(
            "{} {}/{} branch {} (HTTP {})",
            style("Protected").bold().green(),
            args.owner,
            args.repo,
            args.branch,
            confirmation.status
        );
        let applied = &confirmation.rules;
        println!("  Required checks:     {:?}", applied.required_status_checks_contexts);
        println!("  Required approvals:  {}", applied.required_approving_review_count);
        println!("  Dismiss stale:       {}", applied.dismiss_stale_reviews);
        println!("  Enforce for admins:  {}", applied.enforce_admins);
        println!("  Require up to date:  {}", applied.strict_status_checks);
    } else {
        tracing::info!(
            owner = %args.owner,
            repo = %args.repo,
            branch = %args.branch,
            status = confirmation.status,
            "Branch protection applied"
        );
    }

    Ok(())
}
