use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use console::style;
use gl2gh::MigrationProgress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Consolidated progress state to avoid multiple mutex locks.
#[derive(Default)]
struct ProgressState {
    /// Overall bar, one tick per finished project.
    overall: Option<ProgressBar>,
    /// Spinner per project in flight, keyed by `path_with_namespace`.
    projects: HashMap<String, ProgressBar>,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn project_bar(&self, state: &mut ProgressState, project: &str) -> ProgressBar {
        if let Some(pb) = state.projects.get(project) {
            return pb.clone();
        }

        let pb = match state.overall {
            Some(ref overall) => self.multi.insert_before(overall, ProgressBar::new_spinner()),
            None => self.multi.add(ProgressBar::new_spinner()),
        };
        pb.set_style(Self::spinner_style());
        pb.set_prefix(project.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        state.projects.insert(project.to_string(), pb.clone());
        pb
    }

    pub fn handle(&self, event: MigrationProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            MigrationProgress::NamespaceResolved {
                group,
                total,
                matched,
            } => {
                self.multi
                    .println(format!(
                        "{} {} projects in {} ({} matched)",
                        style("Found").bold().green(),
                        total,
                        style(&group).cyan(),
                        matched
                    ))
                    .ok();
            }

            MigrationProgress::MigrationStarted { count, .. } => {
                let pb = self.multi.add(ProgressBar::new(count as u64));
                pb.set_style(Self::bar_style());
                pb.set_prefix("projects");
                state.overall = Some(pb);
            }

            MigrationProgress::ProjectStarted { project } => {
                let pb = self.project_bar(&mut state, &project);
                pb.set_message("provisioning...");
            }

            MigrationProgress::RepositoryProvisioned { project, full_name } => {
                let pb = self.project_bar(&mut state, &project);
                pb.set_message(format!("mirroring to {full_name}..."));
            }

            MigrationProgress::BranchPushed { project, branch } => {
                let pb = self.project_bar(&mut state, &project);
                pb.inc(1);
                pb.set_message(format!("pushed {branch}"));
            }

            MigrationProgress::BranchFailed {
                project,
                branch,
                error,
            } => {
                let pb = self.project_bar(&mut state, &project);
                pb.println(format!(
                    "{} {project} branch {branch}: {error}",
                    style("warning:").bold().yellow()
                ));
            }

            MigrationProgress::ProjectFinished {
                project,
                pushed,
                error,
            } => {
                if let Some(pb) = state.projects.remove(&project) {
                    match error {
                        None => pb.finish_with_message(format!(
                            "{} {pushed} branches",
                            style("✓").green()
                        )),
                        Some(error) => pb.abandon_with_message(format!(
                            "{} {error}",
                            style("✗").red()
                        )),
                    }
                }
                if let Some(ref overall) = state.overall {
                    overall.inc(1);
                }
            }

            MigrationProgress::MigrationComplete { succeeded, failed } => {
                if let Some(ref overall) = state.overall {
                    overall.finish_with_message(format!("{succeeded} migrated, {failed} failed"));
                }
            }

            MigrationProgress::RateLimitBackoff {
                target,
                retry_after_ms,
                attempt,
            } => {
                self.multi
                    .println(format!(
                        "{} {target}: retrying in {:.1}s (attempt {attempt})",
                        style("rate limited:").bold().yellow(),
                        retry_after_ms as f64 / 1000.0
                    ))
                    .ok();
            }

            MigrationProgress::Warning { message } => {
                self.multi
                    .println(format!("{} {message}", style("warning:").bold().yellow()))
                    .ok();
            }

            _ => {}
        }
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for pb in state.projects.values() {
            if !pb.is_finished() {
                pb.finish();
            }
        }
        if let Some(ref pb) = state.overall
            && !pb.is_finished()
        {
            pb.finish();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
