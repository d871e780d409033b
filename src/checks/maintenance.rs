// Scheduled maintenance runs

use crate::config::{Config, Domain};
use crate::error::Result;
use crate::notify::Notifier;
use crate::process::CommandRunner;
use crate::state::{JsonStore, TaskHistory, DISPLAY_TIME_FORMAT};
use crate::tasks::{RunSummary, TaskRunner, TaskSelection};
use chrono::Local;
use std::sync::Arc;

pub async fn run(
    config: &Config,
    notifier: &Notifier,
    runner: Arc<dyn CommandRunner>,
    selection: TaskSelection,
) -> Result<RunSummary> {
    let store = JsonStore::<TaskHistory>::new(config.state_file(Domain::Maintenance));
    let task_runner = TaskRunner::new(runner, config.log_dir(Domain::Maintenance));

    let summary = run_and_record(&task_runner, &store, selection).await;
    notifier.notify(&summary_message(&summary)).await;
    Ok(summary)
}

/// Run `selection` task by task, persisting each record as soon as it lands.
/// A record that cannot be saved is listed in `unsaved` and the run goes on.
pub async fn run_and_record(
    task_runner: &TaskRunner,
    store: &JsonStore<TaskHistory>,
    selection: TaskSelection,
) -> RunSummary {
    tracing::info!("Starting maintenance: {}", selection);
    let mut summary = RunSummary::default();

    for task in selection.tasks() {
        let outcome = task_runner.run(task).await;
        let mut history = store.load_or_default();
        history.record(task, outcome.to_record());
        if let Err(e) = store.save(&history) {
            tracing::error!("Failed to record {} result: {:#}", task, e);
            summary.unsaved.push(task);
        }
        summary.outcomes.push(outcome);
    }

    tracing::info!(
        "Maintenance finished: {} task(s), {} failed, {} unsaved",
        summary.outcomes.len(),
        summary.failures(),
        summary.unsaved.len()
    );
    summary
}

pub fn summary_message(summary: &RunSummary) -> String {
    let mut lines = vec![format!(
        "Maintenance Summary ({}):",
        Local::now().format(DISPLAY_TIME_FORMAT)
    )];
    lines.extend(summary.outcomes.iter().map(|outcome| {
        format!(
            "{}: {}",
            outcome.task,
            if outcome.success { "✅ Success" } else { "❌ Failed" }
        )
    }));
    lines.extend(summary.unsaved_lines());
    lines.join("\n")
}
