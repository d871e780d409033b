// Runs maintenance tasks and classifies their outcome

use crate::process::CommandRunner;
use crate::tasks::{RunSummary, Task, TaskOutcome, TaskSelection};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct TaskRunner {
    runner: Arc<dyn CommandRunner>,
    log_dir: PathBuf,
}

impl TaskRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, log_dir: PathBuf) -> Self {
        Self { runner, log_dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Per-run log artifact, e.g. `gravity_2025-01-31_040000.log`
    pub fn log_file_for(&self, task: Task, at: DateTime<Local>) -> PathBuf {
        self.log_dir
            .join(format!("{}_{}.log", task.name(), at.format("%Y-%m-%d_%H%M%S")))
    }

    /// Run one task. Never fails: launch errors become a failed outcome.
    pub async fn run(&self, task: Task) -> TaskOutcome {
        if let Err(e) = std::fs::create_dir_all(&self.log_dir) {
            tracing::warn!("Could not create {}: {}", self.log_dir.display(), e);
        }

        let log_file = self.log_file_for(task, Local::now());
        let spec = task.command_spec().with_log_file(log_file.clone());

        tracing::info!("Starting: {}", task.description());
        let (success, output) = match self.runner.run(&spec).await {
            Ok(result) if result.success() => {
                tracing::info!("Completed: {}", task.description());
                (true, result.output)
            }
            Ok(result) => {
                tracing::error!(
                    "ERROR running {} (exit code {})",
                    task.description(),
                    result
                        .exit_code
                        .map(|code| code.to_string())
                        .unwrap_or_else(|| "signal".to_string())
                );
                (false, result.output)
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!("Exception running {}: {}", task.description(), message);
                append_line(&log_file, &message);
                (false, message)
            }
        };

        TaskOutcome {
            task,
            success,
            output,
            log_file,
            finished_at: Local::now(),
        }
    }

    /// Run every task in `selection` in order; one failure does not stop the rest
    pub async fn run_selection(&self, selection: TaskSelection) -> RunSummary {
        let mut summary = RunSummary::default();
        for task in selection.tasks() {
            summary.outcomes.push(self.run(task).await);
        }
        summary
    }
}

fn append_line(path: &Path, line: &str) {
    let result = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "{}", line));
    if let Err(e) = result {
        tracing::warn!("Could not write {}: {}", path.display(), e);
    }
}
