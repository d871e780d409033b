// Reply texts and keyboards

use crate::state::{Metric, MetricSnapshot, TaskHistory, DISPLAY_TIME_FORMAT};
use crate::tasks::{unsaved_notice, RunSummary, Task, TaskOutcome, TaskSelection};
use crate::telegram::{truncate, InlineKeyboardButton, InlineKeyboardMarkup};

/// Telegram rejects messages over 4096 characters
pub const MAX_OUTPUT_CHARS: usize = 4000;

pub const STALE_NOTICE: &str = "⚠️ Live check failed. Showing last saved metrics.";
pub const NO_MONITOR_STATE: &str = "No monitor state available yet.";
pub const NO_MAINTENANCE_HISTORY: &str = "No maintenance history found.";
pub const MENU_PROMPT: &str = "Choose a maintenance task:";

pub fn format_metrics(snapshot: &MetricSnapshot, stale: bool) -> String {
    let last_check = snapshot
        .last_check
        .map(|at| at.format(DISPLAY_TIME_FORMAT).to_string())
        .unwrap_or_else(|| "N/A".to_string());

    let mut lines = Vec::with_capacity(6);
    if stale {
        lines.push(STALE_NOTICE.to_string());
    }
    lines.push(format!("📊 Current System Metrics (Last checked: {})", last_check));
    for metric in Metric::ALL {
        let value = snapshot
            .value(metric)
            .map(|value| format!("{:.1}", value))
            .unwrap_or_else(|| "N/A".to_string());
        lines.push(format!("{}: {}{}", metric.label(), value, metric.unit()));
    }
    lines.join("\n")
}

pub fn format_history(history: &TaskHistory) -> String {
    if history.is_empty() {
        return NO_MAINTENANCE_HISTORY.to_string();
    }

    history
        .iter()
        .map(|(task, record)| {
            format!(
                "{}: {} (Last run: {})",
                task,
                if record.success { "✅ Success" } else { "❌ Failed" },
                record.last_run.format(DISPLAY_TIME_FORMAT)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_task_result(outcome: &TaskOutcome, saved: bool) -> String {
    let mut text = format!("{}: {}\n", outcome.task, status_mark(outcome.success));
    if !saved {
        text.push_str(&unsaved_notice(outcome.task));
        text.push('\n');
    }
    text.push_str(&format!(
        "Log: {}\nOutput:\n{}",
        outcome.log_name(),
        truncate(&outcome.output, MAX_OUTPUT_CHARS)
    ));
    text
}

pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut lines = vec!["All tasks completed:".to_string()];
    lines.extend(summary.outcomes.iter().map(|outcome| {
        format!(
            "{}: {} (Log: {})",
            outcome.task,
            status_mark(outcome.success),
            outcome.log_name()
        )
    }));
    lines.push(format!(
        "Failed: {} of {}",
        summary.failures(),
        summary.outcomes.len()
    ));
    lines.extend(summary.unsaved_lines());
    lines.join("\n")
}

pub fn running(selection: TaskSelection) -> String {
    format!("Running {}...", selection)
}

pub fn already_running(task: Task) -> String {
    format!("⏳ {} is already running.", task)
}

pub fn unknown_command(name: &str) -> String {
    format!("Unknown command /{}. Send /help to see what I can do.", name)
}

pub fn help_text() -> String {
    [
        "Available commands:",
        "/status - run a live check and show system metrics",
        "/monitor - same as /status",
        "/maintenance - choose a maintenance task to run",
        "/maintenance_status - show the last result of every task",
        "/help - show this message",
    ]
    .join("\n")
}

/// The task picker, in the order operators are used to
pub fn task_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::single_column(vec![
        InlineKeyboardButton::new("All Tasks", "all"),
        InlineKeyboardButton::new("OS Updates", Task::OsUpdate.name()),
        InlineKeyboardButton::new("Gravity Update", Task::Gravity.name()),
        InlineKeyboardButton::new("Pi-hole Update", Task::PiholeUpdate.name()),
        InlineKeyboardButton::new("Clear Logs", Task::ClearLogs.name()),
    ])
}

fn status_mark(success: bool) -> &'static str {
    if success {
        "✅"
    } else {
        "❌"
    }
}
