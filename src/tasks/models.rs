// Maintenance task definitions

use crate::error::PiwatchError;
use crate::process::CommandSpec;
use crate::state::TaskRecord;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One administrative operation on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    OsUpdate,
    PiholeUpdate,
    Gravity,
    ClearLogs,
}

impl Task {
    /// Execution order for `all`
    pub const ALL: [Task; 4] = [Task::OsUpdate, Task::PiholeUpdate, Task::Gravity, Task::ClearLogs];

    pub fn name(&self) -> &'static str {
        match self {
            Task::OsUpdate => "os_update",
            Task::PiholeUpdate => "pihole_update",
            Task::Gravity => "gravity",
            Task::ClearLogs => "clear_logs",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Task::OsUpdate => "OS update & upgrade",
            Task::PiholeUpdate => "Pi-hole update",
            Task::Gravity => "Pi-hole gravity update",
            Task::ClearLogs => "Flush Pi-hole query logs",
        }
    }

    pub fn shell_command(&self) -> &'static str {
        match self {
            Task::OsUpdate => "sudo apt update && sudo apt upgrade -y",
            Task::PiholeUpdate => "sudo pihole -up",
            Task::Gravity => "sudo pihole -g",
            Task::ClearLogs => "sudo pihole flush",
        }
    }

    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec::shell(self.shell_command()).with_label(self.name())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Task {
    type Err = PiwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|task| task.name() == s.trim())
            .ok_or_else(|| PiwatchError::UnknownTask(s.to_string()))
    }
}

/// What an operator or scheduler asked to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSelection {
    All,
    One(Task),
}

impl TaskSelection {
    pub fn tasks(&self) -> Vec<Task> {
        match self {
            TaskSelection::All => Task::ALL.to_vec(),
            TaskSelection::One(task) => vec![*task],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskSelection::All => "all",
            TaskSelection::One(task) => task.name(),
        }
    }
}

impl fmt::Display for TaskSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskSelection {
    type Err = PiwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "all" {
            Ok(TaskSelection::All)
        } else {
            s.parse().map(TaskSelection::One)
        }
    }
}

/// Result of one task run
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task: Task,
    pub success: bool,
    /// Full combined output, or the launch error text
    pub output: String,
    pub log_file: PathBuf,
    pub finished_at: DateTime<Local>,
}

impl TaskOutcome {
    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            last_run: self.finished_at,
            success: self.success,
            output: self.output.clone(),
        }
    }

    /// File name of the log artifact, as shown to operators
    pub fn log_name(&self) -> String {
        self.log_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.log_file.display().to_string())
    }
}

/// Per-task outcomes of one invocation, in execution order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<TaskOutcome>,
    /// Tasks that ran but whose record never reached the state file
    pub unsaved: Vec<Task>,
}

impl RunSummary {
    /// One line per unsaved record, for the operator-facing summaries
    pub fn unsaved_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.unsaved.iter().map(|task| unsaved_notice(*task))
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.success).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures() == 0
    }
}

pub fn unsaved_notice(task: Task) -> String {
    format!("❌ Could not save {} result", task)
}
