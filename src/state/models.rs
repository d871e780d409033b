// Persisted record types, one per domain

use crate::tasks::Task;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format used whenever a stored timestamp is shown to an operator
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Last known state of the monitored service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Up,
    Down,
    /// Nothing observed yet, so the first observation always counts as a change
    Unknown,
}

impl ServiceStatus {
    pub fn from_observation(is_up: bool) -> Self {
        if is_up {
            ServiceStatus::Up
        } else {
            ServiceStatus::Down
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceStatus::Up => "up",
            ServiceStatus::Down => "down",
            ServiceStatus::Unknown => "unknown",
        }
    }
}

/// Down-alert domain record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusRecord {
    #[serde(alias = "pihole_status")]
    pub service_status: ServiceStatus,
    /// Starts out true so a first run never reports a spurious "lost" alert
    #[serde(alias = "internet")]
    pub internet_reachable: bool,
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self {
            service_status: ServiceStatus::Unknown,
            internet_reachable: true,
        }
    }
}

/// Sampled resource metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Ram,
    Disk,
    Temp,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Cpu, Metric::Ram, Metric::Disk, Metric::Temp];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Ram => "RAM",
            Metric::Disk => "Disk",
            Metric::Temp => "Temp",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temp => "°C",
            _ => "%",
        }
    }
}

/// One sample per metric; `None` means the sensor had nothing to report
pub type MetricValues = BTreeMap<Metric, Option<f64>>;

/// Per-metric "already alerted" memory
pub type AlertFlags = BTreeMap<Metric, bool>;

/// Monitor domain record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSnapshot {
    pub metrics: MetricValues,
    #[serde(alias = "alerts")]
    pub alert_flags: AlertFlags,
    pub last_check: Option<DateTime<Local>>,
}

impl MetricSnapshot {
    /// True until a check has completed at least once
    pub fn is_empty(&self) -> bool {
        self.last_check.is_none() && self.metrics.is_empty()
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied().flatten()
    }
}

/// Outcome of the most recent run of one maintenance task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub last_run: DateTime<Local>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub output: String,
}

/// Maintenance domain record: at most one entry per task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHistory {
    records: BTreeMap<Task, TaskRecord>,
}

impl TaskHistory {
    /// Replace whatever was stored for `task`
    pub fn record(&mut self, task: Task, record: TaskRecord) {
        self.records.insert(task, record);
    }

    pub fn get(&self, task: Task) -> Option<&TaskRecord> {
        self.records.get(&task)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records in fixed task order
    pub fn iter(&self) -> impl Iterator<Item = (&Task, &TaskRecord)> {
        self.records.iter()
    }
}
