// Threshold evaluation with per-metric hysteresis

use crate::config::Thresholds;
use crate::state::{AlertFlags, Metric, MetricValues};

/// Header line of every threshold alert
pub const ALERT_HEADER: &str = "⚠️ Monitor Alert";

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub should_notify: bool,
    pub flags: AlertFlags,
    /// Header plus one line per currently breached metric
    pub message: String,
    pub breached: Vec<Metric>,
}

/// Evaluate `sample` against `limits`.
///
/// A metric that stays above its limit only triggers a notification on the
/// sample where it first crosses, unless `force` is set. Metrics without a
/// value never breach and keep whatever flag they had before.
pub fn evaluate(
    limits: &Thresholds,
    sample: &MetricValues,
    previous: &AlertFlags,
    force: bool,
) -> Evaluation {
    let mut flags = previous.clone();
    let mut breached = Vec::new();
    let mut newly_breached = false;
    let mut lines = vec![ALERT_HEADER.to_string()];

    for metric in Metric::ALL {
        let Some(value) = sample.get(&metric).copied().flatten() else {
            continue;
        };

        let limit = limits.limit(metric);
        let is_breached = value > limit;
        if is_breached {
            if !previous.get(&metric).copied().unwrap_or(false) {
                newly_breached = true;
            }
            breached.push(metric);
            lines.push(format!(
                "{}: {}{} (Threshold: {}{})",
                metric.label(),
                value,
                metric.unit(),
                limit,
                metric.unit()
            ));
        }
        flags.insert(metric, is_breached);
    }

    Evaluation {
        should_notify: newly_breached || (force && !breached.is_empty()),
        flags,
        message: lines.join("\n"),
        breached,
    }
}
