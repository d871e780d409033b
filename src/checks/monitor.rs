// Resource threshold alerting

use crate::alert::{evaluate, Evaluation};
use crate::config::{Config, Domain, Thresholds};
use crate::error::Result;
use crate::notify::Notifier;
use crate::probe::MetricsProbe;
use crate::process::CommandRunner;
use crate::state::{JsonStore, Metric, MetricSnapshot, MetricValues};
use chrono::Local;
use std::sync::Arc;

pub async fn run(
    config: &Config,
    notifier: &Notifier,
    runner: Arc<dyn CommandRunner>,
    force: bool,
) -> Result<()> {
    let store = JsonStore::<MetricSnapshot>::new(config.state_file(Domain::Monitor));
    let sample = MetricsProbe::new(runner).sample().await;

    apply_sample(&store, notifier, &config.thresholds, sample, force).await?;
    Ok(())
}

/// Evaluate `sample`, persist it as the latest snapshot and alert if needed.
///
/// State is saved before the alert goes out, so a failed delivery never
/// causes a repeat alert on the next run.
pub async fn apply_sample(
    store: &JsonStore<MetricSnapshot>,
    notifier: &Notifier,
    limits: &Thresholds,
    sample: MetricValues,
    force: bool,
) -> Result<Evaluation> {
    let mut snapshot = store.load_or_default();
    let evaluation = evaluate(limits, &sample, &snapshot.alert_flags, force);

    snapshot.metrics = sample;
    snapshot.alert_flags = evaluation.flags.clone();
    snapshot.last_check = Some(Local::now());
    store.save(&snapshot)?;

    if evaluation.should_notify {
        notifier.notify(&evaluation.message).await;
        tracing::info!("Alert sent: {}", evaluation.message);
    } else {
        tracing::info!("No thresholds exceeded. Metrics: {}", describe(&snapshot.metrics));
    }

    Ok(evaluation)
}

fn describe(metrics: &MetricValues) -> String {
    Metric::ALL
        .iter()
        .map(|metric| match metrics.get(metric).copied().flatten() {
            Some(value) => format!("{}={}{}", metric.label(), value, metric.unit()),
            None => format!("{}=N/A", metric.label()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
