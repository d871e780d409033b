// Service and internet down/up alerting

use crate::alert::{detect, Observation, Transition};
use crate::config::{Config, Domain};
use crate::error::Result;
use crate::notify::Notifier;
use crate::probe::{ConnectivityProbe, SystemdProbe};
use crate::process::CommandRunner;
use crate::state::{JsonStore, StatusRecord, DISPLAY_TIME_FORMAT};
use chrono::Local;
use std::sync::Arc;

pub async fn run(config: &Config, notifier: &Notifier, runner: Arc<dyn CommandRunner>) -> Result<()> {
    let store = JsonStore::<StatusRecord>::new(config.state_file(Domain::DownAlert));

    let service = SystemdProbe::new(config.service.unit.clone());
    let connectivity = ConnectivityProbe::new(
        runner,
        config.connectivity.host.clone(),
        config.connectivity.timeout_secs,
    );
    let observation = Observation {
        service_up: service.is_active().await,
        internet_up: connectivity.is_reachable().await,
    };
    tracing::debug!("Observed {:?}", observation);

    apply_observation(&store, notifier, &config.service.display_name, observation).await?;
    Ok(())
}

/// Diff `observation` against the stored record, alert on each change and persist
pub async fn apply_observation(
    store: &JsonStore<StatusRecord>,
    notifier: &Notifier,
    service_name: &str,
    observation: Observation,
) -> Result<Vec<Transition>> {
    let previous = store.load_or_default();
    let (transitions, next) = detect(&previous, observation);

    if transitions.is_empty() {
        tracing::info!("No change in service or internet status");
    }
    for transition in &transitions {
        let text = format!(
            "{}\nTimestamp: {}",
            transition.message(service_name),
            Local::now().format(DISPLAY_TIME_FORMAT)
        );
        tracing::info!("{}", transition.message(service_name));
        notifier.notify(&text).await;
    }

    store.save(&next)?;
    Ok(transitions)
}
