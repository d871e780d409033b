#[cfg(test)]
mod tests {
    use crate::alert::{Observation, Transition, ALERT_HEADER};
    use crate::checks::{down_alert, maintenance, monitor};
    use crate::config::Thresholds;
    use crate::error::Result;
    use crate::notify::Notifier;
    use crate::process::{CommandOutput, CommandSpec, MockCommandRunner};
    use crate::state::{
        JsonStore, Metric, MetricSnapshot, MetricValues, ServiceStatus, StatusRecord, TaskHistory,
    };
    use crate::tasks::{Task, TaskRunner, TaskSelection};
    use std::sync::Arc;

    fn observe(service_up: bool, internet_up: bool) -> Observation {
        Observation {
            service_up,
            internet_up,
        }
    }

    fn sample(cpu: Option<f64>, ram: Option<f64>, disk: Option<f64>, temp: Option<f64>) -> MetricValues {
        let mut values = MetricValues::new();
        values.insert(Metric::Cpu, cpu);
        values.insert(Metric::Ram, ram);
        values.insert(Metric::Disk, disk);
        values.insert(Metric::Temp, temp);
        values
    }

    #[tokio::test]
    async fn test_down_alert_persists_and_stays_quiet_on_repeat() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = JsonStore::<StatusRecord>::new(dir.path().join("down_alert_state.json"));
        let notifier = Notifier::test_mode();

        let first = down_alert::apply_observation(&store, &notifier, "Pi-hole", observe(true, true)).await?;
        assert_eq!(first, vec![Transition::ServiceUp]);
        assert_eq!(store.load()?.service_status, ServiceStatus::Up);

        let second = down_alert::apply_observation(&store, &notifier, "Pi-hole", observe(true, true)).await?;
        assert!(second.is_empty());

        let third = down_alert::apply_observation(&store, &notifier, "Pi-hole", observe(false, false)).await?;
        assert_eq!(third, vec![Transition::ServiceDown, Transition::InternetLost]);

        let saved = store.load()?;
        assert_eq!(saved.service_status, ServiceStatus::Down);
        assert!(!saved.internet_reachable);
        Ok(())
    }

    #[tokio::test]
    async fn test_down_alert_recovers_from_corrupt_state() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("down_alert_state.json");
        std::fs::write(&path, "{ not json")?;
        let store = JsonStore::<StatusRecord>::new(path);

        let transitions =
            down_alert::apply_observation(&store, &Notifier::test_mode(), "Pi-hole", observe(false, true)).await?;

        assert_eq!(transitions, vec![Transition::ServiceDown]);
        assert_eq!(store.load()?.service_status, ServiceStatus::Down);
        Ok(())
    }

    #[tokio::test]
    async fn test_monitor_sustained_breach_alerts_once() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = JsonStore::<MetricSnapshot>::new(dir.path().join("monitor_state.json"));
        let notifier = Notifier::test_mode();
        let limits = Thresholds::default();
        let hot = sample(Some(95.0), Some(40.0), Some(30.0), Some(50.0));

        let first = monitor::apply_sample(&store, &notifier, &limits, hot.clone(), false).await?;
        assert!(first.should_notify);
        assert!(first.message.starts_with(ALERT_HEADER));

        let second = monitor::apply_sample(&store, &notifier, &limits, hot.clone(), false).await?;
        assert!(!second.should_notify);

        let forced = monitor::apply_sample(&store, &notifier, &limits, hot, true).await?;
        assert!(forced.should_notify);

        let snapshot = store.load()?;
        assert_eq!(snapshot.value(Metric::Cpu), Some(95.0));
        assert_eq!(snapshot.alert_flags.get(&Metric::Cpu), Some(&true));
        assert_eq!(snapshot.alert_flags.get(&Metric::Ram), Some(&false));
        assert!(snapshot.last_check.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_monitor_null_temperature_is_stored_as_null() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = JsonStore::<MetricSnapshot>::new(dir.path().join("monitor_state.json"));

        let evaluation = monitor::apply_sample(
            &store,
            &Notifier::test_mode(),
            &Thresholds::default(),
            sample(Some(10.0), Some(20.0), Some(30.0), None),
            false,
        )
        .await?;
        assert!(!evaluation.should_notify);

        let raw = std::fs::read_to_string(store.path())?;
        assert!(raw.contains("\"temp\": null"));
        assert_eq!(store.load()?.value(Metric::Temp), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_maintenance_records_every_task_even_after_failure() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut mock = MockCommandRunner::new();
        mock.expect_run().times(4).returning(|spec: &CommandSpec| {
            let failed = spec.label == "pihole_update";
            Ok(CommandOutput {
                exit_code: Some(if failed { 1 } else { 0 }),
                output: format!("{} output", spec.label),
            })
        });

        let runner = TaskRunner::new(Arc::new(mock), dir.path().join("logs"));
        let store = JsonStore::<TaskHistory>::new(dir.path().join("maintenance_state.json"));

        let summary = maintenance::run_and_record(&runner, &store, TaskSelection::All).await;
        assert_eq!(summary.outcomes.len(), 4);
        assert_eq!(summary.failures(), 1);
        assert!(summary.unsaved.is_empty());

        let history = store.load()?;
        assert_eq!(history.len(), 4);
        assert!(!history.get(Task::PiholeUpdate).map(|r| r.success).unwrap_or(true));
        assert!(history.get(Task::Gravity).map(|r| r.success).unwrap_or(false));
        assert_eq!(
            history.get(Task::ClearLogs).map(|r| r.output.as_str()),
            Some("clear_logs output")
        );

        let message = maintenance::summary_message(&summary);
        assert!(message.starts_with("Maintenance Summary ("));
        assert!(message.contains("os_update: ✅ Success"));
        assert!(message.contains("pihole_update: ❌ Failed"));
        Ok(())
    }

    #[tokio::test]
    async fn test_maintenance_keeps_going_when_state_cannot_be_written() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory")?;

        let mut mock = MockCommandRunner::new();
        mock.expect_run().times(4).returning(|_| {
            Ok(CommandOutput {
                exit_code: Some(0),
                output: "done".to_string(),
            })
        });

        let runner = TaskRunner::new(Arc::new(mock), dir.path().join("logs"));
        let store = JsonStore::<TaskHistory>::new(blocker.join("maintenance_state.json"));

        let summary = maintenance::run_and_record(&runner, &store, TaskSelection::All).await;
        assert_eq!(summary.outcomes.len(), 4);
        assert!(summary.all_succeeded());
        assert_eq!(summary.unsaved, Task::ALL.to_vec());

        let message = maintenance::summary_message(&summary);
        assert!(message.contains("clear_logs: ✅ Success"));
        assert!(message.contains("❌ Could not save os_update result"));
        assert!(message.contains("❌ Could not save clear_logs result"));
        Ok(())
    }

    #[tokio::test]
    async fn test_maintenance_single_task_replaces_its_record() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut mock = MockCommandRunner::new();
        let mut exit_codes = vec![1, 0].into_iter();
        mock.expect_run().times(2).returning(move |_| {
            Ok(CommandOutput {
                exit_code: exit_codes.next(),
                output: "done".to_string(),
            })
        });

        let runner = TaskRunner::new(Arc::new(mock), dir.path().join("logs"));
        let store = JsonStore::<TaskHistory>::new(dir.path().join("maintenance_state.json"));
        let gravity = TaskSelection::One(Task::Gravity);

        maintenance::run_and_record(&runner, &store, gravity).await;
        assert!(!store.load()?.get(Task::Gravity).map(|r| r.success).unwrap_or(true));

        maintenance::run_and_record(&runner, &store, gravity).await;
        let history = store.load()?;
        assert_eq!(history.len(), 1);
        assert!(history.get(Task::Gravity).map(|r| r.success).unwrap_or(false));
        Ok(())
    }
}
