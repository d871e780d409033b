// Resource sampling: CPU, memory, root filesystem and SoC temperature

use crate::process::{CommandRunner, CommandSpec};
use crate::state::{Metric, MetricValues};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Components, Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

/// Sensor labels that belong to the CPU package
const CPU_SENSOR_HINTS: [&str; 4] = ["core", "cpu", "package", "soc"];

pub struct MetricsProbe {
    runner: Arc<dyn CommandRunner>,
    cpu_interval: Duration,
}

impl MetricsProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            cpu_interval: Duration::from_secs(1),
        }
    }

    /// Take one sample. Readings that are unavailable on this host are `None`.
    pub async fn sample(&self) -> MetricValues {
        let mut sys = System::new();

        // CPU usage needs two refreshes at least one update interval apart
        sys.refresh_cpu();
        tokio::time::sleep(self.cpu_interval.max(MINIMUM_CPU_UPDATE_INTERVAL)).await;
        sys.refresh_cpu();
        let cpu = Some(round1(sys.global_cpu_info().cpu_usage() as f64));

        sys.refresh_memory();
        let ram = percent(sys.used_memory(), sys.total_memory());

        let disk = root_disk_usage();
        if disk.is_none() {
            tracing::warn!("No root filesystem found for disk usage");
        }

        let temp = match sensor_temperature() {
            Some(temp) => Some(temp),
            None => self.vcgencmd_temperature().await,
        };

        let mut values = MetricValues::new();
        values.insert(Metric::Cpu, cpu);
        values.insert(Metric::Ram, ram);
        values.insert(Metric::Disk, disk);
        values.insert(Metric::Temp, temp);
        values
    }

    /// Raspberry Pi firmware fallback when no kernel sensor is exposed
    async fn vcgencmd_temperature(&self) -> Option<f64> {
        let command = CommandSpec::new("vcgencmd", &["measure_temp"]);
        match self.runner.run(&command).await {
            Ok(output) if output.success() => parse_vcgencmd_temp(&output.output).map(round1),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("No temperature source available: {:#}", e);
                None
            }
        }
    }
}

fn root_disk_usage() -> Option<f64> {
    let disks = Disks::new_with_refreshed_list();
    let root = disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))?;

    let total = root.total_space();
    percent(total.saturating_sub(root.available_space()), total)
}

fn sensor_temperature() -> Option<f64> {
    let components = Components::new_with_refreshed_list();
    components
        .list()
        .iter()
        .find(|component| {
            let label = component.label().to_lowercase();
            CPU_SENSOR_HINTS.iter().any(|hint| label.contains(hint))
        })
        .map(|component| component.temperature() as f64)
        .filter(|temp| temp.is_finite() && *temp > 0.0)
        .map(round1)
}

fn percent(used: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(round1(used as f64 / total as f64 * 100.0))
}

/// Parse `vcgencmd measure_temp` output such as `temp=48.3'C`
pub fn parse_vcgencmd_temp(output: &str) -> Option<f64> {
    let value = output.trim().strip_prefix("temp=")?;
    value.trim_end_matches("'C").trim().parse().ok()
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, MockCommandRunner};

    #[test]
    fn test_parse_vcgencmd_temp() {
        assert_eq!(parse_vcgencmd_temp("temp=48.3'C\n"), Some(48.3));
        assert_eq!(parse_vcgencmd_temp("temp=61.0'C"), Some(61.0));
        assert_eq!(parse_vcgencmd_temp("error=1 error_msg=\"Command not registered\""), None);
        assert_eq!(parse_vcgencmd_temp(""), None);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(91.26), 91.3);
        assert_eq!(round1(12.04), 12.0);
    }

    #[test]
    fn test_percent_of_zero_total_is_unknown() {
        assert_eq!(percent(10, 0), None);
        assert_eq!(percent(1, 4), Some(25.0));
    }

    #[tokio::test]
    async fn test_vcgencmd_fallback() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|spec| spec.program.to_str() == Some("vcgencmd"))
            .returning(|_| {
                Ok(CommandOutput {
                    exit_code: Some(0),
                    output: "temp=52.6'C".to_string(),
                })
            });

        let probe = MetricsProbe::new(Arc::new(runner));
        assert_eq!(probe.vcgencmd_temperature().await, Some(52.6));
    }

    #[tokio::test]
    async fn test_vcgencmd_missing_is_none() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Err(anyhow::anyhow!("failed to spawn: No such file or directory")));

        let probe = MetricsProbe::new(Arc::new(runner));
        assert_eq!(probe.vcgencmd_temperature().await, None);
    }
}
