// Internet reachability via a single ICMP echo

use crate::process::{CommandRunner, CommandSpec};
use std::sync::Arc;

pub struct ConnectivityProbe {
    runner: Arc<dyn CommandRunner>,
    host: String,
    timeout_secs: u64,
}

impl ConnectivityProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, host: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            runner,
            host: host.into(),
            timeout_secs: timeout_secs.max(1),
        }
    }

    pub fn command(&self) -> CommandSpec {
        let timeout = self.timeout_secs.to_string();
        CommandSpec::new("ping", &["-c", "1", "-W", &timeout, &self.host]).with_label("ping")
    }

    /// One echo reply within the timeout means the internet is reachable
    pub async fn is_reachable(&self) -> bool {
        match self.runner.run(&self.command()).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::warn!("Error checking internet: {:#}", e);
                false
            }
        }
    }
}
