// Retry and backoff helpers for the system bus and the update poller

use crate::error::{PiwatchError, Result};
use std::time::Duration;
use tokio::time::sleep;
use zbus::Connection;

/// Bounded retry around fallible async operations
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    max_retries: usize,
    retry_delay: Duration,
    connection_timeout: Duration,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl ConnectionManager {
    pub fn new(max_retries: usize, retry_delay: Duration, connection_timeout: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
            connection_timeout,
        }
    }

    /// Connect to the system bus, giving up after the configured timeout
    pub async fn connect_system_bus(&self) -> Result<Connection> {
        self.with_retry("system bus connection", || async {
            let conn = tokio::time::timeout(self.connection_timeout, Connection::system())
                .await
                .map_err(|_| PiwatchError::SystemBus("Connection timeout".to_string()))?
                .map_err(|e| PiwatchError::SystemBus(format!("Failed to connect: {}", e)))?;

            Ok(conn)
        })
        .await
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of attempts
    pub async fn with_retry<F, T, Fut>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::info!("Operation '{}' succeeded on attempt {}", operation_name, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    tracing::warn!("Operation '{}' failed on attempt {}: {}", operation_name, attempt, error);
                    let permanent = self.should_not_retry(&error);
                    last_error = Some(error);

                    if permanent {
                        break;
                    }

                    if attempt < self.max_retries {
                        tracing::debug!("Retrying in {:?}...", self.retry_delay);
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            PiwatchError::SystemBus(format!("'{}' was never attempted", operation_name)).into()
        }))
    }

    /// Errors that will not go away by asking again
    fn should_not_retry(&self, error: &anyhow::Error) -> bool {
        let error_str = error.to_string().to_lowercase();

        if error_str.contains("permission denied") || error_str.contains("access denied") {
            return true;
        }

        if error_str.contains("not found") || error_str.contains("no such file") {
            return true;
        }

        if error_str.contains("authentication") {
            return true;
        }

        error_str.contains("invalid argument") || error_str.contains("invalid name")
    }
}

/// Delay schedule between failed attempts
#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    Immediate,
    ExponentialBackoff {
        base_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
    FixedDelay(Duration),
}

impl Default for RecoveryStrategy {
    fn default() -> Self {
        Self::ExponentialBackoff {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl RecoveryStrategy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RecoveryStrategy::Immediate => Duration::from_millis(0),
            RecoveryStrategy::FixedDelay(duration) => *duration,
            RecoveryStrategy::ExponentialBackoff {
                base_delay,
                max_delay,
                multiplier,
            } => {
                let exponent = attempt.max(1) as i32 - 1;
                let delay_ms = base_delay.as_millis() as f64 * multiplier.powi(exponent);
                Duration::from_millis(delay_ms as u64).min(*max_delay)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_with_retry_recovers() -> Result<()> {
        let manager = ConnectionManager::new(3, Duration::from_millis(10), Duration::from_secs(1));

        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = manager
            .with_retry("test_operation", move || {
                let count = call_count_clone.clone();
                async move {
                    let current = count.fetch_add(1, Ordering::SeqCst) + 1;
                    if current < 2 {
                        Err(anyhow::anyhow!("Simulated failure"))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await?;

        assert_eq!(result, "success");
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_permanent_error() {
        let manager = ConnectionManager::new(5, Duration::from_millis(10), Duration::from_secs(1));
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result: Result<()> = manager
            .with_retry("lookup", move || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::anyhow!("Unit not found"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_max_attempts() {
        let manager = ConnectionManager::new(2, Duration::from_millis(1), Duration::from_secs(1));
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result: Result<()> = manager
            .with_retry("flaky", move || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::anyhow!("connection reset"))
                }
            })
            .await;

        assert!(result.unwrap_err().to_string().contains("connection reset"));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let strategy = RecoveryStrategy::ExponentialBackoff {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        };

        assert_eq!(strategy.delay(1), Duration::from_millis(100));
        assert_eq!(strategy.delay(2), Duration::from_millis(200));
        assert_eq!(strategy.delay(3), Duration::from_millis(400));
        assert_eq!(strategy.delay(4), Duration::from_millis(500));
    }

    #[test]
    fn test_fixed_and_immediate_strategies() {
        assert_eq!(RecoveryStrategy::Immediate.delay(5), Duration::from_millis(0));

        let fixed = RecoveryStrategy::FixedDelay(Duration::from_secs(2));
        assert_eq!(fixed.delay(1), Duration::from_secs(2));
        assert_eq!(fixed.delay(5), Duration::from_secs(2));
    }
}
