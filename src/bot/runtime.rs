// Long-poll loop driving the control surface

use crate::bot::events::BotEvent;
use crate::bot::surface::ControlSurface;
use crate::config::Config;
use crate::error::Result;
use crate::process::SystemCommandRunner;
use crate::resilience::RecoveryStrategy;
use crate::telegram::TelegramClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const EVENT_QUEUE_DEPTH: usize = 64;

/// Start the bot and serve until interrupted
pub async fn run(config: &Config) -> Result<()> {
    config.require_telegram()?;
    let client = TelegramClient::from_config(&config.telegram)?;
    let surface = Arc::new(ControlSurface::from_config(
        config,
        Arc::new(client.clone()),
        Arc::new(SystemCommandRunner::new()),
    )?);

    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let poller = spawn_update_poller(
        client,
        config.telegram.poll_timeout_secs,
        RecoveryStrategy::default(),
        tx,
    );
    tracing::info!("Monitor and maintenance bot is running");

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    tracing::error!("Update poller stopped");
                    break;
                };
                let surface = surface.clone();
                // Each event gets its own task so a long maintenance run does not block /status
                tokio::spawn(async move {
                    if let Err(e) = surface.handle(event).await {
                        tracing::error!("Failed to handle update: {:#}", e);
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down bot");
                break;
            }
        }
    }

    poller.abort();
    Ok(())
}

/// Long-poll `getUpdates` and forward parsed events until the receiver goes away
pub fn spawn_update_poller(
    client: TelegramClient,
    poll_timeout_secs: u64,
    backoff: RecoveryStrategy,
    tx: mpsc::Sender<BotEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut offset = None;
        let mut failures = 0usize;

        loop {
            match client.get_updates(offset, poll_timeout_secs).await {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        let Some(event) = BotEvent::from_update(update) else {
                            continue;
                        };
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    let delay = backoff.delay(failures);
                    tracing::warn!("getUpdates failed ({} in a row), retrying in {:?}: {:#}", failures, delay, e);
                    tokio::time::sleep(delay).await;
                }
            }

            if tx.is_closed() {
                return;
            }
        }
    })
}
