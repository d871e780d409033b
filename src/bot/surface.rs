// Per-chat command handling for the operator bot

use crate::bot::events::{BotCommand, BotEvent, CallbackAction};
use crate::bot::render;
use crate::config::{Config, Domain};
use crate::error::{PiwatchError, Result};
use crate::process::{CommandRunner, CommandSpec};
use crate::state::{JsonStore, MetricSnapshot, StateGateway, TaskHistory};
use crate::tasks::{RunSummary, Task, TaskOutcome, TaskRunner, TaskSelection};
use crate::telegram::{InlineKeyboardMarkup, TelegramClient};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outbound half of the operator chat
#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_menu(&self, chat_id: i64, text: &str, menu: &InlineKeyboardMarkup) -> Result<()>;
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()>;
}

#[async_trait]
impl ChatChannel for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(&chat_id.to_string(), text, None).await
    }

    async fn send_menu(&self, chat_id: i64, text: &str, menu: &InlineKeyboardMarkup) -> Result<()> {
        self.send_message(&chat_id.to_string(), text, Some(menu)).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.answer_callback_query(callback_id).await
    }

    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        self.edit_message_text(&chat_id.to_string(), message_id, text).await
    }
}

/// Where a chat is in the maintenance dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceState {
    #[default]
    Idle,
    AwaitingTaskChoice,
}

pub struct ControlSurface {
    channel: Arc<dyn ChatChannel>,
    runner: Arc<dyn CommandRunner>,
    task_runner: TaskRunner,
    /// Re-invocation of this binary that refreshes the monitor snapshot
    live_check: CommandSpec,
    authorized_chat: i64,
    monitor_state: StateGateway<MetricSnapshot>,
    maintenance_state: StateGateway<TaskHistory>,
    task_locks: HashMap<Task, Mutex<()>>,
    sessions: Mutex<HashMap<i64, SurfaceState>>,
}

impl ControlSurface {
    pub fn new(
        channel: Arc<dyn ChatChannel>,
        runner: Arc<dyn CommandRunner>,
        task_runner: TaskRunner,
        live_check: CommandSpec,
        authorized_chat: i64,
        monitor_state: StateGateway<MetricSnapshot>,
        maintenance_state: StateGateway<TaskHistory>,
    ) -> Self {
        Self {
            channel,
            runner,
            task_runner,
            live_check,
            authorized_chat,
            monitor_state,
            maintenance_state,
            task_locks: Task::ALL.into_iter().map(|task| (task, Mutex::new(()))).collect(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(
        config: &Config,
        channel: Arc<dyn ChatChannel>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let authorized_chat = config
            .telegram
            .chat()
            .ok_or(PiwatchError::MissingCredential("telegram.chat_id"))?
            .parse::<i64>()
            .map_err(|_| PiwatchError::Config("telegram.chat_id must be a numeric chat id".to_string()))?;

        let config_path = config.source.to_string_lossy().into_owned();
        let live_check = CommandSpec::new(
            config.launcher()?,
            &["--config", config_path.as_str(), "monitor", "--force"],
        )
        .with_label("live-check");

        Ok(Self::new(
            channel,
            runner.clone(),
            TaskRunner::new(runner, config.log_dir(Domain::Maintenance)),
            live_check,
            authorized_chat,
            StateGateway::new(JsonStore::new(config.state_file(Domain::Monitor))),
            StateGateway::new(JsonStore::new(config.state_file(Domain::Maintenance))),
        ))
    }

    pub async fn state(&self, chat_id: i64) -> SurfaceState {
        self.sessions
            .lock()
            .await
            .get(&chat_id)
            .copied()
            .unwrap_or_default()
    }

    async fn set_state(&self, chat_id: i64, state: SurfaceState) -> SurfaceState {
        self.sessions
            .lock()
            .await
            .insert(chat_id, state)
            .unwrap_or_default()
    }

    pub async fn handle(&self, event: BotEvent) -> Result<()> {
        if event.chat_id() != self.authorized_chat {
            tracing::warn!("Ignoring update from unauthorized chat {}", event.chat_id());
            return Ok(());
        }

        match event {
            BotEvent::Command { chat_id, command } => self.handle_command(chat_id, command).await,
            BotEvent::Callback {
                chat_id,
                callback_id,
                message_id,
                action,
            } => {
                self.handle_callback(chat_id, &callback_id, message_id, action)
                    .await
            }
        }
    }

    async fn handle_command(&self, chat_id: i64, command: BotCommand) -> Result<()> {
        tracing::info!("Command from {}: {:?}", chat_id, command);
        match command {
            BotCommand::Status | BotCommand::Monitor => {
                self.set_state(chat_id, SurfaceState::Idle).await;
                self.send_status(chat_id).await
            }
            BotCommand::Maintenance => {
                self.channel
                    .send_menu(chat_id, render::MENU_PROMPT, &render::task_menu())
                    .await?;
                self.set_state(chat_id, SurfaceState::AwaitingTaskChoice).await;
                Ok(())
            }
            BotCommand::MaintenanceStatus => {
                self.set_state(chat_id, SurfaceState::Idle).await;
                let history = self.maintenance_state.read().await.unwrap_or_default();
                self.channel
                    .send_text(chat_id, &render::format_history(&history))
                    .await
            }
            BotCommand::Help => {
                self.set_state(chat_id, SurfaceState::Idle).await;
                self.channel.send_text(chat_id, &render::help_text()).await
            }
            BotCommand::Unknown(name) => {
                self.set_state(chat_id, SurfaceState::Idle).await;
                self.channel
                    .send_text(chat_id, &render::unknown_command(&name))
                    .await
            }
        }
    }

    /// Force a fresh sample, then show whatever snapshot is on disk
    async fn send_status(&self, chat_id: i64) -> Result<()> {
        let fresh = self.run_live_check().await;
        let text = match self.monitor_state.read().await {
            Some(snapshot) => render::format_metrics(&snapshot, !fresh),
            None if fresh => render::NO_MONITOR_STATE.to_string(),
            None => format!("{}\n{}", render::STALE_NOTICE, render::NO_MONITOR_STATE),
        };
        self.channel.send_text(chat_id, &text).await
    }

    async fn run_live_check(&self) -> bool {
        match self.runner.run(&self.live_check).await {
            Ok(output) if output.success() => true,
            Ok(output) => {
                tracing::warn!("Live check failed: {}", output.output.trim());
                false
            }
            Err(e) => {
                tracing::warn!("Exception during live check: {:#}", e);
                false
            }
        }
    }

    async fn handle_callback(
        &self,
        chat_id: i64,
        callback_id: &str,
        message_id: Option<i64>,
        action: CallbackAction,
    ) -> Result<()> {
        if let Err(e) = self.channel.answer_callback(callback_id).await {
            tracing::warn!("Failed to answer callback {}: {:#}", callback_id, e);
        }

        let CallbackAction::Run(selection) = action else {
            tracing::warn!("Ignoring unknown callback from {}", chat_id);
            return Ok(());
        };

        // Keyboards stay clickable after a restart, so a choice is honoured in any state
        let previous = self.set_state(chat_id, SurfaceState::Idle).await;
        if previous != SurfaceState::AwaitingTaskChoice {
            tracing::debug!("Task choice from {} arrived while {:?}", chat_id, previous);
        }

        if let Some(message_id) = message_id {
            if let Err(e) = self
                .channel
                .edit_text(chat_id, message_id, &render::running(selection))
                .await
            {
                tracing::warn!("Failed to acknowledge {}: {:#}", selection, e);
            }
        }

        let reply = match selection {
            TaskSelection::One(task) => match self.run_exclusive(task).await {
                Some((outcome, saved)) => render::format_task_result(&outcome, saved),
                None => render::already_running(task),
            },
            TaskSelection::All => render::format_run_summary(&self.run_all().await),
        };
        self.channel.send_text(chat_id, &reply).await
    }

    /// Run `task` unless it is already running; `None` when it was
    async fn run_exclusive(&self, task: Task) -> Option<(TaskOutcome, bool)> {
        let Some(lock) = self.task_locks.get(&task) else {
            return Some(self.run_and_record(task).await);
        };
        let Ok(_guard) = lock.try_lock() else {
            tracing::info!("{} requested while already running", task);
            return None;
        };
        Some(self.run_and_record(task).await)
    }

    /// Run every task in order, waiting for any that are already running
    async fn run_all(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for task in Task::ALL {
            let _guard = match self.task_locks.get(&task) {
                Some(lock) => Some(lock.lock().await),
                None => None,
            };
            let (outcome, saved) = self.run_and_record(task).await;
            if !saved {
                summary.unsaved.push(task);
            }
            summary.outcomes.push(outcome);
        }
        summary
    }

    /// The flag is false when the record could not be persisted
    async fn run_and_record(&self, task: Task) -> (TaskOutcome, bool) {
        let outcome = self.task_runner.run(task).await;
        let record = outcome.to_record();
        let saved = match self
            .maintenance_state
            .update(|history| history.record(task, record))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to record {} result: {:#}", task, e);
                false
            }
        };
        (outcome, saved)
    }
}
