// Operator events parsed from Telegram updates

use crate::tasks::TaskSelection;
use crate::telegram::Update;

/// Slash commands understood by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Status,
    Monitor,
    Maintenance,
    MaintenanceStatus,
    Help,
    Unknown(String),
}

impl BotCommand {
    /// Parse message text; `None` when the text is not a command at all.
    ///
    /// Handles the `/status@my_bot` form Telegram uses in group chats.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name).to_lowercase();

        Some(match name.as_str() {
            "status" => BotCommand::Status,
            "monitor" => BotCommand::Monitor,
            "maintenance" | "maintain" => BotCommand::Maintenance,
            "maintenance_status" => BotCommand::MaintenanceStatus,
            "start" | "help" => BotCommand::Help,
            _ => BotCommand::Unknown(name),
        })
    }
}

/// What an inline keyboard button asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Run(TaskSelection),
    Unknown,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        data.parse()
            .map(CallbackAction::Run)
            .unwrap_or(CallbackAction::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    Command {
        chat_id: i64,
        command: BotCommand,
    },
    Callback {
        chat_id: i64,
        callback_id: String,
        /// Message carrying the keyboard, edited to acknowledge the choice
        message_id: Option<i64>,
        action: CallbackAction,
    },
}

impl BotEvent {
    /// Extract the event from an update, skipping anything the bot ignores
    pub fn from_update(update: Update) -> Option<Self> {
        if let Some(callback) = update.callback_query {
            // Without the originating message there is no chat to authorize
            let message = callback.message?;
            return Some(BotEvent::Callback {
                chat_id: message.chat.id,
                callback_id: callback.id,
                message_id: Some(message.message_id),
                action: CallbackAction::parse(callback.data.as_deref().unwrap_or_default()),
            });
        }

        let message = update.message?;
        let command = BotCommand::parse(message.text.as_deref()?)?;
        Some(BotEvent::Command {
            chat_id: message.chat.id,
            command,
        })
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            BotEvent::Command { chat_id, .. } | BotEvent::Callback { chat_id, .. } => *chat_id,
        }
    }
}
