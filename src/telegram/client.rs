// Telegram Bot API client

use crate::config::TelegramConfig;
use crate::error::{PiwatchError, Result};
use crate::telegram::{ApiResponse, InlineKeyboardMarkup, Update};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// Longest response body quoted back in an error
const MAX_ERROR_BODY: usize = 300;

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("piwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create telegram http client")?;

        Ok(Self {
            http,
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            timeout: timeout.max(Duration::from_secs(1)),
        })
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        let token = config
            .token()
            .ok_or(PiwatchError::MissingCredential("telegram.bot_token"))?;
        Self::new(&config.api_base, token, Duration::from_secs(config.timeout_secs))
    }

    /// Post `text` to `chat_id`, optionally with an inline keyboard
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = serde_json::to_value(markup)?;
        }
        self.call::<Value>("sendMessage", &body, self.timeout).await?;
        Ok(())
    }

    pub async fn edit_message_text(&self, chat_id: &str, message_id: i64, text: &str) -> Result<()> {
        let body = json!({ "chat_id": chat_id, "message_id": message_id, "text": text });
        self.call::<Value>("editMessageText", &body, self.timeout).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let body = json!({ "callback_query_id": callback_query_id });
        self.call::<Value>("answerCallbackQuery", &body, self.timeout).await?;
        Ok(())
    }

    /// Long-poll for updates newer than `offset`
    pub async fn get_updates(&self, offset: Option<i64>, poll_timeout_secs: u64) -> Result<Vec<Update>> {
        let mut body = json!({
            "timeout": poll_timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        // The HTTP timeout has to outlast the server-side long poll
        let timeout = Duration::from_secs(poll_timeout_secs) + self.timeout;
        self.call("getUpdates", &body, timeout).await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value, timeout: Duration) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| PiwatchError::Telegram(format!("{} failed: {}", method, e.without_url())))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PiwatchError::Telegram(format!(
                "{} returned {}: {}",
                method,
                status,
                truncate(&text, MAX_ERROR_BODY)
            ))
            .into());
        }

        let parsed: ApiResponse<T> = serde_json::from_str(&text)
            .map_err(|e| PiwatchError::Telegram(format!("{} returned invalid JSON: {}", method, e)))?;
        if !parsed.ok {
            return Err(PiwatchError::Telegram(format!(
                "{} rejected: {}",
                method,
                parsed.description.unwrap_or_else(|| "unknown error".to_string())
            ))
            .into());
        }

        parsed
            .result
            .ok_or_else(|| PiwatchError::Telegram(format!("{} returned no result", method)).into())
    }
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
