// Outbound operator notifications

use crate::config::Config;
use crate::error::{PiwatchError, Result};
use crate::telegram::TelegramClient;

#[derive(Debug, Clone)]
enum Delivery {
    Telegram { client: TelegramClient, chat_id: String },
    /// Alerts are logged instead of sent
    TestMode,
}

/// Delivers alert text to the operator chat.
///
/// Delivery failures are logged and swallowed: a lost alert must never stop
/// state from being persisted.
#[derive(Debug, Clone)]
pub struct Notifier {
    delivery: Delivery,
}

impl Notifier {
    pub fn telegram(client: TelegramClient, chat_id: impl Into<String>) -> Self {
        Self {
            delivery: Delivery::Telegram {
                client,
                chat_id: chat_id.into(),
            },
        }
    }

    pub fn test_mode() -> Self {
        Self {
            delivery: Delivery::TestMode,
        }
    }

    /// Build from config; outside test mode missing credentials are fatal
    pub fn from_config(config: &Config, test_mode: bool) -> Result<Self> {
        if test_mode {
            return Ok(Self::test_mode());
        }
        config.require_telegram()?;
        let chat_id = config
            .telegram
            .chat()
            .ok_or(PiwatchError::MissingCredential("telegram.chat_id"))?;
        Ok(Self::telegram(TelegramClient::from_config(&config.telegram)?, chat_id))
    }

    pub fn is_test_mode(&self) -> bool {
        matches!(self.delivery, Delivery::TestMode)
    }

    /// Send `text`; returns whether it was delivered
    pub async fn notify(&self, text: &str) -> bool {
        match &self.delivery {
            Delivery::TestMode => {
                tracing::info!("[TEST MODE] Telegram alert: {}", text);
                false
            }
            Delivery::Telegram { client, chat_id } => {
                match client.send_message(chat_id, text, None).await {
                    Ok(()) => {
                        tracing::info!("Telegram alert sent: {}", text);
                        true
                    }
                    Err(e) => {
                        tracing::error!("Failed to send Telegram alert: {:#}", e);
                        false
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn client_for(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&server.base_url(), "TOKEN", Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_posts_chat_id_and_text() {
        let server = MockServer::start();
        let send = server.mock(|when, then| {
            when.method(POST)
                .path("/botTOKEN/sendMessage")
                .json_body(json!({"chat_id": "4242", "text": "⚠️ Pi-hole is DOWN!"}));
            then.status(200).json_body(json!({
                "ok": true,
                "result": {"message_id": 7, "chat": {"id": 4242}}
            }));
        });

        let notifier = Notifier::telegram(client_for(&server), "4242");
        assert!(notifier.notify("⚠️ Pi-hole is DOWN!").await);
        send.assert_calls(1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_swallowed() {
        let server = MockServer::start();
        let send = server.mock(|when, then| {
            when.method(POST).path("/botTOKEN/sendMessage");
            then.status(500).body("upstream down");
        });

        let notifier = Notifier::telegram(client_for(&server), "1");
        assert!(!notifier.notify("hello").await);
        // Exactly one attempt: failures are never retried
        send.assert_calls(1);
    }

    #[tokio::test]
    async fn test_rejected_message_is_swallowed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/botTOKEN/sendMessage");
            then.status(200)
                .json_body(json!({"ok": false, "description": "Bad Request: chat not found"}));
        });

        let notifier = Notifier::telegram(client_for(&server), "1");
        assert!(!notifier.notify("hello").await);
    }

    #[tokio::test]
    async fn test_test_mode_never_sends() {
        let notifier = Notifier::test_mode();
        assert!(notifier.is_test_mode());
        assert!(!notifier.notify("hello").await);
    }

    #[test]
    fn test_from_config_requires_credentials_outside_test_mode() {
        let config = Config::default();
        assert!(Notifier::from_config(&config, false).is_err());
        assert!(Notifier::from_config(&config, true).unwrap().is_test_mode());
    }
}
