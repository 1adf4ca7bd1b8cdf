//! Outbound Bot API client and the `Transport` seam the dialogues talk through.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// One inline keyboard button.
#[derive(Debug, Clone, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of inline keyboard buttons.
pub type Keyboard = Vec<Vec<InlineButton>>;

/// Reply surface the dialogues use, so they can run against a recording
/// stub in tests instead of the live Bot API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a plain text message.
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), ChannelError>;

    /// Send a text message with an inline keyboard attached.
    async fn reply_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ChannelError>;

    /// Replace the text (and keyboard) of a previously sent message.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), ChannelError>;

    /// Acknowledge a callback query so the client stops showing a spinner.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError>;
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramApi {
    token: SecretString,
    base_url: String,
    client: reqwest::Client,
}

impl TelegramApi {
    pub fn new(token: SecretString) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Point the client at a different server. Tests use this to talk to a
    /// local mock instead of api.telegram.org.
    pub fn with_base_url(token: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            token,
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub(crate) fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.base_url,
            self.token.expose_secret()
        )
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Verify the token against `getMe`.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::HealthCheckFailed(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::HealthCheckFailed(format!(
                "getMe returned {}",
                resp.status()
            )))
        }
    }

    /// Send a single message chunk (≤4096 chars).
    async fn send_chunk(&self, chat_id: i64, body: &serde_json::Value) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                chat_id,
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                chat_id,
                reason: format!("sendMessage returned {status}: {detail}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramApi {
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        // Split long messages; search result lists can exceed the limit.
        for chunk in split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH) {
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            self.send_chunk(chat_id, &body).await?;
        }
        Ok(())
    }

    async fn reply_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "reply_markup": {"inline_keyboard": keyboard},
        });
        self.send_chunk(chat_id, &body).await
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        let resp = self
            .client
            .post(self.api_url("editMessageText"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::EditFailed {
                chat_id,
                message_id,
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(ChannelError::EditFailed {
                chat_id,
                message_id,
                reason: format!("editMessageText returned {status}: {detail}"),
            });
        }
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({"callback_query_id": callback_id});
        let resp = self
            .client
            .post(self.api_url("answerCallbackQuery"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::CallbackAnswerFailed {
                id: callback_id.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ChannelError::CallbackAnswerFailed {
                id: callback_id.to_string(),
                reason: format!("answerCallbackQuery returned {}", resp.status()),
            });
        }
        Ok(())
    }
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let chunk = &remaining[..max_len];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(max_len);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { max_len } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}
