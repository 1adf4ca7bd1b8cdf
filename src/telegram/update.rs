//! Inbound update parsing — raw `getUpdates` JSON into typed events.

use serde_json::Value;

/// The user behind an inbound update.
#[derive(Debug, Clone)]
pub struct UserRef {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl UserRef {
    /// Identities checked against the allowlist: username and numeric id.
    pub fn identities(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(ref name) = self.username {
            ids.push(name.clone());
        }
        ids.push(self.id.to_string());
        ids
    }

    /// Name used to address the user in replies.
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("there")
    }
}

/// Commands the bot reacts to. Anything else is `Other` and ignored upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Search,
    Cancel,
    Other(String),
}

impl Command {
    /// Parse a message text as a bot command. Returns `None` for plain text.
    ///
    /// Handles the `/command@BotName` form Telegram sends in group chats;
    /// arguments after the command token are ignored.
    pub fn parse(text: &str) -> Option<Command> {
        let rest = text.strip_prefix('/')?;
        let token = rest.split_whitespace().next().unwrap_or("");
        let name = token.split('@').next().unwrap_or("");
        if name.is_empty() {
            return None;
        }
        Some(match name {
            "start" => Command::Start,
            "search" => Command::Search,
            "cancel" => Command::Cancel,
            other => Command::Other(other.to_string()),
        })
    }
}

/// One parsed inbound event.
#[derive(Debug, Clone)]
pub enum TelegramEvent {
    /// A `/command` message.
    Command {
        chat_id: i64,
        user: UserRef,
        command: Command,
    },
    /// A plain text message.
    Text {
        chat_id: i64,
        user: UserRef,
        text: String,
    },
    /// An inline keyboard button press.
    Callback {
        id: String,
        chat_id: i64,
        message_id: i64,
        user: UserRef,
        data: String,
    },
}

impl TelegramEvent {
    pub fn user(&self) -> &UserRef {
        match self {
            Self::Command { user, .. } | Self::Text { user, .. } | Self::Callback { user, .. } => {
                user
            }
        }
    }
}

/// Parse one raw `getUpdates` entry.
///
/// Returns `None` for update kinds the bot does not handle (edited messages,
/// media without text, callbacks detached from a message, and so on).
pub fn parse_update(update: &Value) -> Option<TelegramEvent> {
    if let Some(callback) = update.get("callback_query") {
        return parse_callback(callback);
    }

    let message = update.get("message")?;
    let text = message.get("text").and_then(Value::as_str)?;
    let user = parse_user(message.get("from")?)?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)?;

    Some(match Command::parse(text) {
        Some(command) => TelegramEvent::Command {
            chat_id,
            user,
            command,
        },
        None => TelegramEvent::Text {
            chat_id,
            user,
            text: text.to_string(),
        },
    })
}

fn parse_callback(callback: &Value) -> Option<TelegramEvent> {
    let id = callback.get("id").and_then(Value::as_str)?.to_string();
    let data = callback.get("data").and_then(Value::as_str)?.to_string();
    let user = parse_user(callback.get("from")?)?;

    // The originating message carries the chat and message ids needed to
    // edit the prompt in place.
    let message = callback.get("message")?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)?;
    let message_id = message.get("message_id").and_then(Value::as_i64)?;

    Some(TelegramEvent::Callback {
        id,
        chat_id,
        message_id,
        user,
        data,
    })
}

fn parse_user(from: &Value) -> Option<UserRef> {
    let id = from.get("id").and_then(Value::as_i64)?;
    Some(UserRef {
        id,
        username: from
            .get("username")
            .and_then(Value::as_str)
            .map(String::from),
        first_name: from
            .get("first_name")
            .and_then(Value::as_str)
            .map(String::from),
    })
}
