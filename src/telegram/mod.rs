//! Telegram transport — long-polls the Bot API for updates and sends replies.

pub mod api;
pub mod poller;
pub mod update;

pub use api::{InlineButton, Keyboard, TelegramApi, Transport};
pub use poller::{EventStream, spawn_update_stream};
pub use update::{Command, TelegramEvent, UserRef};
