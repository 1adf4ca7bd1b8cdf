//! corpus-bot — a Telegram bot that collects free-text data points into a
//! Google Sheets dataset and proxies one-shot search queries.

pub mod config;
pub mod dialogue;
pub mod dispatcher;
pub mod error;
pub mod search;
pub mod session;
pub mod sheets;
pub mod telegram;
