//! Error types for corpus-bot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Sheets error: {0}")]
    Sheets(#[from] SheetsError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

/// Configuration-related errors. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Telegram transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send message to chat {chat_id}: {reason}")]
    SendFailed { chat_id: i64, reason: String },

    #[error("Failed to edit message {message_id} in chat {chat_id}: {reason}")]
    EditFailed {
        chat_id: i64,
        message_id: i64,
        reason: String,
    },

    #[error("Failed to answer callback query {id}: {reason}")]
    CallbackAnswerFailed { id: String, reason: String },

    #[error("Bot API health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Google Sheets backend errors.
///
/// Raised either while connecting at startup (credentials, token exchange,
/// spreadsheet/worksheet resolution) or on a later `append_row` call. The
/// caller decides which of those is fatal; none of them are here.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("Failed to read credentials file {path}: {reason}")]
    Credentials { path: String, reason: String },

    #[error("OAuth token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    #[error("Worksheet {worksheet} not found in spreadsheet {spreadsheet}")]
    WorksheetNotFound {
        spreadsheet: String,
        worksheet: String,
    },

    #[error("Append failed: {0}")]
    AppendFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Search service errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response from search service: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
