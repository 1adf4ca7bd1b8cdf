//! Configuration, read from the environment at startup.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Placeholder value that ships in deployment templates. Starting the bot
/// with it still in place is always a mistake, so treat it as unset.
const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN";

/// Full bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token. Required.
    pub telegram_token: SecretString,
    /// Users allowed to talk to the bot (usernames or numeric ids, `*` = everyone).
    pub allowed_users: Vec<String>,
    /// Spreadsheet backend settings.
    pub sheets: SheetsConfig,
    /// Search backend settings.
    pub search: SearchConfig,
}

/// Google Sheets settings.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Path to the authorized-user credentials JSON file.
    pub credentials_file: PathBuf,
    /// Title of the spreadsheet to append to.
    pub spreadsheet_name: String,
    /// Title of the worksheet (tab) within the spreadsheet.
    pub worksheet_name: String,
}

/// Search service settings. The endpoint is optional; without it the search
/// feature degrades to a user-visible failure message.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<SecretString>,
}

impl BotConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty() && t != TOKEN_PLACEHOLDER)
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "TELEGRAM_BOT_TOKEN".into(),
                hint: "Set it to the token @BotFather issued for this bot.".into(),
            })?;

        let allowed_users: Vec<String> = lookup("TELEGRAM_ALLOWED_USERS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let sheets = SheetsConfig {
            credentials_file: lookup("GOOGLE_SHEETS_CREDENTIALS_FILE")
                .unwrap_or_else(|| "credentials.json".to_string())
                .into(),
            spreadsheet_name: lookup("GOOGLE_SHEET_NAME")
                .unwrap_or_else(|| "AI Training Dataset".to_string()),
            worksheet_name: lookup("WORKSHEET_NAME").unwrap_or_else(|| "Sheet1".to_string()),
        };

        let search = SearchConfig {
            endpoint: lookup("SEARCH_API_URL").filter(|u| !u.trim().is_empty()),
            api_key: lookup("SEARCH_API_KEY").map(SecretString::from),
        };

        Ok(Self {
            telegram_token: SecretString::from(token),
            allowed_users,
            sheets,
            search,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn placeholder_token_is_an_error() {
        assert!(load(&[("TELEGRAM_BOT_TOKEN", "YOUR_BOT_TOKEN")]).is_err());
    }

    #[test]
    fn blank_token_is_an_error() {
        assert!(load(&[("TELEGRAM_BOT_TOKEN", "   ")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("TELEGRAM_BOT_TOKEN", "123:ABC")]).unwrap();
        assert_eq!(config.allowed_users, vec!["*"]);
        assert_eq!(
            config.sheets.credentials_file,
            PathBuf::from("credentials.json")
        );
        assert_eq!(config.sheets.spreadsheet_name, "AI Training Dataset");
        assert_eq!(config.sheets.worksheet_name, "Sheet1");
        assert!(config.search.endpoint.is_none());
        assert!(config.search.api_key.is_none());
    }

    #[test]
    fn allowed_users_are_split_and_trimmed() {
        let config = load(&[
            ("TELEGRAM_BOT_TOKEN", "123:ABC"),
            ("TELEGRAM_ALLOWED_USERS", "alice, bob ,,42"),
        ])
        .unwrap();
        assert_eq!(config.allowed_users, vec!["alice", "bob", "42"]);
    }

    #[test]
    fn explicit_sheet_settings_win_over_defaults() {
        let config = load(&[
            ("TELEGRAM_BOT_TOKEN", "123:ABC"),
            ("GOOGLE_SHEETS_CREDENTIALS_FILE", "/etc/bot/creds.json"),
            ("GOOGLE_SHEET_NAME", "Field Notes"),
            ("WORKSHEET_NAME", "raw"),
        ])
        .unwrap();
        assert_eq!(
            config.sheets.credentials_file,
            PathBuf::from("/etc/bot/creds.json")
        );
        assert_eq!(config.sheets.spreadsheet_name, "Field Notes");
        assert_eq!(config.sheets.worksheet_name, "raw");
    }

    #[test]
    fn blank_search_endpoint_counts_as_unset() {
        let config = load(&[("TELEGRAM_BOT_TOKEN", "123:ABC"), ("SEARCH_API_URL", " ")]).unwrap();
        assert!(config.search.endpoint.is_none());
    }
}
