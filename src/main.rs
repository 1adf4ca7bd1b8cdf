use std::sync::Arc;

use corpus_bot::config::BotConfig;
use corpus_bot::dispatcher::Dispatcher;
use corpus_bot::search::{HttpSearchClient, SearchBackend};
use corpus_bot::sheets::{SheetsBackend, SheetsClient};
use corpus_bot::telegram::{TelegramApi, spawn_update_stream};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC-...");
        std::process::exit(1);
    });

    eprintln!("📋 corpus-bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Sheet: {} / {}",
        config.sheets.spreadsheet_name, config.sheets.worksheet_name
    );
    eprintln!(
        "   Allowed users: {}",
        if config.allowed_users.iter().any(|u| u == "*") {
            "everyone".to_string()
        } else {
            config.allowed_users.join(", ")
        }
    );

    // Spreadsheet backend. A failed connection degrades the finish action to
    // "cannot save" for the lifetime of the process.
    let sheets = match SheetsClient::connect(&config.sheets).await {
        Ok(client) => SheetsBackend::Available(Arc::new(client)),
        Err(e) => {
            tracing::error!("Error connecting to Google Sheets: {e}");
            SheetsBackend::Unavailable
        }
    };
    eprintln!(
        "   Sheets: {}",
        if sheets.is_available() {
            "connected"
        } else {
            "unavailable (saving disabled)"
        }
    );

    let search = match config.search.endpoint {
        Some(ref endpoint) => {
            eprintln!("   Search: {endpoint}");
            SearchBackend::Available(Arc::new(HttpSearchClient::new(
                endpoint.clone(),
                config.search.api_key.clone(),
            )))
        }
        None => {
            eprintln!("   Search: disabled (SEARCH_API_URL not set)");
            SearchBackend::Unavailable
        }
    };

    let api = TelegramApi::new(config.telegram_token.clone());
    if let Err(e) = api.health_check().await {
        tracing::warn!("Telegram health check failed: {e}");
    }

    let events = spawn_update_stream(api.clone(), config.allowed_users.clone());
    let dispatcher = Dispatcher::new(Arc::new(api), sheets, search);
    dispatcher.run(events).await;

    Ok(())
}
