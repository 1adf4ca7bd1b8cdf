//! Search dialogue — one query in, rendered results out.

use crate::dialogue::DialogueState;
use crate::error::ChannelError;
use crate::search::{SearchBackend, render_results};
use crate::session::SessionStore;
use crate::telegram::api::Transport;

pub const ASK_QUERY: &str = "What would you like to search for?";
pub const NO_RESULTS: &str = "No search results found.";
pub const SEARCH_FAILED: &str = "Sorry, an error occurred while performing the search.";
pub const SEARCH_CANCELLED: &str = "Search cancelled.";

/// `/search` entry point: ask for the query.
pub async fn start(
    transport: &dyn Transport,
    sessions: &mut SessionStore,
    chat_id: i64,
    user_id: i64,
) -> Result<(), ChannelError> {
    sessions.begin(user_id, DialogueState::AwaitingQuery);
    transport.reply(chat_id, ASK_QUERY).await
}

/// The next plain text message is the complete query; run it and render the
/// outcome. Terminal whatever happens, so the session is evicted up front.
pub async fn on_query(
    transport: &dyn Transport,
    search: &SearchBackend,
    sessions: &mut SessionStore,
    chat_id: i64,
    user_id: i64,
    query: &str,
) -> Result<(), ChannelError> {
    sessions.end(user_id);

    transport
        .reply(chat_id, &format!("Searching for '{query}'..."))
        .await?;

    let reply = match search {
        SearchBackend::Available(provider) => {
            let queries = vec![query.to_string()];
            match provider.search(&queries).await {
                Ok(sets) => render_results(&sets).unwrap_or_else(|| NO_RESULTS.to_string()),
                Err(e) => {
                    tracing::error!("Error during search: {e}");
                    SEARCH_FAILED.to_string()
                }
            }
        }
        SearchBackend::Unavailable => {
            tracing::warn!("Search requested but no search backend is configured");
            SEARCH_FAILED.to_string()
        }
    };

    transport.reply(chat_id, &reply).await
}

/// `/cancel` command while awaiting the query.
pub async fn cancel(
    transport: &dyn Transport,
    sessions: &mut SessionStore,
    chat_id: i64,
    user_id: i64,
) -> Result<(), ChannelError> {
    sessions.end(user_id);
    transport.reply(chat_id, SEARCH_CANCELLED).await
}
