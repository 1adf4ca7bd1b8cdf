//! Long-poll loop — turns `getUpdates` responses into a stream of events.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use serde_json::Value;

use crate::telegram::api::TelegramApi;
use crate::telegram::update::{TelegramEvent, UserRef, parse_update};

/// Stream of parsed inbound events, in delivery order.
pub type EventStream = Pin<Box<dyn Stream<Item = TelegramEvent> + Send>>;

/// Seconds the server holds a `getUpdates` call open.
const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Delay before retrying after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Spawn the long-poll task and return the event stream it feeds.
///
/// Updates from users not on the allowlist are logged and dropped here, so
/// the dispatcher only ever sees authorized traffic. The task exits when the
/// stream is dropped.
pub fn spawn_update_stream(api: TelegramApi, allowed_users: Vec<String>) -> EventStream {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut offset: i64 = 0;

        tracing::info!("Listening for Telegram updates...");

        loop {
            let body = serde_json::json!({
                "offset": offset,
                "timeout": LONG_POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"],
            });

            let resp = match api
                .client()
                .post(api.api_url("getUpdates"))
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            let data: Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            if let Some(results) = data.get("result").and_then(Value::as_array) {
                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(event) = parse_update(update) else {
                        continue;
                    };

                    if !user_allowed(&allowed_users, event.user()) {
                        tracing::warn!(
                            user_id = event.user().id,
                            username = event.user().username.as_deref().unwrap_or("unknown"),
                            "Ignoring update from unauthorized user"
                        );
                        continue;
                    }

                    if tx.send(event).is_err() {
                        tracing::info!("Update stream closed");
                        return;
                    }
                }
            }
        }
    });

    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    }))
}

/// Check a user's identities (username, numeric id) against the allowlist.
fn user_allowed(allowed_users: &[String], user: &UserRef) -> bool {
    let identities = user.identities();
    allowed_users
        .iter()
        .any(|entry| entry == "*" || identities.iter().any(|id| id == entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, username: Option<&str>) -> UserRef {
        UserRef {
            id,
            username: username.map(String::from),
            first_name: None,
        }
    }

    #[test]
    fn wildcard_allows_anyone() {
        assert!(user_allowed(&["*".into()], &user(1, Some("anyone"))));
    }

    #[test]
    fn specific_username_allowed() {
        let allowed = vec!["alice".to_string(), "bob".to_string()];
        assert!(user_allowed(&allowed, &user(1, Some("alice"))));
        assert!(!user_allowed(&allowed, &user(2, Some("eve"))));
    }

    #[test]
    fn numeric_id_allowed_without_username() {
        let allowed = vec!["123456789".to_string()];
        assert!(user_allowed(&allowed, &user(123456789, None)));
        assert!(!user_allowed(&allowed, &user(987654321, None)));
    }

    #[test]
    fn empty_allowlist_denies_everyone() {
        assert!(!user_allowed(&[], &user(1, Some("anyone"))));
    }

    #[test]
    fn exact_match_not_substring() {
        let allowed = vec!["alice".to_string()];
        assert!(!user_allowed(&allowed, &user(1, Some("alice_bot"))));
        assert!(!user_allowed(&allowed, &user(2, Some("malice"))));
    }
}
