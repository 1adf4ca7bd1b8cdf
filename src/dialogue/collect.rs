//! Data collection dialogue — gathers free-text data points from one user
//! and commits them as a single spreadsheet row on finish.

use crate::dialogue::DialogueState;
use crate::error::ChannelError;
use crate::session::{Session, SessionStore};
use crate::sheets::SheetsBackend;
use crate::telegram::api::{InlineButton, Keyboard, Transport};
use crate::telegram::update::UserRef;

// Callback data values carried by the inline keyboard buttons.
pub const CB_SUBMIT: &str = "submit_data";
pub const CB_ADD_MORE: &str = "add_more_data";
pub const CB_FINISH: &str = "finish_submission";
pub const CB_CANCEL: &str = "cancel_submission";

pub const PROMPT_ACTION: &str = "Please select an action:";
pub const RECEIVED: &str = "Received your data point. Add another one or use the buttons.";
pub const WHAT_NEXT: &str = "What would you like to do next?";
pub const SEND_DATA_POINT: &str = "Okay, send me the data point.";
pub const SAVED: &str = "Data successfully added to the dataset!";
pub const SAVE_FAILED: &str = "Sorry, there was an error adding data to the sheet.";
pub const SHEETS_UNAVAILABLE: &str = "Sorry, could not connect to Google Sheets. Data not saved.";
pub const NO_DATA: &str = "No data collected yet.";
pub const CANCELLED: &str = "Data submission cancelled.";
pub const CANCELLED_BYE: &str = "Data submission cancelled. Bye!";
pub const SESSION_EXPIRED: &str = "That submission has already ended. Send /start to begin a new one.";

fn start_keyboard() -> Keyboard {
    vec![vec![
        InlineButton::new("Submit Data Point", CB_SUBMIT),
        InlineButton::new("Cancel", CB_CANCEL),
    ]]
}

fn next_action_keyboard() -> Keyboard {
    vec![vec![
        InlineButton::new("Add More Data", CB_ADD_MORE),
        InlineButton::new("Finish Submission", CB_FINISH),
        InlineButton::new("Cancel", CB_CANCEL),
    ]]
}

/// `/start` entry point: greet, open a fresh session, offer the first actions.
pub async fn start(
    transport: &dyn Transport,
    sessions: &mut SessionStore,
    chat_id: i64,
    user: &UserRef,
) -> Result<(), ChannelError> {
    sessions.begin(user.id, DialogueState::CollectingData);
    tracing::info!(user_id = user.id, "Data collection dialogue started");

    let greeting = format!(
        "Hi {}! I'm a bot to help you collect data for your AI model. \
         Send me the data you want to add to the dataset. \
         Type /cancel to stop at any time.",
        user.display_name()
    );
    transport.reply(chat_id, &greeting).await?;
    transport
        .reply_with_keyboard(chat_id, PROMPT_ACTION, &start_keyboard())
        .await
}

/// A plain text message while collecting: record it, offer the next actions.
pub async fn on_data_point(
    transport: &dyn Transport,
    sessions: &mut SessionStore,
    chat_id: i64,
    user_id: i64,
    text: &str,
) -> Result<(), ChannelError> {
    let Some(session) = sessions.get_mut(user_id) else {
        return Ok(());
    };
    session.entries.push(text.to_string());

    transport.reply(chat_id, RECEIVED).await?;
    transport
        .reply_with_keyboard(chat_id, WHAT_NEXT, &next_action_keyboard())
        .await
}

/// An inline keyboard button press.
///
/// A callback arriving when the user has no collecting session (finished,
/// cancelled, or never started) is answered with an expired-session notice
/// rather than acting on stale state.
pub async fn on_callback(
    transport: &dyn Transport,
    sheets: &SheetsBackend,
    sessions: &mut SessionStore,
    chat_id: i64,
    message_id: i64,
    user_id: i64,
    data: &str,
) -> Result<(), ChannelError> {
    let collecting = matches!(
        sessions.get(user_id),
        Some(session) if session.state == DialogueState::CollectingData
    );
    if !collecting {
        return transport.reply(chat_id, SESSION_EXPIRED).await;
    }

    match data {
        CB_SUBMIT | CB_ADD_MORE => {
            transport
                .edit_message(chat_id, message_id, SEND_DATA_POINT)
                .await
        }
        CB_FINISH => {
            let Some(session) = sessions.end(user_id) else {
                return Ok(());
            };
            finish(transport, sheets, chat_id, message_id, session).await
        }
        CB_CANCEL => {
            sessions.end(user_id);
            transport.edit_message(chat_id, message_id, CANCELLED).await
        }
        other => {
            tracing::warn!(data = other, user_id, "Unrecognized callback data");
            Ok(())
        }
    }
}

/// `/cancel` command: discard everything collected so far.
pub async fn cancel(
    transport: &dyn Transport,
    sessions: &mut SessionStore,
    chat_id: i64,
    user_id: i64,
) -> Result<(), ChannelError> {
    sessions.end(user_id);
    transport.reply(chat_id, CANCELLED_BYE).await
}

/// Commit the collected entries as one row. The session is already evicted;
/// entries are discarded whatever the outcome.
async fn finish(
    transport: &dyn Transport,
    sheets: &SheetsBackend,
    chat_id: i64,
    message_id: i64,
    session: Session,
) -> Result<(), ChannelError> {
    if session.entries.is_empty() {
        return transport.edit_message(chat_id, message_id, NO_DATA).await;
    }

    let outcome = match sheets {
        SheetsBackend::Available(sink) => match sink.append_row(&session.entries).await {
            Ok(()) => {
                tracing::info!(
                    user_id = session.user_id,
                    entries = session.entries.len(),
                    "Data added to sheet"
                );
                SAVED
            }
            Err(e) => {
                tracing::error!("Error appending data to Google Sheet: {e}");
                SAVE_FAILED
            }
        },
        SheetsBackend::Unavailable => SHEETS_UNAVAILABLE,
    };

    transport.edit_message(chat_id, message_id, outcome).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_keyboard_buttons() {
        let keyboard = start_keyboard();
        let data: Vec<&str> = keyboard[0]
            .iter()
            .map(|b| b.callback_data.as_str())
            .collect();
        assert_eq!(data, vec![CB_SUBMIT, CB_CANCEL]);
    }

    #[test]
    fn next_action_keyboard_buttons() {
        let keyboard = next_action_keyboard();
        let data: Vec<&str> = keyboard[0]
            .iter()
            .map(|b| b.callback_data.as_str())
            .collect();
        assert_eq!(data, vec![CB_ADD_MORE, CB_FINISH, CB_CANCEL]);
    }
}
