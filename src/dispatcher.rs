//! Routes inbound events to the dialogue owning the user's session.

use std::sync::Arc;

use futures::StreamExt;

use crate::dialogue::{self, DialogueState};
use crate::error::ChannelError;
use crate::search::SearchBackend;
use crate::session::SessionStore;
use crate::sheets::SheetsBackend;
use crate::telegram::api::Transport;
use crate::telegram::poller::EventStream;
use crate::telegram::update::{Command, TelegramEvent, UserRef};

/// Owns the session store and the injected backends; consumes the update
/// stream one event at a time.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    sheets: SheetsBackend,
    search: SearchBackend,
    sessions: SessionStore,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, sheets: SheetsBackend, search: SearchBackend) -> Self {
        Self {
            transport,
            sheets,
            search,
            sessions: SessionStore::new(),
        }
    }

    /// Consume the event stream until it closes. Handler errors are logged
    /// and never tear down the loop.
    pub async fn run(mut self, mut events: EventStream) {
        while let Some(event) = events.next().await {
            if let Err(e) = self.handle_event(event).await {
                tracing::error!("Handler error: {e}");
            }
        }
        tracing::info!("Update stream ended; dispatcher shutting down");
    }

    /// Route one event. Public so tests can drive the dispatcher directly.
    pub async fn handle_event(&mut self, event: TelegramEvent) -> Result<(), ChannelError> {
        match event {
            TelegramEvent::Command {
                chat_id,
                user,
                command,
            } => self.handle_command(chat_id, &user, command).await,
            TelegramEvent::Text {
                chat_id,
                user,
                text,
            } => self.handle_text(chat_id, user.id, &text).await,
            TelegramEvent::Callback {
                id,
                chat_id,
                message_id,
                user,
                data,
            } => {
                // Acknowledge the press so the client stops its spinner,
                // even if handling below fails.
                if let Err(e) = self.transport.answer_callback(&id).await {
                    tracing::warn!("Failed to answer callback query: {e}");
                }
                dialogue::collect::on_callback(
                    self.transport.as_ref(),
                    &self.sheets,
                    &mut self.sessions,
                    chat_id,
                    message_id,
                    user.id,
                    &data,
                )
                .await
            }
        }
    }

    async fn handle_command(
        &mut self,
        chat_id: i64,
        user: &UserRef,
        command: Command,
    ) -> Result<(), ChannelError> {
        match command {
            Command::Start => {
                dialogue::collect::start(
                    self.transport.as_ref(),
                    &mut self.sessions,
                    chat_id,
                    user,
                )
                .await
            }
            Command::Search => {
                dialogue::search::start(
                    self.transport.as_ref(),
                    &mut self.sessions,
                    chat_id,
                    user.id,
                )
                .await
            }
            Command::Cancel => match self.sessions.get(user.id).map(|s| s.state) {
                Some(DialogueState::CollectingData) => {
                    dialogue::collect::cancel(
                        self.transport.as_ref(),
                        &mut self.sessions,
                        chat_id,
                        user.id,
                    )
                    .await
                }
                Some(DialogueState::AwaitingQuery) => {
                    dialogue::search::cancel(
                        self.transport.as_ref(),
                        &mut self.sessions,
                        chat_id,
                        user.id,
                    )
                    .await
                }
                None => {
                    tracing::debug!(user_id = user.id, "Cancel with no active dialogue");
                    Ok(())
                }
            },
            Command::Other(name) => {
                tracing::debug!(command = %name, "Ignoring unknown command");
                Ok(())
            }
        }
    }

    async fn handle_text(
        &mut self,
        chat_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<(), ChannelError> {
        match self.sessions.get(user_id).map(|s| s.state) {
            Some(DialogueState::CollectingData) => {
                dialogue::collect::on_data_point(
                    self.transport.as_ref(),
                    &mut self.sessions,
                    chat_id,
                    user_id,
                    text,
                )
                .await
            }
            Some(DialogueState::AwaitingQuery) => {
                dialogue::search::on_query(
                    self.transport.as_ref(),
                    &self.search,
                    &mut self.sessions,
                    chat_id,
                    user_id,
                    text,
                )
                .await
            }
            None => {
                // Only entry points are reachable without a session.
                tracing::debug!(user_id, "Text with no active dialogue; ignoring");
                Ok(())
            }
        }
    }

    /// Number of in-flight sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}
