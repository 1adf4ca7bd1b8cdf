//! Ephemeral per-user session store.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::dialogue::DialogueState;

/// State for one user's active dialogue.
#[derive(Debug)]
pub struct Session {
    pub user_id: i64,
    pub state: DialogueState,
    /// Data points accumulated so far (data collection dialogue only).
    pub entries: Vec<String>,
}

/// In-memory session store keyed by Telegram user id.
///
/// Sessions are created when a dialogue entry point runs and evicted when the
/// dialogue reaches a terminal state or is cancelled. Nothing is persisted;
/// a process restart drops all in-flight sessions.
///
/// The dispatcher handles one event at a time, so no locking is needed here.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<i64, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session for `user_id`, replacing any active one.
    pub fn begin(&mut self, user_id: i64, state: DialogueState) -> &mut Session {
        let session = Session {
            user_id,
            state,
            entries: Vec::new(),
        };
        match self.sessions.entry(user_id) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(session);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(session),
        }
    }

    pub fn get(&self, user_id: i64) -> Option<&Session> {
        self.sessions.get(&user_id)
    }

    pub fn get_mut(&mut self, user_id: i64) -> Option<&mut Session> {
        self.sessions.get_mut(&user_id)
    }

    /// Terminal transition: remove the session and hand it back to the caller.
    pub fn end(&mut self, user_id: i64) -> Option<Session> {
        self.sessions.remove(&user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
