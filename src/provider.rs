//! Data provider interface consumed by the simulation
//!
//! A provider seeds the store with an initial session set and supplies the
//! two tables the simulation samples from: per-session status messages and
//! weighted status transitions.

use crate::{Conversation, Session, SessionStatus, TransitionTable};
use std::collections::HashMap;

/// Per-session, per-status text used as `latest_message` after a transition
#[derive(Debug, Clone, Default)]
pub struct StatusMessages {
    by_session: HashMap<String, HashMap<SessionStatus, String>>,
}

impl StatusMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        session_id: impl Into<String>,
        status: SessionStatus,
        message: impl Into<String>,
    ) {
        self.by_session
            .entry(session_id.into())
            .or_default()
            .insert(status, message.into());
    }

    /// Builder form of `insert` for a whole session table
    pub fn with_session<I, M>(mut self, session_id: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (SessionStatus, M)>,
        M: Into<String>,
    {
        for (status, message) in entries {
            self.insert(session_id, status, message);
        }
        self
    }

    /// Message registered for this pair.
    ///
    /// A session with no table and a table without this status both yield
    /// `None`; callers keep the prior message in either case.
    pub fn lookup(&self, session_id: &str, status: SessionStatus) -> Option<&str> {
        self.by_session
            .get(session_id)
            .and_then(|table| table.get(&status))
            .map(String::as_str)
    }
}

/// Source of seed sessions, message and transition tables
pub trait SessionProvider: Send + Sync {
    /// Fresh session set; timestamps may be relative to the call time
    fn initial_sessions(&self) -> Vec<Session>;

    fn status_messages(&self) -> &StatusMessages;

    fn transitions(&self) -> &TransitionTable;

    /// Transcript for an expanded session, if the provider has one
    fn conversation(&self, _session_id: &str) -> Option<Conversation> {
        None
    }
}

/// Provider over fixed values
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    pub sessions: Vec<Session>,
    pub messages: StatusMessages,
    pub transitions: TransitionTable,
    pub conversations: HashMap<String, Conversation>,
}

impl StaticProvider {
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            sessions,
            ..Self::default()
        }
    }

    pub fn with_messages(mut self, messages: StatusMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_transitions(mut self, transitions: TransitionTable) -> Self {
        self.transitions = transitions;
        self
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversations
            .insert(conversation.session_id.clone(), conversation);
        self
    }
}

impl SessionProvider for StaticProvider {
    fn initial_sessions(&self) -> Vec<Session> {
        self.sessions.clone()
    }

    fn status_messages(&self) -> &StatusMessages {
        &self.messages
    }

    fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    fn conversation(&self, session_id: &str) -> Option<Conversation> {
        self.conversations.get(session_id).cloned()
    }
}
