//! Session store - canonical session collection and per-session UI state

use crate::random::RandomSource;
use crate::signal::{Signal, Subscription};
use crate::{
    Conversation, Session, SessionUiState, SessionUiStatePatch, StatusMessages, TransitionTable,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Explicitly constructed state container shared by the bridge, the
/// simulation and the views. Cloning yields another handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    /// Insertion order, not display order
    sessions: Signal<Vec<Session>>,
    /// Keyed by session id; entries for removed sessions are kept
    ui_state: Signal<HashMap<String, SessionUiState>>,
    conversation: Signal<Option<Conversation>>,
    expanded_session_id: Signal<Option<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot of the collection
    pub fn sessions(&self) -> Arc<Vec<Session>> {
        self.sessions.get()
    }

    pub fn len(&self) -> usize {
        self.sessions.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.get().is_empty()
    }

    /// Get a session by ID
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get().iter().find(|s| s.id == session_id).cloned()
    }

    /// Overwrite the whole collection. An empty vector clears it; UI state is
    /// left alone.
    pub fn replace_all(&self, sessions: Vec<Session>) {
        debug!("{} session(s) replaced", sessions.len());
        self.sessions.set(sessions);
    }

    /// Move one session along the transition table.
    ///
    /// Samples a candidate for the session's current status. When the sample
    /// equals the current status nothing is written and nobody is notified.
    /// Otherwise the session is rewritten in place with the new status, a
    /// fresh `modified`, one more message and the registered message text (or
    /// its prior text). Returns the updated session when something changed.
    pub fn apply_status_transition(
        &self,
        session_id: &str,
        transitions: &TransitionTable,
        messages: &StatusMessages,
        rng: &mut dyn RandomSource,
    ) -> Option<Session> {
        let mut updated = None;
        self.sessions.update(|sessions| {
            let Some(idx) = sessions.iter().position(|s| s.id == session_id) else {
                debug!(%session_id, "transition for unknown session");
                return None;
            };
            let current = &sessions[idx];
            let candidates = transitions.candidates(current.status);
            let next = candidates[rng.index(candidates.len())];
            if next == current.status {
                trace!(%session_id, status = ?next, "status unchanged");
                return None;
            }

            info!(%session_id, from = ?current.status, to = ?next, "status transition");
            let session = current.transitioned(next, messages.lookup(session_id, next), Utc::now());
            let mut next_sessions = sessions.clone();
            next_sessions[idx] = session.clone();
            updated = Some(session);
            Some(next_sessions)
        });
        updated
    }

    /// UI state for a session, created with defaults on first access
    pub fn ui_state(&self, session_id: &str) -> SessionUiState {
        self.ui_state.update(|states| {
            if states.contains_key(session_id) {
                return None;
            }
            trace!(%session_id, "ui state created");
            let mut next = states.clone();
            next.insert(session_id.to_string(), SessionUiState::default());
            Some(next)
        });
        self.ui_state
            .get()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Merge `patch` into a session's UI state and return the result
    pub fn update_ui_state(&self, session_id: &str, patch: SessionUiStatePatch) -> SessionUiState {
        let mut merged = SessionUiState::default();
        self.ui_state.update(|states| {
            let mut next = states.clone();
            let state = next.entry(session_id.to_string()).or_default();
            state.merge(patch);
            merged = state.clone();
            Some(next)
        });
        merged
    }

    /// Conversation for the expanded session, if any
    pub fn conversation(&self) -> Option<Conversation> {
        (*self.conversation.get()).clone()
    }

    pub fn set_conversation(&self, conversation: Option<Conversation>) {
        self.conversation.set(conversation);
    }

    pub fn expanded_session_id(&self) -> Option<String> {
        (*self.expanded_session_id.get()).clone()
    }

    pub fn set_expanded_session_id(&self, session_id: Option<String>) {
        self.expanded_session_id.set(session_id);
    }

    /// Observe the session collection; see `Signal::subscribe`
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Session]) + Send + Sync + 'static,
    {
        self.sessions
            .subscribe(move |sessions: &Vec<Session>| callback(sessions))
    }

    pub fn subscribe_conversation<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Conversation>) + Send + Sync + 'static,
    {
        self.conversation
            .subscribe(move |conversation: &Option<Conversation>| callback(conversation.as_ref()))
    }

    pub fn subscribe_ui_state<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&HashMap<String, SessionUiState>) + Send + Sync + 'static,
    {
        self.ui_state.subscribe(callback)
    }
}
