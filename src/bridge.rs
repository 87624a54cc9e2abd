//! Update bridge - applies authoritative backend pushes to the store
//!
//! Payloads are trusted as-is: a sessions push replaces the whole collection
//! and a conversation push overwrites the active conversation slot.

use crate::store::SessionStore;
use crate::{Conversation, Session};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Push event from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum UpdateEvent {
    #[serde(rename = "sessions-updated")]
    SessionsUpdated(Vec<Session>),
    #[serde(rename = "conversation-updated")]
    ConversationUpdated(Conversation),
}

impl UpdateEvent {
    /// Channel name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionsUpdated(_) => "sessions-updated",
            Self::ConversationUpdated(_) => "conversation-updated",
        }
    }
}

pub struct UpdateBridge;

impl UpdateBridge {
    /// Apply one event to the store
    pub fn apply(store: &SessionStore, event: UpdateEvent) {
        match event {
            UpdateEvent::SessionsUpdated(sessions) => {
                debug!(sessions = sessions.len(), "sessions updated");
                store.replace_all(sessions);
            }
            UpdateEvent::ConversationUpdated(conversation) => {
                debug!(session_id = %conversation.session_id, "conversation updated");
                store.set_conversation(Some(conversation));
            }
        }
    }

    /// Consume events until every sender is dropped.
    ///
    /// Calling this twice for one store simply applies every event twice.
    pub fn spawn(store: SessionStore, mut rx: UnboundedReceiver<UpdateEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                Self::apply(&store, event);
            }
            info!("update channel closed");
        })
    }
}
