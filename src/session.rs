//! Session, conversation and per-session UI state definitions

use crate::SessionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked agent process and its display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// Process id, informational only
    pub pid: u32,
    pub project_name: String,
    pub project_path: String,
    pub git_branch: String,
    pub first_prompt: String,
    pub summary: String,
    pub message_count: u32,
    /// Last change to status, message count or latest message
    pub modified: DateTime<Utc>,
    pub status: SessionStatus,
    pub latest_message: String,
}

impl Session {
    /// Copy of this session moved to `status`, stamped `now`.
    ///
    /// Bumps the message count and replaces the latest message when `message`
    /// is given, otherwise keeps the prior one.
    pub(crate) fn transitioned(
        &self,
        status: SessionStatus,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            modified: now,
            message_count: self.message_count.saturating_add(1),
            latest_message: message
                .map(str::to_string)
                .unwrap_or_else(|| self.latest_message.clone()),
            ..self.clone()
        }
    }
}

/// Ephemeral UI state kept per session id, outside the session record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUiState {
    pub scroll_position: f64,
    pub draft_prompt: String,
}

/// Partial update merged into a `SessionUiState`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUiStatePatch {
    pub scroll_position: Option<f64>,
    pub draft_prompt: Option<String>,
}

impl SessionUiStatePatch {
    pub fn scroll(position: f64) -> Self {
        Self {
            scroll_position: Some(position),
            ..Self::default()
        }
    }

    pub fn draft(prompt: impl Into<String>) -> Self {
        Self {
            draft_prompt: Some(prompt.into()),
            ..Self::default()
        }
    }
}

impl SessionUiState {
    /// Merge the fields present in `patch`; scroll offsets are clamped at zero
    pub fn merge(&mut self, patch: SessionUiStatePatch) {
        if let Some(position) = patch.scroll_position {
            self.scroll_position = position.max(0.0);
        }
        if let Some(prompt) = patch.draft_prompt {
            self.draft_prompt = prompt;
        }
    }
}

/// Kind of a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    User,
    Assistant,
    Thinking,
    ToolUse,
    ToolResult,
}

/// A single timestamped conversation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub message_type: MessageType,
    pub content: String,
}

/// Transcript of one session. `session_id` is not checked against the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub session_id: String,
    pub messages: Vec<Message>,
}
