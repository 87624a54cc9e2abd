//! Session status enumeration, display priority and transition rules

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rank given to statuses outside the known set
pub const FALLBACK_RANK: u8 = 4;

/// Candidates used when a table has no entry for a status
const RESOLVE_TO_WORKING: &[SessionStatus] = &[SessionStatus::Working];

/// Attention state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Agent process is starting up
    Connecting,
    /// Actively working
    Working,
    /// Blocked on a permission prompt
    NeedsPermission,
    /// Finished a turn, waiting for the user
    WaitingForInput,
    /// Any status string this build does not know about.
    ///
    /// The original string is not kept: re-serializing writes `"Unknown"`.
    #[serde(other)]
    Unknown,
}

impl SessionStatus {
    /// The four statuses a backend is expected to report
    pub const KNOWN: [SessionStatus; 4] = [
        Self::Connecting,
        Self::Working,
        Self::NeedsPermission,
        Self::WaitingForInput,
    ];

    /// Display priority, smallest is most urgent
    pub fn priority_rank(&self) -> u8 {
        match self {
            Self::NeedsPermission => 0,
            Self::WaitingForInput => 1,
            Self::Working => 2,
            Self::Connecting => 3,
            Self::Unknown => FALLBACK_RANK,
        }
    }

    /// Whether a human needs to act on the session
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::NeedsPermission | Self::WaitingForInput)
    }

    /// Short label for the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Working => "working",
            Self::NeedsPermission => "permission",
            Self::WaitingForInput => "input",
            Self::Unknown => "unknown",
        }
    }
}

/// Weighted transition candidates per status.
///
/// Duplicate entries weight the sampling: `Working` lists itself twice so a
/// working session stays put more often than it moves to either alternative.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    entries: HashMap<SessionStatus, Vec<SessionStatus>>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        use SessionStatus::*;
        let entries = HashMap::from([
            (
                Working,
                vec![Working, Working, NeedsPermission, WaitingForInput],
            ),
            // Permission was granted
            (NeedsPermission, vec![Working]),
            // User gave new input, or not yet
            (WaitingForInput, vec![Working, WaitingForInput]),
            (Connecting, vec![Working]),
        ]);
        Self { entries }
    }
}

impl TransitionTable {
    /// Build a table from provider-supplied entries.
    ///
    /// Every listed status must have at least one candidate. Statuses that are
    /// not listed resolve to `Working`.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SessionStatus, Vec<SessionStatus>)>,
    {
        let mut map = HashMap::new();
        for (status, candidates) in entries {
            if candidates.is_empty() {
                return Err(Error::EmptyTransitions(status));
            }
            map.insert(status, candidates);
        }
        Ok(Self { entries: map })
    }

    /// Candidate list for `status`, never empty
    pub fn candidates(&self, status: SessionStatus) -> &[SessionStatus] {
        self.entries
            .get(&status)
            .map(Vec::as_slice)
            .unwrap_or(RESOLVE_TO_WORKING)
    }
}
