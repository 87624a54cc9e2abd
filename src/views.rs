//! Derived views over the session collection
//!
//! Pure functions of a snapshot, recomputed on every read.

use crate::{Session, SessionStatus};
use std::cmp::Reverse;

/// Per-status tally for the header. Unknown statuses land in no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSummary {
    pub working: usize,
    pub needs_permission: usize,
    pub waiting_for_input: usize,
    pub connecting: usize,
}

impl StatusSummary {
    pub fn total(&self) -> usize {
        self.working + self.needs_permission + self.waiting_for_input + self.connecting
    }
}

/// Sessions of one project, most urgent first
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectGroup {
    pub project_name: String,
    pub project_path: String,
    pub sessions: Vec<Session>,
}

/// Sessions ordered by attention priority, then most recently modified.
///
/// The sort is stable, so sessions with equal rank and timestamp keep their
/// collection order.
pub fn sorted_by_priority(sessions: &[Session]) -> Vec<Session> {
    let mut sorted = sessions.to_vec();
    sorted.sort_by_key(|s| (s.status.priority_rank(), Reverse(s.modified)));
    sorted
}

/// Number of sessions that need a human decision
pub fn attention_count(sessions: &[Session]) -> usize {
    sessions
        .iter()
        .filter(|s| s.status.needs_attention())
        .count()
}

pub fn status_summary(sessions: &[Session]) -> StatusSummary {
    sessions
        .iter()
        .fold(StatusSummary::default(), |mut summary, session| {
            match session.status {
                SessionStatus::Working => summary.working += 1,
                SessionStatus::NeedsPermission => summary.needs_permission += 1,
                SessionStatus::WaitingForInput => summary.waiting_for_input += 1,
                SessionStatus::Connecting => summary.connecting += 1,
                SessionStatus::Unknown => {}
            }
            summary
        })
}

/// Priority-sorted sessions grouped by project path.
///
/// Groups are ordered by their most urgent member.
pub fn group_by_project(sessions: &[Session]) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();
    for session in sorted_by_priority(sessions) {
        match groups
            .iter_mut()
            .find(|g| g.project_path == session.project_path)
        {
            Some(group) => group.sessions.push(session),
            None => groups.push(ProjectGroup {
                project_name: session.project_name.clone(),
                project_path: session.project_path.clone(),
                sessions: vec![session],
            }),
        }
    }
    groups
}
