//! Plain-text dashboard for the CLI

use crate::preferences::CustomNames;
use crate::views::{attention_count, sorted_by_priority, status_summary};
use crate::{Session, SessionStatus};
use std::borrow::Cow;
use std::fmt::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';
/// Status column width
const STATUS_WIDTH: usize = 10;
/// Project column width
const PROJECT_WIDTH: usize = 14;
/// Branch column width
const BRANCH_WIDTH: usize = 22;

/// Truncate `text` to at most `width` terminal columns, ending with `…` when cut
pub fn truncate_to_width(text: &str, width: usize) -> Cow<'_, str> {
    if text.width() <= width {
        return Cow::Borrowed(text);
    }
    if width == 0 {
        return Cow::Borrowed("");
    }

    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

/// Left-aligned cell padded by display width
fn cell(text: &str, width: usize) -> String {
    let truncated = truncate_to_width(text, width);
    let pad = width.saturating_sub(truncated.width());
    format!("{}{}", truncated, " ".repeat(pad))
}

fn marker(status: SessionStatus) -> char {
    if status.needs_attention() { '!' } else { ' ' }
}

/// Header plus one row per session, most urgent first.
///
/// `width` bounds every line; the latest message takes whatever is left
/// after the fixed columns. A custom name replaces the project name.
pub fn render_dashboard(sessions: &[Session], names: &CustomNames, width: usize) -> String {
    let summary = status_summary(sessions);
    let mut out = String::new();
    let header = format!(
        "{} session(s), {} need attention | permission {} | input {} | working {} | connecting {}",
        sessions.len(),
        attention_count(sessions),
        summary.needs_permission,
        summary.waiting_for_input,
        summary.working,
        summary.connecting,
    );
    let _ = writeln!(out, "{}", truncate_to_width(&header, width));

    let fixed = 2 + STATUS_WIDTH + 1 + PROJECT_WIDTH + 1 + BRANCH_WIDTH + 1;
    let message_width = width.saturating_sub(fixed);
    for session in sorted_by_priority(sessions) {
        let row = format!(
            "{} {} {} {} {}",
            marker(session.status),
            cell(session.status.label(), STATUS_WIDTH),
            cell(
                names.get(&session.id).unwrap_or(&session.project_name[..]),
                PROJECT_WIDTH,
            ),
            cell(&session.git_branch, BRANCH_WIDTH),
            truncate_to_width(&session.latest_message, message_width),
        );
        let _ = writeln!(out, "{}", truncate_to_width(row.trim_end(), width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn make_session(id: &str, status: SessionStatus, minutes_ago: i64, message: &str) -> Session {
        Session {
            id: id.into(),
            pid: 1,
            project_name: "web-app".into(),
            project_path: "/tmp/web-app".into(),
            git_branch: "feat/auth-flow".into(),
            first_prompt: String::new(),
            summary: String::new(),
            message_count: 0,
            modified: Utc::now() - Duration::minutes(minutes_ago),
            status,
            latest_message: message.into(),
        }
    }

    #[test]
    fn truncate_short_text_unchanged() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert!(matches!(truncate_to_width("hello", 5), Cow::Borrowed(_)));
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        assert_eq!(truncate_to_width("hello", 0), "");
        assert_eq!(truncate_to_width("hello", 1), "…");
    }

    #[test]
    fn truncate_counts_wide_chars() {
        // Each CJK char is two columns
        let out = truncate_to_width("日本語テキスト", 6);
        assert_eq!(out, "日本…");
        assert!(out.width() <= 6);
    }

    #[test]
    fn cell_pads_to_width() {
        assert_eq!(cell("ab", 4), "ab  ");
        assert_eq!(cell("abcdef", 4), "abc…");
    }

    #[test]
    fn dashboard_orders_and_counts() {
        let sessions = vec![
            make_session("w", SessionStatus::Working, 1, "compiling"),
            make_session("p", SessionStatus::NeedsPermission, 10, "may I run tests?"),
        ];
        let out = render_dashboard(&sessions, &CustomNames::default(), 120);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("2 session(s), 1 need attention"));
        assert!(lines[1].starts_with("! permission"));
        assert!(lines[1].ends_with("may I run tests?"));
        assert!(lines[2].contains("working"));
    }

    #[test]
    fn dashboard_respects_width() {
        let long = "x".repeat(200);
        let sessions = vec![make_session("w", SessionStatus::Working, 1, &long)];
        let out = render_dashboard(&sessions, &CustomNames::default(), 80);
        for line in out.lines() {
            assert!(line.width() <= 80, "line too wide: {line}");
        }
        assert!(out.contains(ELLIPSIS));
    }

    #[test]
    fn dashboard_empty() {
        let out = render_dashboard(&[], &CustomNames::default(), 80);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("0 session(s), 0 need attention"));
    }

    #[test]
    fn dashboard_prefers_custom_name() {
        let sessions = vec![
            make_session("named", SessionStatus::NeedsPermission, 1, "ok?"),
            make_session("plain", SessionStatus::Working, 2, "busy"),
        ];
        let mut names = CustomNames::default();
        names.set("named", "Login fix");

        let out = render_dashboard(&sessions, &names, 120);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[1].contains("Login fix"));
        assert!(!lines[1].contains("web-app"));
        assert!(lines[2].contains("web-app"));
    }
}
