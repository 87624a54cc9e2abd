//! Built-in demo data: six sessions over three projects, their per-status
//! messages, and transcripts for three of them.

use crate::provider::{SessionProvider, StatusMessages};
use crate::{Conversation, Message, MessageType, Session, SessionStatus, TransitionTable};
use chrono::{DateTime, Duration, Utc};

fn minutes_ago(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(minutes)
}

/// Static description of one demo session; timestamps are filled in per call
struct DemoSession {
    id: &'static str,
    pid: u32,
    project: &'static str,
    branch: &'static str,
    first_prompt: &'static str,
    summary: &'static str,
    message_count: u32,
    minutes_ago: i64,
    status: SessionStatus,
    /// Working, NeedsPermission, WaitingForInput
    messages: [&'static str; 3],
}

const STARTING: &str = "Starting session...";

const DEMO_SESSIONS: &[DemoSession] = &[
    DemoSession {
        id: "demo-1",
        pid: 90001,
        project: "web-app",
        branch: "feat/auth-flow",
        first_prompt: "Add OAuth2 login with Google and GitHub providers",
        summary: "Implementing OAuth2 authentication flow with multiple providers",
        message_count: 34,
        minutes_ago: 2,
        status: SessionStatus::NeedsPermission,
        messages: [
            "Writing OAuth2 callback handler for Google provider...",
            "I need to write to src/auth/providers.ts, may I proceed?",
            "OAuth2 providers are configured. Want me to add session persistence next?",
        ],
    },
    DemoSession {
        id: "demo-2",
        pid: 90002,
        project: "web-app",
        branch: "fix/perf-regression",
        first_prompt: "Profile and fix the rendering performance regression in the dashboard",
        summary: "Investigating slow renders in dashboard table component",
        message_count: 87,
        minutes_ago: 5,
        status: SessionStatus::Working,
        messages: [
            "Running the profiler on the VirtualizedTable component to identify the bottleneck...",
            "I need to modify src/components/Table.tsx, allow?",
            "Render time reduced from 340ms to 18ms. The fix is in the memoization of row components.",
        ],
    },
    DemoSession {
        id: "demo-3",
        pid: 90003,
        project: "api-server",
        branch: "feat/rate-limiting",
        first_prompt: "Implement token-bucket rate limiting middleware",
        summary: "Adding rate limiting with Redis-backed token bucket",
        message_count: 21,
        minutes_ago: 1,
        status: SessionStatus::NeedsPermission,
        messages: [
            "Implementing the token bucket algorithm with Redis MULTI/EXEC...",
            "I need to run `npm install ioredis`, allow?",
            "Rate limiter middleware is ready. Run `npm test` to verify.",
        ],
    },
    DemoSession {
        id: "demo-4",
        pid: 90004,
        project: "api-server",
        branch: "main",
        first_prompt: "Write integration tests for the payments webhook handler",
        summary: "Creating comprehensive test suite for Stripe webhook processing",
        message_count: 156,
        minutes_ago: 8,
        status: SessionStatus::Working,
        messages: [
            "Writing test case for subscription renewal webhook with idempotency check...",
            "I need to run `npm test -- --watch payments`, allow?",
            "All 23 webhook test cases pass. Coverage is at 94%.",
        ],
    },
    DemoSession {
        id: "demo-5",
        pid: 90005,
        project: "cli-tools",
        branch: "feat/config-wizard",
        first_prompt: "Build an interactive configuration wizard for first-time setup",
        summary: "Created interactive CLI wizard with prompts, validation, and config file generation",
        message_count: 42,
        minutes_ago: 15,
        status: SessionStatus::WaitingForInput,
        messages: [
            "Adding validation rules for the project name prompt...",
            "I need to write to src/commands/init.ts, allow?",
            "Done! The wizard is at src/commands/init.ts. Run `cli-tools init` to try it.",
        ],
    },
    DemoSession {
        id: "demo-6",
        pid: 90006,
        project: "cli-tools",
        branch: "refactor/error-handling",
        first_prompt: "Refactor error handling to use typed Result pattern",
        summary: "Migrated all error handling from try/catch to Result<T, E> pattern",
        message_count: 63,
        minutes_ago: 60,
        status: SessionStatus::WaitingForInput,
        messages: [
            "Migrating the `deploy` command handler to Result<T, E> pattern...",
            "I need to modify src/commands/deploy.ts, allow?",
            "All 14 command handlers have been migrated to the Result pattern. Tests pass.",
        ],
    },
];

impl DemoSession {
    fn message_for(&self, status: SessionStatus) -> &'static str {
        match status {
            SessionStatus::Working => self.messages[0],
            SessionStatus::NeedsPermission => self.messages[1],
            SessionStatus::WaitingForInput => self.messages[2],
            SessionStatus::Connecting | SessionStatus::Unknown => STARTING,
        }
    }

    fn to_session(&self, now: DateTime<Utc>) -> Session {
        Session {
            id: self.id.to_string(),
            pid: self.pid,
            project_name: self.project.to_string(),
            project_path: format!("/Users/demo/projects/{}", self.project),
            git_branch: self.branch.to_string(),
            first_prompt: self.first_prompt.to_string(),
            summary: self.summary.to_string(),
            message_count: self.message_count,
            modified: minutes_ago(now, self.minutes_ago),
            status: self.status,
            latest_message: self.message_for(self.status).to_string(),
        }
    }
}

/// (minutes ago, type, content)
type DemoMessage = (i64, MessageType, &'static str);

const DEMO_CONVERSATIONS: &[(&str, &[DemoMessage])] = &[
    (
        "demo-1",
        &[
            (30, MessageType::User, "Add OAuth2 login with Google and GitHub providers"),
            (
                29,
                MessageType::Thinking,
                "OAuth2 with two providers. Plan:\n1. Provider configuration\n2. Provider-specific handlers\n3. Login routes\n4. Callback handler",
            ),
            (
                29,
                MessageType::Assistant,
                "I'll implement OAuth2 login with Google and GitHub. Let me look at the existing auth setup first.",
            ),
            (28, MessageType::ToolUse, "Read src/auth/index.ts"),
            (
                28,
                MessageType::ToolResult,
                "```typescript\nimport { Router } from \"express\";\nexport const authRouter = Router();\n// TODO: Add OAuth providers\n```",
            ),
            (26, MessageType::ToolUse, "Write src/auth/oauth-config.ts"),
            (26, MessageType::ToolResult, "File written successfully."),
            (
                10,
                MessageType::Assistant,
                "Next I'll add the Google and GitHub flows to `src/auth/providers.ts`.",
            ),
            (2, MessageType::ToolUse, "Write src/auth/providers.ts (waiting for permission)"),
        ],
    ),
    (
        "demo-3",
        &[
            (18, MessageType::User, "Implement token-bucket rate limiting middleware"),
            (
                17,
                MessageType::Thinking,
                "Token bucket backed by Redis, an Express middleware that checks it, configurable tiers, and a fallback when Redis is down.",
            ),
            (16, MessageType::ToolUse, "Read src/middleware/index.ts"),
            (
                16,
                MessageType::ToolResult,
                "```typescript\nimport cors from \"cors\";\nimport helmet from \"helmet\";\nexport { cors, helmet };\n```",
            ),
            (
                15,
                MessageType::Assistant,
                "I need `ioredis` for the Redis client.",
            ),
            (1, MessageType::ToolUse, "Bash: npm install ioredis (waiting for permission)"),
        ],
    ),
    (
        "demo-5",
        &[
            (50, MessageType::User, "Build an interactive configuration wizard for first-time setup"),
            (
                49,
                MessageType::Assistant,
                "I'll create an interactive setup wizard. Checking the CLI structure first.",
            ),
            (48, MessageType::ToolUse, "Read src/commands/index.ts"),
            (
                48,
                MessageType::ToolResult,
                "```typescript\nexport function registerCommands(program: Command) {\n  program.addCommand(runCommand);\n}\n```",
            ),
            (
                15,
                MessageType::Assistant,
                "Done! The wizard is at `src/commands/init.ts`. Run `cli-tools init` to try it. All existing tests still pass.",
            ),
        ],
    ),
];

/// `SessionProvider` over the built-in demo data
#[derive(Debug, Clone)]
pub struct DemoProvider {
    messages: StatusMessages,
    transitions: TransitionTable,
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoProvider {
    pub fn new() -> Self {
        let mut messages = StatusMessages::new();
        for demo in DEMO_SESSIONS {
            for status in SessionStatus::KNOWN {
                messages.insert(demo.id, status, demo.message_for(status));
            }
        }
        Self {
            messages,
            transitions: TransitionTable::default(),
        }
    }

    /// Transcript with timestamps relative to `now`
    fn conversation_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<Conversation> {
        let (_, entries) = DEMO_CONVERSATIONS
            .iter()
            .find(|(id, _)| *id == session_id)?;
        let messages = entries
            .iter()
            .map(|(minutes, message_type, content)| Message {
                timestamp: minutes_ago(now, *minutes),
                message_type: *message_type,
                content: content.to_string(),
            })
            .collect();
        Some(Conversation {
            session_id: session_id.to_string(),
            messages,
        })
    }

    /// Ids of sessions that have a demo transcript
    pub fn conversation_ids(&self) -> impl Iterator<Item = &'static str> {
        DEMO_CONVERSATIONS.iter().map(|(id, _)| *id)
    }
}

impl SessionProvider for DemoProvider {
    fn initial_sessions(&self) -> Vec<Session> {
        let now = Utc::now();
        DEMO_SESSIONS.iter().map(|d| d.to_session(now)).collect()
    }

    fn status_messages(&self) -> &StatusMessages {
        &self.messages
    }

    fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    fn conversation(&self, session_id: &str) -> Option<Conversation> {
        self.conversation_at(session_id, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{attention_count, group_by_project, status_summary};
    use std::collections::HashSet;

    #[test]
    fn six_sessions_over_three_projects() {
        let sessions = DemoProvider::new().initial_sessions();
        assert_eq!(sessions.len(), 6);

        let ids: HashSet<_> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 6);
        assert_eq!(group_by_project(&sessions).len(), 3);
    }

    #[test]
    fn seed_covers_attention_states() {
        let sessions = DemoProvider::new().initial_sessions();
        let summary = status_summary(&sessions);
        assert_eq!(summary.needs_permission, 2);
        assert_eq!(summary.working, 2);
        assert_eq!(summary.waiting_for_input, 2);
        assert_eq!(attention_count(&sessions), 4);
    }

    #[test]
    fn seed_message_matches_status_table() {
        let provider = DemoProvider::new();
        for session in provider.initial_sessions() {
            assert_eq!(
                provider.status_messages().lookup(&session.id, session.status),
                Some(session.latest_message.as_str())
            );
            assert!(session.modified < Utc::now());
        }
    }

    #[test]
    fn every_session_has_full_message_table() {
        let provider = DemoProvider::new();
        for session in provider.initial_sessions() {
            for status in SessionStatus::KNOWN {
                assert!(provider.status_messages().lookup(&session.id, status).is_some());
            }
        }
    }

    #[test]
    fn conversations_for_three_sessions() {
        let provider = DemoProvider::new();
        assert_eq!(provider.conversation_ids().count(), 3);

        let conversation = provider.conversation("demo-1").unwrap();
        assert_eq!(conversation.session_id, "demo-1");
        assert_eq!(conversation.messages[0].message_type, MessageType::User);
        let timestamps: Vec<_> = conversation.messages.iter().map(|m| m.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));

        assert!(provider.conversation("demo-2").is_none());
    }
}
