//! The visible records of a session: the append-only chat transcript and
//! the bounded action log.
//!
//! Chat entries for user/assistant turns are mirrored into the History
//! Store by the session; the action log (tool execution narration) is
//! ephemeral display state and is never persisted.

use chrono::{DateTime, Utc};
use shared::convo::ConversationEntry;
use shared::tool::ActionResult;
use std::collections::VecDeque;
use uuid::Uuid;

/// Display cap for action-result summaries. Display-only: the underlying
/// `ActionResult` is never altered.
pub const RESULT_DISPLAY_CAP: usize = 500;

/// Append-only chat transcript. Entries are timestamped at creation and
/// never reordered.
#[derive(Default)]
pub struct Transcript {
    entries: Vec<ConversationEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One line of tool-execution narration.
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl ActionLogEntry {
    fn new(message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            message,
        }
    }

    pub fn display_line(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Bounded, append-only action log. Oldest entries drop past the cap.
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    cap: usize,
}

impl ActionLog {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    /// Record a free-form narration line.
    pub fn record(&mut self, message: impl Into<String>) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(ActionLogEntry::new(message.into()));
    }

    /// Record one tool result, truncating the summary for display.
    pub fn record_result(&mut self, result: &ActionResult) {
        let status = if result.success { "ok" } else { "failed" };
        let mut summary = result.summary.clone();
        if summary.chars().count() > RESULT_DISPLAY_CAP {
            summary = summary.chars().take(RESULT_DISPLAY_CAP).collect::<String>() + "...";
        }
        self.record(format!("[{}] {}", status, summary));
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::convo::Sender;
    use shared::tool::ActionOutcome;

    #[test]
    fn transcript_preserves_order() {
        let mut transcript = Transcript::new();
        transcript.append(ConversationEntry::new(Sender::User, "one"));
        transcript.append(ConversationEntry::new(Sender::Assistant, "two"));

        let messages: Vec<&str> = transcript
            .entries()
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn action_log_is_bounded_fifo() {
        let mut log = ActionLog::new(3);
        for i in 0..5 {
            log.record(format!("entry {}", i));
        }
        assert_eq!(log.len(), 3);
        let first = log.entries().next().unwrap();
        assert_eq!(first.message, "entry 2");
    }

    #[test]
    fn long_summaries_are_truncated_for_display_only() {
        let mut log = ActionLog::new(10);
        let result = ActionResult::ok(
            "inv-1",
            ActionOutcome::summary("y".repeat(RESULT_DISPLAY_CAP + 100)),
        );
        log.record_result(&result);

        let line = &log.entries().next().unwrap().message;
        // "[ok] " prefix + capped summary + ellipsis
        assert_eq!(line.chars().count(), 5 + RESULT_DISPLAY_CAP + 3);
        // The result itself is untouched.
        assert_eq!(result.summary.chars().count(), RESULT_DISPLAY_CAP + 100);
    }

    #[test]
    fn failed_results_are_labeled() {
        let mut log = ActionLog::new(10);
        let err = shared::tool::ExecutorError::UnknownTool("nope".into());
        log.record_result(&ActionResult::failed("inv-2", &err));
        assert!(log.entries().next().unwrap().message.starts_with("[failed]"));
    }
}
