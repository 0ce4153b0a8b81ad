//! Conversation data model: logged turns and per-request attachments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a logged turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
    System,
}

impl Sender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
            Sender::System => "System",
        }
    }
}

/// One logged conversation turn. Never mutated after creation; evicted only
/// by bounded-size truncation or an explicit clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    pub sender: Sender,
    pub message: String,
    #[serde(default)]
    pub has_attachment: bool,
}

impl ConversationEntry {
    pub fn new(sender: Sender, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            sender,
            message: message.into(),
            has_attachment: false,
        }
    }

    pub fn with_attachment(mut self) -> Self {
        self.has_attachment = true;
        self
    }
}

/// Payload bound to a single outbound request: a screenshot or captured page
/// text. Owned by the turn that produced it; only the `has_attachment` flag
/// survives into the logged entry.
#[derive(Debug, Clone)]
pub enum Attachment {
    /// PNG-encoded screenshot bytes.
    Screenshot(Vec<u8>),
    /// Captured page text, capped by the Context Builder before send.
    PageText(String),
}

impl Attachment {
    pub fn kind(&self) -> &'static str {
        match self {
            Attachment::Screenshot(_) => "screenshot",
            Attachment::PageText(_) => "page text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_defaults_to_no_attachment() {
        let entry = ConversationEntry::new(Sender::User, "hello");
        assert!(!entry.has_attachment);
        assert_eq!(entry.sender, Sender::User);
    }

    #[test]
    fn sender_round_trips_through_json() {
        let entry = ConversationEntry::new(Sender::Assistant, "hi").with_attachment();
        let json = serde_json::to_string(&entry).unwrap();
        let back: ConversationEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
