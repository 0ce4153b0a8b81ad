//! Bounded, persisted conversation history.
//!
//! A FIFO ring of the last N turns, written to a single JSON file after
//! every append. Loading tolerates missing and malformed files (an empty
//! store, never a crash), and persistence failures degrade to in-memory
//! operation for that cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::convo::ConversationEntry;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Returned when history is empty and the caller asked for a rendering.
pub const NO_HISTORY_SENTINEL: &str = "No previous conversation history.";

/// On-disk layout of the rolling history file.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    last_updated: DateTime<Utc>,
    messages: Vec<ConversationEntry>,
}

/// On-disk layout of a structured export.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportFile {
    pub exported_at: DateTime<Utc>,
    pub message_count: usize,
    pub messages: Vec<ConversationEntry>,
}

/// Export rendering, selected by destination extension or explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full fidelity, all entry fields.
    Structured,
    /// Human-readable numbered transcript.
    Text,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ExportFormat::Structured,
            _ => ExportFormat::Text,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("no conversation history to export")]
    Empty,

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bounded ordered sequence of conversation entries, capacity `N`.
pub struct HistoryStore {
    entries: VecDeque<ConversationEntry>,
    capacity: usize,
    path: PathBuf,
}

impl HistoryStore {
    /// Load from `path`. Missing file yields an empty store; a malformed
    /// file logs a warning, yields an empty store, and leaves the file
    /// untouched until the next successful append.
    pub fn load(path: PathBuf, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = VecDeque::with_capacity(capacity);

        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HistoryFile>(&raw) {
                Ok(file) => {
                    let count = file.messages.len();
                    debug!(
                        count,
                        updated = %file.last_updated,
                        path = %path.display(),
                        "loaded conversation history"
                    );
                    for entry in file.messages {
                        if entries.len() == capacity {
                            entries.pop_front();
                        }
                        entries.push_back(entry);
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed history file, starting empty");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no previous history file");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable history file, starting empty");
            }
        }

        Self {
            entries,
            capacity,
            path,
        }
    }

    /// Default location of the rolling history file.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com.local", "Deskhand", "Deskhand")
            .map(|p| p.data_dir().join("chat_history.json"))
            .unwrap_or_else(|| PathBuf::from("deskhand_chat_history.json"))
    }

    /// Append an entry, evicting the oldest past capacity, and persist.
    /// Never raises: persistence failure is logged and in-memory state
    /// still advances.
    pub fn append(&mut self, entry: ConversationEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.persist();
    }

    /// Empty the store and persist the empty state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    /// Deterministic text rendering of the current entries, oldest first.
    pub fn context_snippet(&self) -> String {
        if self.entries.is_empty() {
            return NO_HISTORY_SENTINEL.to_string();
        }

        let mut out = format!(
            "Previous conversation history (last {} messages):\n\n",
            self.entries.len()
        );
        for (i, entry) in self.entries.iter().enumerate() {
            let marker = if entry.has_attachment {
                " [with attachment]"
            } else {
                ""
            };
            out.push_str(&format!(
                "{}. [{}] {}: {}{}\n",
                i + 1,
                entry.timestamp.format("%H:%M:%S"),
                entry.sender.display_name(),
                entry.message,
                marker
            ));
        }
        out
    }

    /// Export the full history to `path` in the given format.
    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<(), HistoryError> {
        if self.entries.is_empty() {
            return Err(HistoryError::Empty);
        }

        let body = match format {
            ExportFormat::Structured => {
                let file = ExportFile {
                    exported_at: Utc::now(),
                    message_count: self.entries.len(),
                    messages: self.entries.iter().cloned().collect(),
                };
                serde_json::to_string_pretty(&file).map_err(|e| HistoryError::Io {
                    path: path.to_path_buf(),
                    source: e.into(),
                })?
            }
            ExportFormat::Text => {
                let mut out = String::new();
                out.push_str("Deskhand - Conversation History\n");
                out.push_str(&format!(
                    "Exported: {}\n",
                    Utc::now().format("%Y-%m-%d %H:%M:%S")
                ));
                out.push_str(&format!("Messages: {}\n\n", self.entries.len()));
                out.push_str(&"=".repeat(50));
                out.push_str("\n\n");
                for (i, entry) in self.entries.iter().enumerate() {
                    let marker = if entry.has_attachment {
                        " [with attachment]"
                    } else {
                        ""
                    };
                    out.push_str(&format!(
                        "{}. [{}] {}: {}{}\n\n",
                        i + 1,
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.sender.display_name(),
                        entry.message,
                        marker
                    ));
                }
                out
            }
        };

        fs::write(path, body).map_err(|e| HistoryError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn persist(&self) {
        let file = HistoryFile {
            last_updated: Utc::now(),
            messages: self.entries.iter().cloned().collect(),
        };
        let json = match serde_json::to_string_pretty(&file) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize history");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent);
            }
        }
        if let Err(e) = fs::write(&self.path, json) {
            warn!(path = %self.path.display(), error = %e, "failed to persist history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::convo::Sender;
    use tempfile::TempDir;

    fn store(dir: &TempDir, capacity: usize) -> HistoryStore {
        HistoryStore::load(dir.path().join("history.json"), capacity)
    }

    fn user_entry(text: &str) -> ConversationEntry {
        ConversationEntry::new(Sender::User, text)
    }

    #[test]
    fn retains_exactly_last_n_in_order() {
        let dir = TempDir::new().unwrap();
        let mut history = store(&dir, 20);

        for i in 0..25 {
            history.append(user_entry(&format!("message {}", i)));
        }

        assert_eq!(history.len(), 20);
        let messages: Vec<&str> = history.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages[0], "message 5");
        assert_eq!(messages[19], "message 24");
        // The oldest 5 are gone.
        for i in 0..5 {
            assert!(!messages.contains(&format!("message {}", i).as_str()));
        }
    }

    #[test]
    fn context_snippet_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let mut history = store(&dir, 5);
        history.append(user_entry("first"));
        history.append(ConversationEntry::new(Sender::Assistant, "second").with_attachment());

        let a = history.context_snippet();
        let b = history.context_snippet();
        assert_eq!(a, b);
        assert!(a.contains("1. ["));
        assert!(a.contains("You: first"));
        assert!(a.contains("Assistant: second [with attachment]"));
    }

    #[test]
    fn empty_store_renders_sentinel() {
        let dir = TempDir::new().unwrap();
        let history = store(&dir, 5);
        assert_eq!(history.context_snippet(), NO_HISTORY_SENTINEL);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let history = store(&dir, 5);
        assert!(history.is_empty());
    }

    #[test]
    fn malformed_file_loads_empty_and_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json at all").unwrap();

        let history = HistoryStore::load(path.clone(), 5);
        assert!(history.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json at all");
    }

    #[test]
    fn append_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let mut history = HistoryStore::load(path.clone(), 5);
        history.append(user_entry("remember me"));
        drop(history);

        let reloaded = HistoryStore::load(path, 5);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.entries().next().unwrap().message, "remember me");
    }

    #[test]
    fn structured_export_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut history = store(&dir, 10);
        history.append(user_entry("alpha"));
        history.append(ConversationEntry::new(Sender::Assistant, "beta").with_attachment());

        let export_path = dir.path().join("export.json");
        history
            .export(&export_path, ExportFormat::Structured)
            .unwrap();

        let raw = fs::read_to_string(&export_path).unwrap();
        let file: ExportFile = serde_json::from_str(&raw).unwrap();
        assert_eq!(file.message_count, 2);
        let original: Vec<ConversationEntry> = history.entries().cloned().collect();
        assert_eq!(file.messages, original);
    }

    #[test]
    fn text_export_is_numbered() {
        let dir = TempDir::new().unwrap();
        let mut history = store(&dir, 10);
        history.append(user_entry("alpha"));
        history.append(user_entry("beta"));

        let export_path = dir.path().join("export.txt");
        history.export(&export_path, ExportFormat::Text).unwrap();

        let raw = fs::read_to_string(&export_path).unwrap();
        assert!(raw.contains("Messages: 2"));
        assert!(raw.contains("1. ["));
        assert!(raw.contains("2. ["));
    }

    #[test]
    fn exporting_empty_history_is_an_error() {
        let dir = TempDir::new().unwrap();
        let history = store(&dir, 5);
        let err = history
            .export(&dir.path().join("export.json"), ExportFormat::Structured)
            .unwrap_err();
        assert!(matches!(err, HistoryError::Empty));
    }

    #[test]
    fn clear_persists_empty_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let mut history = HistoryStore::load(path.clone(), 5);
        history.append(user_entry("gone soon"));
        history.clear();

        assert!(history.is_empty());
        let reloaded = HistoryStore::load(path, 5);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out.json")),
            ExportFormat::Structured
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("out.txt")),
            ExportFormat::Text
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("out")),
            ExportFormat::Text
        );
    }
}
