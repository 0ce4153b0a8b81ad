//! Typed tool calls, execution results, and the executor error taxonomy.
//!
//! A model response carries wire-level [`ToolInvocation`]s (name plus loose
//! JSON arguments). The catalog decodes each one into the [`ToolCall`] sum
//! type so the dispatcher can match exhaustively; adding a tool is a
//! compile-checked change, not a new string comparison.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One structured action request as it appears on the wire, before decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Opaque identifier correlating results with the request.
    pub id: String,
    /// Tool name as emitted by the model.
    pub name: String,
    /// Tool-specific arguments, shape depends on `name`.
    pub arguments: serde_json::Value,
}

/// Mouse button for click actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Screen/input automation actions.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputerAction {
    Click {
        x: i32,
        y: i32,
        button: MouseButton,
        clicks: u32,
    },
    Type {
        text: String,
    },
    Scroll {
        clicks: i32,
    },
    KeyPress {
        key: String,
    },
    MoveTo {
        x: i32,
        y: i32,
    },
    Drag {
        from: (i32, i32),
        to: (i32, i32),
    },
    Screenshot,
}

impl ComputerAction {
    pub fn kind(&self) -> &'static str {
        match self {
            ComputerAction::Click { .. } => "click",
            ComputerAction::Type { .. } => "type",
            ComputerAction::Scroll { .. } => "scroll",
            ComputerAction::KeyPress { .. } => "key",
            ComputerAction::MoveTo { .. } => "move",
            ComputerAction::Drag { .. } => "drag",
            ComputerAction::Screenshot => "screenshot",
        }
    }
}

/// Write mode for file writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    Overwrite,
    Append,
}

/// Filesystem operations.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Read { path: PathBuf },
    Write { path: PathBuf, content: String, mode: WriteMode },
    List { path: PathBuf },
    Delete { path: PathBuf },
    Copy { src: PathBuf, dest: PathBuf },
    Move { src: PathBuf, dest: PathBuf },
}

impl FileOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            FileOperation::Read { .. } => "read",
            FileOperation::Write { .. } => "write",
            FileOperation::List { .. } => "list",
            FileOperation::Delete { .. } => "delete",
            FileOperation::Copy { .. } => "copy",
            FileOperation::Move { .. } => "move",
        }
    }
}

/// Web fetch operations.
#[derive(Debug, Clone, PartialEq)]
pub enum WebOperation {
    LoadPage { url: String },
    GetContent,
    SearchText { text: String },
    ExtractLinks,
}

impl WebOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            WebOperation::LoadPage { .. } => "load_page",
            WebOperation::GetContent => "get_content",
            WebOperation::SearchText { .. } => "search_text",
            WebOperation::ExtractLinks => "extract_links",
        }
    }
}

/// A decoded invocation, routed by exhaustive match in the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Computer(ComputerAction),
    File(FileOperation),
    Web(WebOperation),
}

impl ToolCall {
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolCall::Computer(_) => "computer",
            ToolCall::File(_) => "file_operations",
            ToolCall::Web(_) => "web_operations",
        }
    }
}

/// Successful outcome of executing one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Human-readable summary for the action log.
    pub summary: String,
    /// Optional structured payload (file listing, extracted links, ...).
    pub raw_detail: Option<serde_json::Value>,
}

impl ActionOutcome {
    pub fn summary(text: impl Into<String>) -> Self {
        Self {
            summary: text.into(),
            raw_detail: None,
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.raw_detail = Some(detail);
        self
    }
}

/// Outcome of one tool invocation, success or failure, as logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub invocation_id: String,
    pub success: bool,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_detail: Option<serde_json::Value>,
}

impl ActionResult {
    pub fn ok(invocation_id: impl Into<String>, outcome: ActionOutcome) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            success: true,
            summary: outcome.summary,
            raw_detail: outcome.raw_detail,
        }
    }

    pub fn failed(invocation_id: impl Into<String>, error: &ExecutorError) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            success: false,
            summary: error.to_string(),
            raw_detail: None,
        }
    }
}

/// Failure taxonomy shared by all executors. Every variant carries enough
/// detail to diagnose what operation, what target, and what cause.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("path is a directory: {0}")]
    IsDirectory(PathBuf),

    #[error("path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("coordinates ({x}, {y}) are outside screen bounds {width}x{height}")]
    OutOfBounds { x: i32, y: i32, width: i32, height: i32 },

    #[error("computer automation not available")]
    Unavailable,

    #[error("automation halted by emergency stop")]
    Halted,

    #[error("failed to load page {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("error processing page: {0}")]
    Parse(String),

    #[error("no page content available")]
    NoPageLoaded,
}

impl ExecutorError {
    /// Classify an IO error against the path it touched.
    pub fn from_io(path: &std::path::Path, context: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ExecutorError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                ExecutorError::PermissionDenied(path.to_path_buf())
            }
            _ => ExecutorError::Io {
                context: format!("{} {}", context, path.display()),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_carries_tool_name_for_unknown_tool() {
        let err = ExecutorError::UnknownTool("unknown_tool".into());
        let result = ActionResult::failed("inv-1", &err);
        assert!(!result.success);
        assert!(result.summary.contains("unknown"));
        assert!(result.summary.contains("unknown_tool"));
    }

    #[test]
    fn io_classification_maps_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let classified =
            ExecutorError::from_io(std::path::Path::new("/tmp/x"), "error reading file", err);
        assert!(matches!(classified, ExecutorError::NotFound(_)));
    }

    #[test]
    fn io_classification_maps_permission_denied() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let classified =
            ExecutorError::from_io(std::path::Path::new("/tmp/x"), "error writing file", err);
        assert!(matches!(classified, ExecutorError::PermissionDenied(_)));
    }
}
