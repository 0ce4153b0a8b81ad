//! The fixed tool catalog and wire-argument decoding.
//!
//! Three schemas are presented to the model with every request: `computer`,
//! `file_operations`, and `web_operations`. Each enumerates its legal
//! argument shapes exactly once; the catalog is part of the wire contract
//! and must not vary within a session.
//!
//! Decoding turns a loose wire invocation into the typed [`ToolCall`] sum.
//! Unknown tool names and malformed arguments come back as errors the
//! dispatcher converts into failed results, never as panics.

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::tool::{
    ComputerAction, ExecutorError, FileOperation, MouseButton, ToolCall, ToolInvocation,
    WebOperation, WriteMode,
};
use std::path::PathBuf;

/// One tool schema as sent to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

/// Build the catalog. Deterministic; call once per session and reuse.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "computer",
            description: "Use a computer to perform actions",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["click", "type", "scroll", "key", "move", "drag", "screenshot"]
                    },
                    "coordinate": {
                        "type": "array",
                        "items": {"type": "integer"},
                        "description": "[x, y] coordinates for click/move/drag actions"
                    },
                    "dest_coordinate": {
                        "type": "array",
                        "items": {"type": "integer"},
                        "description": "[x, y] destination for drag actions"
                    },
                    "text": {
                        "type": "string",
                        "description": "Text to type"
                    },
                    "key": {
                        "type": "string",
                        "description": "Key to press"
                    },
                    "clicks": {
                        "type": "integer",
                        "description": "Number of clicks, or scroll clicks"
                    },
                    "button": {
                        "type": "string",
                        "enum": ["left", "right", "middle"]
                    }
                },
                "required": ["action"]
            }),
        },
        ToolDefinition {
            name: "file_operations",
            description: "Perform file operations",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": ["read", "write", "list", "delete", "copy", "move"]
                    },
                    "file_path": {"type": "string"},
                    "content": {"type": "string"},
                    "dest_path": {"type": "string"},
                    "mode": {"type": "string", "enum": ["w", "a"]}
                },
                "required": ["operation", "file_path"]
            }),
        },
        ToolDefinition {
            name: "web_operations",
            description: "Load web pages and extract content",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": ["load_page", "get_content", "search_elements", "extract_links"]
                    },
                    "url": {"type": "string"},
                    "search_text": {"type": "string"}
                },
                "required": ["operation"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct ComputerArgs {
    action: String,
    coordinate: Option<[i32; 2]>,
    dest_coordinate: Option<[i32; 2]>,
    text: Option<String>,
    key: Option<String>,
    clicks: Option<i64>,
    button: Option<MouseButton>,
}

#[derive(Debug, Deserialize)]
struct FileArgs {
    operation: String,
    file_path: String,
    content: Option<String>,
    dest_path: Option<String>,
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebArgs {
    operation: String,
    url: Option<String>,
    search_text: Option<String>,
}

fn invalid(tool: &str, reason: impl Into<String>) -> ExecutorError {
    ExecutorError::InvalidArguments {
        tool: tool.to_string(),
        reason: reason.into(),
    }
}

/// Decode a wire invocation into a typed tool call.
pub fn decode(invocation: &ToolInvocation) -> Result<ToolCall, ExecutorError> {
    match invocation.name.as_str() {
        "computer" => decode_computer(&invocation.arguments).map(ToolCall::Computer),
        "file_operations" => decode_file(&invocation.arguments).map(ToolCall::File),
        "web_operations" => decode_web(&invocation.arguments).map(ToolCall::Web),
        other => Err(ExecutorError::UnknownTool(other.to_string())),
    }
}

fn decode_computer(args: &serde_json::Value) -> Result<ComputerAction, ExecutorError> {
    let args: ComputerArgs =
        serde_json::from_value(args.clone()).map_err(|e| invalid("computer", e.to_string()))?;

    let coordinate = |action: &str| {
        args.coordinate
            .ok_or_else(|| invalid("computer", format!("{} requires coordinate", action)))
    };

    match args.action.as_str() {
        "click" => {
            let [x, y] = coordinate("click")?;
            Ok(ComputerAction::Click {
                x,
                y,
                button: args.button.unwrap_or_default(),
                clicks: args.clicks.unwrap_or(1).max(1) as u32,
            })
        }
        "type" => Ok(ComputerAction::Type {
            text: args.text.unwrap_or_default(),
        }),
        "scroll" => Ok(ComputerAction::Scroll {
            clicks: args.clicks.unwrap_or(3) as i32,
        }),
        "key" => {
            let key = args
                .key
                .ok_or_else(|| invalid("computer", "key action requires key"))?;
            Ok(ComputerAction::KeyPress { key })
        }
        "move" => {
            let [x, y] = coordinate("move")?;
            Ok(ComputerAction::MoveTo { x, y })
        }
        "drag" => {
            let [x, y] = coordinate("drag")?;
            let [dx, dy] = args
                .dest_coordinate
                .ok_or_else(|| invalid("computer", "drag requires dest_coordinate"))?;
            Ok(ComputerAction::Drag {
                from: (x, y),
                to: (dx, dy),
            })
        }
        "screenshot" => Ok(ComputerAction::Screenshot),
        other => Err(invalid("computer", format!("unknown action: {}", other))),
    }
}

fn decode_file(args: &serde_json::Value) -> Result<FileOperation, ExecutorError> {
    let args: FileArgs = serde_json::from_value(args.clone())
        .map_err(|e| invalid("file_operations", e.to_string()))?;
    let path = PathBuf::from(&args.file_path);

    let dest = |op: &str| -> Result<PathBuf, ExecutorError> {
        args.dest_path
            .as_ref()
            .map(PathBuf::from)
            .ok_or_else(|| invalid("file_operations", format!("{} requires dest_path", op)))
    };

    match args.operation.as_str() {
        "read" => Ok(FileOperation::Read { path }),
        "write" => Ok(FileOperation::Write {
            path,
            content: args.content.unwrap_or_default(),
            mode: match args.mode.as_deref() {
                Some("a") => WriteMode::Append,
                _ => WriteMode::Overwrite,
            },
        }),
        "list" => Ok(FileOperation::List { path }),
        "delete" => Ok(FileOperation::Delete { path }),
        "copy" => Ok(FileOperation::Copy {
            src: path,
            dest: dest("copy")?,
        }),
        "move" => Ok(FileOperation::Move {
            src: path,
            dest: dest("move")?,
        }),
        other => Err(invalid(
            "file_operations",
            format!("unknown file operation: {}", other),
        )),
    }
}

fn decode_web(args: &serde_json::Value) -> Result<WebOperation, ExecutorError> {
    let args: WebArgs = serde_json::from_value(args.clone())
        .map_err(|e| invalid("web_operations", e.to_string()))?;

    match args.operation.as_str() {
        "load_page" => {
            let url = args
                .url
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| invalid("web_operations", "load_page requires url"))?;
            Ok(WebOperation::LoadPage { url })
        }
        "get_content" => Ok(WebOperation::GetContent),
        "search_elements" => {
            let text = args
                .search_text
                .ok_or_else(|| invalid("web_operations", "search_elements requires search_text"))?;
            Ok(WebOperation::SearchText { text })
        }
        "extract_links" => Ok(WebOperation::ExtractLinks),
        other => Err(invalid(
            "web_operations",
            format!("unknown web operation: {}", other),
        )),
    }
}
