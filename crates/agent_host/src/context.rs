//! Context Builder: renders the bounded history plus the new user message
//! (and optional attachment) into the single outbound model request.

use providers::catalog::{self, ToolDefinition};
use providers::gateway::ModelRequest;
use shared::convo::Attachment;

use crate::history::HistoryStore;

/// Marker appended when attachment text is cut at the cap.
pub const TRUNCATION_MARKER: &str = "[content truncated]";

pub struct ContextBuilder {
    attachment_text_cap: usize,
    tools: Vec<ToolDefinition>,
}

impl ContextBuilder {
    pub fn new(attachment_text_cap: usize) -> Self {
        Self {
            attachment_text_cap,
            // Built once; the catalog must stay stable across a session.
            tools: catalog::definitions(),
        }
    }

    /// Produce the exact outbound payload for one cycle.
    pub fn build(
        &self,
        history: &HistoryStore,
        message: &str,
        attachment: Option<Attachment>,
    ) -> ModelRequest {
        let mut text = history.context_snippet();
        text.push_str("\nCurrent message:\n");
        text.push_str(message);

        let attachment = match attachment {
            Some(Attachment::PageText(content)) => {
                // Page text rides inside the request text; the cap is a hard
                // contract so oversized captures cannot blow request limits.
                text.push_str("\n\n[Attached page content]\n");
                text.push_str(&cap_text(&content, self.attachment_text_cap));
                None
            }
            other => other,
        };

        ModelRequest {
            text,
            attachment,
            tools: self.tools.clone(),
        }
    }
}

/// Cap `text` at `cap` characters, appending the truncation marker when cut.
fn cap_text(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }
    let mut capped: String = text.chars().take(cap).collect();
    capped.push_str(TRUNCATION_MARKER);
    capped
}
