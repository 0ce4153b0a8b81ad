//! The Model Gateway contract.
//!
//! The core sends one request per cycle (rendered context text, optional
//! attachment, the fixed tool catalog) and receives an ordered sequence of
//! content segments, each plain text or a structured tool invocation. Any
//! transport/auth/rate-limit failure surfaces as a single error value; the
//! core never retries automatically.

use async_trait::async_trait;
use shared::convo::Attachment;
use shared::tool::ToolInvocation;

use crate::catalog::ToolDefinition;

/// One outbound request to the model.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Rendered conversation context plus the current message.
    pub text: String,
    /// At most one attachment per request.
    pub attachment: Option<Attachment>,
    /// The tool catalog, stable across requests in a session.
    pub tools: Vec<ToolDefinition>,
}

/// One segment of a model response, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSegment {
    Text(String),
    Invocation(ToolInvocation),
}

/// A parsed model response.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub segments: Vec<ContentSegment>,
}

impl ModelResponse {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Gateway failure taxonomy. All of these become a single chat-visible error
/// entry; the session stays usable for the next submission.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no API credential configured")]
    MissingCredential,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rate limited: {detail}")]
    RateLimited { detail: String },

    #[error("model API error ({status}): {detail}")]
    Api { status: u16, detail: String },
}

/// Capability boundary to the language model provider.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn send(&self, request: ModelRequest) -> Result<ModelResponse, GatewayError>;
}
