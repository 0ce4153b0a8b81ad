use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::convo::Attachment;
use shared::settings::AppSettings;
use shared::tool::ToolInvocation;
use std::env;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use crate::catalog::ToolDefinition;
use crate::gateway::{ContentSegment, GatewayError, ModelGateway, ModelRequest, ModelResponse};

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<&'a ToolDefinition>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    http: Client,
    auth_token: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Build from settings, falling back to the ANTHROPIC_API_KEY env var.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, GatewayError> {
        let auth_token = settings
            .api_key
            .clone()
            .or_else(|| env::var("ANTHROPIC_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or(GatewayError::MissingCredential)?;

        Ok(Self {
            http: SHARED_HTTP.clone(),
            auth_token,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        })
    }

    fn build_content(request: &ModelRequest) -> Vec<ContentBlock> {
        let mut content = vec![ContentBlock::Text {
            text: request.text.clone(),
        }];

        if let Some(Attachment::Screenshot(bytes)) = &request.attachment {
            content.push(ContentBlock::Image {
                source: ImageSource {
                    source_type: "base64",
                    media_type: "image/png",
                    data: base64::engine::general_purpose::STANDARD.encode(bytes),
                },
            });
        }
        // PageText attachments are folded into the request text by the
        // Context Builder; only screenshots ride as image blocks.

        content
    }

    fn parse_segments(body: MessagesResponse) -> ModelResponse {
        let segments = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(ContentSegment::Text(text)),
                ResponseBlock::ToolUse { id, name, input } => {
                    Some(ContentSegment::Invocation(ToolInvocation {
                        id,
                        name,
                        arguments: input,
                    }))
                }
                ResponseBlock::Unknown => None,
            })
            .collect();

        ModelResponse { segments }
    }
}

#[async_trait]
impl ModelGateway for AnthropicClient {
    async fn send(&self, request: ModelRequest) -> Result<ModelResponse, GatewayError> {
        let req = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![WireMessage {
                role: "user",
                content: Self::build_content(&request),
            }],
            tools: request.tools.iter().collect(),
        };

        debug!(model = %self.model, tools = request.tools.len(), "sending model request");

        let resp = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.auth_token)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.chars().take(800).collect();
            if status.as_u16() == 429 {
                return Err(GatewayError::RateLimited { detail });
            }
            return Err(GatewayError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let body: MessagesResponse = resp.json().await?;
        Ok(Self::parse_segments(body))
    }
}
