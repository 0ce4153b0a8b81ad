//! Model Gateway: the contract the core holds against a language model
//! provider, plus the Anthropic Messages API implementation and the fixed
//! tool catalog presented with every request.

pub mod anthropic;
pub mod catalog;
pub mod gateway;

pub use anthropic::AnthropicClient;
pub use gateway::{ContentSegment, GatewayError, ModelGateway, ModelRequest, ModelResponse};
