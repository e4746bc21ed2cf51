//! Model client module for chat-completion inference.

mod client;
mod message;

pub use client::{
    ChatChoice, ChatCompletion, ChatCompletionsRequest, CompletionUsage, ModelClient, ModelConfig,
    ModelError, ResponseMessage, DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_MODEL_NAME,
};
pub use message::{ChatMessage, ContentItem, ImageDetailLevel, ImageError, ImageUrl, UserContent};
