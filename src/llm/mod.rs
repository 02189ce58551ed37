//! LLM completion access: wire types, HTTP transport and the retrying client.

pub mod client;
pub mod transport;
pub mod types;

pub use client::{CompletionClient, LlmClient};
pub use transport::{ChatTransport, RawResponse, ReqwestTransport};
pub use types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Completion};
