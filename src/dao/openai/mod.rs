//! Chat-completion client used to generate questions.

mod client;
mod error;
mod models;

use futures::future::BoxFuture;

pub use client::{DEFAULT_ENDPOINT, OpenAiClient};
pub use error::{CompletionError, CompletionResult};
pub use models::{ChatMessage, ChatRole, Completion, CompletionOptions, CompletionUsage};

/// Remote function turning a conversation into a text completion.
pub trait CompletionClient: Send + Sync {
    /// Send `messages` with `options` and return the first choice with its usage.
    fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> BoxFuture<'static, CompletionResult<Completion>>;
}
