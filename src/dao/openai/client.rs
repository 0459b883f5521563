use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::{debug, warn};

use super::{
    CompletionClient,
    error::{CompletionError, CompletionResult},
    models::{
        ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Completion,
        CompletionOptions,
    },
};

/// Default chat-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// HTTP client for an OpenAI-compatible chat-completion endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: Arc<str>,
}

impl OpenAiClient {
    /// Build a client posting to `endpoint`, giving up on requests after `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> CompletionResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| CompletionError::ClientBuilder { source })?;

        Ok(Self {
            client,
            endpoint: Arc::from(endpoint.into()),
        })
    }

    async fn send(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> CompletionResult<Completion> {
        if options.api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let body = ChatCompletionRequest {
            model: &options.model,
            messages: &messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint.as_ref())
            .bearer_auth(&options.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| CompletionError::RequestSend { source })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_default();
            warn!(%status, %message, "completion API returned an error");
            return Err(CompletionError::RequestStatus { status, message });
        }

        let payload = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|source| CompletionError::DecodeResponse { source })?;
        debug!(
            choices = payload.choices.len(),
            usage = ?payload.usage,
            "completion received"
        );

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty());

        Ok(Completion {
            content,
            usage: payload.usage,
        })
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> BoxFuture<'static, CompletionResult<Completion>> {
        let client = self.clone();
        Box::pin(async move { client.send(messages, options).await })
    }
}
