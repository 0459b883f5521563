//! Shared fixtures for service tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::future::BoxFuture;

use crate::{
    config::AppConfig,
    dao::{
        kv_store::memory::MemoryStore,
        openai::{
            ChatMessage, Completion, CompletionClient, CompletionError, CompletionOptions,
            CompletionResult, CompletionUsage,
        },
        persistence::Persistence,
    },
    state::{AppState, SharedState},
};

/// Completion client answering every call with the same canned content.
pub struct StubCompletion {
    content: Option<String>,
    calls: AtomicUsize,
}

impl StubCompletion {
    /// Reply with `content` and a fixed usage block.
    pub fn replying(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every call.
    pub fn failing() -> Self {
        Self {
            content: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completion calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionClient for StubCompletion {
    fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> BoxFuture<'static, CompletionResult<Completion>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = self.content.clone();
        Box::pin(async move {
            match content {
                Some(content) => Ok(Completion {
                    content: Some(content),
                    usage: Some(CompletionUsage {
                        prompt_tokens: 100,
                        completion_tokens: 50,
                        total_tokens: 150,
                    }),
                }),
                None => Err(CompletionError::MissingApiKey),
            }
        })
    }
}

/// Degraded state with default configuration and a failing completion client.
pub fn state() -> SharedState {
    AppState::new(AppConfig::default(), Arc::new(StubCompletion::failing()))
        .expect("default configuration builds a valid game")
}

/// State backed by an in-memory store, returning the store for inspection.
pub async fn state_with(
    config: AppConfig,
    completion: Arc<StubCompletion>,
) -> (SharedState, MemoryStore) {
    let backend = MemoryStore::new();
    let state = AppState::new(config, completion).expect("valid configuration");
    state
        .install_persistence(Persistence::new(Arc::new(backend.clone())))
        .await;
    (state, backend)
}

/// State backed by an in-memory store with a failing completion client.
pub async fn memory_state() -> SharedState {
    state_with(AppConfig::default(), Arc::new(StubCompletion::failing()))
        .await
        .0
}
