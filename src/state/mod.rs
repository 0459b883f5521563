/// Game model and reducer.
pub mod game;
mod sse;
/// Phase transition table.
pub mod state_machine;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, RwLock, watch};
use tracing::debug;

use crate::{
    config::AppConfig,
    dao::{models::StorageKey, openai::CompletionClient, persistence::Persistence},
    state::game::{GameError, GameState},
};

pub use self::sse::SseHub;

/// Application state shared across handlers and tasks.
pub type SharedState = Arc<AppState>;

/// Capacity of the game SSE broadcast channel.
const SSE_CAPACITY: usize = 64;

/// Central application state: configuration, storage handle, live game and SSE hub.
pub struct AppState {
    config: AppConfig,
    persistence: RwLock<Option<Persistence>>,
    completion: Arc<dyn CompletionClient>,
    sse: SseHub,
    game: RwLock<GameState>,
    degraded: watch::Sender<bool>,
    transition_gate: Mutex<()>,
    question_gate: Mutex<()>,
    settings_gate: Mutex<()>,
    restored: AtomicBool,
    game_modified: AtomicBool,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode with a fresh game built from the configured
    /// defaults, until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        completion: Arc<dyn CompletionClient>,
    ) -> Result<SharedState, GameError> {
        let game = GameState::new(
            config.default_teams.clone(),
            config.default_settings.clone(),
        )?;
        let (degraded_tx, _rx) = watch::channel(true);

        Ok(Arc::new(Self {
            config,
            persistence: RwLock::new(None),
            completion,
            sse: SseHub::new(SSE_CAPACITY),
            game: RwLock::new(game),
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
            question_gate: Mutex::new(()),
            settings_gate: Mutex::new(()),
            restored: AtomicBool::new(false),
            game_modified: AtomicBool::new(false),
        }))
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Chat-completion client used to generate questions.
    pub fn completion(&self) -> &Arc<dyn CompletionClient> {
        &self.completion
    }

    /// Obtain a handle to the current persistence adapter, if a backend is installed.
    pub async fn persistence(&self) -> Option<Persistence> {
        let guard = self.persistence.read().await;
        guard.as_ref().cloned()
    }

    /// Install a persistence adapter and leave degraded mode.
    pub async fn install_persistence(&self, persistence: Persistence) {
        {
            let mut guard = self.persistence.write().await;
            *guard = Some(persistence);
        }
        self.update_degraded(false);
    }

    /// Remove the current persistence adapter and enter degraded mode.
    pub async fn clear_persistence(&self) {
        {
            let mut guard = self.persistence.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Persist `value` under `key`; reports `false` when no backend is installed or the write fails.
    pub async fn store_data<T>(&self, key: StorageKey, value: &T) -> bool
    where
        T: Serialize + ?Sized,
    {
        match self.persistence().await {
            Some(persistence) => persistence.store(key, value).await,
            None => {
                debug!(key = %key, "storage unavailable (degraded mode); skipping write");
                false
            }
        }
    }

    /// Read the value stored under `key`, or `default` when nothing usable is stored.
    pub async fn retrieve_data<T>(&self, key: StorageKey, default: T) -> T
    where
        T: DeserializeOwned,
    {
        match self.persistence().await {
            Some(persistence) => persistence.retrieve(key, default).await,
            None => default,
        }
    }

    /// Delete the value stored under `key`.
    pub async fn remove_data(&self, key: StorageKey) -> bool {
        match self.persistence().await {
            Some(persistence) => persistence.remove(key).await,
            None => false,
        }
    }

    /// Broadcast hub used for the game SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Live game state. Writers must hold the transition gate, except the countdown ticker.
    pub fn game(&self) -> &RwLock<GameState> {
        &self.game
    }

    /// Snapshot of the live game.
    pub async fn game_snapshot(&self) -> GameState {
        self.game.read().await.clone()
    }

    /// Gate serialising game mutations so there is a single logical writer.
    pub fn transition_gate(&self) -> &Mutex<()> {
        &self.transition_gate
    }

    /// Gate serialising read-modify-write cycles on the question cache.
    pub fn question_gate(&self) -> &Mutex<()> {
        &self.question_gate
    }

    /// Gate serialising read-modify-write cycles on stored settings and token usage.
    pub fn settings_gate(&self) -> &Mutex<()> {
        &self.settings_gate
    }

    /// Mark the stored game as restored, returning whether it already was.
    pub fn mark_restored(&self) -> bool {
        self.restored.swap(true, Ordering::SeqCst)
    }

    /// Record that the live game moved away from the boot game.
    pub fn mark_game_modified(&self) {
        self.game_modified.store(true, Ordering::SeqCst);
    }

    /// Whether the live game was changed since startup.
    pub fn is_game_modified(&self) -> bool {
        self.game_modified.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        kv_store::memory::MemoryStore,
        openai::{
            ChatMessage, Completion, CompletionError, CompletionOptions, CompletionResult,
        },
    };
    use futures::future::BoxFuture;

    struct NoCompletion;

    impl CompletionClient for NoCompletion {
        fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _options: CompletionOptions,
        ) -> BoxFuture<'static, CompletionResult<Completion>> {
            Box::pin(async { Err(CompletionError::MissingApiKey) })
        }
    }

    fn state() -> SharedState {
        AppState::new(AppConfig::default(), Arc::new(NoCompletion)).unwrap()
    }

    #[tokio::test]
    async fn starts_degraded_and_skips_writes() {
        let state = state();
        assert!(state.is_degraded());
        assert!(!state.store_data(StorageKey::UserSettings, "x").await);
        let value: String = state
            .retrieve_data(StorageKey::UserSettings, "fallback".to_string())
            .await;
        assert_eq!(value, "fallback");
    }

    #[tokio::test]
    async fn installing_persistence_leaves_degraded_mode() {
        let state = state();
        let mut watcher = state.degraded_watcher();

        state
            .install_persistence(Persistence::new(Arc::new(MemoryStore::new())))
            .await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        assert!(state.store_data(StorageKey::UserSettings, "x").await);
        state.clear_persistence().await;
        assert!(state.is_degraded());
    }

    #[test]
    fn restored_flag_flips_once() {
        let state = state();
        assert!(!state.mark_restored());
        assert!(state.mark_restored());
    }

    #[test]
    fn boot_game_starts_unmodified() {
        let state = state();
        assert!(!state.is_game_modified());
        state.mark_game_modified();
        assert!(state.is_game_modified());
    }
}
