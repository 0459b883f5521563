use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{kv_store::KeyValueStore, persistence::Persistence, storage::StorageError},
    services::{game_service, sse_events},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Keep a storage backend installed, staying in degraded mode while it is unavailable.
///
/// The stored game is restored the first time a backend comes up.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn KeyValueStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(backend) => {
                attach(&state, backend.clone()).await;
                delay = INITIAL_DELAY;

                loop {
                    sleep(HEALTH_POLL_INTERVAL).await;
                    if let Err(err) = backend.health_check().await {
                        warn!(error = %err, "storage health check failed; entering degraded mode");
                        detach(&state).await;
                        break;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Install `backend` and leave degraded mode.
pub async fn attach(state: &SharedState, backend: Arc<dyn KeyValueStore>) {
    state.install_persistence(Persistence::new(backend)).await;
    info!("storage connection established; leaving degraded mode");
    sse_events::broadcast_system_status(state, false);

    if !state.mark_restored() {
        game_service::restore(state).await;
    }
}

/// Drop the installed backend and enter degraded mode.
pub async fn detach(state: &SharedState) {
    state.clear_persistence().await;
    sse_events::broadcast_system_status(state, true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{kv_store::memory::MemoryStore, models::StorageKey},
        services::test_support,
        state::{game::GameState, state_machine::GamePhase},
    };

    #[tokio::test]
    async fn attach_restores_the_stored_game_once() {
        let state = test_support::state();
        let backend = MemoryStore::new();

        let mut stored = state.game_snapshot().await;
        stored.teams[0].score = 4;
        Persistence::new(Arc::new(backend.clone()))
            .store(StorageKey::CurrentGame, &stored)
            .await;

        let mut receiver = state.sse().subscribe();
        attach(&state, Arc::new(backend.clone())).await;
        assert!(!state.is_degraded());
        assert_eq!(state.game_snapshot().await.teams[0].score, 4);
        let status = receiver.try_recv().unwrap();
        assert_eq!(
            status.event.as_deref(),
            Some(sse_events::EVENT_SYSTEM_STATUS)
        );

        detach(&state).await;
        assert!(state.is_degraded());

        stored.teams[0].score = 9;
        Persistence::new(Arc::new(backend.clone()))
            .store(StorageKey::CurrentGame, &stored)
            .await;
        attach(&state, Arc::new(backend)).await;
        assert_eq!(state.game_snapshot().await.teams[0].score, 4);
    }

    #[tokio::test]
    async fn attach_persists_the_live_game_when_nothing_is_stored() {
        let state = test_support::state();
        let backend = MemoryStore::new();
        attach(&state, Arc::new(backend)).await;

        let stored: Option<GameState> = state.retrieve_data(StorageKey::CurrentGame, None).await;
        assert_eq!(stored.map(|game| game.id), Some(state.game_snapshot().await.id));
    }

    #[tokio::test]
    async fn attach_keeps_progress_made_while_degraded() {
        let state = test_support::state();
        let backend = MemoryStore::new();
        let older = state.game_snapshot().await;
        Persistence::new(Arc::new(backend.clone()))
            .store(StorageKey::CurrentGame, &older)
            .await;

        game_service::start_turn(&state).await.unwrap();
        game_service::answer_correct(&state).await.unwrap();

        attach(&state, Arc::new(backend)).await;
        let live = state.game_snapshot().await;
        assert_eq!(live.teams[0].score, 1);
        assert_eq!(live.current_phase, GamePhase::Question);

        let stored: Option<GameState> = state.retrieve_data(StorageKey::CurrentGame, None).await;
        assert_eq!(stored, Some(live));
    }
}
