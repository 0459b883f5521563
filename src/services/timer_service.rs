use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    services::{game_service, sse_events},
    state::{
        SharedState,
        game::{GameAction, Transition},
    },
};

/// Period of the countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Drive the question countdown for the lifetime of the process.
pub async fn run(state: SharedState) {
    let mut ticker = interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;
    debug!("question timer started");

    loop {
        ticker.tick().await;
        tick(&state).await;
    }
}

/// Advance the countdown by one second when it is running.
///
/// Every tick is persisted. The tick is skipped while another transition holds the
/// gate. Returns the resulting transition, or `None` when nothing was applied.
pub async fn tick(state: &SharedState) -> Option<Transition> {
    let Ok(_gate) = state.transition_gate().try_lock() else {
        debug!("transition in progress; skipping timer tick");
        return None;
    };
    let (game, transition) = {
        let mut game = state.game().write().await;
        if !game.is_timer_running {
            return None;
        }
        match game.apply(GameAction::Tick) {
            Ok(transition) => (game.clone(), transition),
            Err(err) => {
                warn!(error = %err, "timer tick rejected");
                return None;
            }
        }
    };

    sse_events::broadcast_timer_tick(state, &game);
    if transition.changed() {
        info!(game_id = %game.id, "question timer expired");
        game_service::commit(state, &game, transition).await;
    } else {
        game_service::persist(state, &game).await;
    }
    Some(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::StorageKey,
        services::{game_service, test_support},
        state::{
            game::{GameState, SettingsPatch},
            state_machine::GamePhase,
        },
    };

    #[tokio::test]
    async fn idle_timer_does_nothing() {
        let state = test_support::memory_state().await;
        assert!(tick(&state).await.is_none());
        assert_eq!(state.game_snapshot().await.timer, 60);
    }

    #[tokio::test]
    async fn countdown_expires_into_turn_summary() {
        let state = test_support::memory_state().await;
        game_service::update_settings(
            &state,
            SettingsPatch {
                time_limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        game_service::start_turn(&state).await.unwrap();
        let mut receiver = state.sse().subscribe();

        let first = tick(&state).await.unwrap();
        assert!(!first.changed());
        assert_eq!(state.game_snapshot().await.timer, 1);

        let second = tick(&state).await.unwrap();
        assert_eq!(second.to, GamePhase::TurnSummary);
        let game = state.game_snapshot().await;
        assert!(!game.is_timer_running);
        assert_eq!(game.timer, 0);

        let stored: Option<GameState> = state.retrieve_data(StorageKey::CurrentGame, None).await;
        assert_eq!(
            stored.map(|game| game.current_phase),
            Some(GamePhase::TurnSummary)
        );

        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event.event.unwrap_or_default());
        }
        assert_eq!(
            events,
            vec![
                sse_events::EVENT_TIMER_TICK,
                sse_events::EVENT_TIMER_TICK,
                sse_events::EVENT_PHASE_CHANGED,
                sse_events::EVENT_GAME_STATE,
            ]
        );

        assert!(tick(&state).await.is_none());
    }

    #[tokio::test]
    async fn paused_timer_holds_its_value() {
        let state = test_support::memory_state().await;
        game_service::start_turn(&state).await.unwrap();
        game_service::pause_timer(&state).await.unwrap();
        assert!(tick(&state).await.is_none());
        assert_eq!(state.game_snapshot().await.timer, 60);
    }

    #[tokio::test]
    async fn every_tick_is_persisted() {
        let state = test_support::memory_state().await;
        game_service::start_turn(&state).await.unwrap();
        for _ in 0..10 {
            tick(&state).await;
        }

        assert_eq!(state.game_snapshot().await.timer, 50);
        let stored: Option<GameState> = state.retrieve_data(StorageKey::CurrentGame, None).await;
        assert_eq!(stored.map(|game| game.timer), Some(50));
    }

    #[tokio::test]
    async fn tick_waits_for_running_transitions() {
        let state = test_support::memory_state().await;
        game_service::start_turn(&state).await.unwrap();

        let gate = state.transition_gate().lock().await;
        assert!(tick(&state).await.is_none());
        assert_eq!(state.game_snapshot().await.timer, 60);
        drop(gate);

        assert!(tick(&state).await.is_some());
        assert_eq!(state.game_snapshot().await.timer, 59);
    }
}
