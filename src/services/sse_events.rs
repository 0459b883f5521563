use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::GameSummary,
        sse::{PhaseChangedEvent, ServerEvent, SystemStatus, TimerTickEvent},
    },
    state::{
        SharedState,
        game::{GameState, Transition},
    },
};

/// Full game snapshot.
pub const EVENT_GAME_STATE: &str = "game.state";
/// Phase transition.
pub const EVENT_PHASE_CHANGED: &str = "phase_changed";
/// Countdown update.
pub const EVENT_TIMER_TICK: &str = "timer.tick";
/// Degraded mode change.
pub const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast a snapshot of the entire game to subscribers.
pub fn broadcast_game_state(state: &SharedState, game: &GameState) {
    let summary = GameSummary::from(game);
    send_event(state, EVENT_GAME_STATE, &summary);
}

/// Broadcast a phase change when the transition moved the game.
pub fn broadcast_phase_changed(state: &SharedState, transition: Transition) {
    if !transition.changed() {
        return;
    }
    let payload = PhaseChangedEvent {
        from: transition.from.into(),
        to: transition.to.into(),
    };
    send_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast the countdown value.
pub fn broadcast_timer_tick(state: &SharedState, game: &GameState) {
    let payload = TimerTickEvent {
        timer: game.timer,
        is_timer_running: game.is_timer_running,
    };
    send_event(state, EVENT_TIMER_TICK, &payload);
}

/// Broadcast the degraded flag.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event<T: Serialize>(state: &SharedState, event: &str, payload: &T) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => state.sse().broadcast(message),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE event"),
    }
}
