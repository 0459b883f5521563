use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for the active team to start its turn.
    Setup,
    /// A turn is running.
    Question,
    /// Showing the scores of the turn that just ended.
    TurnSummary,
    /// Showing final scores.
    GameEnd,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Setup => VisibleGamePhase::Setup,
            GamePhase::Question => VisibleGamePhase::Question,
            GamePhase::TurnSummary => VisibleGamePhase::TurnSummary,
            GamePhase::GameEnd => VisibleGamePhase::GameEnd,
        }
    }
}
