use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stages of a game round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    /// Waiting for the active team to start its turn.
    #[default]
    Setup,
    /// A turn is running and a question is on screen.
    Question,
    /// The turn is over; scores of the turn are displayed.
    TurnSummary,
    /// A team reached the winning score. Only a reset leaves this phase.
    GameEnd,
}

/// Events that can be fed to the phase transition function.
///
/// Events carrying a flag let the caller state what the counters decided so the
/// transition table itself stays free of game data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// The active team starts its turn.
    StartGame,
    /// The current question was guessed.
    AnswerCorrect {
        /// Whether the turn question counter reached the per-turn limit.
        turn_complete: bool,
    },
    /// The current question was skipped.
    SkipQuestion {
        /// Whether the turn question counter reached the per-turn limit.
        turn_complete: bool,
    },
    /// The countdown reached zero.
    TimerExpired,
    /// Hand over to the next team.
    NextTurn {
        /// Whether any team reached the winning score.
        game_won: bool,
    },
    /// Discard the game and start over.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the game was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Compute the phase reached by applying `event` while in `from`.
pub fn transition(from: GamePhase, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
    let next = match (from, event) {
        (_, GameEvent::Reset) => GamePhase::Setup,
        (GamePhase::Setup, GameEvent::StartGame) => GamePhase::Question,
        (
            GamePhase::Question,
            GameEvent::AnswerCorrect { turn_complete } | GameEvent::SkipQuestion { turn_complete },
        ) => {
            if turn_complete {
                GamePhase::TurnSummary
            } else {
                GamePhase::Question
            }
        }
        (GamePhase::Question, GameEvent::TimerExpired) => GamePhase::TurnSummary,
        (GamePhase::TurnSummary, GameEvent::NextTurn { game_won }) => {
            if game_won {
                GamePhase::GameEnd
            } else {
                GamePhase::Setup
            }
        }
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_happy_path_through_round() {
        let phase = GamePhase::default();
        assert_eq!(phase, GamePhase::Setup);

        let phase = transition(phase, GameEvent::StartGame).unwrap();
        assert_eq!(phase, GamePhase::Question);

        let phase = transition(
            phase,
            GameEvent::AnswerCorrect {
                turn_complete: false,
            },
        )
        .unwrap();
        assert_eq!(phase, GamePhase::Question);

        let phase = transition(phase, GameEvent::SkipQuestion { turn_complete: true }).unwrap();
        assert_eq!(phase, GamePhase::TurnSummary);

        let phase = transition(phase, GameEvent::NextTurn { game_won: false }).unwrap();
        assert_eq!(phase, GamePhase::Setup);
    }

    #[test]
    fn timer_expiry_forces_turn_summary() {
        assert_eq!(
            transition(GamePhase::Question, GameEvent::TimerExpired).unwrap(),
            GamePhase::TurnSummary
        );
    }

    #[test]
    fn winning_next_turn_ends_game() {
        assert_eq!(
            transition(GamePhase::TurnSummary, GameEvent::NextTurn { game_won: true }).unwrap(),
            GamePhase::GameEnd
        );
    }

    #[test]
    fn game_end_only_leaves_through_reset() {
        for event in [
            GameEvent::StartGame,
            GameEvent::AnswerCorrect { turn_complete: true },
            GameEvent::SkipQuestion { turn_complete: true },
            GameEvent::TimerExpired,
            GameEvent::NextTurn { game_won: false },
        ] {
            let err = transition(GamePhase::GameEnd, event).unwrap_err();
            assert_eq!(err.from, GamePhase::GameEnd);
            assert_eq!(err.event, event);
        }

        assert_eq!(
            transition(GamePhase::GameEnd, GameEvent::Reset).unwrap(),
            GamePhase::Setup
        );
    }

    #[test]
    fn answering_outside_question_phase_is_rejected() {
        let err = transition(
            GamePhase::Setup,
            GameEvent::AnswerCorrect {
                turn_complete: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.from, GamePhase::Setup);

        assert!(transition(GamePhase::TurnSummary, GameEvent::TimerExpired).is_err());
        assert!(transition(GamePhase::Setup, GameEvent::NextTurn { game_won: false }).is_err());
    }

    #[test]
    fn phases_serialize_as_kebab_case() {
        assert_eq!(
            serde_json::to_string(&GamePhase::TurnSummary).unwrap(),
            "\"turn-summary\""
        );
        assert_eq!(
            serde_json::from_str::<GamePhase>("\"game-end\"").unwrap(),
            GamePhase::GameEnd
        );
    }
}
