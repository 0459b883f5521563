use tracing::{debug, info, warn};

use crate::{
    dao::models::StorageKey,
    dto::game::{CurrentTeamResponse, GameSummary, TeamInput, TeamSummary, UpdateTeamsRequest},
    error::ServiceError,
    services::{history_service, question_service, sse_events},
    state::{
        SharedState,
        game::{GameAction, GameState, Player, SettingsPatch, Team, Transition},
        state_machine::{GameEvent, transition},
    },
};

/// Snapshot of the live game.
pub async fn game_state(state: &SharedState) -> GameSummary {
    GameSummary::from(&state.game_snapshot().await)
}

/// Team whose turn it is.
pub async fn current_team(state: &SharedState) -> Result<CurrentTeamResponse, ServiceError> {
    let game = state.game().read().await;
    let team = game
        .current_team()
        .ok_or_else(|| ServiceError::NotFound("no active team".into()))?;
    Ok(CurrentTeamResponse {
        team: TeamSummary::from(team),
        player: game.current_player().map(|player| player.name.clone()),
    })
}

/// Persist the live game. Storage failures are logged only.
pub(crate) async fn persist(state: &SharedState, game: &GameState) {
    state.mark_game_modified();
    if !state.store_data(StorageKey::CurrentGame, game).await {
        debug!(game_id = %game.id, "game state not persisted");
    }
}

/// Persist the game and notify subscribers.
pub(crate) async fn commit(state: &SharedState, game: &GameState, transition: Transition) {
    persist(state, game).await;
    sse_events::broadcast_phase_changed(state, transition);
    sse_events::broadcast_game_state(state, game);
}

/// Reduce `action` into the live game, then persist and broadcast the result.
///
/// Callers hold the transition gate.
async fn apply_action(state: &SharedState, action: GameAction) -> Result<GameState, ServiceError> {
    let (game, transition) = {
        let mut game = state.game().write().await;
        let transition = game.apply(action)?;
        (game.clone(), transition)
    };

    if transition.changed() {
        info!(from = ?transition.from, to = ?transition.to, "game phase changed");
    }
    commit(state, &game, transition).await;
    if transition.ended_game() {
        history_service::record_finished_game(state, &game).await;
    }
    Ok(game)
}

/// Start the active team's turn with a fresh question.
pub async fn start_turn(state: &SharedState) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let (phase, categories) = {
        let game = state.game().read().await;
        (game.current_phase, game.settings.categories.clone())
    };
    transition(phase, GameEvent::StartGame)?;

    let first_question = question_service::next_question(state, &categories).await;
    let game = apply_action(state, GameAction::StartGame { first_question }).await?;
    Ok(GameSummary::from(&game))
}

/// Credit the active team for the current question.
pub async fn answer_correct(state: &SharedState) -> Result<GameSummary, ServiceError> {
    score_question(state, true).await
}

/// Skip the current question, applying the skip penalty.
pub async fn skip_question(state: &SharedState) -> Result<GameSummary, ServiceError> {
    score_question(state, false).await
}

async fn score_question(state: &SharedState, correct: bool) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let (needs_next, categories) = {
        let game = state.game().read().await;
        // Validate the phase before spending a question on it.
        let event = if correct {
            GameEvent::AnswerCorrect {
                turn_complete: false,
            }
        } else {
            GameEvent::SkipQuestion {
                turn_complete: false,
            }
        };
        transition(game.current_phase, event)?;
        (game.needs_next_question(), game.settings.categories.clone())
    };

    let next_question = if needs_next {
        Some(question_service::next_question(state, &categories).await)
    } else {
        None
    };

    let action = if correct {
        GameAction::AnswerCorrect { next_question }
    } else {
        GameAction::SkipQuestion { next_question }
    };
    let game = apply_action(state, action).await?;
    Ok(GameSummary::from(&game))
}

/// Hand over to the next team, ending the game when a team reached the winning score.
pub async fn next_turn(state: &SharedState) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let game = apply_action(state, GameAction::NextTurn).await?;
    Ok(GameSummary::from(&game))
}

/// Resume the countdown.
pub async fn start_timer(state: &SharedState) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let game = apply_action(state, GameAction::StartTimer).await?;
    Ok(GameSummary::from(&game))
}

/// Freeze the countdown.
pub async fn pause_timer(state: &SharedState) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let game = apply_action(state, GameAction::PauseTimer).await?;
    Ok(GameSummary::from(&game))
}

/// Restore the countdown to the time limit and stop it.
pub async fn reset_timer(state: &SharedState) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let game = apply_action(state, GameAction::ResetTimer).await?;
    Ok(GameSummary::from(&game))
}

/// Merge a partial settings update.
pub async fn update_settings(
    state: &SharedState,
    patch: SettingsPatch,
) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let game = apply_action(state, GameAction::UpdateSettings(patch)).await?;
    Ok(GameSummary::from(&game))
}

/// Replace the roster. Teams referencing an existing id keep their score.
pub async fn update_teams(
    state: &SharedState,
    request: UpdateTeamsRequest,
) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let current = state.game().read().await.teams.clone();
    let teams = build_roster(state, &current, request.teams)?;
    let game = apply_action(state, GameAction::UpdateTeams(teams)).await?;
    Ok(GameSummary::from(&game))
}

fn build_roster(
    state: &SharedState,
    current: &[Team],
    inputs: Vec<TeamInput>,
) -> Result<Vec<Team>, ServiceError> {
    let mut next_id = current
        .iter()
        .map(|team| team.id)
        .chain(inputs.iter().filter_map(|input| input.id))
        .max()
        .unwrap_or(0)
        + 1;

    let mut teams: Vec<Team> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let id = match input.id {
            Some(id) if teams.iter().any(|team| team.id == id) => {
                return Err(ServiceError::InvalidInput(format!("duplicate team id {id}")));
            }
            Some(id) => id,
            None => {
                let id = next_id;
                next_id += 1;
                id
            }
        };
        let score = current
            .iter()
            .find(|team| team.id == id)
            .map(|team| team.score)
            .unwrap_or(0);
        let color = match input.color {
            Some(color) => color,
            None => {
                let used = teams.iter().map(|team| team.color.as_str()).collect::<Vec<_>>();
                state.config().first_unused_color(&used)
            }
        };

        teams.push(Team {
            id,
            name: input.name.trim().to_string(),
            color,
            score,
            players: input
                .players
                .into_iter()
                .map(|name| Player {
                    name: name.trim().to_string(),
                })
                .collect(),
        });
    }
    Ok(teams)
}

/// Discard the current game and start a new one with the same roster at score 0 and
/// the same settings.
pub async fn reset_game(state: &SharedState) -> Result<GameSummary, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let (game, from) = {
        let mut game = state.game().write().await;
        let from = game.current_phase;
        let to = transition(from, GameEvent::Reset)?;

        let teams = game
            .teams
            .iter()
            .cloned()
            .map(|team| Team { score: 0, ..team })
            .collect();
        let mut fresh = GameState::new(teams, game.settings.clone())?;
        fresh.current_phase = to;
        *game = fresh;
        (game.clone(), from)
    };

    state.remove_data(StorageKey::CurrentGame).await;
    commit(
        state,
        &game,
        Transition {
            from,
            to: game.current_phase,
        },
    )
    .await;
    info!(game_id = %game.id, "game reset");
    Ok(GameSummary::from(&game))
}

/// Load the stored game into memory once storage becomes available.
///
/// Stored games are only loaded while the live game is still the boot game; a game
/// played in degraded mode is persisted over the stored one. Stored games that break
/// the game invariants are ignored.
pub async fn restore(state: &SharedState) {
    let _gate = state.transition_gate().lock().await;
    let stored: Option<GameState> = if state.is_game_modified() {
        info!("keeping the game played while storage was unavailable");
        None
    } else {
        state.retrieve_data(StorageKey::CurrentGame, None).await
    };

    let game = match stored {
        Some(stored) if stored.is_consistent() => {
            info!(game_id = %stored.id, phase = ?stored.current_phase, "restored stored game");
            let mut game = state.game().write().await;
            *game = stored;
            game.clone()
        }
        Some(stored) => {
            warn!(game_id = %stored.id, "stored game is inconsistent; starting fresh");
            state.game_snapshot().await
        }
        None => state.game_snapshot().await,
    };

    let phase = game.current_phase;
    commit(
        state,
        &game,
        Transition {
            from: phase,
            to: phase,
        },
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::phase::VisibleGamePhase,
        services::test_support,
        state::state_machine::GamePhase,
    };

    fn small_game_patch() -> SettingsPatch {
        SettingsPatch {
            questions_per_turn: Some(2),
            winning_score: Some(2),
            skip_penalty: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_turn_serves_a_question_and_persists() {
        let state = test_support::memory_state().await;
        let summary = start_turn(&state).await.unwrap();

        assert_eq!(summary.phase, VisibleGamePhase::Question);
        assert!(summary.current_question.is_some());
        assert!(summary.is_timer_running);

        let stored: Option<GameState> = state.retrieve_data(StorageKey::CurrentGame, None).await;
        assert_eq!(stored.unwrap().current_phase, GamePhase::Question);
    }

    #[tokio::test]
    async fn answering_outside_a_turn_is_a_conflict() {
        let state = test_support::memory_state().await;
        let err = answer_correct(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        start_turn(&state).await.unwrap();
        let err = start_turn(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn full_game_records_history() {
        let state = test_support::memory_state().await;
        update_settings(&state, small_game_patch()).await.unwrap();

        // Team 1 answers both questions and reaches the winning score.
        start_turn(&state).await.unwrap();
        let mid = answer_correct(&state).await.unwrap();
        assert_eq!(mid.phase, VisibleGamePhase::Question);
        let summary = answer_correct(&state).await.unwrap();
        assert_eq!(summary.phase, VisibleGamePhase::TurnSummary);
        assert!(summary.current_question.is_none());

        let ended = next_turn(&state).await.unwrap();
        assert_eq!(ended.phase, VisibleGamePhase::GameEnd);
        assert_eq!(ended.winner.unwrap().name, "Team 1");

        let history = history_service::history(&state).await;
        assert_eq!(history.games.len(), 1);
        assert_eq!(history.games[0].winner_name.as_deref(), Some("Team 1"));

        assert!(start_turn(&state).await.is_err());
        let reset = reset_game(&state).await.unwrap();
        assert_eq!(reset.phase, VisibleGamePhase::Setup);
        assert!(reset.teams.iter().all(|team| team.score == 0));
        assert_eq!(reset.settings.questions_per_turn, 2);
        assert_ne!(reset.id, ended.id);
    }

    #[tokio::test]
    async fn skips_never_push_scores_below_zero() {
        let state = test_support::memory_state().await;
        update_settings(&state, small_game_patch()).await.unwrap();

        start_turn(&state).await.unwrap();
        skip_question(&state).await.unwrap();
        let summary = skip_question(&state).await.unwrap();
        assert_eq!(summary.teams[0].score, 0);
        assert_eq!(summary.phase, VisibleGamePhase::TurnSummary);

        let next = next_turn(&state).await.unwrap();
        assert_eq!(next.phase, VisibleGamePhase::Setup);
        assert_eq!(next.current_team_index, 1);
    }

    #[tokio::test]
    async fn settings_and_teams_are_locked_during_a_turn() {
        let state = test_support::memory_state().await;
        start_turn(&state).await.unwrap();

        let err = update_settings(&state, small_game_patch()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = update_teams(
            &state,
            UpdateTeamsRequest {
                teams: vec![TeamInput {
                    id: None,
                    name: "Solo".into(),
                    color: None,
                    players: vec![],
                }],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn roster_updates_keep_scores_and_assign_colors() {
        let state = test_support::memory_state().await;
        update_settings(&state, small_game_patch()).await.unwrap();
        start_turn(&state).await.unwrap();
        answer_correct(&state).await.unwrap();
        skip_question(&state).await.unwrap();
        next_turn(&state).await.unwrap();

        let summary = update_teams(
            &state,
            UpdateTeamsRequest {
                teams: vec![
                    TeamInput {
                        id: Some(1),
                        name: "Owls".into(),
                        color: None,
                        players: vec!["Ann".into(), "Bob".into()],
                    },
                    TeamInput {
                        id: None,
                        name: "Foxes".into(),
                        color: None,
                        players: vec![],
                    },
                ],
            },
        )
        .await
        .unwrap();

        assert_eq!(summary.teams.len(), 2);
        assert_eq!(summary.teams[0].score, 0);
        assert_eq!(summary.teams[0].name, "Owls");
        assert_eq!(summary.teams[0].color, "#FF5733");
        assert_eq!(summary.teams[1].id, 3);
        assert_eq!(summary.teams[1].color, "#33A1FF");
        assert_eq!(summary.current_team_index, 1);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let state = test_support::memory_state().await;
        let team = |name: &str| TeamInput {
            id: Some(4),
            name: name.into(),
            color: None,
            players: vec![],
        };
        let err = update_teams(
            &state,
            UpdateTeamsRequest {
                teams: vec![team("A"), team("B")],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn restore_prefers_consistent_stored_games() {
        let state = test_support::memory_state().await;
        let mut stored = state.game_snapshot().await;
        stored.teams[0].score = 9;
        state.store_data(StorageKey::CurrentGame, &stored).await;

        restore(&state).await;
        assert_eq!(state.game_snapshot().await.teams[0].score, 9);
    }

    #[tokio::test]
    async fn restore_ignores_inconsistent_stored_games() {
        let state = test_support::memory_state().await;
        let mut broken = state.game_snapshot().await;
        broken.teams[0].score = 9;
        broken.current_team_index = 7;
        state.store_data(StorageKey::CurrentGame, &broken).await;

        restore(&state).await;
        let game = state.game_snapshot().await;
        assert_eq!(game.current_team_index, 0);
        assert_eq!(game.teams[0].score, 0);
    }

    #[tokio::test]
    async fn restore_keeps_a_game_played_before_storage_came_up() {
        let state = test_support::memory_state().await;
        let older = state.game_snapshot().await;
        state.store_data(StorageKey::CurrentGame, &older).await;

        start_turn(&state).await.unwrap();
        answer_correct(&state).await.unwrap();

        restore(&state).await;
        let game = state.game_snapshot().await;
        assert_eq!(game.teams[0].score, 1);
        assert_eq!(game.current_phase, GamePhase::Question);

        let stored: Option<GameState> = state.retrieve_data(StorageKey::CurrentGame, None).await;
        assert_eq!(stored, Some(game));
    }

    #[tokio::test]
    async fn mutations_are_broadcast() {
        let state = test_support::memory_state().await;
        let mut receiver = state.sse().subscribe();
        start_turn(&state).await.unwrap();

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some(sse_events::EVENT_PHASE_CHANGED));
        let second = receiver.recv().await.unwrap();
        assert_eq!(second.event.as_deref(), Some(sse_events::EVENT_GAME_STATE));
    }
}
