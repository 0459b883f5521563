use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::game::{CurrentTeamResponse, GameSummary, UpdateSettingsRequest, UpdateTeamsRequest},
    error::{AppError, ErrorBody},
    services::game_service,
    state::SharedState,
};

/// Routes driving the game in progress.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(get_game))
        .route("/game/current-team", get(get_current_team))
        .route("/game/start", post(start_turn))
        .route("/game/answer", post(answer_correct))
        .route("/game/skip", post(skip_question))
        .route("/game/next-turn", post(next_turn))
        .route("/game/reset", post(reset_game))
        .route("/game/timer/start", post(start_timer))
        .route("/game/timer/pause", post(pause_timer))
        .route("/game/timer/reset", post(reset_timer))
        .route("/game/settings", patch(update_settings))
        .route("/game/teams", put(update_teams))
}

/// Snapshot of the live game.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses((status = 200, description = "Current game", body = GameSummary))
)]
pub async fn get_game(State(state): State<SharedState>) -> Json<GameSummary> {
    Json(game_service::game_state(&state).await)
}

/// Team and player whose turn it is.
#[utoipa::path(
    get,
    path = "/game/current-team",
    tag = "game",
    responses(
        (status = 200, description = "Active team", body = CurrentTeamResponse),
        (status = 404, description = "No active team", body = ErrorBody)
    )
)]
pub async fn get_current_team(
    State(state): State<SharedState>,
) -> Result<Json<CurrentTeamResponse>, AppError> {
    Ok(Json(game_service::current_team(&state).await?))
}

/// Start the active team's turn with a fresh question.
#[utoipa::path(
    post,
    path = "/game/start",
    tag = "game",
    responses(
        (status = 200, description = "Turn started", body = GameSummary),
        (status = 409, description = "Not allowed in the current phase", body = ErrorBody)
    )
)]
pub async fn start_turn(State(state): State<SharedState>) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::start_turn(&state).await?))
}

/// Credit the active team for the current question.
#[utoipa::path(
    post,
    path = "/game/answer",
    tag = "game",
    responses(
        (status = 200, description = "Answer recorded", body = GameSummary),
        (status = 409, description = "No question is being played", body = ErrorBody)
    )
)]
pub async fn answer_correct(
    State(state): State<SharedState>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::answer_correct(&state).await?))
}

/// Skip the current question.
#[utoipa::path(
    post,
    path = "/game/skip",
    tag = "game",
    responses(
        (status = 200, description = "Question skipped", body = GameSummary),
        (status = 409, description = "No question is being played", body = ErrorBody)
    )
)]
pub async fn skip_question(
    State(state): State<SharedState>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::skip_question(&state).await?))
}

/// Hand over to the next team, or end the game.
#[utoipa::path(
    post,
    path = "/game/next-turn",
    tag = "game",
    responses(
        (status = 200, description = "Next turn prepared", body = GameSummary),
        (status = 409, description = "Turn is not over", body = ErrorBody)
    )
)]
pub async fn next_turn(State(state): State<SharedState>) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::next_turn(&state).await?))
}

/// Start a new game with the same teams and settings.
#[utoipa::path(
    post,
    path = "/game/reset",
    tag = "game",
    responses((status = 200, description = "Game reset", body = GameSummary))
)]
pub async fn reset_game(State(state): State<SharedState>) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::reset_game(&state).await?))
}

/// Resume the countdown.
#[utoipa::path(
    post,
    path = "/game/timer/start",
    tag = "game",
    responses(
        (status = 200, description = "Timer running", body = GameSummary),
        (status = 409, description = "No question is being played", body = ErrorBody)
    )
)]
pub async fn start_timer(State(state): State<SharedState>) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::start_timer(&state).await?))
}

/// Pause the countdown.
#[utoipa::path(
    post,
    path = "/game/timer/pause",
    tag = "game",
    responses((status = 200, description = "Timer paused", body = GameSummary))
)]
pub async fn pause_timer(State(state): State<SharedState>) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::pause_timer(&state).await?))
}

/// Stop the countdown and restore the full time limit.
#[utoipa::path(
    post,
    path = "/game/timer/reset",
    tag = "game",
    responses((status = 200, description = "Timer reset", body = GameSummary))
)]
pub async fn reset_timer(State(state): State<SharedState>) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::reset_timer(&state).await?))
}

/// Change the game settings outside of a running turn.
#[utoipa::path(
    patch,
    path = "/game/settings",
    tag = "game",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = GameSummary),
        (status = 400, description = "Invalid settings", body = ErrorBody),
        (status = 409, description = "A turn is running", body = ErrorBody)
    )
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateSettingsRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(
        game_service::update_settings(&state, payload.into()).await?,
    ))
}

/// Replace the roster outside of a running turn.
#[utoipa::path(
    put,
    path = "/game/teams",
    tag = "game",
    request_body = UpdateTeamsRequest,
    responses(
        (status = 200, description = "Teams updated", body = GameSummary),
        (status = 400, description = "Invalid roster", body = ErrorBody),
        (status = 409, description = "A turn is running", body = ErrorBody)
    )
)]
pub async fn update_teams(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateTeamsRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::update_teams(&state, payload).await?))
}
