use axum::{Json, Router, extract::State, routing::get};
use axum_valid::Valid;

use crate::{
    dto::settings::{
        CompletionSettingsResponse, TokenUsageResponse, UpdateCompletionSettingsRequest,
        UserSettingsDto,
    },
    error::ErrorBody,
    services::settings_service,
    state::SharedState,
};

/// Routes exposing user preferences and completion settings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/settings/user",
            get(get_user_settings).put(put_user_settings),
        )
        .route(
            "/settings/completion",
            get(get_completion_settings).put(put_completion_settings),
        )
        .route(
            "/settings/completion/usage",
            get(get_token_usage).delete(reset_token_usage),
        )
}

/// Stored user preferences.
#[utoipa::path(
    get,
    path = "/settings/user",
    tag = "settings",
    responses((status = 200, description = "User preferences", body = UserSettingsDto))
)]
pub async fn get_user_settings(State(state): State<SharedState>) -> Json<UserSettingsDto> {
    Json(settings_service::user_settings(&state).await)
}

/// Replace the user preferences.
#[utoipa::path(
    put,
    path = "/settings/user",
    tag = "settings",
    request_body = UserSettingsDto,
    responses((status = 200, description = "Preferences stored", body = UserSettingsDto))
)]
pub async fn put_user_settings(
    State(state): State<SharedState>,
    Json(payload): Json<UserSettingsDto>,
) -> Json<UserSettingsDto> {
    Json(settings_service::update_user_settings(&state, payload).await)
}

/// Completion settings with the API key masked.
#[utoipa::path(
    get,
    path = "/settings/completion",
    tag = "settings",
    responses((status = 200, description = "Completion settings", body = CompletionSettingsResponse))
)]
pub async fn get_completion_settings(
    State(state): State<SharedState>,
) -> Json<CompletionSettingsResponse> {
    Json(settings_service::completion_settings(&state).await)
}

/// Update the completion settings.
#[utoipa::path(
    put,
    path = "/settings/completion",
    tag = "settings",
    request_body = UpdateCompletionSettingsRequest,
    responses(
        (status = 200, description = "Settings stored", body = CompletionSettingsResponse),
        (status = 400, description = "Invalid settings", body = ErrorBody)
    )
)]
pub async fn put_completion_settings(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateCompletionSettingsRequest>>,
) -> Json<CompletionSettingsResponse> {
    Json(settings_service::update_completion_settings(&state, payload).await)
}

/// Accumulated token usage.
#[utoipa::path(
    get,
    path = "/settings/completion/usage",
    tag = "settings",
    responses((status = 200, description = "Token usage", body = TokenUsageResponse))
)]
pub async fn get_token_usage(State(state): State<SharedState>) -> Json<TokenUsageResponse> {
    Json(settings_service::token_usage(&state).await)
}

/// Zero the token counters.
#[utoipa::path(
    delete,
    path = "/settings/completion/usage",
    tag = "settings",
    responses((status = 200, description = "Token usage reset", body = TokenUsageResponse))
)]
pub async fn reset_token_usage(State(state): State<SharedState>) -> Json<TokenUsageResponse> {
    Json(settings_service::reset_token_usage(&state).await)
}
