use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::history::HistoryResponse, services::history_service, state::SharedState};

/// Route listing finished games.
pub fn router() -> Router<SharedState> {
    Router::new().route("/history", get(get_history))
}

/// Finished games, most recent first.
#[utoipa::path(
    get,
    path = "/history",
    tag = "history",
    responses((status = 200, description = "Finished games", body = HistoryResponse))
)]
pub async fn get_history(State(state): State<SharedState>) -> Json<HistoryResponse> {
    Json(history_service::history(&state).await)
}
