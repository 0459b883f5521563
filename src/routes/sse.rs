use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/game",
    tag = "sse",
    responses((status = 200, description = "Game SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream game updates to connected frontends.
pub async fn game_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!(
        subscribers = state.sse().subscriber_count(),
        "New game SSE connection"
    );
    sse_service::broadcast_info(&state, "game stream connected");
    let initial = sse_service::initial_events(&state).await;
    sse_service::to_sse_stream(receiver, initial)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/game", get(game_stream))
}
