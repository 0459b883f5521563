use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Game flow routes.
pub mod game;
/// Health check route.
pub mod health;
/// Game history route.
pub mod history;
/// Question cache routes.
pub mod questions;
/// Settings routes.
pub mod settings;
/// SSE stream route.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(game::router())
        .merge(questions::router())
        .merge(settings::router())
        .merge(history::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
