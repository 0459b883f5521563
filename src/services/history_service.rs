use tracing::{info, warn};

use crate::{
    dao::models::{GameHistoryEntity, HistoryTeamEntity, StorageKey, timestamp_millis},
    dto::history::{HistoryEntrySummary, HistoryResponse},
    state::{SharedState, game::GameState},
};

/// Finished games, most recent first.
pub async fn history(state: &SharedState) -> HistoryResponse {
    let mut entries: Vec<GameHistoryEntity> = state
        .retrieve_data(StorageKey::GameHistory, Vec::new())
        .await;
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    HistoryResponse {
        games: entries.iter().map(HistoryEntrySummary::from).collect(),
    }
}

/// Append a finished game to the history. A game is recorded at most once.
///
/// Callers hold the transition gate, which serialises history writes.
pub async fn record_finished_game(state: &SharedState, game: &GameState) {
    let Some(winner) = game.leader() else {
        warn!(game_id = %game.id, "finished game has no teams; not recording history");
        return;
    };

    let mut entries: Vec<GameHistoryEntity> = state
        .retrieve_data(StorageKey::GameHistory, Vec::new())
        .await;
    let id = game.id.to_string();
    if entries.iter().any(|entry| entry.id == id) {
        return;
    }

    let now = timestamp_millis();
    entries.push(GameHistoryEntity {
        id,
        date: now,
        teams: game
            .teams
            .iter()
            .map(|team| HistoryTeamEntity {
                id: team.id,
                name: team.name.clone(),
                score: team.score,
            })
            .collect(),
        winner_id: winner.id,
        duration: now.saturating_sub(game.created_at),
    });

    if state.store_data(StorageKey::GameHistory, &entries).await {
        info!(game_id = %game.id, winner = %winner.name, "game recorded in history");
    } else {
        warn!(game_id = %game.id, "game history was not persisted");
    }
}
