use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::dao::models::{GameHistoryEntity, HistoryTeamEntity};

use super::format_millis;

/// Final score of a team in a finished game.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryTeamSummary {
    /// Team identifier.
    pub id: u32,
    /// Team name.
    pub name: String,
    /// Final score.
    pub score: u32,
}

impl From<&HistoryTeamEntity> for HistoryTeamSummary {
    fn from(value: &HistoryTeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            score: value.score,
        }
    }
}

/// Finished game.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntrySummary {
    /// Game identifier.
    pub id: String,
    /// End time, RFC 3339.
    pub date: String,
    /// Final standings.
    pub teams: Vec<HistoryTeamSummary>,
    /// Identifier of the winning team.
    pub winner_id: u32,
    /// Name of the winning team.
    pub winner_name: Option<String>,
    /// Game duration in seconds.
    pub duration_seconds: u64,
}

impl From<&GameHistoryEntity> for HistoryEntrySummary {
    fn from(value: &GameHistoryEntity) -> Self {
        Self {
            id: value.id.clone(),
            date: format_millis(value.date),
            teams: value.teams.iter().map(HistoryTeamSummary::from).collect(),
            winner_id: value.winner_id,
            winner_name: value
                .teams
                .iter()
                .find(|team| team.id == value.winner_id)
                .map(|team| team.name.clone()),
            duration_seconds: value.duration / 1000,
        }
    }
}

/// Finished games, most recent first.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    /// Finished games.
    pub games: Vec<HistoryEntrySummary>,
}
