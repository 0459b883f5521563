use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Articulate Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::game_stream,
        crate::routes::game::get_game,
        crate::routes::game::get_current_team,
        crate::routes::game::start_turn,
        crate::routes::game::answer_correct,
        crate::routes::game::skip_question,
        crate::routes::game::next_turn,
        crate::routes::game::reset_game,
        crate::routes::game::start_timer,
        crate::routes::game::pause_timer,
        crate::routes::game::reset_timer,
        crate::routes::game::update_settings,
        crate::routes::game::update_teams,
        crate::routes::questions::generate,
        crate::routes::questions::generate_all,
        crate::routes::questions::regenerate,
        crate::routes::questions::reset_usage,
        crate::routes::questions::add_manual,
        crate::routes::questions::mark_used,
        crate::routes::questions::cache_stats,
        crate::routes::questions::clear_cache,
        crate::routes::settings::get_user_settings,
        crate::routes::settings::put_user_settings,
        crate::routes::settings::get_completion_settings,
        crate::routes::settings::put_completion_settings,
        crate::routes::settings::get_token_usage,
        crate::routes::settings::reset_token_usage,
        crate::routes::history::get_history,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::TimerTickEvent,
            crate::dto::game::GameSummary,
            crate::dto::game::TeamSummary,
            crate::dto::game::SettingsSummary,
            crate::dto::game::QuestionDto,
            crate::dto::game::DifficultyDto,
            crate::dto::game::CurrentTeamResponse,
            crate::dto::game::UpdateSettingsRequest,
            crate::dto::game::UpdateTeamsRequest,
            crate::dto::game::TeamInput,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::questions::GenerateQuestionsRequest,
            crate::dto::questions::GenerateAllRequest,
            crate::dto::questions::ManualQuestionsRequest,
            crate::dto::questions::MarkUsedRequest,
            crate::dto::questions::QuestionsResponse,
            crate::dto::questions::QuestionBatchesResponse,
            crate::dto::questions::CacheStatsResponse,
            crate::dto::questions::CategoryStats,
            crate::dto::questions::UpdatedCountResponse,
            crate::dto::settings::ThemeDto,
            crate::dto::settings::UserSettingsDto,
            crate::dto::settings::CompletionSettingsResponse,
            crate::dto::settings::UpdateCompletionSettingsRequest,
            crate::dto::settings::TokenUsageResponse,
            crate::dto::history::HistoryResponse,
            crate::dto::history::HistoryEntrySummary,
            crate::dto::history::HistoryTeamSummary,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "game", description = "Game flow, timer, settings and roster"),
        (name = "questions", description = "Question cache and generation"),
        (name = "settings", description = "User preferences and completion settings"),
        (name = "history", description = "Finished games"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse/game",
            "/game/start",
            "/game/settings",
            "/questions/cache",
            "/settings/completion/usage",
            "/history",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
