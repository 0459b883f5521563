use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;
use indexmap::IndexMap;

use crate::{
    dto::{
        game::QuestionDto,
        questions::{
            CacheStatsResponse, GenerateAllRequest, GenerateQuestionsRequest,
            ManualQuestionsRequest, MarkUsedRequest, QuestionBatchesResponse, QuestionsResponse,
            UpdatedCountResponse,
        },
    },
    error::ErrorBody,
    services::question_service,
    state::{SharedState, game::Question},
};

/// Routes managing the question cache.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/questions/generate", post(generate))
        .route("/questions/generate-all", post(generate_all))
        .route("/questions/regenerate", post(regenerate))
        .route("/questions/reset-usage", post(reset_usage))
        .route("/questions/manual", post(add_manual))
        .route("/questions/mark-used", post(mark_used))
        .route("/questions/cache", get(cache_stats).delete(clear_cache))
}

/// Questions for one category, from the cache or freshly generated.
#[utoipa::path(
    post,
    path = "/questions/generate",
    tag = "questions",
    request_body = GenerateQuestionsRequest,
    responses(
        (status = 200, description = "Questions for the category", body = QuestionsResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn generate(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GenerateQuestionsRequest>>,
) -> Json<QuestionsResponse> {
    let category = question_service::normalize_category(&payload.category);
    let questions = question_service::generate(&state, &category, payload.count as usize).await;
    Json(QuestionsResponse {
        category,
        questions: questions.iter().map(QuestionDto::from).collect(),
    })
}

/// Fill several categories at once.
#[utoipa::path(
    post,
    path = "/questions/generate-all",
    tag = "questions",
    request_body = GenerateAllRequest,
    responses(
        (status = 200, description = "Questions per category", body = QuestionBatchesResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn generate_all(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GenerateAllRequest>>,
) -> Json<QuestionBatchesResponse> {
    let categories = requested_categories(payload.categories);
    let batches = question_service::generate_for_categories(
        &state,
        &categories,
        payload.count_per_category as usize,
    )
    .await;
    Json(to_batches(batches))
}

/// Drop the cache and generate fresh batches.
#[utoipa::path(
    post,
    path = "/questions/regenerate",
    tag = "questions",
    request_body = GenerateAllRequest,
    responses(
        (status = 200, description = "Regenerated questions per category", body = QuestionBatchesResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn regenerate(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GenerateAllRequest>>,
) -> Json<QuestionBatchesResponse> {
    let categories = requested_categories(payload.categories);
    let batches = question_service::force_regenerate(
        &state,
        &categories,
        payload.count_per_category as usize,
    )
    .await;
    Json(to_batches(batches))
}

/// Make every cached question available again.
#[utoipa::path(
    post,
    path = "/questions/reset-usage",
    tag = "questions",
    responses((status = 200, description = "Questions made available", body = UpdatedCountResponse))
)]
pub async fn reset_usage(State(state): State<SharedState>) -> Json<UpdatedCountResponse> {
    let updated = question_service::reset_usage(&state).await;
    Json(UpdatedCountResponse { updated })
}

/// Add questions typed in by players.
#[utoipa::path(
    post,
    path = "/questions/manual",
    tag = "questions",
    request_body = ManualQuestionsRequest,
    responses(
        (status = 200, description = "Stored questions", body = QuestionsResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn add_manual(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ManualQuestionsRequest>>,
) -> Json<QuestionsResponse> {
    let category = question_service::normalize_category(&payload.category);
    let questions = question_service::add_manual(&state, &category, payload.questions).await;
    Json(QuestionsResponse {
        category,
        questions: questions.iter().map(QuestionDto::from).collect(),
    })
}

/// Mark cached questions as already played.
#[utoipa::path(
    post,
    path = "/questions/mark-used",
    tag = "questions",
    request_body = MarkUsedRequest,
    responses(
        (status = 200, description = "Questions marked", body = UpdatedCountResponse),
        (status = 400, description = "Invalid request", body = ErrorBody)
    )
)]
pub async fn mark_used(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<MarkUsedRequest>>,
) -> Json<UpdatedCountResponse> {
    let updated = question_service::mark_used(&state, &payload.ids).await;
    Json(UpdatedCountResponse { updated })
}

/// Counters of the question cache.
#[utoipa::path(
    get,
    path = "/questions/cache",
    tag = "questions",
    responses((status = 200, description = "Cache statistics", body = CacheStatsResponse))
)]
pub async fn cache_stats(State(state): State<SharedState>) -> Json<CacheStatsResponse> {
    Json(question_service::cache_stats(&state).await)
}

/// Empty the question cache.
#[utoipa::path(
    delete,
    path = "/questions/cache",
    tag = "questions",
    responses((status = 200, description = "Cache cleared", body = CacheStatsResponse))
)]
pub async fn clear_cache(State(state): State<SharedState>) -> Json<CacheStatsResponse> {
    question_service::clear_cache(&state).await;
    Json(question_service::cache_stats(&state).await)
}

fn requested_categories(categories: Option<Vec<String>>) -> Vec<String> {
    categories.unwrap_or_else(|| {
        question_service::DEFAULT_CATEGORIES
            .iter()
            .map(|category| category.to_string())
            .collect()
    })
}

fn to_batches(batches: IndexMap<String, Vec<Question>>) -> QuestionBatchesResponse {
    QuestionBatchesResponse {
        categories: batches
            .into_iter()
            .map(|(category, questions)| {
                (category, questions.iter().map(QuestionDto::from).collect())
            })
            .collect(),
    }
}
