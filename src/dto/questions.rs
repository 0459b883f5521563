use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::{game::QuestionDto, validation::validate_names};

fn default_count() -> u32 {
    10
}

/// Request a batch of questions for a single category.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GenerateQuestionsRequest {
    /// Category to fill.
    #[validate(length(min = 1, max = 40))]
    pub category: String,
    /// Number of questions to produce.
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 50))]
    pub count: u32,
}

/// Request batches for several categories at once.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GenerateAllRequest {
    /// Categories to fill; the built-in category list when omitted.
    #[serde(default)]
    #[validate(length(min = 1), custom(function = "validate_names"))]
    pub categories: Option<Vec<String>>,
    /// Number of questions to produce per category.
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 50))]
    pub count_per_category: u32,
}

/// Questions typed in by players when generation is not available.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ManualQuestionsRequest {
    /// Category receiving the questions.
    #[validate(length(min = 1, max = 40))]
    pub category: String,
    /// Question texts.
    #[validate(length(min = 1, max = 100))]
    pub questions: Vec<String>,
}

/// Mark cached questions as already played.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MarkUsedRequest {
    /// Identifiers of the questions to mark.
    #[validate(length(min = 1))]
    pub ids: Vec<String>,
}

/// Questions produced for one category.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionsResponse {
    /// Category of the questions.
    pub category: String,
    /// Produced questions.
    pub questions: Vec<QuestionDto>,
}

/// Questions produced per category, in request order.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionBatchesResponse {
    /// Questions keyed by category.
    #[schema(value_type = Object)]
    pub categories: IndexMap<String, Vec<QuestionDto>>,
}

/// Cache counters for one category.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct CategoryStats {
    /// Category name.
    pub category: String,
    /// Cached questions.
    pub total: usize,
    /// Cached questions not yet served.
    pub unused: usize,
}

/// Summary of the question cache.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheStatsResponse {
    /// Cache schema version.
    pub version: String,
    /// Last cache write, RFC 3339.
    pub last_updated: Option<String>,
    /// Cached questions across categories.
    pub total: usize,
    /// Unserved questions across categories.
    pub unused: usize,
    /// Per-category counters.
    pub categories: Vec<CategoryStats>,
}

/// Number of questions affected by a cache operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatedCountResponse {
    /// Affected questions.
    pub updated: usize,
}
