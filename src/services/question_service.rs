//! Question cache and generation.
//!
//! Questions are cached per category under [`StorageKey::QuestionCache`]. When a
//! category runs dry a batch is requested from the completion API; any failure there
//! falls back to the offline templates, so callers always receive questions.

use std::sync::LazyLock;

use futures::future::join_all;
use indexmap::IndexMap;
use rand::seq::IndexedRandom;
use regex::Regex;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{QuestionCacheEntity, StorageKey, timestamp_millis},
        openai::ChatMessage,
    },
    dto::{
        format_millis,
        questions::{CacheStatsResponse, CategoryStats},
    },
    services::{question_templates, settings_service},
    state::{
        SharedState,
        game::{Difficulty, Question},
    },
};

/// Categories filled when a bulk request names none.
pub const DEFAULT_CATEGORIES: [&str; 6] = ["Object", "Nature", "Person", "Action", "World", "Random"];

#[allow(clippy::unwrap_used)]
fn question_array() -> &'static Regex {
    static QUESTION_ARRAY: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").unwrap());
    &QUESTION_ARRAY
}

/// Capitalize the first letter and lowercase the rest: `"nature"` becomes `"Nature"`.
pub fn normalize_category(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => question_templates::FALLBACK_CATEGORY.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

fn parse_difficulty(raw: Option<&str>) -> Difficulty {
    match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("easy") => Difficulty::Easy,
        Some("hard") => Difficulty::Hard,
        _ => Difficulty::Medium,
    }
}

/// Extract the questions of a completion response.
///
/// The first `[ {...} ]` block is decoded when the model wrapped the array in prose.
/// Anything that does not decode into a list of questions yields an empty list.
pub fn parse_questions(response: &str, category: &str) -> Vec<Question> {
    let candidate = question_array()
        .find(response)
        .map(|found| found.as_str())
        .unwrap_or(response);

    let items = match serde_json::from_str::<Vec<GeneratedQuestion>>(candidate) {
        Ok(items) => items,
        Err(err) => {
            warn!(category, error = %err, "failed to parse question response");
            debug!(category, response, "raw question response");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| {
            let text = item.text?.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(Question {
                id: Uuid::new_v4().to_string(),
                category: category.to_string(),
                text,
                difficulty: parse_difficulty(item.difficulty.as_deref()),
                used: false,
            })
        })
        .collect()
}

fn system_prompt(category: &str) -> String {
    format!(
        "You are an assistant that generates creative and fun questions for the game \"Articulate!\" based on specified categories.\n\
         \n\
         Category: {category}\n\
         \n\
         For the \"{category}\" category, generate questions that are:\n\
         - Clear and unambiguous\n\
         - Varied in difficulty (mix of easy, medium, hard)\n\
         - Family-friendly and appropriate for all ages\n\
         - Culturally diverse and inclusive\n\
         - Interesting and engaging\n\
         \n\
         Your response should ONLY contain the questions in a JSON array format, with each question as a separate object containing \"text\" and \"difficulty\" fields. Do not include any additional text, explanations, or formatting."
    )
}

fn user_prompt(count: usize) -> String {
    format!(
        "Generate {count} unique questions for the specified category.\n\
         \n\
         Format your response as a valid JSON array like this:\n\
         [\n  {{\"text\": \"Question text here\", \"difficulty\": \"easy\"}},\n  {{\"text\": \"Another question here\", \"difficulty\": \"medium\"}}\n]\n\
         \n\
         Ensure each question is distinct and directly related to the category. Vary the difficulty levels approximately: 30% easy, 40% medium, 30% hard."
    )
}

async fn load_cache(state: &SharedState) -> QuestionCacheEntity {
    state
        .retrieve_data(StorageKey::QuestionCache, QuestionCacheEntity::default())
        .await
}

async fn save_cache(state: &SharedState, cache: &mut QuestionCacheEntity) -> bool {
    cache.last_updated = timestamp_millis();
    state.store_data(StorageKey::QuestionCache, cache).await
}

fn unused_questions(cache: &QuestionCacheEntity, category: &str, count: usize) -> Vec<Question> {
    cache
        .categories
        .get(category)
        .map(|questions| {
            questions
                .iter()
                .filter(|question| !question.used)
                .take(count)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Ask the completion API for `count` questions, falling back to templates on any failure.
async fn request_questions(state: &SharedState, category: &str, count: usize) -> Vec<Question> {
    let options = settings_service::completion_options(state).await;
    let messages = vec![
        ChatMessage::system(system_prompt(category)),
        ChatMessage::user(user_prompt(count)),
    ];
    let limit = state.config().questions.generation_timeout;

    match timeout(limit, state.completion().complete(messages, options)).await {
        Ok(Ok(completion)) => {
            if let Some(usage) = completion.usage {
                settings_service::record_token_usage(state, usage).await;
            }
            let parsed = completion
                .content
                .map(|content| parse_questions(&content, category))
                .unwrap_or_default();
            if parsed.is_empty() {
                warn!(category, "completion returned no usable questions; using templates");
                return question_templates::generate(category, count);
            }
            info!(category, count = parsed.len(), "generated questions");
            parsed
        }
        Ok(Err(err)) => {
            warn!(category, error = %err, "question generation failed; using templates");
            question_templates::generate(category, count)
        }
        Err(_) => {
            warn!(category, timeout = ?limit, "question generation timed out; using templates");
            question_templates::generate(category, count)
        }
    }
}

async fn append_to_cache(state: &SharedState, category: &str, questions: &[Question]) {
    let _gate = state.question_gate().lock().await;
    let mut cache = load_cache(state).await;
    cache
        .categories
        .entry(category.to_string())
        .or_default()
        .extend(questions.iter().cloned());
    if !save_cache(state, &mut cache).await {
        debug!(category, "question cache not persisted");
    }
}

/// Questions for `category`: cached unused ones when at least `count` exist, otherwise a
/// freshly generated batch that is appended to the cache.
pub async fn generate(state: &SharedState, category: &str, count: usize) -> Vec<Question> {
    let category = normalize_category(category);
    {
        let _gate = state.question_gate().lock().await;
        let cached = unused_questions(&load_cache(state).await, &category, count);
        if cached.len() >= count {
            debug!(category = %category, count, "serving cached questions");
            return cached;
        }
    }

    let fresh = request_questions(state, &category, count).await;
    append_to_cache(state, &category, &fresh).await;
    fresh
}

/// Take the first unused cached question of `category` and mark it used.
async fn take_unused(state: &SharedState, category: &str) -> Option<Question> {
    let _gate = state.question_gate().lock().await;
    let mut cache = load_cache(state).await;
    let question = cache
        .categories
        .get_mut(category)?
        .iter_mut()
        .find(|question| !question.used)?;
    question.used = true;
    let served = question.clone();
    save_cache(state, &mut cache).await;
    Some(served)
}

/// Serve a question from a random category among `categories`, generating a batch when
/// the category has no unused question left. The served question is marked used.
pub async fn next_question(state: &SharedState, categories: &[String]) -> Question {
    let category = {
        let mut rng = rand::rng();
        categories
            .choose(&mut rng)
            .map(|category| normalize_category(category))
            .unwrap_or_else(|| question_templates::FALLBACK_CATEGORY.to_string())
    };

    if let Some(question) = take_unused(state, &category).await {
        return question;
    }

    let batch = state.config().questions.batch_size as usize;
    let fresh = request_questions(state, &category, batch).await;
    append_to_cache(state, &category, &fresh).await;

    if let Some(question) = take_unused(state, &category).await {
        return question;
    }

    // Nothing was persisted (degraded mode): serve straight from the fresh batch.
    fresh
        .into_iter()
        .next()
        .or_else(|| question_templates::generate(&category, 1).into_iter().next())
        .map(|mut question| {
            question.used = true;
            question
        })
        .unwrap_or_else(|| Question {
            id: Uuid::new_v4().to_string(),
            text: format!("Describe a {} without using its name", category.to_lowercase()),
            category,
            difficulty: Difficulty::Medium,
            used: true,
        })
}

/// Generate `count` questions for each category concurrently, keyed by normalized category.
pub async fn generate_for_categories(
    state: &SharedState,
    categories: &[String],
    count: usize,
) -> IndexMap<String, Vec<Question>> {
    let mut normalized: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories.iter().map(|category| normalize_category(category)) {
        if !normalized.contains(&category) {
            normalized.push(category);
        }
    }

    let batches = join_all(normalized.into_iter().map(|category| async move {
        let questions = generate(state, &category, count).await;
        (category, questions)
    }))
    .await;

    batches.into_iter().collect()
}

/// Drop the whole cache, then generate fresh batches for `categories`.
pub async fn force_regenerate(
    state: &SharedState,
    categories: &[String],
    count: usize,
) -> IndexMap<String, Vec<Question>> {
    clear_cache(state).await;
    let batches = generate_for_categories(state, categories, count).await;
    info!(categories = batches.len(), "regenerated question cache");
    batches
}

/// Store questions typed in by players. Blank entries are ignored.
pub async fn add_manual(state: &SharedState, category: &str, texts: Vec<String>) -> Vec<Question> {
    let category = normalize_category(category);
    let questions = texts
        .into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .map(|text| Question {
            id: Uuid::new_v4().to_string(),
            category: category.clone(),
            text,
            difficulty: Difficulty::Medium,
            used: false,
        })
        .collect::<Vec<_>>();

    if !questions.is_empty() {
        append_to_cache(state, &category, &questions).await;
    }
    questions
}

/// Mark the given cached questions as used, returning how many changed.
pub async fn mark_used(state: &SharedState, ids: &[String]) -> usize {
    let _gate = state.question_gate().lock().await;
    let mut cache = load_cache(state).await;
    let mut updated = 0;
    for question in cache.categories.values_mut().flatten() {
        if !question.used && ids.contains(&question.id) {
            question.used = true;
            updated += 1;
        }
    }
    if updated > 0 {
        save_cache(state, &mut cache).await;
    }
    updated
}

/// Make every cached question available again, returning how many changed.
pub async fn reset_usage(state: &SharedState) -> usize {
    let _gate = state.question_gate().lock().await;
    let mut cache = load_cache(state).await;
    let mut updated = 0;
    for question in cache.categories.values_mut().flatten() {
        if question.used {
            question.used = false;
            updated += 1;
        }
    }
    save_cache(state, &mut cache).await;
    info!(updated, "question usage reset");
    updated
}

/// Replace the cache with an empty one.
pub async fn clear_cache(state: &SharedState) -> bool {
    let _gate = state.question_gate().lock().await;
    let mut empty = QuestionCacheEntity::default();
    save_cache(state, &mut empty).await
}

/// Counters of the cache per category.
pub async fn cache_stats(state: &SharedState) -> CacheStatsResponse {
    let cache = load_cache(state).await;
    let categories = cache
        .categories
        .iter()
        .map(|(category, questions)| CategoryStats {
            category: category.clone(),
            total: questions.len(),
            unused: questions.iter().filter(|question| !question.used).count(),
        })
        .collect::<Vec<_>>();

    CacheStatsResponse {
        version: cache.version,
        last_updated: (cache.last_updated > 0).then(|| format_millis(cache.last_updated)),
        total: categories.iter().map(|stats| stats.total).sum(),
        unused: categories.iter().map(|stats| stats.unused).sum(),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use super::*;
    use crate::{
        config::AppConfig,
        services::test_support::{self, StubCompletion},
    };

    const WRAPPED: &str = "Sure! Here are your questions:\n[\n  {\"text\": \"Describe a kettle\", \"difficulty\": \"easy\"},\n  {\"text\": \"Describe a violin\"},\n  {\"text\": \"Describe a lighthouse\", \"difficulty\": \"HARD\"}\n]\nHave fun!";

    #[test]
    fn normalizes_category_names() {
        assert_eq!(normalize_category("nature"), "Nature");
        assert_eq!(normalize_category("  wORLD "), "World");
        assert_eq!(normalize_category(""), "Random");
    }

    #[test]
    fn parser_extracts_arrays_wrapped_in_prose() {
        let questions = parse_questions(WRAPPED, "Object");
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].difficulty, Difficulty::Easy);
        assert_eq!(questions[1].difficulty, Difficulty::Medium);
        assert_eq!(questions[2].difficulty, Difficulty::Hard);
        assert!(questions.iter().all(|q| q.category == "Object" && !q.used));
    }

    #[test]
    fn parser_rejects_malformed_responses() {
        assert!(parse_questions("no json here", "Object").is_empty());
        assert!(parse_questions("{\"text\": \"not an array\"}", "Object").is_empty());
        assert!(parse_questions("[{\"difficulty\": \"easy\"}]", "Object").is_empty());
    }

    #[tokio::test]
    async fn generate_caches_remote_questions_and_tracks_usage() {
        let completion = Arc::new(StubCompletion::replying(WRAPPED));
        let (state, _backend) =
            test_support::state_with(AppConfig::default(), completion.clone()).await;

        let questions = generate(&state, "object", 3).await;
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].category, "Object");
        assert_eq!(completion.calls(), 1);

        let cached = generate(&state, "Object", 2).await;
        assert_eq!(completion.calls(), 1);
        assert_eq!(cached[0].id, questions[0].id);

        let usage = settings_service::token_usage(&state).await;
        assert_eq!(usage.total_tokens, 150);
    }

    #[tokio::test]
    async fn failing_client_falls_back_to_cached_templates() {
        let state = test_support::memory_state().await;

        let questions = generate(&state, "nature", 4).await;
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(|q| q.category == "Nature"));

        let stats = cache_stats(&state).await;
        assert_eq!(stats.total, 4);
        assert_eq!(stats.categories[0].category, "Nature");
    }

    #[tokio::test]
    async fn next_question_never_repeats_until_usage_reset() {
        let state = test_support::memory_state().await;
        let categories = vec!["person".to_string()];

        let mut seen = HashSet::new();
        for _ in 0..25 {
            let question = next_question(&state, &categories).await;
            assert!(question.used);
            assert!(seen.insert(question.id), "question served twice");
        }

        let stats = cache_stats(&state).await;
        assert_eq!(stats.unused, stats.total - 25);

        let restored = reset_usage(&state).await;
        assert_eq!(restored, 25);
        assert_eq!(cache_stats(&state).await.unused, stats.total);
    }

    #[tokio::test]
    async fn next_question_still_serves_in_degraded_mode() {
        let state = test_support::state();
        let question = next_question(&state, &["action".to_string()]).await;
        assert_eq!(question.category, "Action");
        assert!(question.used);
    }

    #[tokio::test]
    async fn bulk_generation_deduplicates_and_regenerate_clears() {
        let state = test_support::memory_state().await;
        let categories = vec!["world".to_string(), "World".to_string(), "object".to_string()];

        let batches = generate_for_categories(&state, &categories, 2).await;
        assert_eq!(batches.keys().collect::<Vec<_>>(), vec!["World", "Object"]);
        assert_eq!(cache_stats(&state).await.total, 4);

        let regenerated = force_regenerate(&state, &["random".to_string()], 3).await;
        assert_eq!(regenerated["Random"].len(), 3);
        let stats = cache_stats(&state).await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.categories.len(), 1);
    }

    #[tokio::test]
    async fn manual_questions_and_mark_used() {
        let state = test_support::memory_state().await;
        let added = add_manual(
            &state,
            "object",
            vec!["Describe a spoon".into(), "  ".into(), "Describe a fork".into()],
        )
        .await;
        assert_eq!(added.len(), 2);

        let updated = mark_used(&state, &[added[0].id.clone(), "unknown".into()]).await;
        assert_eq!(updated, 1);

        let served = next_question(&state, &["Object".to_string()]).await;
        assert_eq!(served.id, added[1].id);
    }

    #[tokio::test]
    async fn clear_cache_empties_everything() {
        let state = test_support::memory_state().await;
        generate(&state, "object", 2).await;
        assert!(clear_cache(&state).await);
        assert_eq!(cache_stats(&state).await.total, 0);
    }
}
