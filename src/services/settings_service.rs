use tracing::{info, warn};

use crate::{
    dao::{
        models::{
            CompletionSettingsEntity, StorageKey, TokenUsageEntity, UserSettingsEntity,
            timestamp_millis,
        },
        openai::{CompletionOptions, CompletionUsage},
    },
    dto::settings::{
        CompletionSettingsResponse, TokenUsageResponse, UpdateCompletionSettingsRequest,
        UserSettingsDto,
    },
    state::SharedState,
};

/// Stored user preferences, or the defaults.
pub async fn user_settings(state: &SharedState) -> UserSettingsDto {
    state
        .retrieve_data(StorageKey::UserSettings, UserSettingsEntity::default())
        .await
        .into()
}

/// Replace the user preferences.
pub async fn update_user_settings(state: &SharedState, payload: UserSettingsDto) -> UserSettingsDto {
    let entity = UserSettingsEntity::from(payload);
    if !state.store_data(StorageKey::UserSettings, &entity).await {
        warn!("user settings were not persisted");
    }
    entity.into()
}

/// Effective completion settings: stored values, with the environment key as fallback.
pub async fn completion_settings_entity(state: &SharedState) -> CompletionSettingsEntity {
    let defaults = state.config().completion.default_settings();
    let mut settings = state
        .retrieve_data(StorageKey::CompletionConfig, defaults.clone())
        .await;
    if settings.api_key.trim().is_empty() {
        settings.api_key = defaults.api_key;
    }
    settings
}

/// Options passed to the completion client for the next call.
pub async fn completion_options(state: &SharedState) -> CompletionOptions {
    let settings = completion_settings_entity(state).await;
    CompletionOptions {
        api_key: settings.api_key,
        model: settings.model,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }
}

/// Completion settings with the API key masked.
pub async fn completion_settings(state: &SharedState) -> CompletionSettingsResponse {
    CompletionSettingsResponse::from(&completion_settings_entity(state).await)
}

/// Merge a partial update into the stored completion settings.
pub async fn update_completion_settings(
    state: &SharedState,
    payload: UpdateCompletionSettingsRequest,
) -> CompletionSettingsResponse {
    let _gate = state.settings_gate().lock().await;
    let defaults = state.config().completion.default_settings();
    let mut settings = state
        .retrieve_data(StorageKey::CompletionConfig, defaults)
        .await;

    if let Some(api_key) = payload.api_key {
        settings.api_key = api_key.trim().to_string();
    }
    if let Some(model) = payload.model {
        settings.model = model;
    }
    if let Some(temperature) = payload.temperature {
        settings.temperature = temperature;
    }
    if let Some(max_tokens) = payload.max_tokens {
        settings.max_tokens = max_tokens;
    }

    if state
        .store_data(StorageKey::CompletionConfig, &settings)
        .await
    {
        info!(model = %settings.model, "completion settings updated");
    } else {
        warn!("completion settings were not persisted");
    }
    CompletionSettingsResponse::from(&settings)
}

/// Accumulated token usage.
pub async fn token_usage(state: &SharedState) -> TokenUsageResponse {
    state
        .retrieve_data(StorageKey::TokenUsage, TokenUsageEntity::default())
        .await
        .into()
}

/// Add the usage block of a completion to the running totals.
pub async fn record_token_usage(state: &SharedState, usage: CompletionUsage) {
    let _gate = state.settings_gate().lock().await;
    let current = state
        .retrieve_data(StorageKey::TokenUsage, TokenUsageEntity::default())
        .await;

    let updated = TokenUsageEntity {
        prompt_tokens: current.prompt_tokens + usage.prompt_tokens,
        completion_tokens: current.completion_tokens + usage.completion_tokens,
        total_tokens: current.total_tokens + usage.total_tokens,
        last_updated: timestamp_millis(),
    };
    state.store_data(StorageKey::TokenUsage, &updated).await;
}

/// Zero the token counters.
pub async fn reset_token_usage(state: &SharedState) -> TokenUsageResponse {
    let _gate = state.settings_gate().lock().await;
    let reset = TokenUsageEntity {
        last_updated: timestamp_millis(),
        ..TokenUsageEntity::default()
    };
    state.store_data(StorageKey::TokenUsage, &reset).await;
    reset.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dto::settings::ThemeDto, services::test_support};

    #[tokio::test]
    async fn user_settings_default_then_round_trip() {
        let state = test_support::memory_state().await;
        let defaults = user_settings(&state).await;
        assert_eq!(defaults.theme, ThemeDto::System);
        assert!(defaults.sound_enabled);

        update_user_settings(
            &state,
            UserSettingsDto {
                theme: ThemeDto::Dark,
                sound_enabled: false,
                notifications: true,
            },
        )
        .await;
        let stored = user_settings(&state).await;
        assert_eq!(stored.theme, ThemeDto::Dark);
        assert!(!stored.sound_enabled);
    }

    #[tokio::test]
    async fn completion_settings_merge_partial_updates() {
        let state = test_support::memory_state().await;
        let before = completion_settings(&state).await;
        assert_eq!(before.model, "gpt-4o-2024-05-13");
        assert_eq!(before.max_tokens, 1000);

        let after = update_completion_settings(
            &state,
            UpdateCompletionSettingsRequest {
                api_key: Some(" sk-test-123456 ".into()),
                temperature: Some(0.2),
                ..Default::default()
            },
        )
        .await;
        assert!(after.api_key_set);
        assert_eq!(after.max_tokens, 1000);

        let options = completion_options(&state).await;
        assert_eq!(options.api_key, "sk-test-123456");
        assert_eq!(options.temperature, 0.2);
    }

    #[tokio::test]
    async fn token_usage_accumulates_and_resets() {
        let state = test_support::memory_state().await;
        let usage = CompletionUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        record_token_usage(&state, usage).await;
        record_token_usage(&state, usage).await;

        let totals = token_usage(&state).await;
        assert_eq!(totals.total_tokens, 30);
        assert_eq!(totals.prompt_tokens, 20);
        assert!(totals.last_updated.is_some());

        let reset = reset_token_usage(&state).await;
        assert_eq!(reset.total_tokens, 0);
        assert_eq!(token_usage(&state).await.total_tokens, 0);
    }
}
