use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::{CompletionSettingsEntity, Theme, TokenUsageEntity, UserSettingsEntity};

use super::format_millis;

/// Display theme preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThemeDto {
    /// Light colors.
    Light,
    /// Dark colors.
    Dark,
    /// Follow the operating system.
    System,
}

impl From<Theme> for ThemeDto {
    fn from(value: Theme) -> Self {
        match value {
            Theme::Light => ThemeDto::Light,
            Theme::Dark => ThemeDto::Dark,
            Theme::System => ThemeDto::System,
        }
    }
}

impl From<ThemeDto> for Theme {
    fn from(value: ThemeDto) -> Self {
        match value {
            ThemeDto::Light => Theme::Light,
            ThemeDto::Dark => Theme::Dark,
            ThemeDto::System => Theme::System,
        }
    }
}

/// User preferences, used both as request and response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSettingsDto {
    /// Color scheme.
    pub theme: ThemeDto,
    /// Whether sound effects play.
    pub sound_enabled: bool,
    /// Whether notifications are shown.
    pub notifications: bool,
}

impl From<UserSettingsEntity> for UserSettingsDto {
    fn from(value: UserSettingsEntity) -> Self {
        Self {
            theme: value.theme.into(),
            sound_enabled: value.sound_enabled,
            notifications: value.notifications,
        }
    }
}

impl From<UserSettingsDto> for UserSettingsEntity {
    fn from(value: UserSettingsDto) -> Self {
        Self {
            theme: value.theme.into(),
            sound_enabled: value.sound_enabled,
            notifications: value.notifications,
        }
    }
}

/// Completion settings as shown to clients. The key itself is never returned.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct CompletionSettingsResponse {
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion length cap.
    pub max_tokens: u32,
    /// Whether a key is stored.
    pub api_key_set: bool,
    /// Last characters of the key, to tell keys apart.
    pub api_key_hint: Option<String>,
}

impl From<&CompletionSettingsEntity> for CompletionSettingsResponse {
    fn from(value: &CompletionSettingsEntity) -> Self {
        let key = value.api_key.trim();
        let api_key_hint = (key.chars().count() >= 8).then(|| {
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{tail}")
        });

        Self {
            model: value.model.clone(),
            temperature: value.temperature,
            max_tokens: value.max_tokens,
            api_key_set: !key.is_empty(),
            api_key_hint,
        }
    }
}

/// Partial completion settings update. An empty `api_key` removes the stored key.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateCompletionSettingsRequest {
    /// New key; an empty string removes it.
    pub api_key: Option<String>,
    /// Model name.
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    /// Sampling temperature.
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,
    /// Completion length cap.
    #[validate(range(min = 1, max = 16384))]
    pub max_tokens: Option<u32>,
}

/// Accumulated token consumption of the completion API.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenUsageResponse {
    /// Tokens sent in prompts.
    pub prompt_tokens: u64,
    /// Tokens received in completions.
    pub completion_tokens: u64,
    /// Total tokens.
    pub total_tokens: u64,
    /// Last update, RFC 3339; absent when never used.
    pub last_updated: Option<String>,
}

impl From<TokenUsageEntity> for TokenUsageResponse {
    fn from(value: TokenUsageEntity) -> Self {
        Self {
            prompt_tokens: value.prompt_tokens,
            completion_tokens: value.completion_tokens,
            total_tokens: value.total_tokens,
            last_updated: (value.last_updated > 0).then(|| format_millis(value.last_updated)),
        }
    }
}
