use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::state::game::Question;

/// Version tag written into every persisted envelope.
pub const CURRENT_VERSION: &str = "1.0.0";

/// Milliseconds elapsed since the Unix epoch.
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Logical keys of the persisted blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Game in progress.
    CurrentGame,
    /// Finished games.
    GameHistory,
    /// User preferences.
    UserSettings,
    /// Authentication token slot.
    AuthToken,
    /// Completion backend settings.
    CompletionConfig,
    /// Token consumption counters.
    TokenUsage,
    /// Question cache.
    QuestionCache,
}

impl StorageKey {
    /// Every known key, in declaration order.
    pub const ALL: [StorageKey; 7] = [
        StorageKey::CurrentGame,
        StorageKey::GameHistory,
        StorageKey::UserSettings,
        StorageKey::AuthToken,
        StorageKey::CompletionConfig,
        StorageKey::TokenUsage,
        StorageKey::QuestionCache,
    ];

    /// Raw key used by the key-value backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::CurrentGame => "articulate:current_game",
            StorageKey::GameHistory => "articulate:game_history",
            StorageKey::UserSettings => "articulate:user_settings",
            StorageKey::AuthToken => "articulate:auth_token",
            StorageKey::CompletionConfig => "articulate:openai_config",
            StorageKey::TokenUsage => "articulate:token_usage",
            StorageKey::QuestionCache => "articulate:question_cache",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope wrapping every persisted value with its schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Schema version the data was written with.
    pub version: String,
    /// Wrapped value.
    pub data: T,
    /// Write time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl<T> Versioned<T> {
    /// Wrap `data` with the current version and timestamp.
    pub fn current(data: T) -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            data,
            timestamp: timestamp_millis(),
        }
    }
}

/// Final standings of one team in a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTeamEntity {
    /// Team identifier within the game.
    pub id: u32,
    /// Team name at the end of the game.
    pub name: String,
    /// Final score.
    pub score: u32,
}

/// Record of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHistoryEntity {
    /// Game identifier.
    pub id: String,
    /// End time in milliseconds since the Unix epoch.
    pub date: u64,
    /// Final standings.
    pub teams: Vec<HistoryTeamEntity>,
    /// Identifier of the winning team.
    pub winner_id: u32,
    /// Game duration in milliseconds.
    pub duration: u64,
}

/// Color scheme preference of the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light colors.
    Light,
    /// Dark colors.
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

/// Per-device user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsEntity {
    pub theme: Theme,
    pub sound_enabled: bool,
    pub notifications: bool,
}

impl Default for UserSettingsEntity {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            sound_enabled: true,
            notifications: true,
        }
    }
}

/// Settings of the chat-completion backend used to generate questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSettingsEntity {
    /// Secret key; empty when none is set.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion length cap.
    pub max_tokens: u32,
}

/// Accumulated token consumption of the completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageEntity {
    /// Tokens sent in prompts.
    pub prompt_tokens: u64,
    /// Tokens received in completions.
    pub completion_tokens: u64,
    /// Sum reported by the API.
    pub total_tokens: u64,
    /// Last update in milliseconds since the Unix epoch; zero when never used.
    pub last_updated: u64,
}

/// Questions fetched or generated so far, grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCacheEntity {
    /// Cache schema version.
    pub version: String,
    /// Last write in milliseconds since the Unix epoch.
    pub last_updated: u64,
    /// Questions per category, in insertion order.
    pub categories: IndexMap<String, Vec<Question>>,
}

impl Default for QuestionCacheEntity {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            last_updated: timestamp_millis(),
            categories: IndexMap::new(),
        }
    }
}
