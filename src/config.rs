//! Application-level configuration loading: game defaults, storage backend and question generation.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    dao::{models::CompletionSettingsEntity, openai},
    state::game::{GameSettings, Player, Team},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARTICULATE_BACK_CONFIG_PATH";
/// Environment variable selecting the storage backend (`memory`, `file` or `couch`).
const STORAGE_BACKEND_ENV: &str = "ARTICULATE_STORAGE";
/// Environment variable overriding the directory of the file backend.
const STORAGE_DIR_ENV: &str = "ARTICULATE_STORAGE_DIR";
/// Environment variable providing the completion API key.
const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Fallback color returned when the colors set is exhausted.
const DEFAULT_COLOR: &str = "#FFFFFF";

/// Medium used to persist game data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process map; nothing survives a restart.
    Memory,
    /// JSON files in a directory.
    File,
    /// CouchDB server.
    Couch,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "file" => Some(Self::File),
            "couch" | "couchdb" => Some(Self::Couch),
            _ => None,
        }
    }

    /// Name reported by the health route.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Couch => "couch",
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend selected at startup.
    pub backend: StorageBackend,
    /// Directory used by the file backend.
    pub directory: PathBuf,
    /// Byte quota applied by the memory backend.
    pub quota_bytes: Option<usize>,
}

/// Chat-completion defaults, overridable at runtime through the settings routes.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Chat-completion endpoint URL.
    pub endpoint: String,
    /// Default model name.
    pub model: String,
    /// Default sampling temperature.
    pub temperature: f32,
    /// Default completion length cap.
    pub max_tokens: u32,
    /// Timeout applied to each completion request.
    pub request_timeout: Duration,
    /// Key read from the environment, if any.
    pub api_key: Option<String>,
}

impl CompletionConfig {
    /// Settings used until the user stores their own.
    pub fn default_settings(&self) -> CompletionSettingsEntity {
        CompletionSettingsEntity {
            api_key: self.api_key.clone().unwrap_or_default(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Question cache tuning.
#[derive(Debug, Clone)]
pub struct QuestionConfig {
    /// Number of questions requested per category when the cache runs dry.
    pub batch_size: u32,
    /// Upper bound on a generation round before falling back to templates.
    pub generation_timeout: Duration,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Settings of a freshly created game.
    pub default_settings: GameSettings,
    /// Roster of a freshly created game.
    pub default_teams: Vec<Team>,
    /// Storage backend settings.
    pub storage: StorageConfig,
    /// Chat-completion defaults.
    pub completion: CompletionConfig,
    /// Question cache tuning.
    pub questions: QuestionConfig,
    colors: Vec<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    ///
    /// Environment variables are applied on top of whatever was loaded.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        teams = config.default_teams.len(),
                        storage = ?config.storage.backend,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    /// Parse a JSON configuration document.
    pub fn parse(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Return the first color of the colors set not already listed in `used`.
    ///
    /// When every entry is already taken we fall back to [`DEFAULT_COLOR`] so callers
    /// always receive a value.
    pub fn first_unused_color(&self, used: &[&str]) -> String {
        self.colors
            .iter()
            .find(|candidate| {
                used.iter()
                    .all(|existing| !existing.eq_ignore_ascii_case(candidate))
            })
            .cloned()
            .unwrap_or_else(|| DEFAULT_COLOR.to_string())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = env::var(STORAGE_BACKEND_ENV) {
            match StorageBackend::parse(&value) {
                Some(backend) => self.storage.backend = backend,
                None => warn!(value = %value, "unknown storage backend; keeping configured one"),
            }
        }
        if let Some(dir) = env::var_os(STORAGE_DIR_ENV).filter(|dir| !dir.is_empty()) {
            self.storage.directory = PathBuf::from(dir);
        }
        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.completion.api_key = Some(key);
            }
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    settings: Option<RawSettings>,
    teams: Option<Vec<RawTeam>>,
    colors: Option<Vec<String>>,
    storage: RawStorage,
    completion: RawCompletion,
    questions: RawQuestions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
struct RawSettings {
    time_limit: u32,
    winning_score: u32,
    questions_per_turn: u32,
    skip_penalty: u32,
    categories: Vec<String>,
    use_timer: bool,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    name: String,
    color: Option<String>,
    #[serde(default)]
    players: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStorage {
    backend: Option<StorageBackend>,
    directory: Option<PathBuf>,
    quota_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCompletion {
    endpoint: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQuestions {
    batch_size: Option<u32>,
    generation_timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let colors = value.colors.unwrap_or_else(default_colors);

        let default_settings = value
            .settings
            .map(|raw| GameSettings {
                time_limit: raw.time_limit,
                winning_score: raw.winning_score,
                questions_per_turn: raw.questions_per_turn,
                skip_penalty: raw.skip_penalty,
                categories: raw.categories,
                use_timer: raw.use_timer,
            })
            .and_then(|settings| match settings.normalized() {
                Ok(settings) => Some(settings),
                Err(err) => {
                    warn!(error = %err, "invalid default settings in config; using built-in ones");
                    None
                }
            })
            .unwrap_or_default();

        let mut config = Self {
            default_settings,
            default_teams: Vec::new(),
            storage: StorageConfig {
                backend: value.storage.backend.unwrap_or(StorageBackend::File),
                directory: value
                    .storage
                    .directory
                    .unwrap_or_else(|| PathBuf::from("data")),
                quota_bytes: value.storage.quota_bytes,
            },
            completion: CompletionConfig {
                endpoint: value
                    .completion
                    .endpoint
                    .unwrap_or_else(|| openai::DEFAULT_ENDPOINT.to_string()),
                model: value
                    .completion
                    .model
                    .unwrap_or_else(|| "gpt-4o-2024-05-13".to_string()),
                temperature: value.completion.temperature.unwrap_or(0.7),
                max_tokens: value.completion.max_tokens.unwrap_or(1000),
                request_timeout: Duration::from_secs(
                    value.completion.request_timeout_secs.unwrap_or(30),
                ),
                api_key: None,
            },
            questions: QuestionConfig {
                batch_size: value.questions.batch_size.unwrap_or(10).max(1),
                generation_timeout: Duration::from_secs(
                    value.questions.generation_timeout_secs.unwrap_or(20),
                ),
            },
            colors,
        };

        let raw_teams = value
            .teams
            .filter(|teams| !teams.is_empty())
            .unwrap_or_else(default_raw_teams);
        config.default_teams = build_teams(&config, raw_teams);
        config
    }
}

fn build_teams(config: &AppConfig, raw_teams: Vec<RawTeam>) -> Vec<Team> {
    let mut teams: Vec<Team> = Vec::with_capacity(raw_teams.len());
    for (index, raw) in raw_teams.into_iter().enumerate() {
        let color = raw.color.unwrap_or_else(|| {
            let used = teams.iter().map(|team| team.color.as_str()).collect::<Vec<_>>();
            config.first_unused_color(&used)
        });
        let players = if raw.players.is_empty() {
            vec![Player {
                name: "Player 1".into(),
            }]
        } else {
            raw.players
                .into_iter()
                .map(|name| Player { name })
                .collect()
        };
        teams.push(Team {
            id: index as u32 + 1,
            name: raw.name,
            color,
            score: 0,
            players,
        });
    }
    teams
}

fn default_raw_teams() -> Vec<RawTeam> {
    vec![
        RawTeam {
            name: "Team 1".into(),
            color: None,
            players: Vec::new(),
        },
        RawTeam {
            name: "Team 2".into(),
            color: None,
            players: Vec::new(),
        },
    ]
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in colors set shipped with the binary.
fn default_colors() -> Vec<String> {
    [
        "#FF5733", "#33A1FF", "#33FF57", "#FF33A1", "#A133FF", "#FFC733", "#33FFF5", "#FF8C33",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
