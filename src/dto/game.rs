use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_millis,
        phase::VisibleGamePhase,
        validation::{validate_hex_color, validate_names},
    },
    state::{
        game::{Difficulty, GameSettings, GameState, Question, SettingsPatch, Team},
        state_machine::GamePhase,
    },
};

/// Question difficulty exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyDto {
    /// Easy to describe.
    Easy,
    /// Average difficulty.
    Medium,
    /// Hard to describe.
    Hard,
}

impl From<Difficulty> for DifficultyDto {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyDto::Easy,
            Difficulty::Medium => DifficultyDto::Medium,
            Difficulty::Hard => DifficultyDto::Hard,
        }
    }
}

/// Public projection of a question.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionDto {
    /// Question identifier.
    pub id: String,
    /// Category of the question.
    pub category: String,
    /// Text to describe.
    pub text: String,
    /// Difficulty hint.
    pub difficulty: DifficultyDto,
    /// Whether the question was already served.
    pub used: bool,
}

impl From<&Question> for QuestionDto {
    fn from(value: &Question) -> Self {
        Self {
            id: value.id.clone(),
            category: value.category.clone(),
            text: value.text.clone(),
            difficulty: value.difficulty.into(),
            used: value.used,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a team exposed to REST/SSE clients.
pub struct TeamSummary {
    /// Team identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Hex color.
    pub color: String,
    /// Current score.
    pub score: u32,
    /// Player names, in turn order.
    pub players: Vec<String>,
}

impl From<&Team> for TeamSummary {
    fn from(value: &Team) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            color: value.color.clone(),
            score: value.score,
            players: value
                .players
                .iter()
                .map(|player| player.name.clone())
                .collect(),
        }
    }
}

/// Rules of the current game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettingsSummary {
    /// Seconds available for each turn.
    pub time_limit: u32,
    /// Score a team must reach to win.
    pub winning_score: u32,
    /// Questions that end a turn.
    pub questions_per_turn: u32,
    /// Points removed for a skipped question.
    pub skip_penalty: u32,
    /// Categories questions are drawn from.
    pub categories: Vec<String>,
    /// Whether turns are timed.
    pub use_timer: bool,
}

impl From<&GameSettings> for SettingsSummary {
    fn from(value: &GameSettings) -> Self {
        Self {
            time_limit: value.time_limit,
            winning_score: value.winning_score,
            questions_per_turn: value.questions_per_turn,
            skip_penalty: value.skip_penalty,
            categories: value.categories.clone(),
            use_timer: value.use_timer,
        }
    }
}

/// Snapshot of the whole game returned by every game route.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    /// Game identifier.
    pub id: String,
    /// Creation time, RFC 3339.
    pub created_at: String,
    /// Current phase.
    pub phase: VisibleGamePhase,
    /// Teams in turn order.
    pub teams: Vec<TeamSummary>,
    /// Rules in force.
    pub settings: SettingsSummary,
    /// Index of the team whose turn it is.
    pub current_team_index: usize,
    /// Index of the describing player within that team.
    pub current_player_index: usize,
    /// Name of the player describing, when the active team lists players.
    pub current_player: Option<String>,
    /// Question being described, if any.
    pub current_question: Option<QuestionDto>,
    /// Seconds left in the turn.
    pub timer: u32,
    /// Whether the countdown is running.
    pub is_timer_running: bool,
    /// Points earned during the current turn.
    pub turn_score: u32,
    /// Questions answered or skipped during the current turn.
    pub turn_questions: u32,
    /// Leading team once the game has ended.
    pub winner: Option<TeamSummary>,
}

impl From<&GameState> for GameSummary {
    fn from(value: &GameState) -> Self {
        let winner = match value.current_phase {
            GamePhase::GameEnd => value.leader().map(TeamSummary::from),
            _ => None,
        };

        Self {
            id: value.id.to_string(),
            created_at: format_millis(value.created_at),
            phase: value.current_phase.into(),
            teams: value.teams.iter().map(TeamSummary::from).collect(),
            settings: (&value.settings).into(),
            current_team_index: value.current_team_index,
            current_player_index: value.current_player_index,
            current_player: value.current_player().map(|player| player.name.clone()),
            current_question: value.current_question.as_ref().map(QuestionDto::from),
            timer: value.timer,
            is_timer_running: value.is_timer_running,
            turn_score: value.turn_score,
            turn_questions: value.turn_questions,
            winner,
        }
    }
}

/// Team whose turn it is, with the player describing.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentTeamResponse {
    /// Active team.
    pub team: TeamSummary,
    /// Describing player, when the team lists players.
    pub player: Option<String>,
}

/// Partial settings update; omitted fields keep their value.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 1, max = 600))]
    pub time_limit: Option<u32>,
    #[validate(range(min = 1, max = 1000))]
    pub winning_score: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub questions_per_turn: Option<u32>,
    #[validate(range(max = 100))]
    pub skip_penalty: Option<u32>,
    #[validate(length(min = 1), custom(function = "validate_names"))]
    pub categories: Option<Vec<String>>,
    /// Turn the countdown on or off.
    pub use_timer: Option<bool>,
}

impl From<UpdateSettingsRequest> for SettingsPatch {
    fn from(value: UpdateSettingsRequest) -> Self {
        Self {
            time_limit: value.time_limit,
            winning_score: value.winning_score,
            questions_per_turn: value.questions_per_turn,
            skip_penalty: value.skip_penalty,
            categories: value.categories,
            use_timer: value.use_timer,
        }
    }
}

/// Replacement roster.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateTeamsRequest {
    /// Teams in turn order.
    #[validate(length(min = 1, max = 12), nested)]
    pub teams: Vec<TeamInput>,
}

/// Incoming team definition.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamInput {
    /// Keeps the score of the existing team with this id. New ids are assigned otherwise.
    #[serde(default)]
    pub id: Option<u32>,
    /// Display name, must not be blank.
    pub name: String,
    /// Optional hex color. If omitted, the backend chooses the first unused color from the
    /// configured colors set.
    #[serde(default)]
    pub color: Option<String>,
    /// Player names, in turn order.
    #[serde(default)]
    pub players: Vec<String>,
}

impl Validate for TeamInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            let mut err = validator::ValidationError::new("team_name");
            err.message = Some("Team name must not be blank".into());
            errors.add("name", err);
        }

        if let Some(ref color) = self.color {
            if let Err(e) = validate_hex_color(color) {
                errors.add("color", e);
            }
        }

        if let Err(e) = validate_names(&self.players) {
            errors.add("players", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
