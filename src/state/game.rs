use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::timestamp_millis,
    state::state_machine::{GameEvent, GamePhase, InvalidTransition, transition},
};

/// Player belonging to a team. Players take turns describing within their team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name of the player.
    pub name: String,
}

/// Team competing in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Identifier unique within the game.
    pub id: u32,
    /// Display name of the team.
    pub name: String,
    /// CSS color used by clients to render the team.
    pub color: String,
    /// Current score. Penalties never push it below zero.
    #[serde(default)]
    pub score: u32,
    /// Players of the team in speaking order.
    #[serde(default)]
    pub players: Vec<Player>,
}

/// Rules of the game, fixed once a game starts unless explicitly updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Seconds available for each turn.
    pub time_limit: u32,
    /// Score a team must reach to win.
    pub winning_score: u32,
    /// Number of answered or skipped questions that ends a turn.
    pub questions_per_turn: u32,
    /// Points removed from the team when a question is skipped.
    pub skip_penalty: u32,
    /// Question categories drawn from during a turn.
    pub categories: Vec<String>,
    /// Whether turns are timed.
    pub use_timer: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            time_limit: 60,
            winning_score: 20,
            questions_per_turn: 5,
            skip_penalty: 1,
            categories: ["world", "object", "nature", "person", "action", "random"]
                .into_iter()
                .map(String::from)
                .collect(),
            use_timer: true,
        }
    }
}

impl GameSettings {
    /// Check the numeric bounds and de-duplicate the category list, keeping the first occurrence.
    pub fn normalized(mut self) -> Result<Self, GameError> {
        if self.time_limit == 0 {
            return Err(GameError::InvalidInput(
                "time limit must be strictly positive".into(),
            ));
        }
        if self.winning_score == 0 {
            return Err(GameError::InvalidInput(
                "winning score must be strictly positive".into(),
            ));
        }
        if self.questions_per_turn == 0 {
            return Err(GameError::InvalidInput(
                "questions per turn must be strictly positive".into(),
            ));
        }

        let mut seen = HashSet::new();
        self.categories = self
            .categories
            .into_iter()
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .filter(|category| seen.insert(category.to_lowercase()))
            .collect();

        if self.categories.is_empty() {
            return Err(GameError::InvalidInput(
                "at least one category is required".into(),
            ));
        }

        Ok(self)
    }

    /// Merge a partial update on top of the current settings.
    pub fn merged(&self, patch: SettingsPatch) -> Self {
        Self {
            time_limit: patch.time_limit.unwrap_or(self.time_limit),
            winning_score: patch.winning_score.unwrap_or(self.winning_score),
            questions_per_turn: patch.questions_per_turn.unwrap_or(self.questions_per_turn),
            skip_penalty: patch.skip_penalty.unwrap_or(self.skip_penalty),
            categories: patch.categories.unwrap_or_else(|| self.categories.clone()),
            use_timer: patch.use_timer.unwrap_or(self.use_timer),
        }
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    /// New seconds per turn; resets the countdown.
    pub time_limit: Option<u32>,
    /// New target score.
    pub winning_score: Option<u32>,
    /// New number of questions per turn.
    pub questions_per_turn: Option<u32>,
    /// New skip penalty.
    pub skip_penalty: Option<u32>,
    /// New category list.
    pub categories: Option<Vec<String>>,
    /// Turn the countdown on or off.
    pub use_timer: Option<bool>,
}

/// Difficulty hint attached to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy to describe.
    Easy,
    /// Average difficulty.
    #[default]
    Medium,
    /// Hard to describe.
    Hard,
}

/// Prompt a player has to describe to their team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier of the question.
    pub id: String,
    /// Category the question belongs to (capitalized, e.g. `Nature`).
    pub category: String,
    /// Text shown to the describing player.
    pub text: String,
    /// Difficulty hint.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Whether the question was already served during a turn.
    #[serde(default)]
    pub used: bool,
}

/// Failures raised when an action cannot be applied to the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The action is not allowed from the current phase.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// The action carries invalid data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The action is well formed but cannot run in the current situation.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Actions the game state reduces.
///
/// Question lookups are asynchronous, so callers resolve them beforehand and hand
/// the result to the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    /// Start the active team's turn with its first question.
    StartGame {
        /// Question shown when the turn begins.
        first_question: Question,
    },
    /// Credit the active team for the current question.
    AnswerCorrect {
        /// Question to show next when the turn goes on.
        next_question: Option<Question>,
    },
    /// Skip the current question, applying the skip penalty.
    SkipQuestion {
        /// Question to show next when the turn goes on.
        next_question: Option<Question>,
    },
    /// One second elapsed on the countdown.
    Tick,
    /// Resume the countdown.
    StartTimer,
    /// Freeze the countdown.
    PauseTimer,
    /// Restore the countdown to the configured time limit and stop it.
    ResetTimer,
    /// Hand over to the next team.
    NextTurn,
    /// Merge a partial settings update.
    UpdateSettings(SettingsPatch),
    /// Replace the team roster.
    UpdateTeams(Vec<Team>),
}

/// Phase change produced by an applied action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Phase before the action.
    pub from: GamePhase,
    /// Phase after the action.
    pub to: GamePhase,
}

impl Transition {
    /// Whether the action moved the game to another phase.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// Whether this transition just ended the game.
    pub fn ended_game(&self) -> bool {
        self.changed() && self.to == GamePhase::GameEnd
    }
}

/// Full state of the game in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Identifier of this game, used for history entries.
    pub id: Uuid,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Teams in turn order.
    pub teams: Vec<Team>,
    /// Rules in force.
    pub settings: GameSettings,
    /// Index of the team whose turn it is.
    pub current_team_index: usize,
    /// Index of the describing player within the active team.
    pub current_player_index: usize,
    /// Current phase.
    pub current_phase: GamePhase,
    /// Question being described.
    pub current_question: Option<Question>,
    /// Seconds left in the current turn.
    pub timer: u32,
    /// Points earned during the current turn.
    pub turn_score: u32,
    /// Questions answered or skipped during the current turn.
    pub turn_questions: u32,
    /// Whether the countdown is running.
    pub is_timer_running: bool,
}

impl GameState {
    /// Build a fresh game in the setup phase.
    pub fn new(teams: Vec<Team>, settings: GameSettings) -> Result<Self, GameError> {
        let settings = settings.normalized()?;
        validate_teams(&teams)?;

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: timestamp_millis(),
            timer: settings.time_limit,
            teams,
            settings,
            current_team_index: 0,
            current_player_index: 0,
            current_phase: GamePhase::Setup,
            current_question: None,
            turn_score: 0,
            turn_questions: 0,
            is_timer_running: false,
        })
    }

    /// Whether a restored state still honours the game invariants.
    pub fn is_consistent(&self) -> bool {
        !self.teams.is_empty()
            && self.current_team_index < self.teams.len()
            && self.settings.questions_per_turn > 0
            && self.turn_questions <= self.settings.questions_per_turn
    }

    /// Team whose turn it is.
    pub fn current_team(&self) -> Option<&Team> {
        self.teams.get(self.current_team_index)
    }

    /// Player describing for the current team, if the team lists players.
    pub fn current_player(&self) -> Option<&Player> {
        let players = &self.current_team()?.players;
        if players.is_empty() {
            return None;
        }
        players.get(self.current_player_index % players.len())
    }

    /// Whether answering or skipping now keeps the turn going and therefore needs another question.
    pub fn needs_next_question(&self) -> bool {
        self.current_phase == GamePhase::Question
            && self.turn_questions + 1 < self.settings.questions_per_turn
    }

    /// Team with the highest score; the earliest team wins ties.
    pub fn leader(&self) -> Option<&Team> {
        self.teams
            .iter()
            .reduce(|best, team| if team.score > best.score { team } else { best })
    }

    /// Apply an action and report the resulting phase change.
    ///
    /// A rejected action leaves the state untouched.
    pub fn apply(&mut self, action: GameAction) -> Result<Transition, GameError> {
        let from = self.current_phase;

        match action {
            GameAction::StartGame { first_question } => self.start_game(first_question)?,
            GameAction::AnswerCorrect { next_question } => {
                self.score_question(true, next_question)?
            }
            GameAction::SkipQuestion { next_question } => {
                self.score_question(false, next_question)?
            }
            GameAction::Tick => self.tick()?,
            GameAction::StartTimer => self.start_timer()?,
            GameAction::PauseTimer => self.is_timer_running = false,
            GameAction::ResetTimer => {
                self.timer = self.settings.time_limit;
                self.is_timer_running = false;
            }
            GameAction::NextTurn => self.next_turn()?,
            GameAction::UpdateSettings(patch) => self.update_settings(patch)?,
            GameAction::UpdateTeams(teams) => self.update_teams(teams)?,
        }

        Ok(Transition {
            from,
            to: self.current_phase,
        })
    }

    fn start_game(&mut self, first_question: Question) -> Result<(), GameError> {
        self.current_phase = transition(self.current_phase, GameEvent::StartGame)?;
        self.timer = self.settings.time_limit;
        self.turn_score = 0;
        self.turn_questions = 0;
        self.current_question = Some(first_question);
        self.is_timer_running = self.settings.use_timer;
        Ok(())
    }

    fn score_question(
        &mut self,
        correct: bool,
        next_question: Option<Question>,
    ) -> Result<(), GameError> {
        let turn_questions = self.turn_questions + 1;
        let turn_complete = turn_questions >= self.settings.questions_per_turn;
        let event = if correct {
            GameEvent::AnswerCorrect { turn_complete }
        } else {
            GameEvent::SkipQuestion { turn_complete }
        };
        let next = transition(self.current_phase, event)?;

        let penalty = self.settings.skip_penalty;
        let team = self
            .teams
            .get_mut(self.current_team_index)
            .ok_or_else(|| GameError::InvalidState("no active team".into()))?;
        if correct {
            team.score += 1;
            self.turn_score += 1;
        } else {
            team.score = team.score.saturating_sub(penalty);
        }

        self.turn_questions = turn_questions;
        self.current_phase = next;
        if turn_complete {
            self.current_question = None;
            self.is_timer_running = false;
        } else {
            self.current_question = next_question;
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<(), GameError> {
        if !self.is_timer_running || self.current_phase != GamePhase::Question {
            return Ok(());
        }

        self.timer = self.timer.saturating_sub(1);
        if self.timer == 0 {
            self.current_phase = transition(self.current_phase, GameEvent::TimerExpired)?;
            self.is_timer_running = false;
        }
        Ok(())
    }

    fn start_timer(&mut self) -> Result<(), GameError> {
        if self.current_phase != GamePhase::Question {
            return Err(GameError::InvalidState(format!(
                "timer can only run during a question, current phase {:?}",
                self.current_phase
            )));
        }
        if self.timer == 0 {
            return Err(GameError::InvalidState("timer already expired".into()));
        }
        self.is_timer_running = true;
        Ok(())
    }

    fn next_turn(&mut self) -> Result<(), GameError> {
        let winning_score = self.settings.winning_score;
        let game_won = self.teams.iter().any(|team| team.score >= winning_score);
        self.current_phase = transition(self.current_phase, GameEvent::NextTurn { game_won })?;

        let next_team_index = (self.current_team_index + 1) % self.teams.len();
        if next_team_index == 0 {
            let rotation = self.teams[0].players.len().max(1);
            self.current_player_index = (self.current_player_index + 1) % rotation;
        }
        self.current_team_index = next_team_index;
        self.timer = self.settings.time_limit;
        self.turn_score = 0;
        self.turn_questions = 0;
        self.is_timer_running = false;
        self.current_question = None;
        Ok(())
    }

    fn update_settings(&mut self, patch: SettingsPatch) -> Result<(), GameError> {
        if self.current_phase == GamePhase::Question {
            return Err(GameError::InvalidState(
                "settings cannot change while a turn is running".into(),
            ));
        }

        let time_limit_changed = patch.time_limit.is_some();
        self.settings = self.settings.merged(patch).normalized()?;
        if time_limit_changed {
            self.timer = self.settings.time_limit;
        }
        self.turn_questions = self.turn_questions.min(self.settings.questions_per_turn);
        Ok(())
    }

    fn update_teams(&mut self, teams: Vec<Team>) -> Result<(), GameError> {
        if self.current_phase == GamePhase::Question {
            return Err(GameError::InvalidState(
                "teams cannot change while a turn is running".into(),
            ));
        }
        validate_teams(&teams)?;

        self.teams = teams;
        if self.current_team_index >= self.teams.len() {
            self.current_team_index = 0;
        }
        Ok(())
    }
}

fn validate_teams(teams: &[Team]) -> Result<(), GameError> {
    if teams.is_empty() {
        return Err(GameError::InvalidInput(
            "a game requires at least one team".into(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for team in teams {
        if team.name.trim().is_empty() {
            return Err(GameError::InvalidInput(
                "team name must not be empty".into(),
            ));
        }
        if !seen_ids.insert(team.id) {
            return Err(GameError::InvalidInput(format!(
                "duplicate team id `{}` detected",
                team.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, name: &str) -> Team {
        Team {
            id,
            name: name.into(),
            color: "#FF5733".into(),
            score: 0,
            players: vec![Player {
                name: "Player 1".into(),
            }],
        }
    }

    fn question(text: &str) -> Question {
        Question {
            id: Uuid::new_v4().to_string(),
            category: "Object".into(),
            text: text.into(),
            difficulty: Difficulty::Medium,
            used: true,
        }
    }

    fn game(questions_per_turn: u32, winning_score: u32) -> GameState {
        GameState::new(
            vec![team(1, "Team A"), team(2, "Team B")],
            GameSettings {
                questions_per_turn,
                winning_score,
                ..GameSettings::default()
            },
        )
        .unwrap()
    }

    fn start(game: &mut GameState) {
        game.apply(GameAction::StartGame {
            first_question: question("first"),
        })
        .unwrap();
    }

    fn answer(game: &mut GameState) -> Transition {
        let next_question = game.needs_next_question().then(|| question("next"));
        game.apply(GameAction::AnswerCorrect { next_question })
            .unwrap()
    }

    fn skip(game: &mut GameState) -> Transition {
        let next_question = game.needs_next_question().then(|| question("next"));
        game.apply(GameAction::SkipQuestion { next_question })
            .unwrap()
    }

    #[test]
    fn start_game_resets_turn_and_runs_timer() {
        let mut game = game(5, 20);
        game.timer = 3;
        game.turn_questions = 2;

        start(&mut game);

        assert_eq!(game.current_phase, GamePhase::Question);
        assert_eq!(game.timer, 60);
        assert_eq!(game.turn_questions, 0);
        assert_eq!(game.turn_score, 0);
        assert!(game.is_timer_running);
        assert_eq!(game.current_question.as_ref().unwrap().text, "first");
    }

    #[test]
    fn start_game_without_timer_leaves_countdown_stopped() {
        let mut game = game(5, 20);
        game.settings.use_timer = false;
        start(&mut game);
        assert!(!game.is_timer_running);
    }

    #[test]
    fn answer_increments_score_and_loads_next_question() {
        let mut game = game(3, 20);
        start(&mut game);

        let transition = answer(&mut game);

        assert!(!transition.changed());
        assert_eq!(game.teams[0].score, 1);
        assert_eq!(game.turn_score, 1);
        assert_eq!(game.turn_questions, 1);
        assert_eq!(game.current_question.as_ref().unwrap().text, "next");
    }

    #[test]
    fn turn_summary_reached_exactly_once_after_questions_per_turn() {
        let mut game = game(3, 20);
        start(&mut game);

        let changes = (0..3)
            .map(|i| if i % 2 == 0 { answer(&mut game) } else { skip(&mut game) })
            .filter(Transition::changed)
            .collect::<Vec<_>>();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].to, GamePhase::TurnSummary);
        assert_eq!(game.turn_questions, 3);
        assert!(game.current_question.is_none());
        assert!(!game.is_timer_running);

        let err = game
            .apply(GameAction::AnswerCorrect {
                next_question: None,
            })
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidTransition(_)));
        assert_eq!(game.turn_questions, 3);
    }

    #[test]
    fn skip_penalty_never_drops_score_below_zero() {
        let mut game = game(5, 20);
        game.settings.skip_penalty = 3;
        start(&mut game);

        answer(&mut game);
        assert_eq!(game.teams[0].score, 1);
        skip(&mut game);
        assert_eq!(game.teams[0].score, 0);
        skip(&mut game);
        assert_eq!(game.teams[0].score, 0);
    }

    #[test]
    fn timer_expiry_ends_turn_regardless_of_counters() {
        let mut game = game(5, 20);
        game.settings.time_limit = 2;
        start(&mut game);

        assert!(!game.apply(GameAction::Tick).unwrap().changed());
        assert_eq!(game.timer, 1);
        let transition = game.apply(GameAction::Tick).unwrap();

        assert_eq!(transition.to, GamePhase::TurnSummary);
        assert_eq!(game.timer, 0);
        assert!(!game.is_timer_running);
        assert_eq!(game.turn_questions, 0);

        // Further ticks are ignored once the turn is over.
        assert!(!game.apply(GameAction::Tick).unwrap().changed());
    }

    #[test]
    fn paused_timer_does_not_tick() {
        let mut game = game(5, 20);
        start(&mut game);
        game.apply(GameAction::PauseTimer).unwrap();
        game.apply(GameAction::Tick).unwrap();
        assert_eq!(game.timer, 60);

        game.apply(GameAction::StartTimer).unwrap();
        game.apply(GameAction::Tick).unwrap();
        assert_eq!(game.timer, 59);

        game.apply(GameAction::ResetTimer).unwrap();
        assert_eq!(game.timer, 60);
        assert!(!game.is_timer_running);
    }

    #[test]
    fn start_timer_requires_question_phase() {
        let mut game = game(5, 20);
        assert!(matches!(
            game.apply(GameAction::StartTimer),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn next_turn_rotates_teams_and_players() {
        let mut game = game(1, 20);
        game.teams[0].players.push(Player {
            name: "Player 2".into(),
        });

        start(&mut game);
        answer(&mut game);
        game.apply(GameAction::NextTurn).unwrap();
        assert_eq!(game.current_team_index, 1);
        assert_eq!(game.current_player_index, 0);
        assert_eq!(game.current_phase, GamePhase::Setup);
        assert_eq!(game.timer, game.settings.time_limit);

        start(&mut game);
        answer(&mut game);
        game.apply(GameAction::NextTurn).unwrap();
        assert_eq!(game.current_team_index, 0);
        assert_eq!(game.current_player_index, 1);
        assert_eq!(game.current_player().unwrap().name, "Player 2");
    }

    #[test]
    fn current_team_index_stays_in_bounds() {
        let mut game = game(1, 100);
        for _ in 0..7 {
            start(&mut game);
            skip(&mut game);
            game.apply(GameAction::NextTurn).unwrap();
            assert!(game.current_team_index < game.teams.len());
        }

        game.current_team_index = 1;
        game.apply(GameAction::UpdateTeams(vec![team(9, "Solo")]))
            .unwrap();
        assert_eq!(game.current_team_index, 0);
        assert!(game.is_consistent());
    }

    #[test]
    fn no_premature_game_end_with_two_teams() {
        let mut game = game(1, 2);

        // Team A scores 1.
        start(&mut game);
        let transition = answer(&mut game);
        assert_eq!(transition.to, GamePhase::TurnSummary);
        assert_eq!(game.teams[0].score, 1);
        game.apply(GameAction::NextTurn).unwrap();
        assert_eq!(game.current_team_index, 1);
        assert_eq!(game.current_phase, GamePhase::Setup);

        // Team B scores 1.
        start(&mut game);
        answer(&mut game);
        assert_eq!(game.teams[1].score, 1);
        let transition = game.apply(GameAction::NextTurn).unwrap();
        assert_eq!(transition.to, GamePhase::Setup);

        // Team A reaches the winning score.
        start(&mut game);
        answer(&mut game);
        let transition = game.apply(GameAction::NextTurn).unwrap();
        assert!(transition.ended_game());
        assert_eq!(game.leader().unwrap().name, "Team A");

        let err = game
            .apply(GameAction::StartGame {
                first_question: question("late"),
            })
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidTransition(_)));
    }

    #[test]
    fn settings_update_rejected_mid_turn_and_validated() {
        let mut game = game(5, 20);

        game.apply(GameAction::UpdateSettings(SettingsPatch {
            time_limit: Some(30),
            categories: Some(vec!["Nature".into(), "nature".into(), " ".into()]),
            ..SettingsPatch::default()
        }))
        .unwrap();
        assert_eq!(game.timer, 30);
        assert_eq!(game.settings.categories, vec!["Nature".to_string()]);

        assert!(matches!(
            game.apply(GameAction::UpdateSettings(SettingsPatch {
                questions_per_turn: Some(0),
                ..SettingsPatch::default()
            })),
            Err(GameError::InvalidInput(_))
        ));
        assert_eq!(game.settings.questions_per_turn, 5);

        start(&mut game);
        assert!(matches!(
            game.apply(GameAction::UpdateSettings(SettingsPatch::default())),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn lowering_questions_per_turn_after_a_turn_keeps_game_consistent() {
        let mut game = game(3, 20);
        start(&mut game);
        for _ in 0..3 {
            answer(&mut game);
        }
        assert_eq!(game.current_phase, GamePhase::TurnSummary);
        assert_eq!(game.turn_questions, 3);

        game.apply(GameAction::UpdateSettings(SettingsPatch {
            questions_per_turn: Some(1),
            ..SettingsPatch::default()
        }))
        .unwrap();

        assert_eq!(game.turn_questions, 1);
        assert_eq!(game.teams[0].score, 3);
        assert!(game.is_consistent());
    }

    #[test]
    fn teams_must_be_non_empty_and_unique() {
        let mut game = game(5, 20);
        assert!(game.apply(GameAction::UpdateTeams(Vec::new())).is_err());
        assert!(
            game.apply(GameAction::UpdateTeams(vec![team(1, "A"), team(1, "B")]))
                .is_err()
        );
        assert_eq!(game.teams.len(), 2);
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let game = game(5, 20);
        let value = serde_json::to_value(&game).unwrap();
        assert_eq!(value["currentPhase"], "setup");
        assert_eq!(value["settings"]["questionsPerTurn"], 5);
        assert!(value["currentQuestion"].is_null());

        let back: GameState = serde_json::from_value(value).unwrap();
        assert_eq!(back, game);
    }
}
