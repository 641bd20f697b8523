//! Hullbreak Game Engine
//!
//! Platform-agnostic core rules for the Hullbreak survival card game: one
//! survivor against the Eco, a corrupted ship intelligence, played with a
//! standard card deck. This crate provides all game mechanics without UI or
//! platform-specific dependencies.

pub mod card;
pub mod chapter;
mod constants;
pub mod data;
pub mod deck;
pub mod eco;
pub mod effects;
pub mod error;
pub mod hallucination;
pub mod nodes;
pub mod numbers;
pub mod score;
pub mod session;
pub mod store;
pub mod turn;

// Re-export commonly used types
pub use card::{Card, CardId, HallucinationCard, HallucinationEffect, Rank, Suit, standard_deck};
pub use chapter::{
    ChapterManager, ChapterProgress, MemoryProfileStorage, PlayerProfile, Preferences,
    ProfileStorage, RunSetup, VictoryReport, check_victory_conditions,
};
pub use data::{
    ChapterCatalog, ChapterConfig, ChapterModifiers, InitialStats, Reward, RewardKind,
    ScenarioCatalog, ScenarioConfig, StatBoost, VictoryCondition,
};
pub use deck::{Deck, DeckManager};
pub use eco::{EcoAction, EcoDecision, EcoMind};
pub use effects::{Amount, Effect, EffectCatalog, EffectRule, EffectSpec, RankBand};
pub use error::{CommandError, ConfigError};
pub use hallucination::{HallucinationConfig, HallucinationState};
pub use nodes::{
    NodeChange, NodeSpec, NodeStatus, NodeSystem, NodeThresholds, ShipNode, default_node_specs,
};
pub use score::{
    ComboConfig, Multiplier, PerformanceRating, ScoreBoard, ScoreEvent, ScoreKind, ScoreTable,
};
pub use session::GameSession;
pub use store::{EcoVitals, GameState, GameStore, Listeners, StatusKind, Stats, Subscription};
pub use turn::{CommandOutcome, Continuation, Phase, Scheduler};

/// Main engine binding campaign progression to run creation. Platform layers
/// hold one of these for the lifetime of the app.
pub struct GameEngine<S: ProfileStorage> {
    progression: ChapterManager<S>,
}

impl<S: ProfileStorage> GameEngine<S> {
    /// Create an engine with the built-in campaign catalogs.
    pub fn new(storage: S) -> Self {
        Self {
            progression: ChapterManager::with_defaults(storage),
        }
    }

    /// Create an engine with custom catalogs, for modded campaigns.
    pub fn with_catalogs(
        storage: S,
        scenarios: ScenarioCatalog,
        chapters: ChapterCatalog,
    ) -> Self {
        Self {
            progression: ChapterManager::new(storage, scenarios, chapters),
        }
    }

    /// Create an engine from JSON catalog sources, validating both and their
    /// cross-references.
    ///
    /// # Errors
    ///
    /// Returns an error when either catalog is malformed or a chapter
    /// references a missing scenario.
    pub fn from_catalog_json(
        storage: S,
        scenarios_json: &str,
        chapters_json: &str,
    ) -> Result<Self, anyhow::Error> {
        let scenarios = ScenarioCatalog::from_json(scenarios_json)?;
        let chapters = ChapterCatalog::from_json(chapters_json, &scenarios)?;
        Ok(Self::with_catalogs(storage, scenarios, chapters))
    }

    #[must_use]
    pub const fn progression(&self) -> &ChapterManager<S> {
        &self.progression
    }

    pub const fn progression_mut(&mut self) -> &mut ChapterManager<S> {
        &mut self.progression
    }

    #[must_use]
    pub const fn profile(&self) -> &PlayerProfile {
        self.progression.profile()
    }

    /// Start a free-play run of the named scenario. Unknown ids fall back to
    /// the first catalog entry rather than failing the launch.
    pub fn start_game(&mut self, scenario_id: &str, seed: u64) -> GameSession {
        let setup = self.progression.scenario_setup(scenario_id);
        GameSession::from_setup(setup, seed)
    }

    /// Start a campaign run of the named chapter.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the chapter is unknown or still locked.
    pub fn start_chapter(&mut self, chapter_id: &str, seed: u64) -> Result<GameSession, ConfigError> {
        let setup = self.progression.select_chapter(chapter_id)?;
        Ok(GameSession::from_setup(setup, seed))
    }

    /// Fold a finished (or abandoned) run back into the profile. Free-play
    /// runs leave the profile untouched. Returns the reward keys granted.
    pub fn finish_run(&mut self, session: &GameSession) -> Vec<String> {
        let Some(chapter_id) = session.chapter_id().map(str::to_string) else {
            return Vec::new();
        };
        let victory = session.state().victory;
        self.progression
            .complete_chapter(&chapter_id, victory, session.score().total())
    }

    /// Wipe campaign progression back to a fresh profile.
    pub fn reset_progress(&mut self) {
        self.progression.reset_progress();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> GameEngine<MemoryProfileStorage> {
        GameEngine::new(MemoryProfileStorage::default())
    }

    fn survive_one_turn_setup() -> RunSetup {
        let mut scenario = ScenarioCatalog::default_catalog().scenarios.remove(0);
        scenario.hallucination = HallucinationConfig {
            base_chance: 0.0,
            chance_per_level: 0.0,
            ..HallucinationConfig::default()
        };
        scenario.victory = vec![VictoryCondition::SurviveTurns(2)];
        RunSetup {
            chapter_id: Some(String::from("awakening")),
            scenario,
            init: InitialStats::default(),
        }
    }

    #[test]
    fn json_catalogs_build_a_working_engine() {
        let scenarios = serde_json::to_string(&ScenarioCatalog::default_catalog()).unwrap();
        let chapters = serde_json::to_string(&ChapterCatalog::default_catalog()).unwrap();
        let engine = GameEngine::from_catalog_json(
            MemoryProfileStorage::default(),
            &scenarios,
            &chapters,
        )
        .unwrap();
        assert!(engine.profile().is_unlocked("awakening"));

        let broken = GameEngine::from_catalog_json(
            MemoryProfileStorage::default(),
            "not json",
            &chapters,
        );
        assert!(broken.is_err());
    }

    #[test]
    fn locked_chapters_cannot_start() {
        let mut engine = engine();
        assert!(matches!(
            engine.start_chapter("adrift", 1),
            Err(ConfigError::ChapterLocked(_))
        ));
        assert!(engine.start_chapter("awakening", 1).is_ok());
    }

    #[test]
    fn free_play_ignores_unlock_state() {
        let mut engine = engine();
        let session = engine.start_game("cold_signal", 3);
        assert_eq!(session.scenario().id, "cold_signal");
        assert!(session.chapter_id().is_none());
        assert!(engine.finish_run(&session).is_empty());
        assert_eq!(engine.profile().total_score, 0);
    }

    #[test]
    fn campaign_victory_flows_into_the_profile() {
        let mut engine = engine();
        let mut session = GameSession::from_setup(survive_one_turn_setup(), 11);
        session.set_settle_delay_ms(0);
        assert!(session.end_player_turn().accepted());
        assert!(session.state().victory);
        assert!(
            session
                .score()
                .breakdown()
                .contains_key(&ScoreKind::ChapterComplete)
        );

        let granted = engine.finish_run(&session);
        assert_eq!(granted.len(), 2);
        assert!(engine.profile().is_unlocked("adrift"));
        let progress = engine.profile().progress("awakening").unwrap();
        assert!(progress.completed);
        assert_eq!(progress.best_score, session.score().total());
    }

    #[test]
    fn abandoned_campaign_run_counts_as_attempt() {
        let mut engine = engine();
        let session = GameSession::from_setup(survive_one_turn_setup(), 11);
        let granted = engine.finish_run(&session);
        assert!(granted.is_empty());
        let progress = engine.profile().progress("awakening").unwrap();
        assert!(!progress.completed);
        assert_eq!(progress.attempts, 1);
    }

    #[test]
    fn progression_survives_engine_restart() {
        let storage = MemoryProfileStorage::default();
        {
            let mut engine = GameEngine::new(storage.clone());
            let mut session = GameSession::from_setup(survive_one_turn_setup(), 11);
            session.set_settle_delay_ms(0);
            session.end_player_turn();
            engine.finish_run(&session);
        }
        let engine = GameEngine::new(storage);
        assert!(engine.profile().is_unlocked("adrift"));
    }
}
