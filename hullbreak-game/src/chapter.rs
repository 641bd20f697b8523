//! Chapter progression, victory evaluation, and the persisted profile.
//!
//! The manager owns the static catalogs and the mutable [`PlayerProfile`].
//! Victory checking only reports; ending a run is the orchestrator's call.
//! Rewards are granted at most once per (chapter, reward key).

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::constants::{
    LOG_CHAPTER_COMPLETE, LOG_CHAPTER_LOCKED, LOG_CHAPTER_SELECTED, LOG_CHAPTER_UNKNOWN,
    LOG_PROFILE_FALLBACK, LOG_PROFILE_RESET, LOG_REWARD_GRANTED,
};
use crate::data::{
    ChapterCatalog, ChapterConfig, InitialStats, RewardKind, ScenarioCatalog, ScenarioConfig,
    StatBoost, VictoryCondition,
};
use crate::error::ConfigError;
use crate::nodes::NodeSystem;
use crate::store::{GameState, Listeners, Subscription};

/// Which declared conditions are met by the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VictoryReport {
    pub met: Vec<VictoryCondition>,
    pub unmet: Vec<VictoryCondition>,
}

impl VictoryReport {
    #[must_use]
    pub fn all_met(&self) -> bool {
        self.unmet.is_empty() && !self.met.is_empty()
    }
}

/// Evaluate every declared condition against a state snapshot. Reports
/// which remain unmet; it does not end the run.
#[must_use]
pub fn check_victory_conditions(
    conditions: &[VictoryCondition],
    state: &GameState,
    nodes: &NodeSystem,
    score_total: i64,
) -> VictoryReport {
    let mut report = VictoryReport {
        met: Vec::new(),
        unmet: Vec::new(),
    };
    for condition in conditions {
        let met = match condition {
            VictoryCondition::DefeatEco => state.eco.hp <= 0,
            VictoryCondition::SurviveTurns(target) => state.turn >= *target,
            VictoryCondition::ProtectNodes(target) => nodes.intact_count() >= *target as usize,
            VictoryCondition::ScoreThreshold(target) => score_total >= *target,
        };
        if met {
            report.met.push(*condition);
        } else {
            report.unmet.push(*condition);
        }
    }
    report
}

/// Per-chapter progress record on the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChapterProgress {
    pub completed: bool,
    pub best_score: i64,
    pub attempts: u32,
    /// Dedupe keys of rewards already granted
    #[serde(default)]
    pub granted_rewards: BTreeSet<String>,
}

/// Player preferences persisted alongside progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Preferences {
    #[serde(default)]
    pub reduced_motion: bool,
    #[serde(default)]
    pub colorblind_palette: bool,
}

/// The persisted player profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerProfile {
    pub total_score: i64,
    #[serde(default)]
    pub chapters: BTreeMap<String, ChapterProgress>,
    /// Permanent stat boosts accumulated across runs
    #[serde(default)]
    pub boosts: StatBoost,
    #[serde(default)]
    pub unlocked: BTreeSet<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl PlayerProfile {
    /// Fresh profile with the catalog's root chapters unlocked.
    #[must_use]
    pub fn fresh(chapters: &ChapterCatalog) -> Self {
        Self {
            unlocked: chapters
                .initially_unlocked()
                .iter()
                .map(|chapter| chapter.id.clone())
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_unlocked(&self, chapter_id: &str) -> bool {
        self.unlocked.contains(chapter_id)
    }

    #[must_use]
    pub fn progress(&self, chapter_id: &str) -> Option<&ChapterProgress> {
        self.chapters.get(chapter_id)
    }
}

/// Opaque persistence surface for the profile. Platform layers implement
/// this; load failures fall back to a fresh profile rather than failing the
/// boot.
pub trait ProfileStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the persisted profile, `None` on first launch.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store is unreadable or malformed.
    fn load(&self) -> Result<Option<PlayerProfile>, Self::Error>;

    /// Persist the profile.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be written.
    fn save(&self, profile: &PlayerProfile) -> Result<(), Self::Error>;
}

/// In-memory storage for tests and headless tooling.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStorage {
    slot: Rc<RefCell<Option<PlayerProfile>>>,
}

impl ProfileStorage for MemoryProfileStorage {
    type Error = Infallible;

    fn load(&self) -> Result<Option<PlayerProfile>, Self::Error> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, profile: &PlayerProfile) -> Result<(), Self::Error> {
        *self.slot.borrow_mut() = Some(profile.clone());
        Ok(())
    }
}

/// Everything a new run needs, composed by chapter selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSetup {
    pub chapter_id: Option<String>,
    pub scenario: ScenarioConfig,
    pub init: InitialStats,
}

fn compose_init(
    scenario: &ScenarioConfig,
    chapter: Option<&ChapterConfig>,
    boosts: StatBoost,
) -> InitialStats {
    let mut init = scenario.initial;
    if let Some(chapter) = chapter {
        init.hull += chapter.modifiers.hull;
        init.sanity += chapter.modifiers.sanity;
        init.ap += chapter.modifiers.ap;
        init.eco_hp += chapter.modifiers.eco_hp;
    }
    init.hull = (init.hull + boosts.hull).max(1);
    init.sanity = (init.sanity + boosts.sanity).max(1);
    init.ap = (init.ap + boosts.ap).max(1);
    init.eco_hp = init.eco_hp.max(1);
    init
}

/// Owner of catalogs, profile, and the run-completion lifecycle.
#[derive(Debug)]
pub struct ChapterManager<S: ProfileStorage> {
    scenarios: ScenarioCatalog,
    chapters: ChapterCatalog,
    storage: S,
    profile: PlayerProfile,
    listeners: Listeners<PlayerProfile>,
    /// Log keys emitted by progression operations, drained by the host
    pub logs: Vec<String>,
}

impl<S: ProfileStorage> ChapterManager<S> {
    /// Construct with explicit catalogs. A missing or malformed persisted
    /// profile falls back to a fresh one.
    pub fn new(storage: S, scenarios: ScenarioCatalog, chapters: ChapterCatalog) -> Self {
        let mut logs = Vec::new();
        let profile = match storage.load() {
            Ok(Some(profile)) => profile,
            Ok(None) => PlayerProfile::fresh(&chapters),
            Err(err) => {
                log::warn!("profile load failed, starting fresh: {err}");
                logs.push(String::from(LOG_PROFILE_FALLBACK));
                PlayerProfile::fresh(&chapters)
            }
        };
        Self {
            scenarios,
            chapters,
            storage,
            profile,
            listeners: Listeners::default(),
            logs,
        }
    }

    /// Construct with the built-in campaign catalogs.
    pub fn with_defaults(storage: S) -> Self {
        Self::new(
            storage,
            ScenarioCatalog::default_catalog(),
            ChapterCatalog::default_catalog(),
        )
    }

    #[must_use]
    pub const fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    #[must_use]
    pub const fn scenarios(&self) -> &ScenarioCatalog {
        &self.scenarios
    }

    #[must_use]
    pub const fn chapters(&self) -> &ChapterCatalog {
        &self.chapters
    }

    /// Register a listener invoked after every profile mutation.
    pub fn subscribe_profile(
        &mut self,
        callback: impl FnMut(&PlayerProfile) + 'static,
    ) -> Subscription {
        self.listeners.subscribe(callback)
    }

    fn notify(&mut self) {
        self.listeners.notify(&self.profile);
    }

    fn persist(&mut self) {
        if let Err(err) = self.storage.save(&self.profile) {
            log::warn!("profile save failed: {err}");
        }
        self.notify();
    }

    /// Validate unlock state and configuration for a chapter, returning the
    /// composed run setup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the failed check; the failure is
    /// also mirrored into the progression log feed.
    pub fn select_chapter(&mut self, chapter_id: &str) -> Result<RunSetup, ConfigError> {
        let Some(chapter) = self.chapters.get(chapter_id).cloned() else {
            self.logs.push(String::from(LOG_CHAPTER_UNKNOWN));
            return Err(ConfigError::UnknownChapter(chapter_id.to_string()));
        };
        if !self.profile.is_unlocked(chapter_id) {
            self.logs.push(String::from(LOG_CHAPTER_LOCKED));
            return Err(ConfigError::ChapterLocked(chapter_id.to_string()));
        }
        let Some(scenario) = self.scenarios.get(&chapter.scenario).cloned() else {
            self.logs.push(String::from(LOG_CHAPTER_UNKNOWN));
            return Err(ConfigError::UnknownScenario(chapter.scenario.clone()));
        };
        self.logs.push(String::from(LOG_CHAPTER_SELECTED));
        let init = compose_init(&scenario, Some(&chapter), self.profile.boosts);
        Ok(RunSetup {
            chapter_id: Some(chapter_id.to_string()),
            scenario,
            init,
        })
    }

    /// Resolve a scenario outside the campaign (free play). An unknown id
    /// falls back to the first catalog entry so a run is never left
    /// half-initialized.
    pub fn scenario_setup(&mut self, scenario_id: &str) -> RunSetup {
        let scenario = self.scenarios.get(scenario_id).cloned().unwrap_or_else(|| {
            log::warn!("unknown scenario {scenario_id}, falling back to default");
            self.logs.push(String::from(LOG_CHAPTER_UNKNOWN));
            self.scenarios
                .scenarios
                .first()
                .cloned()
                .unwrap_or_else(|| ScenarioCatalog::default_catalog().scenarios.remove(0))
        });
        let init = compose_init(&scenario, None, self.profile.boosts);
        RunSetup {
            chapter_id: None,
            scenario,
            init,
        }
    }

    fn grant_reward(
        profile: &mut PlayerProfile,
        chapter_id: &str,
        reward_key: &str,
        kind: &RewardKind,
    ) -> bool {
        let progress = profile.chapters.entry(chapter_id.to_string()).or_default();
        if !progress.granted_rewards.insert(reward_key.to_string()) {
            return false;
        }
        match kind {
            RewardKind::UnlockChapter(id) => {
                profile.unlocked.insert(id.clone());
            }
            RewardKind::StatBoost(boost) => profile.boosts.accumulate(*boost),
            RewardKind::BonusScore(points) => profile.total_score += points,
        }
        true
    }

    /// Record the end of a run. On victory: best score, rewards (idempotent
    /// per dedupe key), unlocks, and persistence. Returns the reward keys
    /// granted this call.
    pub fn complete_chapter(&mut self, chapter_id: &str, victory: bool, score: i64) -> Vec<String> {
        let Some(chapter) = self.chapters.get(chapter_id).cloned() else {
            self.logs.push(String::from(LOG_CHAPTER_UNKNOWN));
            return Vec::new();
        };
        {
            let progress = self.profile.chapters.entry(chapter_id.to_string()).or_default();
            progress.attempts += 1;
        }
        let mut granted = Vec::new();
        if victory {
            {
                let progress = self
                    .profile
                    .chapters
                    .entry(chapter_id.to_string())
                    .or_default();
                progress.completed = true;
                progress.best_score = progress.best_score.max(score);
            }
            self.profile.total_score += score;
            for reward in &chapter.rewards {
                if Self::grant_reward(&mut self.profile, chapter_id, &reward.key, &reward.kind) {
                    self.logs.push(String::from(LOG_REWARD_GRANTED));
                    granted.push(reward.key.clone());
                }
            }
            self.logs.push(String::from(LOG_CHAPTER_COMPLETE));
        }
        self.persist();
        granted
    }

    /// Wipe progression back to a fresh profile and persist it.
    pub fn reset_progress(&mut self) {
        self.profile = PlayerProfile::fresh(&self.chapters);
        self.logs.push(String::from(LOG_PROFILE_RESET));
        self.persist();
    }
}
