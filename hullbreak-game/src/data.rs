//! Static scenario and chapter descriptors.
//!
//! These are read-only inputs to a run; gameplay never mutates them. Built-in
//! defaults keep the engine startable without external assets, and JSON
//! catalogs can replace them wholesale.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hallucination::HallucinationConfig;
use crate::nodes::{NodeSpec, NodeThresholds, default_node_specs};

/// Starting vitals for a run. Maxima are derived from these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialStats {
    #[serde(default = "InitialStats::default_hull")]
    pub hull: i32,
    #[serde(default = "InitialStats::default_sanity")]
    pub sanity: i32,
    #[serde(default = "InitialStats::default_ap")]
    pub ap: i32,
    #[serde(default = "InitialStats::default_hand_size")]
    pub hand_size: usize,
    #[serde(default = "InitialStats::default_eco_hp")]
    pub eco_hp: i32,
}

impl Default for InitialStats {
    fn default() -> Self {
        Self {
            hull: Self::default_hull(),
            sanity: Self::default_sanity(),
            ap: Self::default_ap(),
            hand_size: Self::default_hand_size(),
            eco_hp: Self::default_eco_hp(),
        }
    }
}

impl InitialStats {
    const fn default_hull() -> i32 {
        20
    }

    const fn default_sanity() -> i32 {
        20
    }

    const fn default_ap() -> i32 {
        2
    }

    const fn default_hand_size() -> usize {
        5
    }

    const fn default_eco_hp() -> i32 {
        50
    }
}

/// Win condition declared by a scenario. Evaluated against a state snapshot;
/// evaluation reports, it never ends the run itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum VictoryCondition {
    DefeatEco,
    SurviveTurns(u32),
    ProtectNodes(u32),
    ScoreThreshold(i64),
}

/// Complete parameterization of one playable scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub initial: InitialStats,
    #[serde(default = "default_node_specs")]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub thresholds: NodeThresholds,
    #[serde(default)]
    pub hallucination: HallucinationConfig,
    /// Adversary scaling coefficient, 1.0 = baseline
    #[serde(default = "ScenarioConfig::default_difficulty")]
    pub difficulty: f32,
    #[serde(default = "ScenarioConfig::default_victory")]
    pub victory: Vec<VictoryCondition>,
}

impl ScenarioConfig {
    const fn default_difficulty() -> f32 {
        1.0
    }

    fn default_victory() -> Vec<VictoryCondition> {
        vec![VictoryCondition::DefeatEco]
    }

    /// Validate the scenario shape at catalog load.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCatalog`] naming the failed rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::InvalidCatalog(String::from(
                "scenario id must not be empty",
            )));
        }
        if self.initial.hand_size == 0 {
            return Err(ConfigError::InvalidCatalog(format!(
                "scenario {}: hand size must be positive",
                self.id
            )));
        }
        if self.victory.is_empty() {
            return Err(ConfigError::InvalidCatalog(format!(
                "scenario {}: at least one victory condition required",
                self.id
            )));
        }
        self.thresholds
            .validate()
            .map_err(|msg| ConfigError::InvalidCatalog(format!("scenario {}: {msg}", self.id)))?;
        self.hallucination
            .validate()
            .map_err(|msg| ConfigError::InvalidCatalog(format!("scenario {}: {msg}", self.id)))?;
        Ok(())
    }
}

/// Permanent stat boost granted by a reward and accumulated on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatBoost {
    #[serde(default)]
    pub hull: i32,
    #[serde(default)]
    pub sanity: i32,
    #[serde(default)]
    pub ap: i32,
}

impl StatBoost {
    pub const fn accumulate(&mut self, other: Self) {
        self.hull += other.hull;
        self.sanity += other.sanity;
        self.ap += other.ap;
    }
}

/// What a chapter reward grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    UnlockChapter(String),
    StatBoost(StatBoost),
    BonusScore(i64),
}

/// A reward with its dedupe key; granted at most once per (chapter, key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub key: String,
    pub kind: RewardKind,
}

/// Chapter-level stat modifiers layered on top of the scenario base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChapterModifiers {
    #[serde(default)]
    pub hull: i32,
    #[serde(default)]
    pub sanity: i32,
    #[serde(default)]
    pub ap: i32,
    #[serde(default)]
    pub eco_hp: i32,
}

/// One chapter of the campaign: a scenario binding plus progression wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterConfig {
    pub id: String,
    pub name: String,
    pub scenario: String,
    #[serde(default)]
    pub modifiers: ChapterModifiers,
    #[serde(default)]
    pub rewards: Vec<Reward>,
    /// Chapter that must be completed before this one unlocks
    #[serde(default)]
    pub requires: Option<String>,
}

/// Container for all scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScenarioCatalog {
    pub scenarios: Vec<ScenarioConfig>,
}

impl ScenarioCatalog {
    /// Load from JSON and validate every entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed or an entry fails
    /// validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let catalog: Self = serde_json::from_str(json)
            .map_err(|err| ConfigError::InvalidCatalog(err.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Validate all entries and id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for scenario in &self.scenarios {
            scenario.validate()?;
        }
        let mut ids: Vec<&str> = self.scenarios.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.scenarios.len() {
            return Err(ConfigError::InvalidCatalog(String::from(
                "duplicate scenario ids",
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ScenarioConfig> {
        self.scenarios.iter().find(|scenario| scenario.id == id)
    }

    /// Built-in campaign scenarios.
    #[must_use]
    pub fn default_catalog() -> Self {
        let derelict = ScenarioConfig {
            id: String::from("derelict"),
            name: String::from("The Derelict"),
            initial: InitialStats::default(),
            nodes: default_node_specs(),
            thresholds: NodeThresholds::default(),
            hallucination: HallucinationConfig::default(),
            difficulty: 1.0,
            victory: vec![VictoryCondition::DefeatEco],
        };
        let long_drift = ScenarioConfig {
            id: String::from("long_drift"),
            name: String::from("The Long Drift"),
            victory: vec![
                VictoryCondition::SurviveTurns(10),
                VictoryCondition::ProtectNodes(2),
            ],
            difficulty: 1.2,
            ..derelict.clone()
        };
        let cold_signal = ScenarioConfig {
            id: String::from("cold_signal"),
            name: String::from("Cold Signal"),
            victory: vec![
                VictoryCondition::DefeatEco,
                VictoryCondition::ScoreThreshold(2_000),
            ],
            difficulty: 1.5,
            ..derelict.clone()
        };
        Self {
            scenarios: vec![derelict, long_drift, cold_signal],
        }
    }
}

/// Container for all chapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChapterCatalog {
    pub chapters: Vec<ChapterConfig>,
}

impl ChapterCatalog {
    /// Load from JSON and validate against the scenario catalog.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed or references are broken.
    pub fn from_json(json: &str, scenarios: &ScenarioCatalog) -> Result<Self, ConfigError> {
        let catalog: Self = serde_json::from_str(json)
            .map_err(|err| ConfigError::InvalidCatalog(err.to_string()))?;
        catalog.validate(scenarios)?;
        Ok(catalog)
    }

    /// Validate scenario bindings and the unlock graph.
    ///
    /// # Errors
    ///
    /// Returns the first broken reference.
    pub fn validate(&self, scenarios: &ScenarioCatalog) -> Result<(), ConfigError> {
        for chapter in &self.chapters {
            if scenarios.get(&chapter.scenario).is_none() {
                return Err(ConfigError::InvalidCatalog(format!(
                    "chapter {} references unknown scenario {}",
                    chapter.id, chapter.scenario
                )));
            }
            if let Some(requirement) = &chapter.requires
                && self.get(requirement).is_none()
            {
                return Err(ConfigError::InvalidCatalog(format!(
                    "chapter {} requires unknown chapter {requirement}",
                    chapter.id
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChapterConfig> {
        self.chapters.iter().find(|chapter| chapter.id == id)
    }

    /// Chapters with no prerequisite; unlocked on a fresh profile.
    #[must_use]
    pub fn initially_unlocked(&self) -> Vec<&ChapterConfig> {
        self.chapters
            .iter()
            .filter(|chapter| chapter.requires.is_none())
            .collect()
    }

    /// Built-in campaign chapters.
    #[must_use]
    pub fn default_catalog() -> Self {
        Self {
            chapters: vec![
                ChapterConfig {
                    id: String::from("awakening"),
                    name: String::from("Awakening"),
                    scenario: String::from("derelict"),
                    modifiers: ChapterModifiers::default(),
                    rewards: vec![
                        Reward {
                            key: String::from("unlock_adrift"),
                            kind: RewardKind::UnlockChapter(String::from("adrift")),
                        },
                        Reward {
                            key: String::from("hull_plating"),
                            kind: RewardKind::StatBoost(StatBoost {
                                hull: 2,
                                sanity: 0,
                                ap: 0,
                            }),
                        },
                    ],
                    requires: None,
                },
                ChapterConfig {
                    id: String::from("adrift"),
                    name: String::from("Adrift"),
                    scenario: String::from("long_drift"),
                    modifiers: ChapterModifiers {
                        eco_hp: 10,
                        ..ChapterModifiers::default()
                    },
                    rewards: vec![
                        Reward {
                            key: String::from("unlock_descent"),
                            kind: RewardKind::UnlockChapter(String::from("descent")),
                        },
                        Reward {
                            key: String::from("steady_mind"),
                            kind: RewardKind::StatBoost(StatBoost {
                                hull: 0,
                                sanity: 2,
                                ap: 0,
                            }),
                        },
                    ],
                    requires: Some(String::from("awakening")),
                },
                ChapterConfig {
                    id: String::from("descent"),
                    name: String::from("Descent"),
                    scenario: String::from("cold_signal"),
                    modifiers: ChapterModifiers {
                        hull: -2,
                        eco_hp: 20,
                        ..ChapterModifiers::default()
                    },
                    rewards: vec![Reward {
                        key: String::from("final_score"),
                        kind: RewardKind::BonusScore(5_000),
                    }],
                    requires: Some(String::from("adrift")),
                },
            ],
        }
    }
}
