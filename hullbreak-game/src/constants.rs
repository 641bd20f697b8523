//! Centralized balance and tuning constants for Hullbreak game logic.
//!
//! Keeping these together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than scattered literals.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_RUN_STARTED: &str = "log.run.started";
pub(crate) const LOG_CARD_PLAYED: &str = "log.card.played";
pub(crate) const LOG_CARD_DRAWN: &str = "log.card.drawn";
pub(crate) const LOG_CARD_UNMAPPED: &str = "log.card.unmapped";
pub(crate) const LOG_FOCUS_PERFORMED: &str = "log.focus.performed";
pub(crate) const LOG_ILLEGAL_ACTION: &str = "log.action.illegal";
pub(crate) const LOG_NODE_COLLAPSED: &str = "log.node.collapsed";
pub(crate) const LOG_NODE_RESTORED: &str = "log.node.restored";
pub(crate) const LOG_NODE_REPAIRED: &str = "log.node.repaired";
pub(crate) const LOG_NODE_DAMAGED: &str = "log.node.damaged";
pub(crate) const LOG_HALLUCINATION: &str = "log.hallucination.resolved";
pub(crate) const LOG_ECO_ATTACK: &str = "log.eco.attack";
pub(crate) const LOG_ECO_PASS: &str = "log.eco.pass";
pub(crate) const LOG_ECO_EXPOSED: &str = "log.eco.exposed";
pub(crate) const LOG_EVENT_PHASE: &str = "log.phase.event";
pub(crate) const LOG_MAINTENANCE: &str = "log.phase.maintenance";
pub(crate) const LOG_TURN_ENDED: &str = "log.turn.ended";
pub(crate) const LOG_GAME_OVER: &str = "log.game.over";
pub(crate) const LOG_GAME_VICTORY: &str = "log.game.victory";
pub(crate) const LOG_CHAPTER_SELECTED: &str = "log.chapter.selected";
pub(crate) const LOG_CHAPTER_UNKNOWN: &str = "log.chapter.unknown";
pub(crate) const LOG_CHAPTER_LOCKED: &str = "log.chapter.locked";
pub(crate) const LOG_CHAPTER_COMPLETE: &str = "log.chapter.complete";
pub(crate) const LOG_REWARD_GRANTED: &str = "log.reward.granted";
pub(crate) const LOG_PROFILE_FALLBACK: &str = "log.profile.fallback";
pub(crate) const LOG_PROFILE_RESET: &str = "log.profile.reset";

// Action costs -------------------------------------------------------------
pub(crate) const AP_COST_DRAW: i32 = 1;
pub(crate) const AP_COST_FOCUS: i32 = 1;
pub(crate) const AP_COST_PLAY: i32 = 1;
pub(crate) const AP_COST_REPAIR: i32 = 1;

// Hallucination tuning -----------------------------------------------------
pub(crate) const HALLUCINATION_BASE_CHANCE: f32 = 0.05;
pub(crate) const HALLUCINATION_CHANCE_PER_LEVEL: f32 = 0.08;
/// Never reaches 1.0 so the deck always remains drawable
pub(crate) const HALLUCINATION_MAX_CHANCE: f32 = 0.85;
pub(crate) const HALLUCINATION_STEP: u32 = 1;
pub(crate) const HALLUCINATION_FOCUS_DRAIN: i32 = 2;
pub(crate) const HALLUCINATION_HULL_DAMAGE: i32 = 1;
/// Consecutive substitutions tolerated within one deal; the sub-1.0 chance
/// cap keeps real streaks far below this
pub(crate) const HALLUCINATION_STREAK_LIMIT: u32 = 1_000;

// Eco tuning ---------------------------------------------------------------
pub(crate) const ECO_HAND_SIZE: usize = 10;
pub(crate) const ECO_BASE_EXPOSURE_CHANCE: f32 = 0.30;
pub(crate) const ECO_EXPOSED_DAMAGE_MULT: f32 = 1.5;
pub(crate) const ECO_EXPOSURE_TURNS: u32 = 1;

// Scoring tuning -----------------------------------------------------------
pub(crate) const SCORE_DAMAGE_DEALT: i64 = 10;
pub(crate) const SCORE_NODE_REPAIRED: i64 = 15;
pub(crate) const SCORE_CARD_PLAYED: i64 = 2;
pub(crate) const SCORE_TURN_SURVIVED: i64 = 25;
pub(crate) const SCORE_ECO_DEFEATED: i64 = 500;
pub(crate) const SCORE_CHAPTER_COMPLETE: i64 = 1_000;
pub(crate) const COMBO_WINDOW_MS: u64 = 5_000;
pub(crate) const COMBO_BONUS: f64 = 1.25;

// Phase pacing -------------------------------------------------------------
/// Logical-clock settle delay after the Eco attack resolves. Presentation
/// pacing only; headless tests run with zero.
pub(crate) const ECO_SETTLE_DELAY_MS: u64 = 600;
