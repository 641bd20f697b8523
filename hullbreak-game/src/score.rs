//! Scoring, multipliers, and combo tracking.
//!
//! Every gameplay event lands in an append-only ledger of score events;
//! analytics (category breakdown, performance rating) derive from the ledger
//! and never mutate it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    COMBO_BONUS, COMBO_WINDOW_MS, SCORE_CARD_PLAYED, SCORE_CHAPTER_COMPLETE, SCORE_DAMAGE_DEALT,
    SCORE_ECO_DEFEATED, SCORE_NODE_REPAIRED, SCORE_TURN_SURVIVED,
};
use crate::numbers::{i64_to_f64, round_f64_to_i64};
use crate::store::{Listeners, Subscription};

/// Category of scorable gameplay event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    DamageDealt,
    NodeRepaired,
    CardPlayed,
    TurnSurvived,
    EcoDefeated,
    ChapterComplete,
}

impl ScoreKind {
    pub const ALL: [Self; 6] = [
        Self::DamageDealt,
        Self::NodeRepaired,
        Self::CardPlayed,
        Self::TurnSurvived,
        Self::EcoDefeated,
        Self::ChapterComplete,
    ];
}

/// Base points per event kind; magnitudes multiply the base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTable {
    base: HashMap<ScoreKind, i64>,
}

impl Default for ScoreTable {
    fn default() -> Self {
        let base = HashMap::from([
            (ScoreKind::DamageDealt, SCORE_DAMAGE_DEALT),
            (ScoreKind::NodeRepaired, SCORE_NODE_REPAIRED),
            (ScoreKind::CardPlayed, SCORE_CARD_PLAYED),
            (ScoreKind::TurnSurvived, SCORE_TURN_SURVIVED),
            (ScoreKind::EcoDefeated, SCORE_ECO_DEFEATED),
            (ScoreKind::ChapterComplete, SCORE_CHAPTER_COMPLETE),
        ]);
        Self { base }
    }
}

impl ScoreTable {
    #[must_use]
    pub fn base_for(&self, kind: ScoreKind) -> i64 {
        self.base.get(&kind).copied().unwrap_or(0)
    }

    /// Override the base points for one event kind.
    pub fn set_base(&mut self, kind: ScoreKind, base: i64) {
        self.base.insert(kind, base);
    }
}

/// A score multiplier, optionally expiring at a logical-clock instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multiplier {
    pub value: f64,
    pub expires_at_ms: Option<u64>,
}

/// Rolling combo window configuration; the bonus compounds geometrically
/// with consecutive qualifying actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboConfig {
    pub window_ms: u64,
    pub bonus: f64,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            window_ms: COMBO_WINDOW_MS,
            bonus: COMBO_BONUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct ComboTrack {
    count: u32,
    last_at_ms: u64,
}

/// Immutable ledger entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub kind: ScoreKind,
    pub base: i64,
    pub magnitude: i64,
    pub multiplier: f64,
    pub combo_count: u32,
    pub points: i64,
    pub at_ms: u64,
}

/// Overall run rating derived from the final total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceRating {
    Flawless,
    Strong,
    Steady,
    Scraping,
}

impl PerformanceRating {
    #[must_use]
    pub const fn for_total(total: i64) -> Self {
        if total >= 5_000 {
            Self::Flawless
        } else if total >= 2_500 {
            Self::Strong
        } else if total >= 1_000 {
            Self::Steady
        } else {
            Self::Scraping
        }
    }
}

/// The scoring engine for one run.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    table: ScoreTable,
    combo_cfg: ComboConfig,
    multipliers: Vec<Multiplier>,
    combos: HashMap<ScoreKind, ComboTrack>,
    events: Vec<ScoreEvent>,
    total: i64,
    listeners: Listeners<ScoreEvent>,
}

impl ScoreBoard {
    #[must_use]
    pub fn new(table: ScoreTable, combo_cfg: ComboConfig) -> Self {
        Self {
            table,
            combo_cfg,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn total(&self) -> i64 {
        self.total
    }

    #[must_use]
    pub fn events(&self) -> &[ScoreEvent] {
        &self.events
    }

    /// Wipe the ledger, multipliers, and combos for a new run. Listener
    /// registrations survive.
    pub fn reset(&mut self) {
        self.multipliers.clear();
        self.combos.clear();
        self.events.clear();
        self.total = 0;
    }

    /// Register a listener fired once per appended score event.
    pub fn subscribe(&mut self, callback: impl FnMut(&ScoreEvent) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }

    /// Install a multiplier; `expires_at_ms` of `None` lasts the whole run.
    pub fn add_multiplier(&mut self, value: f64, expires_at_ms: Option<u64>) {
        self.multipliers.push(Multiplier {
            value,
            expires_at_ms,
        });
    }

    fn active_multiplier_product(&mut self, now_ms: u64) -> f64 {
        self.multipliers
            .retain(|m| m.expires_at_ms.is_none_or(|at| at > now_ms));
        self.multipliers.iter().map(|m| m.value).product()
    }

    fn bump_combo(&mut self, kind: ScoreKind, now_ms: u64) -> u32 {
        let window = self.combo_cfg.window_ms;
        let track = self
            .combos
            .entry(kind)
            .or_insert(ComboTrack {
                count: 0,
                last_at_ms: now_ms,
            });
        if track.count > 0 && now_ms.saturating_sub(track.last_at_ms) <= window {
            track.count += 1;
        } else {
            track.count = 1;
        }
        track.last_at_ms = now_ms;
        track.count
    }

    /// Reset every combo counter; called when a disqualifying event (for
    /// example, taking a hit) interrupts the flow.
    pub fn break_combos(&mut self) {
        self.combos.clear();
    }

    /// Record a scorable event. `magnitude` multiplies the base table value
    /// (for example, points of damage dealt); the result is scaled by all
    /// active multipliers and the compounding combo bonus, then appended to
    /// the ledger.
    pub fn add_score(&mut self, kind: ScoreKind, magnitude: i64, now_ms: u64) -> i64 {
        let base = self.table.base_for(kind);
        let product = self.active_multiplier_product(now_ms);
        let combo_count = self.bump_combo(kind, now_ms);
        let combo_bonus = self.combo_cfg.bonus.powi(combo_count.saturating_sub(1) as i32);
        let multiplier = product * combo_bonus;
        let points = round_f64_to_i64(i64_to_f64(base * magnitude) * multiplier).max(0);

        let event = ScoreEvent {
            kind,
            base,
            magnitude,
            multiplier,
            combo_count,
            points,
            at_ms: now_ms,
        };
        self.total += points;
        self.listeners.notify(&event);
        self.events.push(event);
        points
    }

    /// Total points per category, derived from the ledger.
    #[must_use]
    pub fn breakdown(&self) -> HashMap<ScoreKind, i64> {
        let mut out = HashMap::new();
        for event in &self.events {
            *out.entry(event.kind).or_insert(0) += event.points;
        }
        out
    }

    #[must_use]
    pub const fn rating(&self) -> PerformanceRating {
        PerformanceRating::for_total(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_points_scale_with_magnitude() {
        let mut board = ScoreBoard::default();
        let points = board.add_score(ScoreKind::DamageDealt, 5, 0);
        assert_eq!(points, 50);
        assert_eq!(board.total(), 50);
    }

    #[test]
    fn combo_compounds_geometrically_inside_window() {
        let mut board = ScoreBoard::default();
        let first = board.add_score(ScoreKind::CardPlayed, 1, 0);
        let second = board.add_score(ScoreKind::CardPlayed, 1, 1_000);
        let third = board.add_score(ScoreKind::CardPlayed, 1, 2_000);
        assert_eq!(first, 2);
        // 2 * 1.25 rounds to 3, 2 * 1.5625 rounds to 3.
        assert_eq!(second, 3);
        assert_eq!(third, 3);
        assert_eq!(board.events()[2].combo_count, 3);
    }

    #[test]
    fn combo_resets_outside_window() {
        let mut board = ScoreBoard::default();
        board.add_score(ScoreKind::CardPlayed, 1, 0);
        let late = board.add_score(ScoreKind::CardPlayed, 1, COMBO_WINDOW_MS + 1);
        assert_eq!(late, 2);
        assert_eq!(board.events()[1].combo_count, 1);
    }

    #[test]
    fn break_combos_resets_all_counters() {
        let mut board = ScoreBoard::default();
        board.add_score(ScoreKind::CardPlayed, 1, 0);
        board.break_combos();
        board.add_score(ScoreKind::CardPlayed, 1, 100);
        assert_eq!(board.events()[1].combo_count, 1);
    }

    #[test]
    fn multipliers_expire_on_the_logical_clock() {
        let mut board = ScoreBoard::default();
        board.add_multiplier(2.0, Some(1_000));
        let boosted = board.add_score(ScoreKind::DamageDealt, 1, 500);
        assert_eq!(boosted, 20);
        let expired = board.add_score(ScoreKind::DamageDealt, 1, 20_000);
        assert_eq!(expired, 10);
    }

    #[test]
    fn ledger_is_append_only_and_supports_breakdown() {
        let mut board = ScoreBoard::default();
        board.add_score(ScoreKind::DamageDealt, 2, 0);
        board.add_score(ScoreKind::NodeRepaired, 1, 60_000);
        let breakdown = board.breakdown();
        assert_eq!(breakdown[&ScoreKind::DamageDealt], 20);
        assert_eq!(breakdown[&ScoreKind::NodeRepaired], 15);
        assert_eq!(board.events().len(), 2);
    }

    #[test]
    fn subscribers_see_each_event() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut board = ScoreBoard::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = board.subscribe(move |event| sink.borrow_mut().push(event.points));
        board.add_score(ScoreKind::TurnSurvived, 1, 0);
        assert_eq!(seen.borrow().as_slice(), [25]);
    }

    #[test]
    fn rating_bands() {
        assert_eq!(PerformanceRating::for_total(0), PerformanceRating::Scraping);
        assert_eq!(PerformanceRating::for_total(1_200), PerformanceRating::Steady);
        assert_eq!(PerformanceRating::for_total(2_600), PerformanceRating::Strong);
        assert_eq!(
            PerformanceRating::for_total(9_999),
            PerformanceRating::Flawless
        );
    }
}
