//! Shared game state and its change-notification contract.
//!
//! Every rules-affecting mutation funnels through [`GameStore`] so that
//! subscribers always observe a fully-applied snapshot. Notification is
//! synchronous and fires once per mutating call; batched operations (dealing
//! a hand) notify once per card to preserve presentation hooks.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::card::{Card, CardId, Suit};
use crate::data::InitialStats;
use crate::turn::Phase;

/// Player vitals. Clamped to their maxima after every adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub hull: i32,
    pub max_hull: i32,
    pub sanity: i32,
    pub max_sanity: i32,
    pub ap: i32,
    pub max_ap: i32,
}

impl Stats {
    /// Clamp every stat into `0..=max`.
    pub const fn clamp(&mut self) {
        if self.hull > self.max_hull {
            self.hull = self.max_hull;
        }
        if self.hull < 0 {
            self.hull = 0;
        }
        if self.sanity > self.max_sanity {
            self.sanity = self.max_sanity;
        }
        if self.sanity < 0 {
            self.sanity = 0;
        }
        if self.ap > self.max_ap {
            self.ap = self.max_ap;
        }
        if self.ap < 0 {
            self.ap = 0;
        }
    }
}

/// Adversary vitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EcoVitals {
    pub hp: i32,
    pub max_hp: i32,
}

/// Turn-scoped transient status effects, cleared when the player turn ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Cards of this suit cannot be played this turn
    SuitBlocked(Suit),
}

/// The single shared mutable record of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub stats: Stats,
    pub eco: EcoVitals,
    /// Ordered hand, unique by card id
    pub hand: Vec<Card>,
    pub hand_limit: usize,
    /// Starts at 1, increments only during maintenance
    pub turn: u32,
    pub phase: Phase,
    /// Turns of Eco exposure remaining; exposed Eco takes amplified damage
    pub eco_exposed_turns: u32,
    /// Card the Eco revealed while exposed, for the presentation layer
    pub revealed_card: Option<Card>,
    pub game_over: bool,
    pub victory: bool,
    pub statuses: Vec<StatusKind>,
    /// Corruption escalation level driving hallucination substitution
    pub hallucination_level: u32,
    /// Human-readable event feed of stable log keys
    pub logs: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::from_initial(&InitialStats::default())
    }
}

impl GameState {
    /// Build a fresh state from scenario initial stats.
    #[must_use]
    pub fn from_initial(init: &InitialStats) -> Self {
        Self {
            stats: Stats {
                hull: init.hull,
                max_hull: init.hull,
                sanity: init.sanity,
                max_sanity: init.sanity,
                ap: init.ap,
                max_ap: init.ap,
            },
            eco: EcoVitals {
                hp: init.eco_hp,
                max_hp: init.eco_hp,
            },
            hand: Vec::new(),
            hand_limit: init.hand_size,
            turn: 1,
            phase: Phase::Event,
            eco_exposed_turns: 0,
            revealed_card: None,
            game_over: false,
            victory: false,
            statuses: Vec::new(),
            hallucination_level: 0,
            logs: Vec::new(),
        }
    }

    #[must_use]
    pub fn hand_card(&self, id: CardId) -> Option<&Card> {
        self.hand.iter().find(|card| card.id == id)
    }

    #[must_use]
    pub fn suit_blocked(&self, suit: Suit) -> bool {
        self.statuses
            .iter()
            .any(|status| matches!(status, StatusKind::SuitBlocked(s) if *s == suit))
    }

    #[must_use]
    pub const fn eco_exposed(&self) -> bool {
        self.eco_exposed_turns > 0
    }
}

/// Handle returned by `subscribe`; dropping it does not unsubscribe, calling
/// [`Subscription::cancel`] does. Safe to cancel from inside a notification.
#[derive(Debug, Clone)]
pub struct Subscription {
    alive: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn cancel(&self) {
        self.alive.set(false);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.alive.get()
    }
}

/// Callback registry shared by the state, log, score, and profile feeds.
/// Cancellation flips a flag rather than mutating the list, so a listener
/// may unsubscribe any handle during a notification without corrupting the
/// iteration.
pub struct Listeners<T: ?Sized> {
    slots: Vec<(Rc<Cell<bool>>, Box<dyn FnMut(&T)>)>,
}

impl<T: ?Sized> Default for Listeners<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: ?Sized> std::fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.slots.len())
            .finish()
    }
}

impl<T: ?Sized> Listeners<T> {
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let alive = Rc::new(Cell::new(true));
        self.slots.push((alive.clone(), Box::new(callback)));
        Subscription { alive }
    }

    pub fn notify(&mut self, value: &T) {
        self.slots.retain(|(alive, _)| alive.get());
        for (alive, callback) in &mut self.slots {
            if alive.get() {
                callback(value);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|(alive, _)| alive.get()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owner of [`GameState`]; the only mutation path the rest of the engine
/// uses. Every mutating method leaves the state consistent before notifying.
#[derive(Debug, Default)]
pub struct GameStore {
    state: GameState,
    listeners: Listeners<GameState>,
    log_listeners: Listeners<str>,
}

impl GameStore {
    #[must_use]
    pub fn new(init: &InitialStats) -> Self {
        Self {
            state: GameState::from_initial(init),
            listeners: Listeners::default(),
            log_listeners: Listeners::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Clone the current state for victory checks and persistence.
    #[must_use]
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    /// Register a state-change listener, invoked synchronously after every
    /// mutation with the post-mutation snapshot.
    pub fn subscribe(&mut self, callback: impl FnMut(&GameState) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }

    /// Register a listener on the human-readable log feed.
    pub fn subscribe_logs(&mut self, callback: impl FnMut(&str) + 'static) -> Subscription {
        self.log_listeners.subscribe(callback)
    }

    /// Reinitialize every field from the scenario configuration. Idempotent:
    /// two consecutive resets produce identical states. Listener
    /// registrations survive a reset.
    pub fn reset(&mut self, init: &InitialStats) {
        self.state = GameState::from_initial(init);
        self.notify();
    }

    fn notify(&mut self) {
        self.listeners.notify(&self.state);
    }

    /// Append a log key to the event feed and notify log listeners.
    pub fn push_log(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.state.logs.push(key.clone());
        self.log_listeners.notify(&key);
        self.notify();
    }

    // Vitals ---------------------------------------------------------------

    /// Adjust hull by a signed delta, clamped to `0..=max`.
    pub fn adjust_hull(&mut self, delta: i32) -> i32 {
        self.state.stats.hull += delta;
        self.state.stats.clamp();
        self.notify();
        self.state.stats.hull
    }

    /// Adjust sanity by a signed delta, clamped to `0..=max`.
    pub fn adjust_sanity(&mut self, delta: i32) -> i32 {
        self.state.stats.sanity += delta;
        self.state.stats.clamp();
        self.notify();
        self.state.stats.sanity
    }

    /// Adjust AP by a signed delta, clamped to `0..=max`.
    pub fn adjust_ap(&mut self, delta: i32) -> i32 {
        self.state.stats.ap += delta;
        self.state.stats.clamp();
        self.notify();
        self.state.stats.ap
    }

    /// Spend AP if available. Returns false without mutating when short.
    pub fn spend_ap(&mut self, cost: i32) -> bool {
        if self.state.stats.ap < cost {
            return false;
        }
        self.state.stats.ap -= cost;
        self.notify();
        true
    }

    /// Reset AP to its maximum at the start of the player phase.
    pub fn refill_ap(&mut self) {
        self.state.stats.ap = self.state.stats.max_ap;
        self.notify();
    }

    /// Damage the Eco, floored at zero. Returns remaining HP.
    pub fn damage_eco(&mut self, amount: i32) -> i32 {
        self.state.eco.hp = (self.state.eco.hp - amount.max(0)).max(0);
        self.notify();
        self.state.eco.hp
    }

    pub fn heal_eco(&mut self, amount: i32) -> i32 {
        self.state.eco.hp = (self.state.eco.hp + amount.max(0)).min(self.state.eco.max_hp);
        self.notify();
        self.state.eco.hp
    }

    // Hand -----------------------------------------------------------------

    /// Add a card to the hand. Duplicate ids are ignored, preserving the
    /// unique-by-id invariant.
    pub fn push_hand_card(&mut self, card: Card) -> bool {
        if self.state.hand.iter().any(|held| held.id == card.id) {
            log::warn!("duplicate card {:?} dropped from hand insert", card.id);
            return false;
        }
        self.state.hand.push(card);
        self.notify();
        true
    }

    /// Remove a card from the hand by id.
    pub fn remove_hand_card(&mut self, id: CardId) -> Option<Card> {
        let index = self.state.hand.iter().position(|card| card.id == id)?;
        let card = self.state.hand.remove(index);
        self.notify();
        Some(card)
    }

    /// Empty the hand, returning the cards for discard.
    pub fn take_hand(&mut self) -> Vec<Card> {
        let hand = std::mem::take(&mut self.state.hand);
        self.notify();
        hand
    }

    // Phase and flags --------------------------------------------------------

    pub fn set_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.notify();
    }

    /// Advance the turn counter; legal only during maintenance.
    pub fn increment_turn(&mut self) {
        debug_assert_eq!(self.state.phase, Phase::Maintenance);
        self.state.turn += 1;
        self.notify();
    }

    pub fn set_hallucination_level(&mut self, level: u32) {
        self.state.hallucination_level = level;
        self.notify();
    }

    pub fn add_status(&mut self, status: StatusKind) {
        if !self.state.statuses.contains(&status) {
            self.state.statuses.push(status);
        }
        self.notify();
    }

    /// Drop all turn-scoped statuses at end of the player phase.
    pub fn clear_turn_statuses(&mut self) {
        self.state.statuses.clear();
        self.notify();
    }

    /// Mark the Eco exposed for the given number of turns, optionally
    /// revealing a card from its hand.
    pub fn expose_eco(&mut self, turns: u32, revealed: Option<Card>) {
        self.state.eco_exposed_turns = self.state.eco_exposed_turns.max(turns);
        self.state.revealed_card = revealed;
        self.notify();
    }

    /// Tick down exposure when the player phase ends.
    pub fn decay_exposure(&mut self) {
        if self.state.eco_exposed_turns > 0 {
            self.state.eco_exposed_turns -= 1;
            if self.state.eco_exposed_turns == 0 {
                self.state.revealed_card = None;
            }
        }
        self.notify();
    }

    /// Terminal for the run once set; phase transitions stop afterwards.
    pub fn set_game_over(&mut self, victory: bool) {
        if self.state.game_over {
            return;
        }
        self.state.game_over = true;
        self.state.victory = victory;
        self.notify();
    }

    /// Set the defeat flag when either vital hit its floor. Returns true
    /// when the run just ended.
    pub fn check_defeat(&mut self) -> bool {
        if self.state.game_over {
            return false;
        }
        if self.state.stats.hull <= 0 || self.state.stats.sanity <= 0 {
            self.set_game_over(false);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, standard_deck};
    use std::cell::RefCell;

    fn init() -> InitialStats {
        InitialStats::default()
    }

    #[test]
    fn mutations_notify_with_post_mutation_snapshot() {
        let mut store = GameStore::new(&init());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe(move |state| sink.borrow_mut().push(state.stats.hull));

        store.adjust_hull(-3);
        store.adjust_hull(-2);
        let seen = seen.borrow();
        assert_eq!(*seen, vec![17, 15]);
    }

    #[test]
    fn dealing_notifies_once_per_card() {
        let mut store = GameStore::new(&init());
        let count = Rc::new(Cell::new(0u32));
        let sink = count.clone();
        let _sub = store.subscribe(move |_| sink.set(sink.get() + 1));

        for card in standard_deck().into_iter().take(5) {
            store.push_hand_card(card);
        }
        assert_eq!(count.get(), 5);
        assert_eq!(store.state().hand.len(), 5);
    }

    #[test]
    fn unsubscribe_during_notification_is_safe() {
        let mut store = GameStore::new(&init());
        let count = Rc::new(Cell::new(0u32));

        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let inner_slot = slot.clone();
        let sink = count.clone();
        let _first = store.subscribe(move |_| {
            sink.set(sink.get() + 1);
            // Cancel the other subscription mid-notification.
            if let Some(sub) = inner_slot.borrow().as_ref() {
                sub.cancel();
            }
        });
        let other_count = Rc::new(Cell::new(0u32));
        let other_sink = other_count.clone();
        let second = store.subscribe(move |_| other_sink.set(other_sink.get() + 1));
        *slot.borrow_mut() = Some(second);

        store.adjust_hull(-1);
        store.adjust_hull(-1);
        assert_eq!(count.get(), 2);
        // Second listener fired at most once before cancellation took hold.
        assert!(other_count.get() <= 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut store = GameStore::new(&init());
        store.adjust_hull(-5);
        store.push_hand_card(standard_deck().remove(0));
        store.push_log("log.test");

        store.reset(&init());
        let once = store.snapshot();
        store.reset(&init());
        let twice = store.snapshot();
        assert_eq!(once, twice);
        assert_eq!(once.stats.hull, init().hull);
        assert!(once.hand.is_empty());
        assert!(once.logs.is_empty());
    }

    #[test]
    fn duplicate_hand_ids_are_rejected() {
        let mut store = GameStore::new(&init());
        let card = standard_deck().remove(0);
        assert!(store.push_hand_card(card.clone()));
        assert!(!store.push_hand_card(card));
        assert_eq!(store.state().hand.len(), 1);
    }

    #[test]
    fn stats_clamp_at_floors_and_ceilings() {
        let mut store = GameStore::new(&init());
        assert_eq!(store.adjust_hull(999), init().hull);
        assert_eq!(store.adjust_hull(-999), 0);
        assert!(!store.spend_ap(99));
        assert!(store.spend_ap(1));
        assert_eq!(store.state().stats.ap, init().ap - 1);
    }

    #[test]
    fn defeat_flag_is_terminal() {
        let mut store = GameStore::new(&init());
        store.adjust_hull(-999);
        assert!(store.check_defeat());
        assert!(store.state().game_over);
        assert!(!store.state().victory);
        // Further victories cannot overwrite the ended run.
        store.set_game_over(true);
        assert!(!store.state().victory);
    }

    #[test]
    fn suit_block_status_queries() {
        let mut store = GameStore::new(&init());
        store.add_status(StatusKind::SuitBlocked(Suit::Spades));
        assert!(store.state().suit_blocked(Suit::Spades));
        assert!(!store.state().suit_blocked(Suit::Hearts));
        store.clear_turn_statuses();
        assert!(!store.state().suit_blocked(Suit::Spades));
    }

    #[test]
    fn log_feed_reaches_subscribers() {
        let mut store = GameStore::new(&init());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe_logs(move |key| sink.borrow_mut().push(key.to_string()));
        store.push_log("log.run.started");
        assert_eq!(seen.borrow().as_slice(), ["log.run.started"]);
        assert_eq!(store.state().logs, vec!["log.run.started"]);
    }

    #[test]
    fn hand_lookup_by_id() {
        let mut store = GameStore::new(&init());
        let deck = standard_deck();
        let ace = deck
            .iter()
            .find(|c| c.rank == Rank::Ace)
            .cloned()
            .unwrap();
        store.push_hand_card(ace.clone());
        assert_eq!(store.state().hand_card(ace.id), Some(&ace));
        assert!(store.remove_hand_card(ace.id).is_some());
        assert!(store.remove_hand_card(ace.id).is_none());
    }
}
