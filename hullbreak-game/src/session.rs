//! Run orchestration: phases, commands, and effect application.
//!
//! [`GameSession`] binds the store, decks, nodes, adversary, corruption, and
//! scoring into one facade. Every player command is validated here (phase,
//! AP, suit locks) and every atomic effect funnels through the store, so
//! subscribers always observe consistent snapshots. Deferred transitions run
//! on the logical clock via [`Scheduler`]; hosts drive it with [`advance`].
//!
//! [`advance`]: GameSession::advance

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::card::{Card, CardId, HallucinationEffect, Suit};
use crate::chapter::{RunSetup, VictoryReport, check_victory_conditions};
use crate::constants::{
    AP_COST_DRAW, AP_COST_FOCUS, AP_COST_PLAY, AP_COST_REPAIR, ECO_EXPOSURE_TURNS, ECO_HAND_SIZE,
    ECO_SETTLE_DELAY_MS, HALLUCINATION_STREAK_LIMIT, LOG_CARD_DRAWN, LOG_CARD_PLAYED,
    LOG_CARD_UNMAPPED, LOG_ECO_ATTACK,
    LOG_ECO_EXPOSED, LOG_ECO_PASS, LOG_EVENT_PHASE, LOG_FOCUS_PERFORMED, LOG_GAME_OVER,
    LOG_GAME_VICTORY, LOG_HALLUCINATION, LOG_ILLEGAL_ACTION, LOG_MAINTENANCE, LOG_NODE_DAMAGED,
    LOG_NODE_REPAIRED, LOG_RUN_STARTED, LOG_TURN_ENDED,
};
use crate::data::{InitialStats, ScenarioConfig};
use crate::deck::DeckManager;
use crate::eco::{EcoAction, EcoMind};
use crate::effects::{Effect, EffectCatalog};
use crate::error::CommandError;
use crate::hallucination::HallucinationState;
use crate::nodes::NodeSystem;
use crate::score::{ScoreBoard, ScoreEvent, ScoreKind};
use crate::store::{GameState, GameStore, StatusKind, Subscription};
use crate::turn::{CommandOutcome, Continuation, Phase, Scheduler, gate_phase};

/// One run of the game, from deal to game over.
#[derive(Debug)]
pub struct GameSession {
    scenario: ScenarioConfig,
    init: InitialStats,
    store: GameStore,
    decks: DeckManager,
    nodes: NodeSystem,
    hallucination: HallucinationState,
    eco: EcoMind,
    catalog: EffectCatalog,
    score: ScoreBoard,
    scheduler: Scheduler,
    rng: ChaCha20Rng,
    seed: u64,
    settle_delay_ms: u64,
    /// Campaign binding; `None` for free play
    chapter_id: Option<String>,
}

impl GameSession {
    /// Start a run with freshly shuffled decks. The seed fixes every random
    /// outcome, so equal seeds replay identical runs.
    #[must_use]
    pub fn new(scenario: ScenarioConfig, init: InitialStats, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let decks = DeckManager::new_run(&mut rng);
        Self::assemble(scenario, init, decks, rng, seed)
    }

    /// Start a run from a composed setup, keeping its campaign binding.
    #[must_use]
    pub fn from_setup(setup: RunSetup, seed: u64) -> Self {
        let mut session = Self::new(setup.scenario, setup.init, seed);
        session.chapter_id = setup.chapter_id;
        session
    }

    /// Start a run with caller-supplied decks, for scripted runs and tooling.
    #[must_use]
    pub fn with_decks(
        scenario: ScenarioConfig,
        init: InitialStats,
        decks: DeckManager,
        seed: u64,
    ) -> Self {
        let rng = ChaCha20Rng::seed_from_u64(seed);
        Self::assemble(scenario, init, decks, rng, seed)
    }

    fn assemble(
        scenario: ScenarioConfig,
        init: InitialStats,
        mut decks: DeckManager,
        mut rng: ChaCha20Rng,
        seed: u64,
    ) -> Self {
        let eco_hand = decks.eco.draw(ECO_HAND_SIZE, &mut rng);
        let eco = EcoMind::new(eco_hand, scenario.difficulty);
        let nodes = NodeSystem::initialize(&scenario.nodes, scenario.thresholds);
        let hallucination = HallucinationState::new(scenario.hallucination);
        let store = GameStore::new(&init);
        let mut session = Self {
            scenario,
            init,
            store,
            decks,
            nodes,
            hallucination,
            eco,
            catalog: EffectCatalog::default(),
            score: ScoreBoard::default(),
            scheduler: Scheduler::default(),
            rng,
            seed,
            settle_delay_ms: ECO_SETTLE_DELAY_MS,
            chapter_id: None,
        };
        session.open_run();
        session
    }

    /// Abandon the current run and start over from the same seed. Pending
    /// continuations are invalidated first so nothing from the old run can
    /// fire into the new one. Listener registrations survive.
    pub fn reset(&mut self) {
        self.scheduler.invalidate();
        self.rng = ChaCha20Rng::seed_from_u64(self.seed);
        self.store.reset(&self.init);
        self.decks = DeckManager::new_run(&mut self.rng);
        self.nodes = NodeSystem::initialize(&self.scenario.nodes, self.scenario.thresholds);
        self.hallucination = HallucinationState::new(self.scenario.hallucination);
        let eco_hand = self.decks.eco.draw(ECO_HAND_SIZE, &mut self.rng);
        self.eco = EcoMind::new(eco_hand, self.scenario.difficulty);
        self.score.reset();
        self.open_run();
    }

    fn open_run(&mut self) {
        self.store.push_log(LOG_RUN_STARTED);
        self.store.push_log(LOG_EVENT_PHASE);
        let hand_limit = self.store.state().hand_limit;
        self.draw_to_hand(hand_limit);
        if self.store.state().game_over {
            return;
        }
        self.store.refill_ap();
        self.store.set_phase(Phase::PlayerAction);
    }

    // Accessors --------------------------------------------------------------

    #[must_use]
    pub const fn state(&self) -> &GameState {
        self.store.state()
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeSystem {
        &self.nodes
    }

    #[must_use]
    pub fn score(&self) -> &ScoreBoard {
        &self.score
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    #[must_use]
    pub fn eco_hand_len(&self) -> usize {
        self.eco.hand_len()
    }

    #[must_use]
    pub fn chapter_id(&self) -> Option<&str> {
        self.chapter_id.as_deref()
    }

    /// Replace the default effect catalog, for modded rule sets. Takes
    /// effect from the next resolution.
    pub fn set_effect_catalog(&mut self, catalog: EffectCatalog) {
        self.catalog = catalog;
    }

    /// Override the post-attack settle delay. Zero runs maintenance in the
    /// same call as `end_player_turn`, which headless hosts want.
    pub const fn set_settle_delay_ms(&mut self, ms: u64) {
        self.settle_delay_ms = ms;
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&GameState) + 'static) -> Subscription {
        self.store.subscribe(callback)
    }

    pub fn subscribe_logs(&mut self, callback: impl FnMut(&str) + 'static) -> Subscription {
        self.store.subscribe_logs(callback)
    }

    pub fn subscribe_score(&mut self, callback: impl FnMut(&ScoreEvent) + 'static) -> Subscription {
        self.score.subscribe(callback)
    }

    /// Evaluate the scenario's victory conditions against the live state.
    #[must_use]
    pub fn victory_report(&self) -> VictoryReport {
        check_victory_conditions(
            &self.scenario.victory,
            self.store.state(),
            &self.nodes,
            self.score.total(),
        )
    }

    // Clock ------------------------------------------------------------------

    /// Move the logical clock forward and run any continuations that came
    /// due. Hosts call this from their frame loop or, headless, with the
    /// exact delay.
    pub fn advance(&mut self, delta_ms: u64) {
        for continuation in self.scheduler.advance(delta_ms) {
            match continuation {
                Continuation::EcoSettled => self.run_maintenance(),
            }
        }
    }

    #[must_use]
    pub fn transition_pending(&self) -> bool {
        self.scheduler.pending()
    }

    // Commands ---------------------------------------------------------------

    fn gate(&self, required: Phase) -> Result<(), CommandError> {
        let state = self.store.state();
        gate_phase(state.game_over, state.phase, required)
    }

    fn reject(&mut self, err: CommandError) -> CommandOutcome {
        log::debug!("command rejected: {err}");
        self.store.push_log(LOG_ILLEGAL_ACTION);
        CommandOutcome::Rejected(err)
    }

    fn charge_ap(&mut self, cost: i32) -> Result<(), CommandError> {
        let available = self.store.state().stats.ap;
        if self.store.spend_ap(cost) {
            Ok(())
        } else {
            Err(CommandError::InsufficientAp {
                needed: cost,
                available,
            })
        }
    }

    /// Play a card from the hand. Costs one AP; the card's effects resolve
    /// in catalog order and the card lands in the discard pile.
    pub fn play_card(&mut self, id: CardId) -> CommandOutcome {
        if let Err(err) = self.gate(Phase::PlayerAction) {
            return self.reject(err);
        }
        let Some(card) = self.store.state().hand_card(id).cloned() else {
            return self.reject(CommandError::CardNotInHand(id));
        };
        if self.store.state().suit_blocked(card.suit) {
            return self.reject(CommandError::SuitBlocked);
        }
        if let Err(err) = self.charge_ap(AP_COST_PLAY) {
            return self.reject(err);
        }
        self.store.remove_hand_card(id);
        let effects = self.catalog.resolve_card(&card);
        if effects.is_empty() {
            self.store.push_log(LOG_CARD_UNMAPPED);
        }
        self.store.push_log(LOG_CARD_PLAYED);
        self.score
            .add_score(ScoreKind::CardPlayed, 1, self.scheduler.now_ms());
        for effect in effects {
            self.apply_effect(effect, false);
            if self.store.state().game_over {
                break;
            }
        }
        self.decks.player.discard_one(card);
        CommandOutcome::Accepted
    }

    /// Draw one card for one AP. Rejected when the hand is full.
    pub fn draw_card(&mut self) -> CommandOutcome {
        if let Err(err) = self.gate(Phase::PlayerAction) {
            return self.reject(err);
        }
        if self.store.state().hand.len() >= self.store.state().hand_limit {
            return self.reject(CommandError::HandFull);
        }
        if let Err(err) = self.charge_ap(AP_COST_DRAW) {
            return self.reject(err);
        }
        self.draw_to_hand(1);
        CommandOutcome::Accepted
    }

    /// Discard a chosen card and draw a replacement, for one AP.
    pub fn perform_focus(&mut self, discard: CardId) -> CommandOutcome {
        if let Err(err) = self.gate(Phase::PlayerAction) {
            return self.reject(err);
        }
        if self.store.state().hand_card(discard).is_none() {
            return self.reject(CommandError::CardNotInHand(discard));
        }
        if let Err(err) = self.charge_ap(AP_COST_FOCUS) {
            return self.reject(err);
        }
        if let Some(card) = self.store.remove_hand_card(discard) {
            self.decks.player.discard_one(card);
        }
        self.store.push_log(LOG_FOCUS_PERFORMED);
        self.draw_to_hand(1);
        CommandOutcome::Accepted
    }

    /// Spend Clubs cards to repair a node, for one AP. Each card repairs
    /// half its value rounded up; the cards are discarded.
    pub fn repair_node(&mut self, node_id: &str, card_ids: &[CardId]) -> CommandOutcome {
        if let Err(err) = self.gate(Phase::PlayerAction) {
            return self.reject(err);
        }
        if self.nodes.get(node_id).is_none() {
            return self.reject(CommandError::UnknownNode(node_id.to_string()));
        }
        if card_ids.is_empty() {
            return self.reject(CommandError::WrongSuit);
        }
        let mut spent: Vec<Card> = Vec::with_capacity(card_ids.len());
        for id in card_ids {
            if spent.iter().any(|card| card.id == *id) {
                return self.reject(CommandError::CardNotInHand(*id));
            }
            let Some(card) = self.store.state().hand_card(*id).cloned() else {
                return self.reject(CommandError::CardNotInHand(*id));
            };
            if card.suit != Suit::Clubs {
                return self.reject(CommandError::WrongSuit);
            }
            spent.push(card);
        }
        if self.store.state().suit_blocked(Suit::Clubs) {
            return self.reject(CommandError::SuitBlocked);
        }
        if let Err(err) = self.charge_ap(AP_COST_REPAIR) {
            return self.reject(err);
        }
        let amount: i32 = spent.iter().map(|card| (card.value() + 1) / 2).sum();
        for card in spent {
            if let Some(card) = self.store.remove_hand_card(card.id) {
                self.decks.player.discard_one(card);
            }
        }
        self.apply_repair(node_id, amount);
        CommandOutcome::Accepted
    }

    /// End the player phase: statuses clear, exposure ticks down, the Eco
    /// attacks, and after the settle delay maintenance runs and the next
    /// turn begins. Decaying exposure here means an exposure inflicted
    /// during the Eco's attack stays live through the whole following
    /// player phase.
    pub fn end_player_turn(&mut self) -> CommandOutcome {
        if let Err(err) = self.gate(Phase::PlayerAction) {
            return self.reject(err);
        }
        self.store.clear_turn_statuses();
        self.store.decay_exposure();
        self.store.push_log(LOG_TURN_ENDED);
        self.store.set_phase(Phase::EcoAttack);
        self.run_eco_attack();
        if self.store.state().game_over {
            return CommandOutcome::Accepted;
        }
        self.scheduler
            .schedule(self.settle_delay_ms, Continuation::EcoSettled);
        if self.settle_delay_ms == 0 {
            self.advance(0);
        }
        CommandOutcome::Accepted
    }

    // Phase internals --------------------------------------------------------

    fn run_eco_attack(&mut self) {
        let decision = self.eco.decide(&mut self.rng);
        match decision.action {
            EcoAction::Pass => {
                self.store.push_log(LOG_ECO_PASS);
            }
            EcoAction::Play(card) => {
                self.store.push_log(LOG_ECO_ATTACK);
                let effects = self.catalog.resolve_eco_card(&card);
                if effects.is_empty() {
                    self.store.push_log(LOG_CARD_UNMAPPED);
                }
                for effect in effects {
                    self.apply_effect(effect, true);
                    if self.store.state().game_over {
                        break;
                    }
                }
                self.decks.eco.discard_one(card);
                if decision.exposed_self && !self.store.state().game_over {
                    self.expose_eco();
                }
            }
        }
    }

    fn run_maintenance(&mut self) {
        if self.store.state().game_over {
            return;
        }
        self.store.set_phase(Phase::Maintenance);
        self.store.push_log(LOG_MAINTENANCE);
        let hand = self.store.take_hand();
        self.decks.player.discard(hand);
        // Corruption rises before the redraw so the fresh hand rolls at the
        // new level.
        let level = self.hallucination.escalate();
        self.store.set_hallucination_level(level);
        let hand_limit = self.store.state().hand_limit;
        self.draw_to_hand(hand_limit);
        if self.store.state().game_over {
            return;
        }
        self.score
            .add_score(ScoreKind::TurnSurvived, 1, self.scheduler.now_ms());
        self.store.increment_turn();
        self.evaluate_victory();
        if self.store.state().game_over {
            return;
        }
        self.store.set_phase(Phase::Event);
        self.store.push_log(LOG_EVENT_PHASE);
        self.store.refill_ap();
        self.store.set_phase(Phase::PlayerAction);
    }

    fn evaluate_victory(&mut self) {
        if self.store.state().game_over {
            return;
        }
        if self.victory_report().all_met() {
            if self.chapter_id.is_some() {
                self.score
                    .add_score(ScoreKind::ChapterComplete, 1, self.scheduler.now_ms());
            }
            self.store.set_game_over(true);
            self.store.push_log(LOG_GAME_VICTORY);
        }
    }

    fn check_defeat(&mut self) {
        if self.store.check_defeat() {
            self.store.push_log(LOG_GAME_OVER);
        }
    }

    fn expose_eco(&mut self) {
        let revealed = self.eco.reveal();
        self.store.expose_eco(ECO_EXPOSURE_TURNS, revealed);
        self.store.push_log(LOG_ECO_EXPOSED);
    }

    // Draw pipeline ----------------------------------------------------------

    /// Draw up to `n` cards into the hand. Each draw first rolls against the
    /// corruption level; a substituted draw resolves its hallucination
    /// immediately, never enters the hand, and is redrawn. The loop targets
    /// the resulting hand size, so substitutions and any cards a
    /// hallucination forces out mid-deal are both made good. A deal only
    /// comes up short when the deck itself runs dry.
    fn draw_to_hand(&mut self, n: usize) {
        let target = (self.store.state().hand.len() + n).min(self.store.state().hand_limit);
        // Only consecutive substitutions are bounded; the chance cap keeps
        // any real streak far shorter than the limit.
        let mut streak = 0;
        while self.store.state().hand.len() < target && streak < HALLUCINATION_STREAK_LIMIT {
            if self.hallucination.roll(&mut self.rng) {
                streak += 1;
                let hallucination = self.hallucination.conjure(&mut self.rng);
                self.store.push_log(LOG_HALLUCINATION);
                self.resolve_hallucination(hallucination.effect);
                if self.store.state().game_over {
                    return;
                }
                continue;
            }
            streak = 0;
            let Some(card) = self.decks.player.draw(1, &mut self.rng).pop() else {
                break;
            };
            self.store.push_hand_card(card);
            self.store.push_log(LOG_CARD_DRAWN);
        }
    }

    fn resolve_hallucination(&mut self, effect: HallucinationEffect) {
        match effect {
            HallucinationEffect::DrainSanity(amount) => {
                self.store.adjust_sanity(-amount);
            }
            HallucinationEffect::HullDamage(amount) => {
                self.store.adjust_hull(-amount);
            }
            HallucinationEffect::ForceDiscard(count) => self.force_discard(count),
        }
        self.score.break_combos();
        self.check_defeat();
    }

    fn force_discard(&mut self, count: u32) {
        for _ in 0..count {
            let len = self.store.state().hand.len();
            if len == 0 {
                break;
            }
            let index = self.rng.gen_range(0..len);
            let id = self.store.state().hand[index].id;
            if let Some(card) = self.store.remove_hand_card(id) {
                self.decks.player.discard_one(card);
            }
        }
    }

    // Effect application -----------------------------------------------------

    fn apply_repair(&mut self, node_id: &str, amount: i32) {
        let Some(change) = self.nodes.repair_node(node_id, amount) else {
            return;
        };
        if change.applied > 0 {
            self.store.push_log(LOG_NODE_REPAIRED);
            self.score
                .add_score(ScoreKind::NodeRepaired, 1, self.scheduler.now_ms());
        }
        if let Some(key) = change.transition_log {
            self.store.push_log(key);
        }
    }

    fn apply_effect(&mut self, effect: Effect, from_eco: bool) {
        match effect {
            Effect::DamageEco(base) => {
                let amount = EcoMind::amplify_incoming(base, self.store.state().eco_exposed());
                let before = self.store.state().eco.hp;
                let after = self.store.damage_eco(amount);
                let dealt = before - after;
                if dealt > 0 {
                    self.score.add_score(
                        ScoreKind::DamageDealt,
                        i64::from(dealt),
                        self.scheduler.now_ms(),
                    );
                }
                if before > 0 && after == 0 {
                    self.score
                        .add_score(ScoreKind::EcoDefeated, 1, self.scheduler.now_ms());
                    self.evaluate_victory();
                }
            }
            Effect::DamagePlayer(base) => {
                let amount = if from_eco {
                    self.eco.scale_damage(base)
                } else {
                    base
                };
                self.store.adjust_hull(-amount);
                self.score.break_combos();
                self.check_defeat();
            }
            Effect::HealHull(amount) => {
                self.store.adjust_hull(amount);
            }
            Effect::RestoreSanity(amount) => {
                self.store.adjust_sanity(amount);
            }
            Effect::DrainSanity(base) => {
                let amount = if from_eco {
                    self.eco.scale_damage(base)
                } else {
                    base
                };
                self.store.adjust_sanity(-amount);
                self.score.break_combos();
                self.check_defeat();
            }
            Effect::GainAp(amount) => {
                self.store.adjust_ap(amount);
            }
            Effect::DrawCards(count) => self.draw_to_hand(count as usize),
            Effect::ForceDiscard(count) => self.force_discard(count),
            Effect::RepairWeakestNode(amount) => {
                if let Some(id) = self.nodes.most_damaged().map(|node| node.id.clone()) {
                    self.apply_repair(&id, amount);
                }
            }
            Effect::DamageRandomNode(amount) => {
                let targets: Vec<String> = self
                    .nodes
                    .nodes()
                    .iter()
                    .filter(|node| !node.collapsed)
                    .map(|node| node.id.clone())
                    .collect();
                if targets.is_empty() {
                    return;
                }
                let id = &targets[self.rng.gen_range(0..targets.len())];
                if let Some(change) = self.nodes.damage_node(id, amount) {
                    self.store.push_log(LOG_NODE_DAMAGED);
                    if let Some(key) = change.transition_log {
                        self.store.push_log(key);
                    }
                }
            }
            Effect::BlockSuit(suit) => self.store.add_status(StatusKind::SuitBlocked(suit)),
            Effect::ExposeEco => self.expose_eco(),
        }
    }
}
