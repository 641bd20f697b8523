//! Eco adversary decision logic.
//!
//! The Eco draws its hand once at run start and never replenishes it from
//! player mechanics. Each combat phase it selects one card by a
//! difficulty-scaled policy and resolves it against the player; an empty
//! hand is a pass, never a fault.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::card::{Card, Suit};
use crate::constants::{ECO_BASE_EXPOSURE_CHANCE, ECO_EXPOSED_DAMAGE_MULT};
use crate::numbers::round_f32_to_i32;

/// What the Eco chose to do this phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcoAction {
    /// Hand exhausted; forward progress without an attack
    Pass,
    /// Play the given card against the player
    Play(Card),
}

/// Outcome of one decision, including whether the Eco slipped and revealed
/// itself while acting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcoDecision {
    pub action: EcoAction,
    pub exposed_self: bool,
}

/// The adversary's private state for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcoMind {
    hand: Vec<Card>,
    /// Scaling coefficient; 1.0 = baseline, higher is harsher
    difficulty: f32,
    exposure_chance: f32,
}

impl EcoMind {
    #[must_use]
    pub fn new(hand: Vec<Card>, difficulty: f32) -> Self {
        let difficulty = difficulty.max(0.1);
        Self {
            hand,
            difficulty,
            // Careless at low difficulty, disciplined at high.
            exposure_chance: (ECO_BASE_EXPOSURE_CHANCE / difficulty).min(0.95),
        }
    }

    #[must_use]
    pub fn hand_len(&self) -> usize {
        self.hand.len()
    }

    #[must_use]
    pub const fn difficulty(&self) -> f32 {
        self.difficulty
    }

    /// Select and remove the card for this attack. Prefers the
    /// highest-value Spade, falling back to the highest-value card overall.
    fn pick_card(&mut self) -> Option<Card> {
        if self.hand.is_empty() {
            return None;
        }
        let index = self
            .hand
            .iter()
            .enumerate()
            .filter(|(_, card)| card.suit == Suit::Spades)
            .max_by_key(|(_, card)| card.value())
            .map(|(i, _)| i)
            .or_else(|| {
                self.hand
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, card)| card.value())
                    .map(|(i, _)| i)
            })?;
        Some(self.hand.remove(index))
    }

    /// Card shown to the player while the Eco is exposed.
    #[must_use]
    pub fn reveal(&self) -> Option<Card> {
        self.hand.iter().max_by_key(|card| card.value()).cloned()
    }

    /// One decision per ECO_ATTACK invocation.
    pub fn decide(&mut self, rng: &mut impl Rng) -> EcoDecision {
        let Some(card) = self.pick_card() else {
            return EcoDecision {
                action: EcoAction::Pass,
                exposed_self: false,
            };
        };
        let exposed_self = rng.r#gen::<f32>() < self.exposure_chance;
        EcoDecision {
            action: EcoAction::Play(card),
            exposed_self,
        }
    }

    /// Scale an outgoing damage amount by the difficulty coefficient.
    #[must_use]
    pub fn scale_damage(&self, base: i32) -> i32 {
        round_f32_to_i32(base as f32 * self.difficulty).max(0)
    }

    /// Scale damage the Eco receives while exposed.
    #[must_use]
    pub fn amplify_incoming(base: i32, exposed: bool) -> i32 {
        if exposed {
            round_f32_to_i32(base as f32 * ECO_EXPOSED_DAMAGE_MULT)
        } else {
            base
        }
    }
}
