//! Creeping corruption and hallucination draws.
//!
//! The corruption level rises by a fixed step every maintenance cycle. At
//! draw time a roll against the level's chance may substitute a hallucination
//! for a real card; the substitute resolves immediately and never enters the
//! visible hand. The chance curve is capped below 100% so the deck always
//! stays drawable.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::card::{Card, CardId, HallucinationCard, HallucinationEffect, Rank, Suit};
use crate::constants::{
    HALLUCINATION_BASE_CHANCE, HALLUCINATION_CHANCE_PER_LEVEL, HALLUCINATION_FOCUS_DRAIN,
    HALLUCINATION_HULL_DAMAGE, HALLUCINATION_MAX_CHANCE, HALLUCINATION_STEP,
};

/// Tunable curve for the substitution chance. `max_chance` must stay below
/// 1.0; `validate` enforces it at catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HallucinationConfig {
    #[serde(default = "HallucinationConfig::default_base_chance")]
    pub base_chance: f32,
    #[serde(default = "HallucinationConfig::default_chance_per_level")]
    pub chance_per_level: f32,
    #[serde(default = "HallucinationConfig::default_max_chance")]
    pub max_chance: f32,
    /// Fixed level increment applied each maintenance phase
    #[serde(default = "HallucinationConfig::default_step")]
    pub step: u32,
}

impl Default for HallucinationConfig {
    fn default() -> Self {
        Self {
            base_chance: Self::default_base_chance(),
            chance_per_level: Self::default_chance_per_level(),
            max_chance: Self::default_max_chance(),
            step: Self::default_step(),
        }
    }
}

impl HallucinationConfig {
    const fn default_base_chance() -> f32 {
        HALLUCINATION_BASE_CHANCE
    }

    const fn default_chance_per_level() -> f32 {
        HALLUCINATION_CHANCE_PER_LEVEL
    }

    const fn default_max_chance() -> f32 {
        HALLUCINATION_MAX_CHANCE
    }

    const fn default_step() -> u32 {
        HALLUCINATION_STEP
    }

    /// Validate curve bounds.
    ///
    /// # Errors
    ///
    /// Returns a message when the cap would make the deck un-drawable or the
    /// curve is not monotonic.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.max_chance) {
            return Err(String::from("hallucination max_chance must be below 1.0"));
        }
        if self.base_chance < 0.0 || self.chance_per_level < 0.0 {
            return Err(String::from("hallucination curve must be non-decreasing"));
        }
        Ok(())
    }
}

/// Runtime corruption state for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HallucinationState {
    pub level: u32,
    #[serde(default)]
    pub config: HallucinationConfig,
}

impl HallucinationState {
    #[must_use]
    pub const fn new(config: HallucinationConfig) -> Self {
        Self { level: 0, config }
    }

    /// Raise the corruption level by the configured step. Called at the end
    /// of every maintenance phase.
    pub const fn escalate(&mut self) -> u32 {
        self.level += self.config.step;
        self.level
    }

    /// Chance that the next draw is substituted. Monotonic in level, capped
    /// strictly below 1.0.
    #[must_use]
    pub fn draw_chance(&self) -> f32 {
        let raw = self.config.base_chance + self.config.chance_per_level * self.level as f32;
        raw.min(self.config.max_chance)
    }

    /// Roll whether the next draw is substituted by a hallucination.
    pub fn roll(&self, rng: &mut impl Rng) -> bool {
        rng.r#gen::<f32>() < self.draw_chance()
    }

    /// Produce the hallucination that replaces a draw. The carried card is a
    /// phantom (id outside the standard deck range) used only for logging
    /// and art lookup.
    pub fn conjure(&self, rng: &mut impl Rng) -> HallucinationCard {
        let effect = match rng.gen_range(0..3u8) {
            0 => HallucinationEffect::DrainSanity(HALLUCINATION_FOCUS_DRAIN),
            1 => HallucinationEffect::HullDamage(HALLUCINATION_HULL_DAMAGE),
            _ => HallucinationEffect::ForceDiscard(1),
        };
        let mut card = Card::new(CardId(1000 + self.level as u16), Suit::Spades, Rank::Ace);
        card.art = String::from("cards/hallucination");
        HallucinationCard { card, effect }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn chance_is_monotonic_and_capped() {
        let mut state = HallucinationState::default();
        let mut previous = state.draw_chance();
        for _ in 0..50 {
            state.escalate();
            let chance = state.draw_chance();
            assert!(chance >= previous);
            assert!(chance < 1.0);
            previous = chance;
        }
        assert!((previous - state.config.max_chance).abs() < f32::EPSILON);
    }

    #[test]
    fn escalate_applies_configured_step() {
        let mut state = HallucinationState::new(HallucinationConfig {
            step: 3,
            ..HallucinationConfig::default()
        });
        assert_eq!(state.escalate(), 3);
        assert_eq!(state.escalate(), 6);
    }

    #[test]
    fn validation_rejects_certain_substitution() {
        let config = HallucinationConfig {
            max_chance: 1.0,
            ..HallucinationConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(HallucinationConfig::default().validate().is_ok());
    }

    #[test]
    fn conjured_cards_sit_outside_the_deck_id_range() {
        let state = HallucinationState::default();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let hallucination = state.conjure(&mut rng);
        assert!(hallucination.card.id.0 >= 1000);
    }
}
