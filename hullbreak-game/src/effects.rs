//! Card effect resolution.
//!
//! A played card maps, via a data-driven catalog keyed by suit and rank band,
//! to an ordered list of atomic effects. This module only resolves cards into
//! effects; legality (phase, AP, suit locks) is the orchestrator's concern and
//! application happens in the session so each atomic step funnels through the
//! store.

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::card::{Card, Rank, Suit};
use crate::error::ConfigError;

/// How an effect magnitude is derived from the played card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    Fixed(i32),
    /// The card's numeric value
    Value,
    /// Half the card's numeric value, rounded up
    HalfValue,
}

impl Amount {
    #[must_use]
    pub const fn resolve(self, card: &Card) -> i32 {
        match self {
            Self::Fixed(n) => n,
            Self::Value => card.value(),
            Self::HalfValue => (card.value() + 1) / 2,
        }
    }
}

/// Catalog-side effect description with unresolved magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSpec {
    DamageEco(Amount),
    DamagePlayer(Amount),
    HealHull(Amount),
    RestoreSanity(Amount),
    DrainSanity(Amount),
    GainAp(Amount),
    DrawCards(u32),
    ForceDiscard(u32),
    RepairWeakestNode(Amount),
    DamageRandomNode(Amount),
    BlockSuit(Suit),
    ExposeEco,
}

/// An atomic, independently-loggable effect with concrete magnitudes. Each
/// application clamps within stat floors and ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    DamageEco(i32),
    DamagePlayer(i32),
    HealHull(i32),
    RestoreSanity(i32),
    DrainSanity(i32),
    GainAp(i32),
    DrawCards(u32),
    ForceDiscard(u32),
    RepairWeakestNode(i32),
    DamageRandomNode(i32),
    BlockSuit(Suit),
    ExposeEco,
}

impl EffectSpec {
    #[must_use]
    pub const fn resolve(self, card: &Card) -> Effect {
        match self {
            Self::DamageEco(a) => Effect::DamageEco(a.resolve(card)),
            Self::DamagePlayer(a) => Effect::DamagePlayer(a.resolve(card)),
            Self::HealHull(a) => Effect::HealHull(a.resolve(card)),
            Self::RestoreSanity(a) => Effect::RestoreSanity(a.resolve(card)),
            Self::DrainSanity(a) => Effect::DrainSanity(a.resolve(card)),
            Self::GainAp(a) => Effect::GainAp(a.resolve(card)),
            Self::DrawCards(n) => Effect::DrawCards(n),
            Self::ForceDiscard(n) => Effect::ForceDiscard(n),
            Self::RepairWeakestNode(a) => Effect::RepairWeakestNode(a.resolve(card)),
            Self::DamageRandomNode(a) => Effect::DamageRandomNode(a.resolve(card)),
            Self::BlockSuit(s) => Effect::BlockSuit(s),
            Self::ExposeEco => Effect::ExposeEco,
        }
    }
}

/// Inclusive rank band a rule applies to, ordered by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankBand {
    pub min: Rank,
    pub max: Rank,
}

impl RankBand {
    #[must_use]
    pub const fn full() -> Self {
        Self {
            min: Rank::Two,
            max: Rank::Ace,
        }
    }

    #[must_use]
    pub fn contains(&self, rank: Rank) -> bool {
        rank >= self.min && rank <= self.max
    }
}

/// One mapping row: (suit, rank band) to an ordered effect list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRule {
    pub suit: Suit,
    pub ranks: RankBand,
    pub effects: SmallVec<[EffectSpec; 4]>,
}

/// The effect catalog for both sides of the table. Player rules describe
/// cards the survivor plays; Eco rules describe the adversary's cards
/// resolved against the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectCatalog {
    pub player_rules: Vec<EffectRule>,
    pub eco_rules: Vec<EffectRule>,
}

impl Default for EffectCatalog {
    fn default() -> Self {
        let low = RankBand {
            min: Rank::Two,
            max: Rank::Ten,
        };
        let court = RankBand {
            min: Rank::Jack,
            max: Rank::Ace,
        };
        let player_rules = vec![
            EffectRule {
                suit: Suit::Spades,
                ranks: low,
                effects: smallvec![EffectSpec::DamageEco(Amount::Value)],
            },
            EffectRule {
                suit: Suit::Spades,
                ranks: court,
                effects: smallvec![EffectSpec::DamageEco(Amount::Value), EffectSpec::ExposeEco],
            },
            EffectRule {
                suit: Suit::Hearts,
                ranks: low,
                effects: smallvec![EffectSpec::HealHull(Amount::HalfValue)],
            },
            EffectRule {
                suit: Suit::Hearts,
                ranks: court,
                effects: smallvec![
                    EffectSpec::HealHull(Amount::HalfValue),
                    EffectSpec::RestoreSanity(Amount::HalfValue),
                ],
            },
            EffectRule {
                suit: Suit::Diamonds,
                ranks: low,
                effects: smallvec![EffectSpec::DrawCards(1)],
            },
            EffectRule {
                suit: Suit::Diamonds,
                ranks: court,
                effects: smallvec![EffectSpec::DrawCards(1), EffectSpec::GainAp(Amount::Fixed(1))],
            },
            EffectRule {
                suit: Suit::Clubs,
                ranks: low,
                effects: smallvec![EffectSpec::RepairWeakestNode(Amount::HalfValue)],
            },
            EffectRule {
                suit: Suit::Clubs,
                ranks: court,
                effects: smallvec![EffectSpec::RepairWeakestNode(Amount::Value)],
            },
        ];
        let eco_rules = vec![
            EffectRule {
                suit: Suit::Spades,
                ranks: RankBand::full(),
                effects: smallvec![EffectSpec::DamagePlayer(Amount::HalfValue)],
            },
            EffectRule {
                suit: Suit::Hearts,
                ranks: RankBand::full(),
                effects: smallvec![EffectSpec::DrainSanity(Amount::HalfValue)],
            },
            EffectRule {
                suit: Suit::Clubs,
                ranks: RankBand::full(),
                effects: smallvec![EffectSpec::DamageRandomNode(Amount::HalfValue)],
            },
            EffectRule {
                suit: Suit::Diamonds,
                ranks: low,
                effects: smallvec![EffectSpec::ForceDiscard(1)],
            },
            EffectRule {
                suit: Suit::Diamonds,
                ranks: court,
                effects: smallvec![
                    EffectSpec::ForceDiscard(1),
                    EffectSpec::BlockSuit(Suit::Spades),
                ],
            },
        ];
        Self {
            player_rules,
            eco_rules,
        }
    }
}

impl EffectCatalog {
    /// Load a catalog override from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed or a rule is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let catalog: Self = serde_json::from_str(json)
            .map_err(|err| ConfigError::InvalidCatalog(err.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Validate rule shape at load time: non-empty effect lists and ordered
    /// rank bands.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in self.player_rules.iter().chain(&self.eco_rules) {
            if rule.effects.is_empty() {
                return Err(ConfigError::InvalidCatalog(format!(
                    "empty effect list for {} {}..{}",
                    rule.suit, rule.ranks.min, rule.ranks.max
                )));
            }
            if rule.ranks.min > rule.ranks.max {
                return Err(ConfigError::InvalidCatalog(format!(
                    "rank band out of order for {}",
                    rule.suit
                )));
            }
        }
        Ok(())
    }

    fn resolve_with(rules: &[EffectRule], card: &Card) -> SmallVec<[Effect; 4]> {
        let Some(rule) = rules
            .iter()
            .find(|rule| rule.suit == card.suit && rule.ranks.contains(card.rank))
        else {
            // Unknown combinations resolve to a no-op, never an error.
            log::warn!("no effect mapping for {card}");
            return SmallVec::new();
        };
        rule.effects.iter().map(|spec| spec.resolve(card)).collect()
    }

    /// Effects of a card played by the survivor.
    #[must_use]
    pub fn resolve_card(&self, card: &Card) -> SmallVec<[Effect; 4]> {
        Self::resolve_with(&self.player_rules, card)
    }

    /// Effects of a card the Eco resolves against the player.
    #[must_use]
    pub fn resolve_eco_card(&self, card: &Card) -> SmallVec<[Effect; 4]> {
        Self::resolve_with(&self.eco_rules, card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardId;

    fn card(suit: Suit, rank: Rank) -> Card {
        Card::new(CardId(0), suit, rank)
    }

    #[test]
    fn spades_damage_equals_card_value() {
        let catalog = EffectCatalog::default();
        let effects = catalog.resolve_card(&card(Suit::Spades, Rank::Five));
        assert_eq!(effects.as_slice(), [Effect::DamageEco(5)]);
    }

    #[test]
    fn court_spades_also_expose() {
        let catalog = EffectCatalog::default();
        let effects = catalog.resolve_card(&card(Suit::Spades, Rank::Queen));
        assert_eq!(
            effects.as_slice(),
            [Effect::DamageEco(10), Effect::ExposeEco]
        );
    }

    #[test]
    fn effects_execute_in_declared_order() {
        let catalog = EffectCatalog::default();
        let effects = catalog.resolve_card(&card(Suit::Hearts, Rank::King));
        assert_eq!(
            effects.as_slice(),
            [Effect::HealHull(5), Effect::RestoreSanity(5)]
        );
    }

    #[test]
    fn half_value_rounds_up() {
        assert_eq!(Amount::HalfValue.resolve(&card(Suit::Hearts, Rank::Three)), 2);
        assert_eq!(Amount::HalfValue.resolve(&card(Suit::Hearts, Rank::Four)), 2);
    }

    #[test]
    fn eco_diamonds_court_blocks_spades() {
        let catalog = EffectCatalog::default();
        let effects = catalog.resolve_eco_card(&card(Suit::Diamonds, Rank::Ace));
        assert_eq!(
            effects.as_slice(),
            [Effect::ForceDiscard(1), Effect::BlockSuit(Suit::Spades)]
        );
    }

    #[test]
    fn unmapped_card_resolves_to_no_op() {
        let catalog = EffectCatalog {
            player_rules: Vec::new(),
            eco_rules: Vec::new(),
        };
        assert!(catalog.resolve_card(&card(Suit::Clubs, Rank::Two)).is_empty());
    }

    #[test]
    fn validation_rejects_empty_effect_lists() {
        let catalog = EffectCatalog {
            player_rules: vec![EffectRule {
                suit: Suit::Clubs,
                ranks: RankBand::full(),
                effects: SmallVec::new(),
            }],
            eco_rules: Vec::new(),
        };
        assert!(catalog.validate().is_err());
        assert!(EffectCatalog::default().validate().is_ok());
    }

    #[test]
    fn catalog_roundtrips_through_json() {
        let catalog = EffectCatalog::default();
        let json = serde_json::to_string(&catalog).unwrap();
        let restored = EffectCatalog::from_json(&json).unwrap();
        assert_eq!(catalog, restored);
    }
}
