//! Card model shared by every other subsystem.
//!
//! Cards are immutable value types; suit is the dispatch key for effect
//! semantics (Clubs repair, Spades attack, Diamonds search, Hearts focus).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identity for a card within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Clubs, Self::Diamonds, Self::Hearts, Self::Spades];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clubs => "clubs",
            Self::Diamonds => "diamonds",
            Self::Hearts => "hearts",
            Self::Spades => "spades",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Suit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clubs" => Ok(Self::Clubs),
            "diamonds" => Ok(Self::Diamonds),
            "hearts" => Ok(Self::Hearts),
            "spades" => Ok(Self::Spades),
            _ => Err(()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Self; 13] = [
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Jack,
        Self::Queen,
        Self::King,
        Self::Ace,
    ];

    /// Numeric value used by the effect engine: pips at face value,
    /// court cards at 10, ace at 11.
    #[must_use]
    pub const fn value(self) -> i32 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten | Self::Jack | Self::Queen | Self::King => 10,
            Self::Ace => 11,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "j",
            Self::Queen => "q",
            Self::King => "k",
            Self::Ace => "a",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single playing card. Immutable once constructed; equality is by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub suit: Suit,
    pub rank: Rank,
    /// Asset reference resolved by the presentation layer
    #[serde(default)]
    pub art: String,
}

impl Card {
    #[must_use]
    pub fn new(id: CardId, suit: Suit, rank: Rank) -> Self {
        Self {
            id,
            suit,
            rank,
            art: format!("cards/{}_{}", suit.as_str(), rank.as_str()),
        }
    }

    /// Numeric value the effect engine scales by.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.rank.value()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.suit, self.rank)
    }
}

/// Negative payload carried by a hallucination draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HallucinationEffect {
    /// Drain sanity by the given amount
    DrainSanity(i32),
    /// Damage the hull (player health) by the given amount
    HullDamage(i32),
    /// Discard up to N random cards from the hand
    ForceDiscard(u32),
}

/// A corrupted draw substituted for a real card. Never enters the visible
/// hand; it resolves immediately and is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallucinationCard {
    pub card: Card,
    pub effect: HallucinationEffect,
}

/// Build the standard 52-card deck with stable ids.
#[must_use]
pub fn standard_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(52);
    let mut next_id: u16 = 0;
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            cards.push(Card::new(CardId(next_id), suit, rank));
            next_id += 1;
        }
    }
    cards
}
