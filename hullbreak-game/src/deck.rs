//! Deck and discard lifecycle.
//!
//! Each side of the table owns an independent deck with its own discard pile.
//! Drawing reshuffles the discard pile back in on exhaustion; when both piles
//! are empty a draw yields fewer cards than requested rather than failing.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::card::{Card, standard_deck};

/// A draw pile paired with its discard pile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
}

impl Deck {
    /// Build a deck from the given cards, top of the pile last.
    #[must_use]
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            draw_pile: cards,
            discard_pile: Vec::new(),
        }
    }

    /// Build a shuffled standard 52-card deck.
    #[must_use]
    pub fn standard_shuffled(rng: &mut impl Rng) -> Self {
        let mut deck = Self::new(standard_deck());
        deck.shuffle(rng);
        deck
    }

    /// Uniformly permute the draw pile.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.draw_pile.shuffle(rng);
    }

    /// Draw up to `n` cards. When the draw pile runs dry the discard pile is
    /// shuffled back in before continuing; cards already discarded in the
    /// current cycle never reappear before that reshuffle. Returns fewer
    /// cards than requested only when both piles are exhausted.
    pub fn draw(&mut self, n: usize, rng: &mut impl Rng) -> Vec<Card> {
        let mut drawn = Vec::with_capacity(n);
        for _ in 0..n {
            if self.draw_pile.is_empty() && !self.discard_pile.is_empty() {
                log::debug!(
                    "deck exhausted, reshuffling {} discards",
                    self.discard_pile.len()
                );
                self.draw_pile.append(&mut self.discard_pile);
                self.shuffle(rng);
            }
            match self.draw_pile.pop() {
                Some(card) => drawn.push(card),
                None => break,
            }
        }
        drawn
    }

    /// Move cards from play into the discard pile.
    pub fn discard(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.discard_pile.extend(cards);
    }

    /// Return a single card to the discard pile.
    pub fn discard_one(&mut self, card: Card) {
        self.discard_pile.push(card);
    }

    #[must_use]
    pub const fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    #[must_use]
    pub const fn discard_pile_len(&self) -> usize {
        self.discard_pile.len()
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len()
    }
}

/// The two independent decks of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckManager {
    pub player: Deck,
    pub eco: Deck,
}

impl DeckManager {
    /// Fresh shuffled player and Eco decks for a new run.
    #[must_use]
    pub fn new_run(rng: &mut impl Rng) -> Self {
        Self {
            player: Deck::standard_shuffled(rng),
            eco: Deck::standard_shuffled(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(7)
    }

    #[test]
    fn draw_pops_requested_count() {
        let mut rng = rng();
        let mut deck = Deck::standard_shuffled(&mut rng);
        let cards = deck.draw(5, &mut rng);
        assert_eq!(cards.len(), 5);
        assert_eq!(deck.draw_pile_len(), 47);
    }

    #[test]
    fn exhaustion_reshuffles_discards() {
        let mut rng = rng();
        let mut deck = Deck::standard_shuffled(&mut rng);
        let first = deck.draw(52, &mut rng);
        assert_eq!(first.len(), 52);
        deck.discard(first);
        assert_eq!(deck.draw_pile_len(), 0);
        assert_eq!(deck.discard_pile_len(), 52);

        let again = deck.draw(3, &mut rng);
        assert_eq!(again.len(), 3);
        assert_eq!(deck.discard_pile_len(), 0);
        assert_eq!(deck.draw_pile_len(), 49);
    }

    #[test]
    fn fully_exhausted_deck_yields_short_draw() {
        let mut rng = rng();
        let mut deck = Deck::standard_shuffled(&mut rng);
        let all = deck.draw(52, &mut rng);
        assert_eq!(all.len(), 52);
        // Nothing discarded, so there is nothing left to reshuffle.
        let empty = deck.draw(4, &mut rng);
        assert!(empty.is_empty());
    }

    #[test]
    fn discarded_cards_stay_out_until_reshuffle() {
        let mut rng = rng();
        let mut deck = Deck::standard_shuffled(&mut rng);
        let hand = deck.draw(5, &mut rng);
        let discarded_ids: Vec<_> = hand.iter().map(|c| c.id).collect();
        deck.discard(hand);

        let rest = deck.draw(47, &mut rng);
        assert!(rest.iter().all(|c| !discarded_ids.contains(&c.id)));
    }

    #[test]
    fn manager_decks_are_independent() {
        let mut rng = rng();
        let mut decks = DeckManager::new_run(&mut rng);
        let _ = decks.player.draw(10, &mut rng);
        assert_eq!(decks.player.draw_pile_len(), 42);
        assert_eq!(decks.eco.draw_pile_len(), 52);
    }
}
