//! Card decks. The top of the deck is the end of the backing vector.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck<T> {
    cards: Vec<T>,
}

impl<T: Copy + Eq> Deck<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn from_cards(cards: impl IntoIterator<Item = T>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Take the top card.
    pub fn draw(&mut self) -> Option<T> {
        self.cards.pop()
    }

    /// Look at the top card without taking it.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        self.cards.last().copied()
    }

    /// Return a card to the bottom of the deck.
    pub fn tuck(&mut self, card: T) {
        self.cards.insert(0, card);
    }

    #[must_use]
    pub fn contains(&self, card: T) -> bool {
        self.cards.contains(&card)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cards
    }
}
