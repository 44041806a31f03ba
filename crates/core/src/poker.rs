//! Card and deck primitives.
//!
//! A [`Card`] is a single index in `0..52`: rank = `index / 4` (deuce = 0,
//! ace = 12) and suit = `index % 4`. The compact encoding keeps holdings
//! and boards cheap to copy and hash during tree traversal.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GameError;

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 52;

/// Rank characters in ascending order, indexed by `Card::rank()`.
pub const RANK_CHARS: [char; 13] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];

/// Suit characters indexed by `Card::suit()`.
pub const SUIT_CHARS: [char; 4] = ['c', 'd', 'h', 's'];

/// A playing card, stored as an index in `0..52`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Card(u8);

impl Card {
    /// Build a card from a raw deck index.
    ///
    /// Returns `None` when `index >= 52`.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        (index < DECK_SIZE as u8).then_some(Self(index))
    }

    /// Build a card from a rank (`0..13`, deuce = 0) and suit (`0..4`).
    #[must_use]
    pub fn from_rank_suit(rank: u8, suit: u8) -> Option<Self> {
        (rank < 13 && suit < 4).then(|| Self(rank * 4 + suit))
    }

    /// The raw deck index in `0..52`.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Rank in `0..13`, deuce = 0, ace = 12.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0 / 4
    }

    /// Suit in `0..4`.
    #[must_use]
    pub const fn suit(self) -> u8 {
        self.0 % 4
    }

    /// Numeric rank value in `2..=14` (ace high).
    #[must_use]
    pub const fn value(self) -> u8 {
        self.rank() + 2
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            RANK_CHARS[self.rank() as usize],
            SUIT_CHARS[self.suit() as usize]
        )
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Error parsing a card from its two-character notation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCardError {
    #[error("card notation must be two characters, got {0:?}")]
    BadLength(String),

    #[error("unknown rank character {0:?}")]
    BadRank(char),

    #[error("unknown suit character {0:?}")]
    BadSuit(char),
}

impl FromStr for Card {
    type Err = ParseCardError;

    /// Parse `"As"`, `"Td"`, `"2c"` style notation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(r), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ParseCardError::BadLength(s.to_string()));
        };
        let rank = RANK_CHARS
            .iter()
            .position(|&c| c == r.to_ascii_uppercase())
            .ok_or(ParseCardError::BadRank(r))?;
        let suit = SUIT_CHARS
            .iter()
            .position(|&c| c == su.to_ascii_lowercase())
            .ok_or(ParseCardError::BadSuit(su))?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(rank as u8 * 4 + suit as u8))
    }
}

/// All 52 cards in index order.
#[must_use]
pub fn full_deck() -> Vec<Card> {
    (0..DECK_SIZE as u8).map(Card).collect()
}

/// Sort cards in place by descending rank (suit breaks ties, so the order
/// is a deterministic total order). Holdings are always kept in this order;
/// discard indices refer to it.
pub fn sort_descending(cards: &mut [Card]) {
    cards.sort_unstable_by(|a, b| b.cmp(a));
}

/// A shuffled deck that deals from the top.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A full 52-card deck shuffled with the supplied generator.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = full_deck();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Deal one card.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DeckExhausted`] when the deck is empty.
    pub fn draw(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::DeckExhausted {
            requested: 1,
            available: 0,
        })
    }

    /// Number of undealt cards.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}
