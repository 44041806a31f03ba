//! Hand evaluation over 5 to 8 card pools.
//!
//! [`evaluate`] scores the best 5-card poker hand contained in the pool and
//! returns a [`HandScore`], a single integer whose ordering is the hand
//! ordering: the category sits in the high bits, kicker nibbles below. Two
//! equal scores are tied hands.
//!
//! Pools larger than five cards are handled by enumerating every 5-card
//! subset (at most C(8,5) = 56) and keeping the maximum. That is already
//! well under a microsecond, so no memoization layer is kept in front.

use crate::poker::Card;

/// Hand category in ascending strength order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandCategory {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl HandCategory {
    /// All categories, ascending.
    pub const ALL: [Self; 9] = [
        Self::HighCard,
        Self::OnePair,
        Self::TwoPair,
        Self::ThreeOfAKind,
        Self::Straight,
        Self::Flush,
        Self::FullHouse,
        Self::FourOfAKind,
        Self::StraightFlush,
    ];

    /// Numeric id in `0..=8`.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

const CATEGORY_SHIFT: u32 = 20;

/// A totally ordered hand score.
///
/// Bits 20..24 hold the category id; bits 0..20 hold five 4-bit kicker
/// values (rank values `2..=14`, most significant first). The exact layout
/// is private detail; only the ordering matters to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandScore(u32);

impl HandScore {
    fn pack(category: HandCategory, kickers: [u8; 5]) -> Self {
        let mut bits = u32::from(category.id()) << CATEGORY_SHIFT;
        for (i, &k) in kickers.iter().enumerate() {
            debug_assert!(k <= 14);
            bits |= u32::from(k) << (16 - 4 * i as u32);
        }
        Self(bits)
    }

    /// The category this score falls in.
    #[must_use]
    pub fn category(self) -> HandCategory {
        HandCategory::ALL[(self.0 >> CATEGORY_SHIFT) as usize]
    }

    /// The raw ordered integer.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Score the best 5-card hand within a pool of 5 to 8 cards.
///
/// # Panics
///
/// Panics when fewer than 5 cards are supplied; that is a programming
/// error in the caller, not a recoverable condition.
#[must_use]
#[allow(clippy::needless_range_loop)]
pub fn evaluate(cards: &[Card]) -> HandScore {
    let n = cards.len();
    assert!(n >= 5, "hand evaluation requires at least 5 cards, got {n}");

    if n == 5 {
        return score_five([cards[0], cards[1], cards[2], cards[3], cards[4]]);
    }

    let mut best = HandScore(0);
    for a in 0..n - 4 {
        for b in a + 1..n - 3 {
            for c in b + 1..n - 2 {
                for d in c + 1..n - 1 {
                    for e in d + 1..n {
                        let score =
                            score_five([cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if score > best {
                            best = score;
                        }
                    }
                }
            }
        }
    }
    best
}

/// Category of the best 5-card hand within the pool. Convenience for
/// bucketing, which only cares about the coarse class.
#[must_use]
pub fn strength_category(cards: &[Card]) -> HandCategory {
    evaluate(cards).category()
}

/// Coarse category for a pool of fewer than five cards, from rank
/// multiplicities alone (straights and flushes need five cards and are
/// never reported here). Used by the discard bucket when only four cards
/// are known.
#[must_use]
pub fn partial_category(cards: &[Card]) -> HandCategory {
    let mut counts = [0u8; 15];
    for c in cards {
        counts[c.value() as usize] += 1;
    }
    let mut pairs = 0;
    let mut best = HandCategory::HighCard;
    for &count in &counts {
        match count {
            4 => return HandCategory::FourOfAKind,
            3 => best = best.max(HandCategory::ThreeOfAKind),
            2 => pairs += 1,
            _ => {}
        }
    }
    match pairs {
        0 => best,
        1 => best.max(HandCategory::OnePair),
        _ => best.max(HandCategory::TwoPair),
    }
}

/// Score exactly five cards.
fn score_five(cards: [Card; 5]) -> HandScore {
    let mut values = [0u8; 5];
    for (v, c) in values.iter_mut().zip(&cards) {
        *v = c.value();
    }
    values.sort_unstable_by(|a, b| b.cmp(a));

    let flush = cards.iter().all(|c| c.suit() == cards[0].suit());
    let straight_high = straight_high(values);

    if let Some(high) = straight_high {
        if flush {
            return HandScore::pack(HandCategory::StraightFlush, [high, 0, 0, 0, 0]);
        }
    }

    // (count, value) pairs, largest group first, higher value first on ties.
    let mut groups: Vec<(u8, u8)> = Vec::with_capacity(5);
    for &v in &values {
        match groups.iter_mut().find(|(_, gv)| *gv == v) {
            Some(group) => group.0 += 1,
            None => groups.push((1, v)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));

    if groups[0].0 == 4 {
        return HandScore::pack(
            HandCategory::FourOfAKind,
            [groups[0].1, groups[1].1, 0, 0, 0],
        );
    }
    if groups[0].0 == 3 && groups[1].0 == 2 {
        return HandScore::pack(
            HandCategory::FullHouse,
            [groups[0].1, groups[1].1, 0, 0, 0],
        );
    }
    if flush {
        return HandScore::pack(HandCategory::Flush, values);
    }
    if let Some(high) = straight_high {
        return HandScore::pack(HandCategory::Straight, [high, 0, 0, 0, 0]);
    }
    if groups[0].0 == 3 {
        return HandScore::pack(
            HandCategory::ThreeOfAKind,
            [groups[0].1, groups[1].1, groups[2].1, 0, 0],
        );
    }
    if groups[0].0 == 2 && groups[1].0 == 2 {
        return HandScore::pack(
            HandCategory::TwoPair,
            [groups[0].1, groups[1].1, groups[2].1, 0, 0],
        );
    }
    if groups[0].0 == 2 {
        return HandScore::pack(
            HandCategory::OnePair,
            [groups[0].1, groups[1].1, groups[2].1, groups[3].1, 0],
        );
    }
    HandScore::pack(HandCategory::HighCard, values)
}

/// High card of a straight formed by exactly these five values (sorted
/// descending), or `None`. The wheel counts as a 5-high straight.
fn straight_high(values: [u8; 5]) -> Option<u8> {
    let distinct = values.windows(2).all(|w| w[0] != w[1]);
    if !distinct {
        return None;
    }
    if values[0] - values[4] == 4 {
        return Some(values[0]);
    }
    if values == [14, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}
