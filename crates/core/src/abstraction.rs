//! State abstraction: bucket ids and infoset keys.
//!
//! Everything here is a pure function of the acting player's private cards
//! and the public state. Nothing may look at the opponent's holding, their
//! unrevealed discard, or the undealt deck; that property is what makes an
//! infoset key an infoset key.
//!
//! Keys are strings of the form `s{street}_{pos}_{bucket}_{history}`, kept
//! human-readable for portability and debuggability. If key construction
//! ever shows up in a profile, intern them into integer ids by first-seen
//! order; the tables do not care.

use arrayvec::ArrayVec;

use crate::evaluation::{evaluate, partial_category, strength_category};
use crate::game::Street;
use crate::poker::Card;

/// Tier label for a rank value: ten-or-better, seven-to-nine, or the rest.
fn rank_tier(value: u8) -> &'static str {
    if value >= 10 {
        "high"
    } else if value >= 7 {
        "mid"
    } else {
        "low"
    }
}

/// Bucket for a 3-card preflop holding.
///
/// Classifies by rank multiplicity first (trips, pair, unpaired), then by
/// rank tiers and suitedness. Input must be sorted by descending rank.
#[must_use]
pub fn preflop_bucket(hole: &[Card]) -> String {
    debug_assert_eq!(hole.len(), 3, "preflop holdings have three cards");
    let v: ArrayVec<u8, 3> = hole.iter().map(|c| c.value()).collect();

    if v[0] == v[1] && v[1] == v[2] {
        return format!("trips_{}", rank_tier(v[0]));
    }

    if v[0] == v[1] || v[1] == v[2] {
        let (pair, kicker) = if v[0] == v[1] { (v[0], v[2]) } else { (v[1], v[0]) };
        return format!("pair_{}_{}", rank_tier(pair), rank_tier(kicker));
    }

    let mut suit_counts = [0u8; 4];
    for c in hole {
        suit_counts[c.suit() as usize] += 1;
    }
    let max_suited = suit_counts.iter().copied().max().unwrap_or(0);
    let suit_tag = match max_suited {
        3 => "mono",
        2 => "two_suit",
        _ => "rainbow",
    };
    format!("high_{}_{}", rank_tier(v[0]), suit_tag)
}

/// Texture tag for the current board.
///
/// When several features apply, the structurally strongest wins: trips,
/// then a pair, then a three-flush, then connectivity, then two of a suit,
/// then all-distinct suits. An empty board is `dry`.
#[must_use]
pub fn board_texture(board: &[Card]) -> &'static str {
    if board.is_empty() {
        return "dry";
    }

    let mut rank_counts = [0u8; 15];
    let mut suit_counts = [0u8; 4];
    for c in board {
        rank_counts[c.value() as usize] += 1;
        suit_counts[c.suit() as usize] += 1;
    }

    if rank_counts.iter().any(|&n| n >= 3) {
        return "trips";
    }
    if rank_counts.iter().any(|&n| n >= 2) {
        return "paired";
    }
    if suit_counts.iter().any(|&n| n >= 3) {
        return "flush_draw";
    }
    if is_connected(&rank_counts) {
        return "connected";
    }
    if suit_counts.iter().any(|&n| n == 2) {
        return "two_tone";
    }
    "rainbow"
}

/// Whether three distinct board ranks fall within a five-rank window.
fn is_connected(rank_counts: &[u8; 15]) -> bool {
    let distinct: ArrayVec<u8, 15> = (2..=14u8)
        .filter(|&v| rank_counts[v as usize] > 0)
        .collect();
    distinct.windows(3).any(|w| w[2] - w[0] <= 4)
}

/// Bucket for a betting decision once community cards exist: the strength
/// category of the combined pool crossed with the board texture.
#[must_use]
pub fn postflop_bucket(hole: &[Card], board: &[Card]) -> String {
    let mut pool: ArrayVec<Card, 9> = ArrayVec::new();
    pool.extend(hole.iter().copied());
    pool.extend(board.iter().copied());
    let category = strength_category(&pool);
    format!("cat{}_{}", category.id(), board_texture(board))
}

/// Bucket for the discard decision: the category left behind by each of
/// the three possible tosses, plus the index of the equity-preserving one.
///
/// With a 2-card board the kept pool is only four cards, so the category
/// degrades to a multiplicity-only classification and the tiebreak to a
/// rank sum; both are deterministic, which is all the key needs.
#[must_use]
pub fn discard_bucket(hole: &[Card], board: &[Card]) -> String {
    debug_assert_eq!(hole.len(), 3, "discard decisions happen with three cards");

    let mut categories = [0u8; 3];
    let mut strengths = [0u32; 3];
    for drop in 0..3 {
        let mut pool: ArrayVec<Card, 9> = ArrayVec::new();
        pool.extend(
            hole.iter()
                .enumerate()
                .filter(|(i, _)| *i != drop)
                .map(|(_, &c)| c),
        );
        pool.extend(board.iter().copied());

        if pool.len() >= 5 {
            let score = evaluate(&pool);
            categories[drop] = score.category().id();
            strengths[drop] = score.raw();
        } else {
            categories[drop] = partial_category(&pool).id();
            strengths[drop] = pool.iter().map(|c| u32::from(c.value())).sum();
        }
    }

    let mut best = 0;
    for i in 1..3 {
        if strengths[i] > strengths[best] {
            best = i;
        }
    }
    format!(
        "d{}{}{}_b{best}",
        categories[0], categories[1], categories[2]
    )
}

/// Bucket appropriate for the given street.
pub(crate) fn bucket_for(street: Street, hole: &[Card], board: &[Card]) -> String {
    match street {
        Street::Preflop => preflop_bucket(hole),
        Street::Discard if hole.len() == 3 => discard_bucket(hole, board),
        _ => postflop_bucket(hole, board),
    }
}

/// Positional tag for a seat. Seat 0 posts the small blind and holds the
/// button; seat 1 posts the big blind and is out of position after the
/// flop. The four tags are injective over (seat, preflop-or-later).
#[must_use]
pub fn position_tag(seat: usize, street: Street) -> &'static str {
    debug_assert!(seat < 2);
    match (seat, street) {
        (0, Street::Preflop) => "sb",
        (0, _) => "btn",
        (_, Street::Preflop) => "bb",
        (_, _) => "oop",
    }
}

/// Assemble the canonical infoset key. An empty betting history renders as
/// `none` so every key has four segments.
#[must_use]
pub fn infoset_key(street: Street, seat: usize, bucket: &str, history: &str) -> String {
    let history = if history.is_empty() { "none" } else { history };
    format!(
        "s{}_{}_{}_{}",
        street.id(),
        position_tag(seat, street),
        bucket,
        history
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_macros::timed_test;

    fn cards(spec: &str) -> Vec<Card> {
        spec.split_whitespace()
            .map(|s| s.parse().expect("test card"))
            .collect()
    }

    #[timed_test]
    fn preflop_trips_bucket_by_tier() {
        assert_eq!(preflop_bucket(&cards("As Ah Ad")), "trips_high");
        assert_eq!(preflop_bucket(&cards("8s 8h 8d")), "trips_mid");
        assert_eq!(preflop_bucket(&cards("4s 4h 4d")), "trips_low");
    }

    #[timed_test]
    fn preflop_pair_bucket_tracks_pair_and_kicker() {
        assert_eq!(preflop_bucket(&cards("As Ah 5d")), "pair_high_low");
        assert_eq!(preflop_bucket(&cards("Ks 8h 8d")), "pair_mid_high");
        assert_eq!(preflop_bucket(&cards("9s 4h 4d")), "pair_low_mid");
    }

    #[timed_test]
    fn preflop_unpaired_bucket_tracks_suits() {
        assert_eq!(preflop_bucket(&cards("As Ks 7s")), "high_high_mono");
        assert_eq!(preflop_bucket(&cards("As Ks 7h")), "high_high_two_suit");
        assert_eq!(preflop_bucket(&cards("As Kh 7d")), "high_high_rainbow");
        assert_eq!(preflop_bucket(&cards("6s 4h 2d")), "high_low_rainbow");
    }

    #[timed_test]
    fn texture_priority_prefers_structure() {
        assert_eq!(board_texture(&cards("7s 7h 7d")), "trips");
        assert_eq!(board_texture(&cards("7s 7h Kd")), "paired");
        assert_eq!(board_texture(&cards("As Ks 7s")), "flush_draw");
        assert_eq!(board_texture(&cards("9s 8h 6d")), "connected");
        assert_eq!(board_texture(&cards("As Ks 7h")), "two_tone");
        assert_eq!(board_texture(&cards("As Kh 7d")), "rainbow");
        assert_eq!(board_texture(&[]), "dry");
    }

    #[timed_test]
    fn two_card_board_textures() {
        assert_eq!(board_texture(&cards("7s 7h")), "paired");
        assert_eq!(board_texture(&cards("As Ks")), "two_tone");
        assert_eq!(board_texture(&cards("As Kh")), "rainbow");
    }

    #[timed_test]
    fn postflop_bucket_combines_category_and_texture() {
        // Trip aces on a rainbow-ish two-card flop.
        assert_eq!(postflop_bucket(&cards("As Ah 4c"), &cards("Ad 9h")), "cat3_rainbow");
        // Bare high card.
        assert_eq!(postflop_bucket(&cards("As Kh 4c"), &cards("9d 2h")), "cat0_rainbow");
    }

    #[timed_test]
    fn discard_bucket_flags_best_toss() {
        // Holding a pair of aces plus a deuce on a K9 board: tossing the
        // deuce (index 2) keeps the pair.
        let bucket = discard_bucket(&cards("As Ah 2c"), &cards("Kd 9h"));
        assert!(bucket.ends_with("_b2"), "bucket was {bucket}");
        assert!(bucket.starts_with('d'));
    }

    #[timed_test]
    fn discard_bucket_uses_full_scores_with_three_card_board() {
        let bucket = discard_bucket(&cards("As Ah 2c"), &cards("Kd 9h 5s"));
        // Dropping the deuce leaves one pair (category 1); dropping an ace
        // leaves high card (category 0).
        assert_eq!(bucket, "d001_b2");
    }

    #[timed_test]
    fn position_tags_are_injective() {
        let tags = [
            position_tag(0, Street::Preflop),
            position_tag(1, Street::Preflop),
            position_tag(0, Street::Turn),
            position_tag(1, Street::Turn),
        ];
        let unique: std::collections::HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(position_tag(0, Street::Flop), position_tag(0, Street::River));
    }

    #[timed_test]
    fn infoset_key_shape() {
        assert_eq!(
            infoset_key(Street::Preflop, 0, "pair_high_low", ""),
            "s0_sb_pair_high_low_none"
        );
        assert_eq!(
            infoset_key(Street::Turn, 1, "cat1_paired", "brc"),
            "s4_oop_cat1_paired_brc"
        );
    }

    #[timed_test]
    fn buckets_are_deterministic() {
        let hole = cards("As Ah 2c");
        let board = cards("Kd 9h");
        assert_eq!(
            discard_bucket(&hole, &board),
            discard_bucket(&hole, &board)
        );
        assert_eq!(preflop_bucket(&hole), preflop_bucket(&hole));
    }
}
