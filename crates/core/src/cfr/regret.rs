//! Regret matching over fixed-width action rows.
//!
//! Tables store one `[f64; 9]` row per infoset, indexed by
//! [`Action::index`](crate::game::Action::index). Slots outside the legal
//! set stay at zero and are masked on every read, so a row never needs to
//! remember which actions it was created under.

use crate::game::{Action, Actions};

/// Width of a table row: one slot per action symbol.
pub const ACTION_SLOTS: usize = Action::COUNT;

/// Write the regret-matched strategy for `legal` into `out`.
///
/// Positive regrets are normalized over the legal set; when none are
/// positive the strategy is uniform over the legal set. Illegal slots are
/// zeroed.
#[allow(clippy::cast_precision_loss)]
pub fn regret_match_into(regrets: &[f64; ACTION_SLOTS], legal: &Actions, out: &mut [f64; ACTION_SLOTS]) {
    debug_assert!(!legal.is_empty());
    out.fill(0.0);

    let positive_sum: f64 = legal
        .iter()
        .map(|a| regrets[a.index()].max(0.0))
        .sum();

    if positive_sum > 0.0 {
        for a in legal {
            out[a.index()] = regrets[a.index()].max(0.0) / positive_sum;
        }
    } else {
        let uniform = 1.0 / legal.len() as f64;
        for a in legal {
            out[a.index()] = uniform;
        }
    }
}

/// Allocation-free-caller variant of [`regret_match_into`] that returns
/// the row by value.
#[must_use]
pub fn regret_match(regrets: &[f64; ACTION_SLOTS], legal: &Actions) -> [f64; ACTION_SLOTS] {
    let mut out = [0.0; ACTION_SLOTS];
    regret_match_into(regrets, legal, &mut out);
    out
}

/// Normalize accumulated weights over the legal set.
///
/// Returns `None` when no mass has accumulated on any legal action.
#[must_use]
pub fn normalize_masked(
    sums: &[f64; ACTION_SLOTS],
    legal: &Actions,
) -> Option<[f64; ACTION_SLOTS]> {
    let total: f64 = legal.iter().map(|a| sums[a.index()]).sum();
    if total <= 0.0 {
        return None;
    }
    let mut out = [0.0; ACTION_SLOTS];
    for a in legal {
        out[a.index()] = sums[a.index()] / total;
    }
    Some(out)
}
