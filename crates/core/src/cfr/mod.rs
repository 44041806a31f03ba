//! Counterfactual regret minimization.
//!
//! - [`XorShift64`]: the seeded generator whose single `u64` of state rides
//!   along in checkpoints, making interrupted runs bit-reproducible.
//! - [`regret_match`]: strategy from positive cumulative regrets.
//! - [`MccfrTrainer`]: external-sampling MCCFR over the Hold'em Toss tree.

mod mccfr;
mod regret;
mod rng;

pub use mccfr::{MccfrTrainer, train_parallel};
pub use regret::{ACTION_SLOTS, normalize_masked, regret_match, regret_match_into};
pub use rng::XorShift64;
