//! External-sampling Monte Carlo CFR.
//!
//! Each iteration deals one hand and walks the tree for a single
//! traverser. Chance is resolved by the pre-shuffled deck, the opponent's
//! node samples one action from the current regret-matched strategy, and
//! the traverser's node enumerates every legal action, accumulating
//! regret against the node's expected value. The averaged `strategy_sum`
//! table, not the latest strategy, is what approaches equilibrium.
//!
//! Updates are raw sums: no regret flooring, no iteration discounting, no
//! reach weighting. That keeps both tables additive, which is what makes
//! sharded training and checkpoint resume exact.

use rustc_hash::FxHashMap;

use crate::checkpoint::Checkpoint;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::{Action, Actions, GameState};

use super::regret::{ACTION_SLOTS, normalize_masked, regret_match};
use super::rng::XorShift64;

/// External-sampling MCCFR trainer for Hold'em Toss.
pub struct MccfrTrainer {
    config: GameConfig,
    /// Cumulative counterfactual regret per infoset.
    regret_sum: FxHashMap<String, [f64; ACTION_SLOTS]>,
    /// Cumulative strategy weight per infoset, for averaging.
    strategy_sum: FxHashMap<String, [f64; ACTION_SLOTS]>,
    iterations: u64,
    rng: XorShift64,
    root_utility_sum: f64,
    root_utility_count: u64,
}

impl MccfrTrainer {
    /// A fresh trainer with empty tables.
    #[must_use]
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            regret_sum: FxHashMap::default(),
            strategy_sum: FxHashMap::default(),
            iterations: 0,
            rng: XorShift64::new(seed),
            root_utility_sum: 0.0,
            root_utility_count: 0,
        }
    }

    /// Rebuild a trainer from a checkpoint; continuing from here replays
    /// the exact update sequence an uninterrupted run would have made.
    #[must_use]
    pub fn from_checkpoint(config: GameConfig, checkpoint: Checkpoint) -> Self {
        Self {
            config,
            regret_sum: checkpoint.regret_sum,
            strategy_sum: checkpoint.strategy_sum,
            iterations: checkpoint.iteration,
            rng: XorShift64::restore(checkpoint.rng_state),
            root_utility_sum: 0.0,
            root_utility_count: 0,
        }
    }

    /// Snapshot the trainer for persistence.
    #[must_use]
    pub fn to_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            iteration: self.iterations,
            rng_state: self.rng.state(),
            regret_sum: self.regret_sum.clone(),
            strategy_sum: self.strategy_sum.clone(),
        }
    }

    /// Iterations completed over the trainer's lifetime.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Number of infosets with accumulated strategy weight.
    #[must_use]
    pub fn infoset_count(&self) -> usize {
        self.strategy_sum.len()
    }

    /// The averaged-strategy table.
    #[must_use]
    pub fn strategy_sum(&self) -> &FxHashMap<String, [f64; ACTION_SLOTS]> {
        &self.strategy_sum
    }

    /// The cumulative-regret table.
    #[must_use]
    pub fn regret_sum(&self) -> &FxHashMap<String, [f64; ACTION_SLOTS]> {
        &self.regret_sum
    }

    /// Mean root utility since this process started training. For
    /// alternating-traverser self-play this oscillates around zero; it is
    /// a convergence health signal, not a correctness criterion.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_root_utility(&self) -> f64 {
        if self.root_utility_count == 0 {
            return 0.0;
        }
        self.root_utility_sum / self.root_utility_count as f64
    }

    /// Run `iterations` iterations, alternating the traverser.
    ///
    /// # Errors
    ///
    /// Propagates [`GameError`] out of the traversal; the tree walk cannot
    /// be meaningfully resumed mid-iteration.
    pub fn train(&mut self, iterations: u64) -> Result<(), GameError> {
        self.train_with_callback(iterations, |_| {})
    }

    /// [`train`](Self::train) with a per-iteration progress callback.
    ///
    /// # Errors
    ///
    /// Same as [`train`](Self::train).
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        mut on_iteration: F,
    ) -> Result<(), GameError>
    where
        F: FnMut(u64),
    {
        for done in 0..iterations {
            let traverser = (self.iterations % 2) as usize;
            let state = GameState::deal(&self.config, &mut self.rng)?;
            let value = self.traverse(&state, traverser)?;

            self.root_utility_sum += value;
            self.root_utility_count += 1;
            self.iterations += 1;
            on_iteration(done + 1);
        }
        Ok(())
    }

    /// Averaged strategy for an infoset, masked to `legal`. Unseen
    /// infosets and zero-mass rows fall back to uniform.
    #[must_use]
    pub fn average_strategy(&self, key: &str, legal: &Actions) -> [f64; ACTION_SLOTS] {
        self.strategy_sum
            .get(key)
            .and_then(|sums| normalize_masked(sums, legal))
            .unwrap_or_else(|| uniform(legal))
    }

    /// Current regret-matched strategy for an infoset, masked to `legal`.
    #[must_use]
    pub fn current_strategy(&self, key: &str, legal: &Actions) -> [f64; ACTION_SLOTS] {
        self.regret_sum
            .get(key)
            .map_or_else(|| uniform(legal), |regrets| regret_match(regrets, legal))
    }

    /// Fold another trainer's tables into this one by elementwise
    /// addition. Both tables are additive monoids, so shards trained
    /// independently merge exactly.
    pub fn absorb(&mut self, other: &MccfrTrainer) {
        for (key, row) in &other.regret_sum {
            let mine = self
                .regret_sum
                .entry(key.clone())
                .or_insert([0.0; ACTION_SLOTS]);
            for (m, o) in mine.iter_mut().zip(row) {
                *m += o;
            }
        }
        for (key, row) in &other.strategy_sum {
            let mine = self
                .strategy_sum
                .entry(key.clone())
                .or_insert([0.0; ACTION_SLOTS]);
            for (m, o) in mine.iter_mut().zip(row) {
                *m += o;
            }
        }
        self.iterations += other.iterations;
        self.root_utility_sum += other.root_utility_sum;
        self.root_utility_count += other.root_utility_count;
    }

    /// One external-sampling descent, returning the traverser's
    /// counterfactual utility.
    fn traverse(&mut self, state: &GameState, traverser: usize) -> Result<f64, GameError> {
        if state.is_terminal() {
            return Ok(state.utility(traverser));
        }

        let legal = state.legal_actions();
        debug_assert!(!legal.is_empty(), "non-terminal state with no actions");
        let seat = state.to_act;
        let key = state.infoset_key(seat);
        let strategy = self
            .regret_sum
            .get(&key)
            .map_or_else(|| uniform(&legal), |regrets| regret_match(regrets, &legal));

        if seat == traverser {
            // Enumerate every action; regret against the mixed value.
            let mut utils = [0.0; ACTION_SLOTS];
            for &action in &legal {
                let mut next = state.clone();
                next.apply_action(action)?;
                utils[action.index()] = self.traverse(&next, traverser)?;
            }

            let node_value: f64 = legal
                .iter()
                .map(|a| strategy[a.index()] * utils[a.index()])
                .sum();

            let regrets = self
                .regret_sum
                .entry(key.clone())
                .or_insert([0.0; ACTION_SLOTS]);
            for &action in &legal {
                regrets[action.index()] += utils[action.index()] - node_value;
            }

            let sums = self
                .strategy_sum
                .entry(key)
                .or_insert([0.0; ACTION_SLOTS]);
            for &action in &legal {
                sums[action.index()] += strategy[action.index()];
            }

            Ok(node_value)
        } else {
            // Opponent node: sample a single action and follow it.
            let action = self.sample(&strategy, &legal);
            let mut next = state.clone();
            next.apply_action(action)?;
            self.traverse(&next, traverser)
        }
    }

    /// Sample an action from a strategy row restricted to `legal`.
    fn sample(&mut self, strategy: &[f64; ACTION_SLOTS], legal: &Actions) -> Action {
        let roll = self.rng.next_f64();
        let mut cumulative = 0.0;
        for &action in legal {
            cumulative += strategy[action.index()];
            if roll < cumulative {
                return action;
            }
        }
        legal[legal.len() - 1]
    }
}

/// Uniform strategy over the legal set.
#[allow(clippy::cast_precision_loss)]
fn uniform(legal: &Actions) -> [f64; ACTION_SLOTS] {
    let mut out = [0.0; ACTION_SLOTS];
    let p = 1.0 / legal.len() as f64;
    for a in legal {
        out[a.index()] = p;
    }
    out
}

/// Train `iterations` split across `shards` independent workers and merge
/// the shards additively. Shards draw from unrelated seed streams, so the
/// result differs from (but converges like) a single sequential run.
///
/// # Errors
///
/// Propagates the first [`GameError`] any shard hits.
///
/// # Panics
///
/// Panics when `shards` is zero.
pub fn train_parallel(
    config: &GameConfig,
    seed: u64,
    iterations: u64,
    shards: usize,
) -> Result<MccfrTrainer, GameError> {
    use rayon::prelude::*;

    assert!(shards > 0, "at least one shard required");
    let shards_u64 = shards as u64;
    let counts: Vec<u64> = (0..shards_u64)
        .map(|i| iterations / shards_u64 + u64::from(i < iterations % shards_u64))
        .collect();

    let trained: Result<Vec<MccfrTrainer>, GameError> = counts
        .into_par_iter()
        .enumerate()
        .map(|(shard, count)| {
            let shard_seed =
                seed.wrapping_add((shard as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let mut trainer = MccfrTrainer::new(config.clone(), shard_seed);
            trainer.train(count)?;
            Ok(trainer)
        })
        .collect();

    let mut merged = MccfrTrainer::new(config.clone(), seed);
    for shard in trained? {
        merged.absorb(&shard);
    }
    Ok(merged)
}
