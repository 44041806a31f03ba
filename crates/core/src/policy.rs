//! Runtime decision policy.
//!
//! Loads an averaged strategy and, for each live decision, rebuilds the
//! same infoset key the trainer would have used, intersects the abstract
//! alphabet with what the engine currently permits, renormalizes, samples,
//! and maps the pick back to a concrete engine action. When the infoset
//! was never visited in training the policy reports [`PolicyError::
//! UnseenInfoset`]; the caller escalates to whatever fallback heuristic it
//! keeps for that case.

use std::path::Path;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::abstraction;
use crate::cfr::{ACTION_SLOTS, XorShift64};
use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::game::{Action, Actions, HAND_SIZE, Street};
use crate::poker::Card;

/// Everything the acting player can see at a decision point.
#[derive(Debug, Clone)]
pub struct TableView {
    /// Own hole cards, sorted by descending rank: three before the
    /// discard, two after.
    pub hole: Vec<Card>,
    /// Community cards, public discards included.
    pub board: Vec<Card>,
    /// Current street.
    pub street: Street,
    /// Own seat: 0 posts the small blind, 1 the big blind.
    pub seat: usize,
    /// Betting-history tokens for the current street.
    pub history: String,
    /// Total chips committed by both players.
    pub pot: u32,
    /// Own chips committed this street.
    pub my_pip: u32,
    /// Opponent chips committed this street.
    pub opp_pip: u32,
    /// Own remaining stack.
    pub my_stack: u32,
}

/// The engine's menu for this decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermittedActions {
    pub can_fold: bool,
    pub can_check: bool,
    pub can_call: bool,
    /// Inclusive bounds on a raise, expressed as the street-total pip the
    /// raiser would reach. `None` when raising is not permitted.
    pub raise_bounds: Option<(u32, u32)>,
    /// Whether a discard is expected instead of a betting action.
    pub can_discard: bool,
}

/// A concrete action in engine terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    Fold,
    Check,
    Call,
    /// Raise such that the player's street pip reaches `to`.
    Raise { to: u32 },
    /// Toss the card at `index` in the sorted hole.
    Discard { index: usize },
}

/// Errors surfaced by the policy. Only `UnseenInfoset` is expected during
/// normal play; it hands the decision to the external fallback.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("no strategy data for infoset {0}")]
    UnseenInfoset(String),

    #[error("no abstract action maps to a permitted engine action")]
    NoMappableAction,

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// A read-only snapshot of the averaged strategy, plus a sampling RNG.
pub struct Policy {
    strategy_sum: FxHashMap<String, [f64; ACTION_SLOTS]>,
    iterations_trained: u64,
    rng: XorShift64,
}

impl Policy {
    /// Load a persisted strategy.
    ///
    /// # Errors
    ///
    /// Propagates [`CheckpointError`] for missing, corrupt, or
    /// version-mismatched files.
    pub fn load(path: &Path, seed: u64) -> Result<Self, PolicyError> {
        let checkpoint = Checkpoint::load(path)?;
        Ok(Self::from_checkpoint(checkpoint, seed))
    }

    /// Build a policy straight from a checkpoint.
    #[must_use]
    pub fn from_checkpoint(checkpoint: Checkpoint, seed: u64) -> Self {
        Self {
            strategy_sum: checkpoint.strategy_sum,
            iterations_trained: checkpoint.iteration,
            rng: XorShift64::new(seed),
        }
    }

    /// Iterations behind the loaded strategy.
    #[must_use]
    pub fn iterations_trained(&self) -> u64 {
        self.iterations_trained
    }

    /// Number of infosets in the loaded strategy.
    #[must_use]
    pub fn infoset_count(&self) -> usize {
        self.strategy_sum.len()
    }

    /// The infoset key this view maps to. Exposed for diagnostics.
    #[must_use]
    pub fn infoset_key(view: &TableView) -> String {
        let bucket = abstraction::bucket_for(view.street, &view.hole, &view.board);
        abstraction::infoset_key(view.street, view.seat, &bucket, &view.history)
    }

    /// Pick an action for the current decision.
    ///
    /// The returned action is always one the engine permits. Strategy mass
    /// on abstract actions without an engine counterpart is renormalized
    /// away; a visited infoset whose mass lies entirely on unavailable
    /// actions degrades to uniform over the available ones.
    ///
    /// # Errors
    ///
    /// [`PolicyError::UnseenInfoset`] when training never reached this
    /// infoset (recoverable: use the fallback heuristic);
    /// [`PolicyError::NoMappableAction`] when the permitted set is empty,
    /// which indicates a malformed view.
    pub fn decide(
        &mut self,
        view: &TableView,
        permitted: &PermittedActions,
    ) -> Result<EngineAction, PolicyError> {
        let available = abstract_candidates(view, permitted);
        if available.is_empty() {
            return Err(PolicyError::NoMappableAction);
        }

        let key = Self::infoset_key(view);
        let Some(row) = self.strategy_sum.get(&key).copied() else {
            return Err(PolicyError::UnseenInfoset(key));
        };

        let action = self.sample_masked(&row, &available);
        Ok(to_engine(action, view, permitted))
    }

    /// Sample from `row` restricted to `available`, renormalizing; uniform
    /// when the restriction removes all mass.
    #[allow(clippy::cast_precision_loss)]
    fn sample_masked(&mut self, row: &[f64; ACTION_SLOTS], available: &Actions) -> Action {
        let total: f64 = available.iter().map(|a| row[a.index()]).sum();
        let roll = self.rng.next_f64();

        if total > 0.0 {
            let mut cumulative = 0.0;
            for &action in available {
                cumulative += row[action.index()] / total;
                if roll < cumulative {
                    return action;
                }
            }
        } else {
            let uniform = 1.0 / available.len() as f64;
            let mut cumulative = 0.0;
            for &action in available {
                cumulative += uniform;
                if roll < cumulative {
                    return action;
                }
            }
        }
        available[available.len() - 1]
    }
}

/// Abstract actions with an engine counterpart this turn.
fn abstract_candidates(view: &TableView, permitted: &PermittedActions) -> Actions {
    let mut actions = Actions::new();

    if permitted.can_discard && view.hole.len() == HAND_SIZE {
        actions.push(Action::Discard0);
        actions.push(Action::Discard1);
        actions.push(Action::Discard2);
        return actions;
    }

    if permitted.can_fold {
        actions.push(Action::Fold);
    }
    if permitted.can_check || permitted.can_call {
        actions.push(Action::CheckCall);
    }
    if permitted.raise_bounds.is_some() {
        // Every sizing symbol clamps into the engine's raise window, so
        // all of them remain mappable whenever raising is permitted.
        actions.push(Action::Bet33);
        actions.push(Action::Bet66);
        actions.push(Action::BetPot);
        actions.push(Action::AllIn);
    }
    actions
}

/// Map an abstract pick to a concrete engine action.
fn to_engine(action: Action, view: &TableView, permitted: &PermittedActions) -> EngineAction {
    if let Some(index) = action.discard_index() {
        return EngineAction::Discard { index };
    }

    match action {
        Action::Fold => EngineAction::Fold,
        Action::CheckCall => {
            if permitted.can_check {
                EngineAction::Check
            } else {
                EngineAction::Call
            }
        }
        _ => {
            // The added chips cover the call and the raise together, the
            // same resolution the trainer's game model uses, so trained
            // frequencies land on equivalent engine bets.
            let add = match action {
                Action::Bet33 => view.pot.div_ceil(3),
                Action::Bet66 => (2 * view.pot).div_ceil(3),
                Action::BetPot => view.pot,
                _ => view.my_stack,
            };
            let target = view.my_pip + add;
            let (min, max) = permitted.raise_bounds.unwrap_or((target, target));
            EngineAction::Raise {
                to: target.clamp(min, max),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;
    use test_macros::timed_test;

    fn cards(spec: &str) -> Vec<Card> {
        spec.split_whitespace()
            .map(|s| s.parse().expect("test card"))
            .collect()
    }

    fn preflop_view() -> TableView {
        TableView {
            hole: cards("As Ah 2c"),
            board: vec![],
            street: Street::Preflop,
            seat: 0,
            history: String::new(),
            pot: 3,
            my_pip: 1,
            opp_pip: 2,
            my_stack: 399,
        }
    }

    fn betting_menu() -> PermittedActions {
        PermittedActions {
            can_fold: true,
            can_call: true,
            raise_bounds: Some((4, 400)),
            ..Default::default()
        }
    }

    /// A checkpoint whose only infoset is the preflop view above, with
    /// all mass on one action.
    fn single_action_checkpoint(action: Action) -> Checkpoint {
        let key = Policy::infoset_key(&preflop_view());
        let mut row = [0.0; ACTION_SLOTS];
        row[action.index()] = 7.0;
        let mut strategy_sum = FxHashMap::default();
        strategy_sum.insert(key, row);
        Checkpoint {
            iteration: 1,
            rng_state: 1,
            regret_sum: FxHashMap::default(),
            strategy_sum,
        }
    }

    #[timed_test]
    fn unseen_infoset_escalates() {
        let mut policy = Policy::from_checkpoint(
            Checkpoint {
                iteration: 0,
                rng_state: 1,
                regret_sum: FxHashMap::default(),
                strategy_sum: FxHashMap::default(),
            },
            1,
        );
        let result = policy.decide(&preflop_view(), &betting_menu());
        assert!(matches!(result, Err(PolicyError::UnseenInfoset(_))));
    }

    #[timed_test]
    fn all_mass_on_fold_folds() {
        let mut policy = Policy::from_checkpoint(single_action_checkpoint(Action::Fold), 3);
        let action = policy.decide(&preflop_view(), &betting_menu()).unwrap();
        assert_eq!(action, EngineAction::Fold);
    }

    #[timed_test]
    fn check_call_prefers_check_when_available() {
        let mut policy =
            Policy::from_checkpoint(single_action_checkpoint(Action::CheckCall), 3);
        let menu = PermittedActions {
            can_check: true,
            raise_bounds: Some((2, 400)),
            ..Default::default()
        };
        let action = policy.decide(&preflop_view(), &menu).unwrap();
        assert_eq!(action, EngineAction::Check);

        let mut policy =
            Policy::from_checkpoint(single_action_checkpoint(Action::CheckCall), 3);
        let action = policy.decide(&preflop_view(), &betting_menu()).unwrap();
        assert_eq!(action, EngineAction::Call);
    }

    #[timed_test]
    fn pot_raise_adds_the_pot_on_top_of_the_pip() {
        let mut policy = Policy::from_checkpoint(single_action_checkpoint(Action::BetPot), 3);
        let action = policy.decide(&preflop_view(), &betting_menu()).unwrap();
        // Pip 1, pot-sized addition 3: street total 4 (1 call + 2 raise).
        assert_eq!(action, EngineAction::Raise { to: 4 });
    }

    #[timed_test]
    fn raise_clamps_into_engine_bounds() {
        let mut policy = Policy::from_checkpoint(single_action_checkpoint(Action::AllIn), 3);
        let menu = PermittedActions {
            can_fold: true,
            can_call: true,
            raise_bounds: Some((4, 50)),
            ..Default::default()
        };
        let action = policy.decide(&preflop_view(), &menu).unwrap();
        assert_eq!(action, EngineAction::Raise { to: 50 });
    }

    #[timed_test]
    fn mass_on_unavailable_action_renormalizes() {
        // All trained mass sits on BetPot, but the engine forbids raising.
        let mut policy = Policy::from_checkpoint(single_action_checkpoint(Action::BetPot), 3);
        let menu = PermittedActions {
            can_fold: true,
            can_call: true,
            ..Default::default()
        };
        // Zero mass remains on {Fold, CheckCall}: the policy goes uniform
        // over them and still answers with a permitted action.
        for _ in 0..20 {
            let action = policy.decide(&preflop_view(), &menu).unwrap();
            assert!(matches!(action, EngineAction::Fold | EngineAction::Call));
        }
    }

    #[timed_test]
    fn discard_views_map_to_discard_indices() {
        let key_view = TableView {
            hole: cards("As Ah 2c"),
            board: cards("Kd 9h"),
            street: Street::Discard,
            seat: 0,
            history: String::new(),
            pot: 4,
            my_pip: 0,
            opp_pip: 0,
            my_stack: 398,
        };
        let key = Policy::infoset_key(&key_view);
        let mut row = [0.0; ACTION_SLOTS];
        row[Action::Discard2.index()] = 1.0;
        let mut strategy_sum = FxHashMap::default();
        strategy_sum.insert(key, row);

        let mut policy = Policy::from_checkpoint(
            Checkpoint {
                iteration: 1,
                rng_state: 1,
                regret_sum: FxHashMap::default(),
                strategy_sum,
            },
            5,
        );
        let menu = PermittedActions {
            can_discard: true,
            ..Default::default()
        };
        let action = policy.decide(&key_view, &menu).unwrap();
        assert_eq!(action, EngineAction::Discard { index: 2 });
    }

    #[timed_test]
    fn empty_menu_is_an_error() {
        let mut policy = Policy::from_checkpoint(single_action_checkpoint(Action::Fold), 3);
        let result = policy.decide(&preflop_view(), &PermittedActions::default());
        assert!(matches!(result, Err(PolicyError::NoMappableAction)));
    }

    #[timed_test]
    fn sampling_follows_trained_frequencies() {
        let key = Policy::infoset_key(&preflop_view());
        let mut row = [0.0; ACTION_SLOTS];
        row[Action::Fold.index()] = 3.0;
        row[Action::CheckCall.index()] = 1.0;
        let mut strategy_sum = FxHashMap::default();
        strategy_sum.insert(key, row);
        let mut policy = Policy::from_checkpoint(
            Checkpoint {
                iteration: 1,
                rng_state: 1,
                regret_sum: FxHashMap::default(),
                strategy_sum,
            },
            11,
        );

        let menu = PermittedActions {
            can_fold: true,
            can_call: true,
            ..Default::default()
        };
        let mut folds = 0;
        for _ in 0..400 {
            if policy.decide(&preflop_view(), &menu).unwrap() == EngineAction::Fold {
                folds += 1;
            }
        }
        // Expected 300; a wide tolerance keeps the test deterministic-safe.
        assert!((200..=390).contains(&folds), "folds = {folds}");
    }
}
