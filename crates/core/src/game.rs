//! The Hold'em Toss hand state machine.
//!
//! Heads-up, three hole cards each, a two-card flop, then a public discard
//! round in which every player tosses one hole card face-up onto the board
//! before the turn. Betting uses a nine-symbol action alphabet with
//! pot-relative sizes; aggressive actions are capped at four per street so
//! the tree stays bounded.
//!
//! ## Street order
//! 1. Preflop betting (small blind acts first; an open limp leaves the big
//!    blind an option).
//! 2. Flop: two community cards, betting (big blind first).
//! 3. Discard: seat 0 then seat 1 each toss one card onto the board. No
//!    betting.
//! 4. Turn and river: one card each, betting.
//! 5. Showdown: each player's two kept cards plus all six board cards form
//!    an eight-card pool; best five-card hand wins, ties split.

use arrayvec::ArrayVec;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::abstraction;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::evaluation::evaluate;
use crate::poker::{Card, Deck, sort_descending};

/// Hole cards dealt to each player.
pub const HAND_SIZE: usize = 3;

/// Community cards dealt at the flop.
pub const FLOP_SIZE: usize = 2;

/// Size of the action alphabet.
pub const MAX_ACTIONS: usize = 9;

/// Stack-allocated legal-action list.
pub type Actions = ArrayVec<Action, MAX_ACTIONS>;

// ---------------------------------------------------------------------------
// Actions and streets
// ---------------------------------------------------------------------------

/// The abstract action alphabet shared by trainer and runtime policy.
///
/// Bet symbols are sized relative to the pot at the moment the action
/// resolves; `Discard*` symbols name an index into the player's sorted
/// hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Fold,
    CheckCall,
    Bet33,
    Bet66,
    BetPot,
    AllIn,
    Discard0,
    Discard1,
    Discard2,
}

impl Action {
    /// Number of symbols in the alphabet.
    pub const COUNT: usize = MAX_ACTIONS;

    /// Every symbol, in table-slot order.
    pub const ALL: [Self; MAX_ACTIONS] = [
        Self::Fold,
        Self::CheckCall,
        Self::Bet33,
        Self::Bet66,
        Self::BetPot,
        Self::AllIn,
        Self::Discard0,
        Self::Discard1,
        Self::Discard2,
    ];

    /// Fixed table slot for this symbol.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Action::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The hole-card index named by a discard symbol.
    #[must_use]
    pub const fn discard_index(self) -> Option<usize> {
        match self {
            Self::Discard0 => Some(0),
            Self::Discard1 => Some(1),
            Self::Discard2 => Some(2),
            _ => None,
        }
    }

    /// Whether this symbol bets or raises chips.
    #[must_use]
    pub const fn is_aggressive(self) -> bool {
        matches!(self, Self::Bet33 | Self::Bet66 | Self::BetPot | Self::AllIn)
    }
}

/// Game street. Discriminants are the canonical street numbers used in
/// infoset keys (the gap at 1 is inherited from the wire protocol's
/// numbering and kept for key compatibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Street {
    Preflop = 0,
    Flop = 2,
    Discard = 3,
    Turn = 4,
    River = 5,
    Showdown = 6,
}

impl Street {
    /// Canonical street number.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Whether chips can move on this street.
    #[must_use]
    pub const fn is_betting(self) -> bool {
        matches!(self, Self::Preflop | Self::Flop | Self::Turn | Self::River)
    }

    /// Per-street history slot.
    const fn history_slot(self) -> usize {
        match self {
            Self::Preflop => 0,
            Self::Flop => 1,
            Self::Discard => 2,
            Self::Turn => 3,
            Self::River | Self::Showdown => 4,
        }
    }
}

/// Why a hand ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// This seat folded; the opponent takes the pot.
    Fold(usize),
    /// Hands were compared. `None` means a chopped pot.
    Showdown { winner: Option<usize> },
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Mutable state of a single hand.
///
/// Built once per playout by [`GameState::deal`], mutated in place by
/// [`GameState::apply_action`], and dropped at terminal.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Each player's hole cards, sorted by descending rank. Three cards
    /// until that player discards, two afterwards.
    pub hole: [ArrayVec<Card, HAND_SIZE>; 2],
    /// Community cards, discards included once tossed.
    pub board: ArrayVec<Card, 6>,
    /// Current street.
    pub street: Street,
    /// Total chips committed by both players.
    pub pot: u32,
    /// Remaining stacks.
    pub stacks: [u32; 2],
    /// Lifetime chip contributions; always sums to `pot`.
    pub contributions: [u32; 2],
    /// Seat to act next.
    pub to_act: usize,
    /// Card each player tossed, public once on the board.
    pub discarded: [Option<Card>; 2],
    /// Set when the hand is over.
    pub terminal: Option<Terminal>,
    deck: Deck,
    pips: [u32; 2],
    street_raises: u8,
    histories: [String; 5],
    config: GameConfig,
}

impl GameState {
    /// Shuffle a fresh deck, deal three cards to each seat, and post the
    /// blinds. Seat 0 posts the small blind and acts first preflop.
    pub fn deal<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Result<Self, GameError> {
        let mut deck = Deck::shuffled(rng);
        let mut hole: [ArrayVec<Card, HAND_SIZE>; 2] = [ArrayVec::new(), ArrayVec::new()];
        for seat_hole in &mut hole {
            for _ in 0..HAND_SIZE {
                seat_hole.push(deck.draw()?);
            }
            sort_descending(seat_hole);
        }

        let (sb, bb) = (config.small_blind, config.big_blind);
        Ok(Self {
            hole,
            board: ArrayVec::new(),
            street: Street::Preflop,
            pot: sb + bb,
            stacks: [config.starting_stack - sb, config.starting_stack - bb],
            contributions: [sb, bb],
            to_act: 0,
            discarded: [None, None],
            terminal: None,
            deck,
            pips: [sb, bb],
            street_raises: 0,
            histories: Default::default(),
            config: config.clone(),
        })
    }

    /// Whether the hand is over.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Betting-history token string for the current street.
    #[must_use]
    pub fn history(&self) -> &str {
        &self.histories[self.street.history_slot()]
    }

    /// Chips the acting player must add to match the opponent.
    #[must_use]
    pub fn to_call(&self) -> u32 {
        self.pips[1 - self.to_act].saturating_sub(self.pips[self.to_act])
    }

    /// Chips `seat` has committed on the current street.
    #[must_use]
    pub fn pip(&self, seat: usize) -> u32 {
        self.pips[seat]
    }

    /// The game configuration this hand was dealt under.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Legal actions
    // -----------------------------------------------------------------------

    /// The subset of the alphabet that is legal right now.
    #[must_use]
    pub fn legal_actions(&self) -> Actions {
        let mut actions = Actions::new();
        if self.terminal.is_some() {
            return actions;
        }

        if self.street == Street::Discard {
            if self.hole[self.to_act].len() == HAND_SIZE {
                actions.push(Action::Discard0);
                actions.push(Action::Discard1);
                actions.push(Action::Discard2);
            }
            return actions;
        }

        let to_call = self.to_call();
        let stack = self.stacks[self.to_act];

        if to_call > 0 {
            actions.push(Action::Fold);
        }
        actions.push(Action::CheckCall);

        if self.can_raise() {
            for action in [Action::Bet33, Action::Bet66, Action::BetPot] {
                let add = self.bet_addition(action);
                if add <= stack && add >= to_call + self.config.big_blind {
                    actions.push(action);
                }
            }
            // All-in is exempt from the minimum-raise rule.
            actions.push(Action::AllIn);
        }

        actions
    }

    /// Whether any aggressive action is available: under the street cap,
    /// with chips beyond the call, against an opponent who can still call.
    fn can_raise(&self) -> bool {
        self.street_raises < self.config.max_raises_per_street
            && self.stacks[self.to_act] > self.to_call()
            && self.stacks[1 - self.to_act] > 0
    }

    /// Chips a sized bet adds on top of the player's current pip. Computed
    /// on the pot as it stands, outstanding bet included; fractional sizes
    /// round up so no bet is ever zero chips.
    fn bet_addition(&self, action: Action) -> u32 {
        match action {
            Action::Bet33 => self.pot.div_ceil(3),
            Action::Bet66 => (2 * self.pot).div_ceil(3),
            Action::BetPot => self.pot,
            Action::AllIn => self.stacks[self.to_act],
            _ => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Apply one action for the seat to act.
    ///
    /// # Errors
    ///
    /// [`GameError::IllegalAction`] if the action is not currently legal;
    /// [`GameError::DeckExhausted`] if a street transition cannot deal.
    pub fn apply_action(&mut self, action: Action) -> Result<(), GameError> {
        if !self.legal_actions().contains(&action) {
            return Err(GameError::IllegalAction {
                action,
                street: self.street,
            });
        }

        match action {
            Action::Discard0 | Action::Discard1 | Action::Discard2 => {
                let index = action.discard_index().unwrap_or(0);
                self.apply_discard(index)
            }
            Action::Fold => {
                self.push_token('f');
                self.terminal = Some(Terminal::Fold(self.to_act));
                Ok(())
            }
            Action::CheckCall => self.apply_check_call(),
            _ => self.apply_bet(action),
        }
    }

    /// Toss the card at `index` in the acting player's sorted hole onto
    /// the board. Once both players have tossed, the turn is dealt.
    fn apply_discard(&mut self, index: usize) -> Result<(), GameError> {
        let seat = self.to_act;
        let card = self.hole[seat].remove(index);
        self.discarded[seat] = Some(card);
        self.board.push(card);

        if self.discarded[0].is_some() && self.discarded[1].is_some() {
            self.advance_street()
        } else {
            self.to_act = 1 - seat;
            Ok(())
        }
    }

    fn apply_check_call(&mut self) -> Result<(), GameError> {
        let seat = self.to_act;
        let opponent = 1 - seat;
        let to_call = self.to_call();
        let opening = self.history().is_empty();
        self.push_token('c');

        if to_call == 0 {
            // A check: the first check passes the action, the second
            // closes the street.
            if opening {
                self.to_act = opponent;
                return Ok(());
            }
            return self.advance_street();
        }

        let paid = to_call.min(self.stacks[seat]);
        self.stacks[seat] -= paid;
        self.pips[seat] += paid;
        self.contributions[seat] += paid;
        self.pot += paid;

        if paid < to_call {
            // Short all-in call: the uncalled excess goes back to the
            // aggressor.
            let excess = to_call - paid;
            self.stacks[opponent] += excess;
            self.pips[opponent] -= excess;
            self.contributions[opponent] -= excess;
            self.pot -= excess;
        }

        // A small-blind open limp leaves the big blind an option.
        if self.street == Street::Preflop && opening {
            self.to_act = opponent;
            return Ok(());
        }
        self.advance_street()
    }

    fn apply_bet(&mut self, action: Action) -> Result<(), GameError> {
        let seat = self.to_act;
        let add = self.bet_addition(action);
        debug_assert!(add <= self.stacks[seat]);

        let token = if self.street_raises == 0 { 'b' } else { 'r' };
        self.push_token(token);

        self.stacks[seat] -= add;
        self.pips[seat] += add;
        self.contributions[seat] += add;
        self.pot += add;
        self.street_raises += 1;
        self.to_act = 1 - seat;
        Ok(())
    }

    fn push_token(&mut self, token: char) {
        self.histories[self.street.history_slot()].push(token);
    }

    /// Close the current street: reset per-street chip state, deal the next
    /// community cards, hand the action to the opening seat.
    fn advance_street(&mut self) -> Result<(), GameError> {
        self.pips = [0, 0];
        self.street_raises = 0;

        match self.street {
            Street::Preflop => {
                for _ in 0..FLOP_SIZE {
                    let card = self.deck.draw()?;
                    self.board.push(card);
                }
                self.street = Street::Flop;
                self.to_act = 1;
            }
            Street::Flop => {
                self.street = Street::Discard;
                self.to_act = 0;
            }
            Street::Discard => {
                let card = self.deck.draw()?;
                self.board.push(card);
                self.street = Street::Turn;
                self.to_act = 1;
            }
            Street::Turn => {
                let card = self.deck.draw()?;
                self.board.push(card);
                self.street = Street::River;
                self.to_act = 1;
            }
            Street::River => {
                self.street = Street::Showdown;
                self.settle_showdown();
            }
            Street::Showdown => {
                debug_assert!(false, "advance past showdown");
            }
        }
        Ok(())
    }

    /// Compare the eight-card pools and record the outcome.
    fn settle_showdown(&mut self) {
        let score = |seat: usize| {
            let mut pool: ArrayVec<Card, 8> = ArrayVec::new();
            pool.extend(self.hole[seat].iter().copied());
            pool.extend(self.board.iter().copied());
            evaluate(&pool)
        };
        let winner = match score(0).cmp(&score(1)) {
            std::cmp::Ordering::Greater => Some(0),
            std::cmp::Ordering::Less => Some(1),
            std::cmp::Ordering::Equal => None,
        };
        self.terminal = Some(Terminal::Showdown { winner });
    }

    // -----------------------------------------------------------------------
    // Outcome
    // -----------------------------------------------------------------------

    /// Chips won or lost by `seat`, relative to its stake. Zero for a
    /// non-terminal state. The winner gains exactly the loser's total
    /// contribution, so utilities sum to zero.
    #[must_use]
    pub fn utility(&self, seat: usize) -> f64 {
        let Some(terminal) = self.terminal else {
            return 0.0;
        };
        let settle = |winner: usize| {
            if winner == seat {
                f64::from(self.contributions[1 - seat])
            } else {
                -f64::from(self.contributions[seat])
            }
        };
        match terminal {
            Terminal::Fold(folder) => settle(1 - folder),
            Terminal::Showdown { winner: Some(w) } => settle(w),
            Terminal::Showdown { winner: None } => 0.0,
        }
    }

    /// The infoset key for `seat`, built from its private cards, the
    /// public board, and the current street's betting history only.
    #[must_use]
    pub fn infoset_key(&self, seat: usize) -> String {
        let bucket = abstraction::bucket_for(self.street, &self.hole[seat], &self.board);
        abstraction::infoset_key(self.street, seat, &bucket, self.history())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
