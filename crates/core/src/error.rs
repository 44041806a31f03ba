use thiserror::Error;

use crate::game::{Action, Street};

/// Fatal errors raised by the game engine.
///
/// Both variants indicate a bug in the caller or in the abstraction, not a
/// recoverable runtime condition; the trainer propagates them out of the
/// traversal immediately.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// An action outside `legal_actions` was applied.
    #[error("illegal action {action:?} on street {street:?}")]
    IllegalAction { action: Action, street: Street },

    /// A deal was requested with too few cards left in the deck.
    #[error("deck exhausted: requested {requested}, {available} remaining")]
    DeckExhausted { requested: usize, available: usize },
}
