use crate::Card;
use crate::session::Seat;
use thiserror::Error;

/// Reason a command was rejected. A denied command leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("invalid card code: {0}")]
    InvalidCode(String),
    #[error("card {0} is already in use")]
    DuplicateCard(Card),
    #[error("card {0} is not in your hand")]
    CardNotInHand(Card),
    #[error("incomplete hand: expected 7 cards, have {0}")]
    IncompleteHand(usize),
    #[error("hand slot {0} is out of range")]
    InvalidSlot(usize),
    #[error("player count must be 2, 3 or 4, got {0}")]
    InvalidPlayerCount(u8),
    #[error("no round is running")]
    RoundNotRunning,
    #[error("a round is already running")]
    RoundAlreadyRunning,
    #[error("there is no card on the table")]
    MissingTableCard,
    #[error("seat {0:?} is not active with this player count")]
    SeatNotActive(Seat),
    #[error("it is not {0:?}'s turn")]
    NotYourTurn(Seat),
    #[error("waiting for: {0}")]
    PendingRequest(String),
    #[error("nothing is waiting for that answer")]
    NoPendingRequest,
    #[error("card {0} is not a possible answer here")]
    UnexpectedCard(Card),
    #[error("the hand is not ready to close")]
    NotClosureReady,
    #[error("nothing left to draw")]
    DrawPileEmpty,
}
