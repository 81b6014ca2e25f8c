use thiserror::Error;

/// Every way a game action can be refused.
///
/// `InvalidPieceState` is the odd one out: it marks construction of an
/// impossible piece and is a programmer error, not a user rejection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuleError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("The game is already over")]
    GameAlreadyOver,

    #[error("Illegal move")]
    IllegalMove,

    #[error("Illegal drop")]
    IllegalDrop,

    #[error("Promotion flag does not match the move")]
    InvalidPromotion,

    #[error("Piece state is not representable: {0}")]
    InvalidPieceState(&'static str),
}
