//! Shogi game model: pieces and the board, the legality rules, and the
//! turn-by-turn session state machine. Nothing async and no I/O lives
//! here; the server crate drives it.

pub mod board;
pub mod error;
pub mod piece;
pub mod rules;
pub mod session;

pub use board::{Board, Square};
pub use error::RuleError;
pub use piece::{Piece, PieceKind, Side};
pub use rules::{
    detect_terminal, in_check, is_attacked, legal_board_moves, legal_drops, may_promote,
    must_promote,
};
pub use session::{GameAction, MoveRecord, Reserve, Reserves, Session, SessionStatus};
