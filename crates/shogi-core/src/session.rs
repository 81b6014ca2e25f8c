//! A session is one authoritative game in progress: board, captured
//! reserves, side to move, move log, and outcome. All mutation funnels
//! through [`Session::apply`], which validates fully before touching
//! state, so a rejected action leaves the session byte-identical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Square};
use crate::error::RuleError;
use crate::piece::{Piece, PieceKind, Side};
use crate::rules;

/// Captured pieces held by one player, keyed by demoted kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reserve(BTreeMap<PieceKind, u8>);

impl Reserve {
    pub fn add(&mut self, kind: PieceKind) {
        *self.0.entry(kind).or_insert(0) += 1;
    }

    /// Removes one piece of `kind`. Returns false when none is held.
    pub fn take(&mut self, kind: PieceKind) -> bool {
        match self.0.get_mut(&kind) {
            Some(n) => {
                *n -= 1;
                if *n == 0 {
                    self.0.remove(&kind);
                }
                true
            }
            None => false,
        }
    }

    pub fn count(&self, kind: PieceKind) -> u8 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn contains(&self, kind: PieceKind) -> bool {
        self.count(kind) > 0
    }

    pub fn kinds(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Both players' reserves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub first: Reserve,
    pub second: Reserve,
}

impl Reserves {
    pub fn of(&self, side: Side) -> &Reserve {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }

    pub fn of_mut(&mut self, side: Side) -> &mut Reserve {
        match side {
            Side::First => &mut self.first,
            Side::Second => &mut self.second,
        }
    }
}

/// A player's intent for one turn. Drops carry no promotion flag;
/// dropped pieces always enter the board unpromoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameAction {
    Move {
        from: Square,
        to: Square,
        #[serde(default)]
        promote: bool,
    },
    Drop {
        piece: PieceKind,
        to: Square,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Checkmate { winner: Side },
    Resigned { winner: Side },
    Aborted,
}

impl SessionStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    pub fn winner(&self) -> Option<Side> {
        match self {
            SessionStatus::Checkmate { winner } | SessionStatus::Resigned { winner } => {
                Some(*winner)
            }
            _ => None,
        }
    }
}

/// One applied action as it went into the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub side: Side,
    pub action: GameAction,
    pub piece: PieceKind,
    /// The piece stood promoted after the action.
    pub promoted: bool,
    pub captured: Option<PieceKind>,
    pub notation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    room_id: String,
    board: Board,
    reserves: Reserves,
    turn: Side,
    move_log: Vec<MoveRecord>,
    status: SessionStatus,
}

impl Session {
    /// A fresh game at the starting position, first player to move.
    pub fn new(room_id: impl Into<String>) -> Self {
        Self::from_parts(room_id, Board::starting_position(), Reserves::default(), Side::First)
    }

    /// An active session over an arbitrary position.
    pub fn from_parts(
        room_id: impl Into<String>,
        board: Board,
        reserves: Reserves,
        turn: Side,
    ) -> Self {
        Session {
            room_id: room_id.into(),
            board,
            reserves,
            turn,
            move_log: Vec::new(),
            status: SessionStatus::Active,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn reserves(&self) -> &Reserves {
        &self.reserves
    }

    pub fn reserve(&self, side: Side) -> &Reserve {
        self.reserves.of(side)
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn move_log(&self) -> &[MoveRecord] {
        &self.move_log
    }

    /// Validates and applies one action for `side`. The turn check runs
    /// before the status check, so a player acting out of turn hears
    /// `NotYourTurn` even once the game is over. Nothing mutates unless
    /// every check passes.
    pub fn apply(&mut self, side: Side, action: GameAction) -> Result<MoveRecord, RuleError> {
        if side != self.turn {
            return Err(RuleError::NotYourTurn);
        }
        if self.status.is_over() {
            return Err(RuleError::GameAlreadyOver);
        }
        let record = match action {
            GameAction::Move { from, to, promote } => {
                let (piece, captured) = self.plan_move(side, from, to, promote)?;
                let moved = if promote { piece.promote()? } else { piece };
                let notation = move_notation(side, piece, to, promote);
                self.board.set(from, None);
                self.board.set(to, Some(moved));
                let captured_kind = captured.map(|p| p.demote().kind());
                if let Some(kind) = captured_kind {
                    self.reserves.of_mut(side).add(kind);
                }
                MoveRecord {
                    side,
                    action,
                    piece: moved.kind(),
                    promoted: moved.is_promoted(),
                    captured: captured_kind,
                    notation,
                }
            }
            GameAction::Drop { piece: kind, to } => {
                let dropped = self.plan_drop(side, kind, to)?;
                self.reserves.of_mut(side).take(kind);
                self.board.set(to, Some(dropped));
                MoveRecord {
                    side,
                    action,
                    piece: kind,
                    promoted: false,
                    captured: None,
                    notation: drop_notation(side, dropped, to),
                }
            }
        };
        self.move_log.push(record.clone());
        self.turn = self.turn.flip();
        if let Some(winner) = rules::detect_terminal(self) {
            self.status = SessionStatus::Checkmate { winner };
        }
        Ok(record)
    }

    /// Concedes the game for `side`; their opponent wins.
    pub fn resign(&mut self, side: Side) -> Result<(), RuleError> {
        if self.status.is_over() {
            return Err(RuleError::GameAlreadyOver);
        }
        self.status = SessionStatus::Resigned {
            winner: side.flip(),
        };
        Ok(())
    }

    /// Ends the game without a winner, e.g. when a room empties out.
    pub fn abort(&mut self) {
        if !self.status.is_over() {
            self.status = SessionStatus::Aborted;
        }
    }

    /// The move log as display notation, oldest first.
    pub fn log_lines(&self) -> Vec<String> {
        self.move_log.iter().map(|r| r.notation.clone()).collect()
    }

    fn plan_move(
        &self,
        side: Side,
        from: Square,
        to: Square,
        promote: bool,
    ) -> Result<(Piece, Option<Piece>), RuleError> {
        // An empty or opposing source square is an ownership violation,
        // not a geometry one. A replayed move that lost a race lands here
        // once the piece has left the square.
        let piece = match self.board.get(from) {
            Some(p) if p.side() == side => p,
            _ => return Err(RuleError::NotYourTurn),
        };
        if !rules::legal_board_moves(self, from).contains(&to) {
            return Err(RuleError::IllegalMove);
        }
        if promote && !rules::may_promote(piece, from, to) {
            return Err(RuleError::InvalidPromotion);
        }
        if !promote && !piece.is_promoted() && rules::must_promote(piece.kind(), to, side) {
            return Err(RuleError::InvalidPromotion);
        }
        Ok((piece, self.board.get(to)))
    }

    fn plan_drop(&self, side: Side, kind: PieceKind, to: Square) -> Result<Piece, RuleError> {
        if !self.reserve(side).contains(kind) {
            return Err(RuleError::IllegalDrop);
        }
        if !rules::legal_drops(self, side, kind).contains(&to) {
            return Err(RuleError::IllegalDrop);
        }
        Ok(Piece::new(kind, side))
    }
}

fn move_notation(side: Side, piece: Piece, to: Square, promote: bool) -> String {
    let mut line = format!("{}{}{}", side.symbol(), to.notation(), piece.kanji());
    if promote {
        line.push('成');
    }
    line
}

fn drop_notation(side: Side, piece: Piece, to: Square) -> String {
    format!("{}{}{}打", side.symbol(), to.notation(), piece.kanji())
}
