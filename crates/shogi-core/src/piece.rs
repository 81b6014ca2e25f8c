use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// The two players. `First` (sente) moves toward row 0, `Second` (gote)
/// toward row 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn flip(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Row delta of one forward step.
    pub fn forward(self) -> i8 {
        match self {
            Side::First => -1,
            Side::Second => 1,
        }
    }

    /// The rank farthest from this side's starting edge.
    pub fn far_rank(self) -> u8 {
        match self {
            Side::First => 0,
            Side::Second => 8,
        }
    }

    /// Is `row` inside this side's three-rank promotion zone?
    pub fn in_promotion_zone(self, row: u8) -> bool {
        match self {
            Side::First => row <= 2,
            Side::Second => row >= 6,
        }
    }

    pub fn kanji(self) -> &'static str {
        match self {
            Side::First => "先手",
            Side::Second => "後手",
        }
    }

    /// Symbol prefixed to this side's moves in the log.
    pub fn symbol(self) -> &'static str {
        match self {
            Side::First => "☗",
            Side::Second => "☖",
        }
    }
}

/// Base piece kinds. Promotion is a flag on `Piece`, not a separate kind,
/// so captures demote by simply reading the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Rook,
    Bishop,
    Gold,
    Silver,
    Knight,
    Lance,
    Pawn,
}

impl PieceKind {
    /// Kinds that have a promoted form. King and Gold do not.
    pub fn promotes(self) -> bool {
        !matches!(self, PieceKind::King | PieceKind::Gold)
    }

    /// Kinds a reserve can hold (everything capturable).
    pub fn droppable(self) -> bool {
        self != PieceKind::King
    }
}

/// A piece: kind, owner, and whether its promoted face is up.
///
/// The fields are private so the King/Gold-never-promote rule holds for
/// every `Piece` in existence, including deserialized ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPiece")]
pub struct Piece {
    kind: PieceKind,
    side: Side,
    promoted: bool,
}

#[derive(Deserialize)]
struct RawPiece {
    kind: PieceKind,
    side: Side,
    #[serde(default)]
    promoted: bool,
}

impl TryFrom<RawPiece> for Piece {
    type Error = RuleError;

    fn try_from(raw: RawPiece) -> Result<Self, Self::Error> {
        let piece = Piece::new(raw.kind, raw.side);
        if raw.promoted {
            piece.promote()
        } else {
            Ok(piece)
        }
    }
}

impl Piece {
    /// A fresh, unpromoted piece.
    pub fn new(kind: PieceKind, side: Side) -> Piece {
        Piece {
            kind,
            side,
            promoted: false,
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_promoted(&self) -> bool {
        self.promoted
    }

    /// The same piece with its promoted face up.
    pub fn promote(self) -> Result<Piece, RuleError> {
        if !self.kind.promotes() {
            return Err(RuleError::InvalidPieceState(
                "King and Gold have no promoted form",
            ));
        }
        Ok(Piece {
            promoted: true,
            ..self
        })
    }

    /// The unpromoted face, as a capture puts it into the reserve.
    pub fn demote(self) -> Piece {
        Piece {
            promoted: false,
            ..self
        }
    }

    /// Single-step move offsets (row delta, col delta), oriented for the
    /// owner. Sliding movement is listed by `slide_dirs` instead; a
    /// promoted Rook or Bishop has both.
    pub fn step_offsets(&self) -> Vec<(i8, i8)> {
        let f = self.side.forward();
        match (self.kind, self.promoted) {
            (PieceKind::King, _) => vec![
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
            (PieceKind::Rook, true) => vec![(-1, -1), (-1, 1), (1, -1), (1, 1)],
            (PieceKind::Rook, false) => vec![],
            (PieceKind::Bishop, true) => vec![(-1, 0), (0, -1), (0, 1), (1, 0)],
            (PieceKind::Bishop, false) => vec![],
            (PieceKind::Gold, _) => gold_steps(f),
            (PieceKind::Silver, false) => vec![(f, -1), (f, 0), (f, 1), (-f, -1), (-f, 1)],
            (PieceKind::Silver, true) => gold_steps(f),
            (PieceKind::Knight, false) => vec![(2 * f, -1), (2 * f, 1)],
            (PieceKind::Knight, true) => gold_steps(f),
            (PieceKind::Lance, true) => gold_steps(f),
            (PieceKind::Lance, false) => vec![],
            (PieceKind::Pawn, false) => vec![(f, 0)],
            (PieceKind::Pawn, true) => gold_steps(f),
        }
    }

    /// Sliding directions, repeated until blocked or capturing.
    pub fn slide_dirs(&self) -> Vec<(i8, i8)> {
        let f = self.side.forward();
        match (self.kind, self.promoted) {
            (PieceKind::Rook, _) => vec![(-1, 0), (1, 0), (0, -1), (0, 1)],
            (PieceKind::Bishop, _) => vec![(-1, -1), (-1, 1), (1, -1), (1, 1)],
            (PieceKind::Lance, false) => vec![(f, 0)],
            _ => vec![],
        }
    }

    pub fn is_slider(&self) -> bool {
        !self.slide_dirs().is_empty()
    }

    /// SFEN-style letter code: uppercase for First, `+` when promoted.
    pub fn letter(&self) -> String {
        let c = match self.kind {
            PieceKind::King => "k",
            PieceKind::Rook => "r",
            PieceKind::Bishop => "b",
            PieceKind::Gold => "g",
            PieceKind::Silver => "s",
            PieceKind::Knight => "n",
            PieceKind::Lance => "l",
            PieceKind::Pawn => "p",
        };
        let c = match self.side {
            Side::First => c.to_uppercase(),
            Side::Second => c.to_string(),
        };
        if self.promoted {
            format!("+{c}")
        } else {
            c
        }
    }

    /// Kanji used in log lines. The king's glyph differs by owner.
    pub fn kanji(&self) -> &'static str {
        match (self.kind, self.promoted) {
            (PieceKind::King, _) => match self.side {
                Side::First => "王",
                Side::Second => "玉",
            },
            (PieceKind::Rook, false) => "飛",
            (PieceKind::Rook, true) => "龍",
            (PieceKind::Bishop, false) => "角",
            (PieceKind::Bishop, true) => "馬",
            (PieceKind::Gold, _) => "金",
            (PieceKind::Silver, false) => "銀",
            (PieceKind::Silver, true) => "成銀",
            (PieceKind::Knight, false) => "桂",
            (PieceKind::Knight, true) => "成桂",
            (PieceKind::Lance, false) => "香",
            (PieceKind::Lance, true) => "成香",
            (PieceKind::Pawn, false) => "歩",
            (PieceKind::Pawn, true) => "と",
        }
    }
}

/// Gold movement: forward three, sideways, straight back.
fn gold_steps(f: i8) -> Vec<(i8, i8)> {
    vec![(f, -1), (f, 0), (f, 1), (0, -1), (0, 1), (-f, 0)]
}
