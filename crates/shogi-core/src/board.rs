use std::fmt;

use serde::{Deserialize, Serialize};

use crate::piece::{Piece, PieceKind, Side};

/// A board coordinate, both components in `0..9`.
///
/// The orientation is canonical: row 0 is Second's back rank, row 8 is
/// First's, col 0 is file 9 and col 8 is file 1. Player-relative flipping
/// is a presentation concern and never reaches this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSquare")]
pub struct Square {
    pub(crate) row: u8,
    pub(crate) col: u8,
}

#[derive(Deserialize)]
struct RawSquare {
    row: u8,
    col: u8,
}

impl TryFrom<RawSquare> for Square {
    type Error = String;

    fn try_from(raw: RawSquare) -> Result<Self, Self::Error> {
        Square::new(raw.row, raw.col)
            .ok_or_else(|| format!("square ({}, {}) is off the board", raw.row, raw.col))
    }
}

impl Square {
    pub fn new(row: u8, col: u8) -> Option<Square> {
        if row < 9 && col < 9 {
            Some(Square { row, col })
        } else {
            None
        }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// The square offset by (dr, dc), if it stays on the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Square> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..9).contains(&row) && (0..9).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// Traditional file number, counted 9..1 left to right.
    pub fn file(self) -> u8 {
        9 - self.col
    }

    /// `５六`-style coordinate: full-width file digit plus kanji rank.
    pub fn notation(self) -> String {
        const FILES: [&str; 9] = ["１", "２", "３", "４", "５", "６", "７", "８", "９"];
        const RANKS: [&str; 9] = ["一", "二", "三", "四", "五", "六", "七", "八", "九"];
        format!(
            "{}{}",
            FILES[self.file() as usize - 1],
            RANKS[self.row as usize]
        )
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The 9×9 grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Piece>; 9]; 9],
}

impl Board {
    pub fn empty() -> Board {
        Board {
            cells: [[None; 9]; 9],
        }
    }

    /// The standard opening layout: back ranks L N S G K G S N L, rook and
    /// bishop on the second ranks, a wall of pawns on rows 2 and 6.
    pub fn starting_position() -> Board {
        use PieceKind::*;

        let mut board = Board::empty();
        let back = [Lance, Knight, Silver, Gold, King, Gold, Silver, Knight, Lance];
        for (col, &kind) in back.iter().enumerate() {
            board.cells[0][col] = Some(Piece::new(kind, Side::Second));
            board.cells[8][col] = Some(Piece::new(kind, Side::First));
        }
        board.cells[1][1] = Some(Piece::new(Rook, Side::Second));
        board.cells[1][7] = Some(Piece::new(Bishop, Side::Second));
        board.cells[7][1] = Some(Piece::new(Bishop, Side::First));
        board.cells[7][7] = Some(Piece::new(Rook, Side::First));
        for col in 0..9 {
            board.cells[2][col] = Some(Piece::new(Pawn, Side::Second));
            board.cells[6][col] = Some(Piece::new(Pawn, Side::First));
        }
        board
    }

    /// All 81 squares in row-major order.
    pub fn squares() -> impl Iterator<Item = Square> {
        (0u8..9).flat_map(|row| (0u8..9).map(move |col| Square { row, col }))
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.row as usize][sq.col as usize]
    }

    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.row as usize][sq.col as usize] = piece;
    }

    /// Occupied squares and their pieces.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, rank)| {
            rank.iter().enumerate().filter_map(move |(col, cell)| {
                cell.map(|piece| {
                    (
                        Square {
                            row: row as u8,
                            col: col as u8,
                        },
                        piece,
                    )
                })
            })
        })
    }

    pub fn pieces_of(&self, side: Side) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.side() == side)
    }

    pub fn find_king(&self, side: Side) -> Option<Square> {
        self.pieces_of(side)
            .find(|(_, p)| p.kind() == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    /// Does `side` have an unpromoted pawn anywhere in `col`?
    pub fn has_unpromoted_pawn_in_col(&self, side: Side, col: u8) -> bool {
        (0..9).any(|row| {
            matches!(
                self.cells[row][col as usize],
                Some(p) if p.side() == side && p.kind() == PieceKind::Pawn && !p.is_promoted()
            )
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in &self.cells {
            for cell in rank {
                match cell {
                    Some(p) => write!(f, "{:>3}", p.letter())?,
                    None => write!(f, "{:>3}", ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
