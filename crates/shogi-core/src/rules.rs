//! Move legality: movement geometry, check detection, drop restrictions
//! (nifu and the pawn-drop-mate prohibition), promotion predicates, and
//! terminal detection. Everything here is a pure function over a session
//! snapshot; nothing mutates.

use crate::board::{Board, Square};
use crate::piece::{Piece, PieceKind, Side};
use crate::session::{Reserve, Session};

/// Squares the piece on `from` can reach by movement alone: steps plus
/// slide-until-blocked, never landing on a friendly piece.
fn raw_destinations(board: &Board, from: Square, piece: Piece) -> Vec<Square> {
    let mut out = Vec::new();
    for (dr, dc) in piece.step_offsets() {
        if let Some(to) = from.offset(dr, dc) {
            if board.get(to).map(|p| p.side()) != Some(piece.side()) {
                out.push(to);
            }
        }
    }
    for (dr, dc) in piece.slide_dirs() {
        let mut cur = from;
        while let Some(to) = cur.offset(dr, dc) {
            match board.get(to) {
                None => {
                    out.push(to);
                    cur = to;
                }
                Some(p) => {
                    if p.side() != piece.side() {
                        out.push(to);
                    }
                    break;
                }
            }
        }
    }
    out
}

fn board_after_move(board: &Board, from: Square, to: Square) -> Board {
    let mut next = board.clone();
    let piece = next.get(from);
    next.set(from, None);
    next.set(to, piece);
    next
}

fn board_after_drop(board: &Board, piece: Piece, to: Square) -> Board {
    let mut next = board.clone();
    next.set(to, Some(piece));
    next
}

/// Is `sq` attacked by any piece of `by`?
pub fn is_attacked(board: &Board, sq: Square, by: Side) -> bool {
    board
        .pieces_of(by)
        .any(|(from, piece)| raw_destinations(board, from, piece).contains(&sq))
}

/// Is `side`'s king attacked?
pub fn in_check(board: &Board, side: Side) -> bool {
    match board.find_king(side) {
        Some(sq) => is_attacked(board, sq, side.flip()),
        None => false,
    }
}

/// Legal destinations for the piece on `from`. Empty when `from` is empty
/// or holds a piece of the waiting side. Moves that would leave the
/// mover's own king attacked are excluded.
pub fn legal_board_moves(session: &Session, from: Square) -> Vec<Square> {
    board_moves(session.board(), session.turn(), from)
}

pub(crate) fn board_moves(board: &Board, turn: Side, from: Square) -> Vec<Square> {
    let piece = match board.get(from) {
        Some(p) if p.side() == turn => p,
        _ => return Vec::new(),
    };
    raw_destinations(board, from, piece)
        .into_iter()
        .filter(|&to| !in_check(&board_after_move(board, from, to), turn))
        .collect()
}

/// Legal drop squares for `kind` held by `side`: empty squares, minus
/// nifu files for pawns, minus pawn drops that would deliver immediate
/// checkmate, minus anything that leaves the dropper's own king attacked.
/// Whether the reserve actually holds the piece is checked at application
/// time, not here.
pub fn legal_drops(session: &Session, side: Side, kind: PieceKind) -> Vec<Square> {
    if !kind.droppable() {
        return Vec::new();
    }
    let board = session.board();
    let piece = Piece::new(kind, side);
    Board::squares()
        .filter(|&sq| board.get(sq).is_none())
        .filter(|&sq| {
            kind != PieceKind::Pawn || !board.has_unpromoted_pawn_in_col(side, sq.col())
        })
        .filter(|&sq| !in_check(&board_after_drop(board, piece, sq), side))
        .filter(|&sq| {
            kind != PieceKind::Pawn
                || !pawn_drop_mates(board, session.reserve(side.flip()), piece, sq)
        })
        .collect()
}

/// Would dropping `pawn` on `sq` checkmate the opponent on the spot?
/// Only a contact check can, so anything not directly behind the enemy
/// king is cleared without simulation.
fn pawn_drop_mates(board: &Board, defender_reserve: &Reserve, pawn: Piece, sq: Square) -> bool {
    let defender = pawn.side().flip();
    let ahead = match sq.offset(pawn.side().forward(), 0) {
        Some(s) => s,
        None => return false,
    };
    match board.get(ahead) {
        Some(p) if p.kind() == PieceKind::King && p.side() == defender => {}
        _ => return false,
    }
    is_checkmated(&board_after_drop(board, pawn, sq), defender_reserve, defender)
}

/// Is `side` in check with no board move or drop that resolves it?
///
/// Drop escapes are filtered for nifu only: a pawn contact check cannot
/// be blocked by a drop, so the drop-mate exclusion never changes the
/// answer here and the recursion stays one level deep.
pub fn is_checkmated(board: &Board, reserve: &Reserve, side: Side) -> bool {
    if !in_check(board, side) {
        return false;
    }
    !has_escape(board, reserve, side)
}

fn has_escape(board: &Board, reserve: &Reserve, side: Side) -> bool {
    for (from, piece) in board.pieces_of(side) {
        for to in raw_destinations(board, from, piece) {
            if !in_check(&board_after_move(board, from, to), side) {
                return true;
            }
        }
    }
    for kind in reserve.kinds() {
        let piece = Piece::new(kind, side);
        for sq in Board::squares() {
            if board.get(sq).is_some() {
                continue;
            }
            if kind == PieceKind::Pawn && board.has_unpromoted_pawn_in_col(side, sq.col()) {
                continue;
            }
            if !in_check(&board_after_drop(board, piece, sq), side) {
                return true;
            }
        }
    }
    false
}

/// Moves that may not end unpromoted: Pawn and Lance on the far rank,
/// Knight on the far two ranks, where the piece would never move again.
pub fn must_promote(kind: PieceKind, to: Square, side: Side) -> bool {
    match kind {
        PieceKind::Pawn | PieceKind::Lance => to.row() == side.far_rank(),
        PieceKind::Knight => match side {
            Side::First => to.row() <= 1,
            Side::Second => to.row() >= 7,
        },
        _ => false,
    }
}

/// May the piece promote on a move from `from` to `to`? Requires a
/// promotable, not-yet-promoted kind and one endpoint inside the mover's
/// promotion zone.
pub fn may_promote(piece: Piece, from: Square, to: Square) -> bool {
    piece.kind().promotes()
        && !piece.is_promoted()
        && (piece.side().in_promotion_zone(from.row()) || piece.side().in_promotion_zone(to.row()))
}

/// Terminal check for the side to move: no legal board move and no legal
/// drop means the game is over with the opponent winning. A stuck side
/// that is not even in check loses the same way.
pub fn detect_terminal(session: &Session) -> Option<Side> {
    let side = session.turn();
    let board = session.board();
    let any_move = board
        .pieces_of(side)
        .any(|(from, _)| !board_moves(board, side, from).is_empty());
    if any_move {
        return None;
    }
    let any_drop = session
        .reserve(side)
        .kinds()
        .any(|kind| !legal_drops(session, side, kind).is_empty());
    if any_drop {
        return None;
    }
    Some(side.flip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Reserves;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col).unwrap()
    }

    fn place(board: &mut Board, row: u8, col: u8, kind: PieceKind, side: Side) {
        board.set(sq(row, col), Some(Piece::new(kind, side)));
    }

    fn place_promoted(board: &mut Board, row: u8, col: u8, kind: PieceKind, side: Side) {
        board.set(sq(row, col), Some(Piece::new(kind, side).promote().unwrap()));
    }

    fn session_with(board: Board, turn: Side) -> Session {
        Session::from_parts("test", board, Reserves::default(), turn)
    }

    // ---- movement geometry ----

    #[test]
    fn test_pawn_moves_one_step_forward() {
        let session = Session::new("test");
        assert_eq!(legal_board_moves(&session, sq(6, 4)), vec![sq(5, 4)]);
    }

    #[test]
    fn test_moves_for_opposing_or_empty_square_are_empty() {
        let session = Session::new("test");
        // Second's pawn while First is to move
        assert!(legal_board_moves(&session, sq(2, 4)).is_empty());
        // an empty square
        assert!(legal_board_moves(&session, sq(4, 4)).is_empty());
    }

    #[test]
    fn test_lance_slides_until_blocked() {
        let mut board = Board::empty();
        place(&mut board, 8, 0, PieceKind::Lance, Side::First);
        place(&mut board, 3, 0, PieceKind::Pawn, Side::Second);
        let session = session_with(board, Side::First);
        let moves = legal_board_moves(&session, sq(8, 0));
        assert_eq!(
            moves,
            vec![sq(7, 0), sq(6, 0), sq(5, 0), sq(4, 0), sq(3, 0)]
        );
    }

    #[test]
    fn test_lance_stops_before_friendly_piece() {
        let mut board = Board::empty();
        place(&mut board, 8, 0, PieceKind::Lance, Side::First);
        place(&mut board, 5, 0, PieceKind::Pawn, Side::First);
        let session = session_with(board, Side::First);
        assert_eq!(
            legal_board_moves(&session, sq(8, 0)),
            vec![sq(7, 0), sq(6, 0)]
        );
    }

    #[test]
    fn test_knight_jumps_over_pieces() {
        let mut board = Board::empty();
        place(&mut board, 8, 1, PieceKind::Knight, Side::First);
        place(&mut board, 7, 1, PieceKind::Pawn, Side::First);
        let session = session_with(board, Side::First);
        let moves = legal_board_moves(&session, sq(8, 1));
        assert_eq!(moves, vec![sq(6, 0), sq(6, 2)]);
    }

    #[test]
    fn test_gold_and_silver_patterns() {
        let mut board = Board::empty();
        place(&mut board, 4, 4, PieceKind::Gold, Side::First);
        let session = session_with(board.clone(), Side::First);
        let gold: Vec<Square> = legal_board_moves(&session, sq(4, 4));
        assert_eq!(gold.len(), 6);
        assert!(gold.contains(&sq(3, 4)) && gold.contains(&sq(5, 4)));
        assert!(!gold.contains(&sq(5, 3)) && !gold.contains(&sq(5, 5)));

        board.set(sq(4, 4), Some(Piece::new(PieceKind::Silver, Side::First)));
        let session = session_with(board, Side::First);
        let silver = legal_board_moves(&session, sq(4, 4));
        assert_eq!(silver.len(), 5);
        assert!(silver.contains(&sq(5, 3)) && silver.contains(&sq(5, 5)));
        assert!(!silver.contains(&sq(4, 3)) && !silver.contains(&sq(5, 4)));
    }

    #[test]
    fn test_promoted_rook_gains_diagonal_steps() {
        let mut board = Board::empty();
        place_promoted(&mut board, 4, 4, PieceKind::Rook, Side::First);
        let session = session_with(board, Side::First);
        let moves = legal_board_moves(&session, sq(4, 4));
        // 16 sliding squares plus the 4 diagonal steps
        assert_eq!(moves.len(), 20);
        assert!(moves.contains(&sq(3, 3)));
    }

    #[test]
    fn test_captures_allowed_own_squares_blocked() {
        let mut board = Board::empty();
        place(&mut board, 4, 4, PieceKind::Rook, Side::First);
        place(&mut board, 4, 6, PieceKind::Pawn, Side::Second);
        place(&mut board, 4, 2, PieceKind::Pawn, Side::First);
        let session = session_with(board, Side::First);
        let moves = legal_board_moves(&session, sq(4, 4));
        assert!(moves.contains(&sq(4, 6)));
        assert!(!moves.contains(&sq(4, 7)));
        assert!(!moves.contains(&sq(4, 2)));
        assert!(moves.contains(&sq(4, 3)));
    }

    // ---- check and pins ----

    #[test]
    fn test_in_check_detection() {
        let mut board = Board::empty();
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        place(&mut board, 0, 4, PieceKind::Rook, Side::Second);
        assert!(in_check(&board, Side::First));

        place(&mut board, 4, 4, PieceKind::Pawn, Side::First);
        assert!(!in_check(&board, Side::First));
    }

    #[test]
    fn test_pinned_piece_may_only_stay_on_the_line() {
        let mut board = Board::empty();
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        place(&mut board, 7, 4, PieceKind::Silver, Side::First);
        place(&mut board, 0, 4, PieceKind::Lance, Side::Second);
        place(&mut board, 0, 0, PieceKind::King, Side::Second);
        let session = session_with(board, Side::First);
        // every silver move that leaves the file exposes the king
        assert_eq!(legal_board_moves(&session, sq(7, 4)), vec![sq(6, 4)]);
    }

    // ---- drops ----

    #[test]
    fn test_drops_exclude_occupied_and_nifu_files() {
        let mut board = Board::empty();
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        place(&mut board, 0, 4, PieceKind::King, Side::Second);
        place(&mut board, 6, 2, PieceKind::Pawn, Side::First);
        let session = session_with(board, Side::First);

        let drops = legal_drops(&session, Side::First, PieceKind::Pawn);
        assert!(!drops.contains(&sq(6, 2)), "occupied");
        assert!(!drops.contains(&sq(3, 2)), "nifu file");
        assert!(drops.contains(&sq(3, 3)));

        // gold drops ignore the pawn-file restriction
        let gold_drops = legal_drops(&session, Side::First, PieceKind::Gold);
        assert!(gold_drops.contains(&sq(3, 2)));
    }

    #[test]
    fn test_promoted_pawn_does_not_block_the_file() {
        let mut board = Board::empty();
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        place(&mut board, 0, 0, PieceKind::King, Side::Second);
        place_promoted(&mut board, 4, 2, PieceKind::Pawn, Side::First);
        let session = session_with(board, Side::First);
        assert!(legal_drops(&session, Side::First, PieceKind::Pawn).contains(&sq(6, 2)));
    }

    #[test]
    fn test_drop_must_address_check() {
        let mut board = Board::empty();
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        place(&mut board, 4, 4, PieceKind::Rook, Side::Second);
        place(&mut board, 0, 0, PieceKind::King, Side::Second);
        let session = session_with(board, Side::First);
        let drops = legal_drops(&session, Side::First, PieceKind::Gold);
        // interposing on the rook's file is fine, anything else leaves check
        assert!(drops.contains(&sq(6, 4)));
        assert!(!drops.contains(&sq(3, 3)));
    }

    #[test]
    fn test_pawn_drop_mate_forbidden_nearby_file_allowed() {
        let mut board = Board::empty();
        place(&mut board, 0, 0, PieceKind::King, Side::Second);
        place(&mut board, 2, 1, PieceKind::Gold, Side::First);
        place(&mut board, 1, 2, PieceKind::Silver, Side::First);
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        let mut reserves = Reserves::default();
        reserves.first.add(PieceKind::Pawn);
        let session = Session::from_parts("test", board, reserves, Side::First);

        let drops = legal_drops(&session, Side::First, PieceKind::Pawn);
        // (1,0) is contact mate: the king cannot take the defended pawn
        // and every flight square is covered
        assert!(!drops.contains(&sq(1, 0)));
        // the same drop one file over merely threatens
        assert!(drops.contains(&sq(1, 1)));
    }

    #[test]
    fn test_pawn_drop_check_with_escape_allowed() {
        let mut board = Board::empty();
        place(&mut board, 0, 0, PieceKind::King, Side::Second);
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        let mut reserves = Reserves::default();
        reserves.first.add(PieceKind::Pawn);
        let session = Session::from_parts("test", board, reserves, Side::First);
        // bare king: the check is escapable, so the drop stands
        assert!(legal_drops(&session, Side::First, PieceKind::Pawn).contains(&sq(1, 0)));
    }

    // ---- promotion predicates ----

    #[test]
    fn test_must_promote_rows() {
        assert!(must_promote(PieceKind::Pawn, sq(0, 4), Side::First));
        assert!(must_promote(PieceKind::Lance, sq(0, 0), Side::First));
        assert!(must_promote(PieceKind::Knight, sq(1, 4), Side::First));
        assert!(!must_promote(PieceKind::Pawn, sq(1, 4), Side::First));
        assert!(!must_promote(PieceKind::Silver, sq(0, 4), Side::First));

        assert!(must_promote(PieceKind::Pawn, sq(8, 4), Side::Second));
        assert!(must_promote(PieceKind::Knight, sq(7, 4), Side::Second));
        assert!(!must_promote(PieceKind::Knight, sq(6, 4), Side::Second));
    }

    #[test]
    fn test_may_promote_zone_entry_and_exit() {
        let silver = Piece::new(PieceKind::Silver, Side::First);
        assert!(may_promote(silver, sq(3, 3), sq(2, 3)));
        assert!(may_promote(silver, sq(2, 3), sq(3, 3)));
        assert!(!may_promote(silver, sq(4, 3), sq(3, 3)));

        let gold = Piece::new(PieceKind::Gold, Side::First);
        assert!(!may_promote(gold, sq(3, 3), sq(2, 3)));

        let promoted = silver.promote().unwrap();
        assert!(!may_promote(promoted, sq(3, 3), sq(2, 3)));

        let second_silver = Piece::new(PieceKind::Silver, Side::Second);
        assert!(may_promote(second_silver, sq(5, 3), sq(6, 3)));
    }

    // ---- terminal detection ----

    #[test]
    fn test_opening_position_is_not_terminal() {
        assert_eq!(detect_terminal(&Session::new("test")), None);
    }

    #[test]
    fn test_checkmate_detected() {
        let mut board = Board::empty();
        place(&mut board, 0, 4, PieceKind::King, Side::Second);
        place(&mut board, 1, 4, PieceKind::Gold, Side::First);
        place(&mut board, 2, 3, PieceKind::Silver, Side::First);
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        let session = session_with(board, Side::Second);
        assert_eq!(detect_terminal(&session), Some(Side::First));
    }

    #[test]
    fn test_check_with_reserve_escape_is_not_terminal() {
        let mut board = Board::empty();
        place(&mut board, 0, 4, PieceKind::King, Side::Second);
        place(&mut board, 1, 4, PieceKind::Gold, Side::First);
        place(&mut board, 2, 3, PieceKind::Silver, Side::First);
        place(&mut board, 8, 4, PieceKind::King, Side::First);
        let mut reserves = Reserves::default();
        reserves.second.add(PieceKind::Rook);
        let session = Session::from_parts("test", board, reserves, Side::Second);
        // the gold is a contact check; no drop can block it and the king
        // has no flight square, so even a full hand does not help
        assert_eq!(detect_terminal(&session), Some(Side::First));
    }

    #[test]
    fn test_blockable_check_is_not_terminal() {
        let mut board = Board::empty();
        place(&mut board, 0, 4, PieceKind::King, Side::Second);
        place(&mut board, 0, 8, PieceKind::Rook, Side::First);
        place(&mut board, 2, 4, PieceKind::Gold, Side::First);
        place(&mut board, 8, 0, PieceKind::King, Side::First);
        let mut reserves = Reserves::default();
        reserves.second.add(PieceKind::Pawn);
        let session = Session::from_parts("test", board, reserves, Side::Second);
        // the king has no square, but a pawn drop between rook and king
        // interposes
        assert_eq!(detect_terminal(&session), None);

        let no_hand = Session::from_parts(
            "test",
            session.board().clone(),
            Reserves::default(),
            Side::Second,
        );
        assert_eq!(detect_terminal(&no_hand), Some(Side::First));
    }
}
