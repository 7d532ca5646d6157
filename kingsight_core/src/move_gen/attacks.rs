//! Attack scans over the cell grid.
//!
//! Answering "is this square attacked?" takes six specialised pattern scans:
//! pawn diagonals, knight jumps, king adjacency, diagonal rays (bishops and
//! queens) and orthogonal rays (rooks and queens).

use crate::board::{Color, Piece, PieceType, Square};

pub(crate) type Cells = [Option<Piece>; 64];

pub(crate) const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

pub(crate) const KING_STEPS: [(i8, i8); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

pub(crate) const DIAGONAL_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

pub(crate) const ORTHOGONAL_RAYS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Finds the king of the given colour.
pub(crate) fn king_square(cells: &Cells, color: Color) -> Option<Square> {
    let king = Piece::king(color);
    Square::all().find(|sq| cells[sq.index()] == Some(king))
}

/// Returns whether any piece of `defender`'s opponent could move or capture
/// onto `square`.
pub(crate) fn is_attacked(cells: &Cells, square: Square, defender: Color) -> bool {
    let attacker = defender.flip();

    attacked_by_pawn(cells, square, attacker)
        || attacked_by_leaper(cells, square, attacker, PieceType::Knight, &KNIGHT_JUMPS)
        || attacked_by_leaper(cells, square, attacker, PieceType::King, &KING_STEPS)
        || attacked_on_rays(cells, square, attacker, PieceType::Bishop, &DIAGONAL_RAYS)
        || attacked_on_rays(cells, square, attacker, PieceType::Rook, &ORTHOGONAL_RAYS)
}

fn attacked_by_pawn(cells: &Cells, square: Square, attacker: Color) -> bool {
    // An attacking pawn sits one rank towards its own side of the board.
    let pawn_rank_delta = -attacker.forward();
    let pawn = Piece::pawn(attacker);

    [-1, 1].into_iter().any(|file_delta| {
        square
            .try_offset(pawn_rank_delta, file_delta)
            .is_some_and(|from| cells[from.index()] == Some(pawn))
    })
}

fn attacked_by_leaper(
    cells: &Cells,
    square: Square,
    attacker: Color,
    kind: PieceType,
    offsets: &[(i8, i8)],
) -> bool {
    let piece = Piece::new(attacker, kind);
    offsets.iter().any(|&(dr, df)| {
        square
            .try_offset(dr, df)
            .is_some_and(|from| cells[from.index()] == Some(piece))
    })
}

/// Scans each ray to its first occupied square; a slider of `kind` (or a
/// queen) of the attacking colour there attacks `square`.
fn attacked_on_rays(
    cells: &Cells,
    square: Square,
    attacker: Color,
    kind: PieceType,
    rays: &[(i8, i8)],
) -> bool {
    rays.iter().any(|&(dr, df)| {
        let mut current = square;
        while let Some(next) = current.try_offset(dr, df) {
            match cells[next.index()] {
                None => current = next,
                Some(piece) => {
                    return piece.color() == attacker
                        && (piece.piece_type() == kind || piece.piece_type() == PieceType::Queen)
                }
            }
        }
        false
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::Board;

    fn cells_of(fen: &str) -> Cells {
        *Board::parse_fen(fen).unwrap().cells()
    }

    #[test]
    fn pawn_attack_direction_depends_on_color() {
        let cells = cells_of("k7/8/8/3p4/8/2P5/8/K7 w - -");

        // The white pawn on c3 attacks b4 and d4.
        assert!(is_attacked(&cells, Square::B4, Color::Black));
        assert!(is_attacked(&cells, Square::D4, Color::Black));
        assert!(!is_attacked(&cells, Square::C4, Color::Black));

        // The black pawn on d5 attacks c4 and e4.
        assert!(is_attacked(&cells, Square::C4, Color::White));
        assert!(is_attacked(&cells, Square::E4, Color::White));
        assert!(!is_attacked(&cells, Square::D4, Color::White));
    }

    #[test]
    fn knight_jumps() {
        let cells = cells_of("k7/8/8/8/8/2n5/8/K7 w - -");
        for target in [
            Square::A2,
            Square::A4,
            Square::B1,
            Square::B5,
            Square::D1,
            Square::D5,
            Square::E2,
            Square::E4,
        ] {
            assert!(is_attacked(&cells, target, Color::White), "{target}");
        }
        assert!(!is_attacked(&cells, Square::C4, Color::White));
    }

    #[test]
    fn sliders_stop_at_blockers() {
        let cells = cells_of("k7/8/8/8/1b6/8/3P4/4K3 w - -");

        // The bishop on b4 reaches d2 but the pawn shadows e1.
        assert!(is_attacked(&cells, Square::D2, Color::White));
        assert!(!is_attacked(&cells, Square::E1, Color::White));
    }

    #[test]
    fn queen_attacks_both_ray_kinds() {
        let cells = cells_of("k7/8/8/3q4/8/8/8/K7 w - -");
        assert!(is_attacked(&cells, Square::D1, Color::White));
        assert!(is_attacked(&cells, Square::A5, Color::White));
        assert!(is_attacked(&cells, Square::G2, Color::White));
        assert!(!is_attacked(&cells, Square::E3, Color::White));
    }

    #[test]
    fn king_adjacency() {
        let cells = cells_of("k7/8/8/8/8/8/1K6/8 w - -");
        assert!(is_attacked(&cells, Square::A1, Color::Black));
        assert!(is_attacked(&cells, Square::C3, Color::Black));
        assert!(!is_attacked(&cells, Square::D4, Color::Black));
    }

    #[test]
    fn finds_kings() {
        let cells = cells_of("k7/8/8/8/8/8/8/K7 w - -");
        assert_eq!(king_square(&cells, Color::White), Some(Square::A1));
        assert_eq!(king_square(&cells, Color::Black), Some(Square::A8));
    }
}
