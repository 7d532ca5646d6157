//! Legal-move generation.
//!
//! Candidate destinations are produced per piece kind (pawn pushes and
//! captures, knight jumps, slider ray scans, king steps and castles), then
//! every candidate successor position is materialised and filtered: any move
//! that leaves the mover's own king attacked is silently dropped. The filter
//! is authoritative; special-case legality (pins, en-passant discovered
//! checks, castling into check) falls out of it.

mod attacks;

use std::collections::BTreeMap;

use arrayvec::ArrayVec;

pub(crate) use attacks::{is_attacked, king_square};

use crate::board::{Board, Castling, Color, Move, PieceType, Square};

/// Maximum number of moves that could occur in a legal position, used for
/// stack-allocating a vector to hold candidate moves.
pub const MAX_MOVES: usize = 256;

pub type MoveVec = ArrayVec<Move, MAX_MOVES>;

pub struct MoveGenerator<'a> {
    board: &'a Board,
    us: Color,
}

impl<'a> MoveGenerator<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            us: board.to_move(),
        }
    }

    /// Generates the map of legal successor positions keyed by move.
    pub fn legal_children(self) -> BTreeMap<Move, Board> {
        let mut candidates = MoveVec::new();
        self.candidate_moves(&mut candidates);

        let mut children = BTreeMap::new();
        for mv in candidates {
            let next = self.board.make_move(mv);
            let our_king = king_square(next.cells(), self.us)
                .expect("mover's king vanished while making a move");

            if !is_attacked(next.cells(), our_king, self.us) {
                children.insert(mv, next);
            }
        }
        children
    }

    fn candidate_moves(&self, out: &mut MoveVec) {
        for square in Square::all() {
            let Some(piece) = self.board.get_piece(square) else {
                continue;
            };
            if piece.color() != self.us {
                continue;
            }

            match piece.piece_type() {
                PieceType::Pawn => self.pawn_moves(square, out),
                PieceType::Knight => self.leaper_moves(square, &attacks::KNIGHT_JUMPS, out),
                PieceType::Bishop => self.slider_moves(square, &attacks::DIAGONAL_RAYS, out),
                PieceType::Rook => self.slider_moves(square, &attacks::ORTHOGONAL_RAYS, out),
                PieceType::Queen => {
                    self.slider_moves(square, &attacks::DIAGONAL_RAYS, out);
                    self.slider_moves(square, &attacks::ORTHOGONAL_RAYS, out);
                }
                PieceType::King => self.king_moves(square, out),
            }
        }
    }

    fn is_empty(&self, square: Square) -> bool {
        self.board.get_piece(square).is_none()
    }

    fn holds_enemy(&self, square: Square) -> bool {
        self.board
            .get_piece(square)
            .is_some_and(|piece| piece.color() != self.us)
    }

    /// Pushes `from`-`to`, fanning out into the four promotions when the
    /// destination is a back rank.
    fn push_pawn_move(&self, from: Square, to: Square, out: &mut MoveVec) {
        if to.rank() == 0 || to.rank() == 7 {
            for kind in PieceType::PROMOTABLE {
                out.push(Move::promoting(from, to, kind));
            }
        } else {
            out.push(Move::new(from, to));
        }
    }

    fn pawn_moves(&self, from: Square, out: &mut MoveVec) {
        let forward = self.us.forward();

        if let Some(ahead) = from.try_offset(forward, 0) {
            if self.is_empty(ahead) {
                self.push_pawn_move(from, ahead, out);

                let home_rank = match self.us {
                    Color::White => 1,
                    Color::Black => 6,
                };
                if from.rank() == home_rank {
                    let double = ahead.try_offset(forward, 0).expect("double push off board");
                    if self.is_empty(double) {
                        out.push(Move::new(from, double));
                    }
                }
            }
        }

        for file_delta in [-1, 1] {
            let Some(target) = from.try_offset(forward, file_delta) else {
                continue;
            };

            if self.holds_enemy(target) {
                self.push_pawn_move(from, target, out);
            } else if Some(target) == self.board.en_passant() {
                out.push(Move::new(from, target));
            }
        }
    }

    fn leaper_moves(&self, from: Square, offsets: &[(i8, i8)], out: &mut MoveVec) {
        for &(dr, df) in offsets {
            if let Some(to) = from.try_offset(dr, df) {
                if self.is_empty(to) || self.holds_enemy(to) {
                    out.push(Move::new(from, to));
                }
            }
        }
    }

    fn slider_moves(&self, from: Square, rays: &[(i8, i8)], out: &mut MoveVec) {
        for &(dr, df) in rays {
            let mut current = from;
            while let Some(to) = current.try_offset(dr, df) {
                if self.is_empty(to) {
                    out.push(Move::new(from, to));
                    current = to;
                } else {
                    if self.holds_enemy(to) {
                        out.push(Move::new(from, to));
                    }
                    break;
                }
            }
        }
    }

    fn king_moves(&self, from: Square, out: &mut MoveVec) {
        self.leaper_moves(from, &attacks::KING_STEPS, out);
        self.castle_moves(from, out);
    }

    /// Emits castles when the rights are intact, the king and rook stand on
    /// their home squares, the squares between them are empty, the king is
    /// not in check and does not pass over an attacked square. The
    /// destination square is covered by the post-move filter.
    fn castle_moves(&self, from: Square, out: &mut MoveVec) {
        let home = match self.us {
            Color::White => Square::E1,
            Color::Black => Square::E8,
        };
        if from != home || self.board.in_check() {
            return;
        }

        let rank = home.rank();
        let rook = crate::board::Piece::rook(self.us);

        let kingside = self.board.castling().contains(Castling::kingside(self.us))
            && self.board.get_piece(Square::new_unchecked(rank, 7)) == Some(rook)
            && (5..=6).all(|file| self.is_empty(Square::new_unchecked(rank, file)))
            && !is_attacked(
                self.board.cells(),
                Square::new_unchecked(rank, 5),
                self.us,
            );
        if kingside {
            out.push(Move::new(home, Square::new_unchecked(rank, 6)));
        }

        let queenside = self.board.castling().contains(Castling::queenside(self.us))
            && self.board.get_piece(Square::new_unchecked(rank, 0)) == Some(rook)
            && (1..=3).all(|file| self.is_empty(Square::new_unchecked(rank, file)))
            && !is_attacked(
                self.board.cells(),
                Square::new_unchecked(rank, 3),
                self.us,
            );
        if queenside {
            out.push(Move::new(home, Square::new_unchecked(rank, 2)));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn board(fen: &str) -> Board {
        Board::parse_fen(fen).unwrap()
    }

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    fn legal_moves(fen: &str) -> Vec<Move> {
        board(fen).legal_children().into_keys().collect()
    }

    #[test]
    fn starting_position_has_twenty_moves() {
        let children = Board::starting_position().legal_children();
        assert_eq!(children.len(), 20);
        assert!(children.contains_key(&mv("e2e4")));
        assert!(children.contains_key(&mv("b1c3")));
        assert!(!children.contains_key(&mv("e1e2")));
    }

    #[test]
    fn every_child_satisfies_board_invariants() {
        for (mv, child) in Board::starting_position().legal_children() {
            assert_eq!(child.counts().total(), 64, "{mv}");
            assert_eq!(child.to_move(), Color::Black, "{mv}");

            // The mover may never leave their own king attacked.
            let king = child.king_square(Color::White).unwrap();
            assert!(!is_attacked(child.cells(), king, Color::White), "{mv}");
        }
    }

    #[test]
    fn pinned_piece_cannot_move() {
        // The knight on d7 shields the black king from the rook on d1.
        let moves = legal_moves("3k4/3n4/8/8/8/8/8/3RK3 b - -");
        assert!(moves.iter().all(|m| m.from_square() != Square::D7));
    }

    #[test]
    fn check_evasion_only() {
        // White king on e1 is checked by the rook on e8; only moves that
        // resolve the check survive the filter.
        let moves = legal_moves("4r2k/8/8/8/8/8/3N4/4K3 w - -");
        let expected: Vec<Move> = ["e1d1", "e1f1", "e1f2", "d2e4"]
            .iter()
            .map(|s| mv(s))
            .collect();

        let mut moves = moves;
        let mut expected = expected;
        moves.sort();
        expected.sort();
        assert_eq!(moves, expected);
    }

    #[test]
    fn en_passant_appears_as_a_legal_child() {
        let children =
            board("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
                .legal_children();
        let child = &children[&mv("e4d5")];

        assert_eq!(
            child.get_piece(Square::D5),
            Some(crate::board::Piece::WHITE_PAWN)
        );
        assert_eq!(child.get_piece(Square::D4), None);
        assert_eq!(child.get_piece(Square::E4), None);
    }

    #[test]
    fn en_passant_discovered_check_is_filtered() {
        // Capturing en passant would expose the white king on the fifth rank
        // to the black rook.
        let children = board("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 2").legal_children();
        assert!(!children.contains_key(&mv("e5d6")));
        // The plain push remains legal.
        assert!(children.contains_key(&mv("e5e6")));
    }

    #[test]
    fn promotions_fan_out_into_four_children() {
        let children = board("8/P7/8/8/8/8/8/k6K w - -").legal_children();

        for kind in PieceType::PROMOTABLE {
            let promotion = Move::promoting(Square::A7, Square::A8, kind);
            let child = &children[&promotion];
            assert_eq!(
                child.get_piece(Square::A8),
                Some(crate::board::Piece::new(Color::White, kind))
            );
        }
        assert!(!children.contains_key(&mv("a7a8")));
    }

    #[test]
    fn castling_both_sides_when_clear() {
        let moves = legal_moves("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -");
        assert!(moves.contains(&mv("e1g1")));
        assert!(moves.contains(&mv("e1c1")));
    }

    #[test]
    fn no_castling_while_in_check() {
        let moves = legal_moves("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq -");
        assert!(!moves.contains(&mv("e1g1")));
        assert!(!moves.contains(&mv("e1c1")));
    }

    #[test]
    fn no_castling_through_an_attacked_square() {
        // The black rook on f2 covers f1, the square the king passes over
        // kingside; queenside is unaffected.
        let moves = legal_moves("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq -");
        assert!(!moves.contains(&mv("e1g1")));
        assert!(moves.contains(&mv("e1c1")));
    }

    #[test]
    fn no_castling_into_an_attacked_square() {
        let moves = legal_moves("r3k2r/8/8/8/8/8/6r1/R3K2R w KQkq -");
        assert!(!moves.contains(&mv("e1g1")));
        assert!(moves.contains(&mv("e1c1")));
    }

    #[test]
    fn queenside_castle_ignores_the_rook_path_square() {
        // b1 is attacked, but only the rook passes over it; the castle is
        // legal.
        let moves = legal_moves("r3k2r/8/8/8/8/8/1r6/R3K2R w KQkq -");
        assert!(moves.contains(&mv("e1c1")));
    }

    #[test]
    fn no_castling_without_rights_or_rook() {
        let no_rights = legal_moves("r3k2r/8/8/8/8/8/8/R3K2R w kq -");
        assert!(!no_rights.contains(&mv("e1g1")));
        assert!(!no_rights.contains(&mv("e1c1")));

        // Rights present but the kingside rook is gone.
        let no_rook = legal_moves("r3k2r/8/8/8/8/8/8/R3K3 w KQkq -");
        assert!(!no_rook.contains(&mv("e1g1")));
        assert!(no_rook.contains(&mv("e1c1")));
    }

    #[test]
    fn checkmate_has_no_children() {
        // Back-rank mate.
        let children = board("R5k1/5ppp/8/8/8/8/8/K7 b - -").legal_children();
        assert!(children.is_empty());
    }

    #[test]
    fn stalemate_has_no_children() {
        let children = board("k7/8/1Q6/8/8/8/8/K7 b - -").legal_children();
        assert!(children.is_empty());
    }
}
