//! Structs and functions related to the board representation.

mod castling;
mod fen;
mod move_repr;
mod piece;
mod square;

use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

pub use castling::Castling;
pub use fen::FenParseError;
pub use move_repr::{Move, ParseMoveError};
pub use piece::{cell_label, Color, Piece, PieceType, EMPTY_LABEL, LABEL_COUNT};
pub use square::{ParseSquareError, Square};

use thiserror::Error;

use crate::move_gen::{self, MoveGenerator};

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The requested [`Move`] is not among the legal successors of the position.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("move {0} is not legal in this position")]
pub struct InvalidMove(pub Move);

/// Per-label piece histogram over the 64 cells.
///
/// Indexed by classifier label (white pawn through black king, then the empty
/// square); the counts always sum to 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceCounts([u8; LABEL_COUNT]);

impl PieceCounts {
    fn from_cells(cells: &[Option<Piece>; 64]) -> Self {
        let mut counts = [0u8; LABEL_COUNT];
        for &cell in cells {
            counts[cell_label(cell)] += 1;
        }
        Self(counts)
    }

    /// Number of cells carrying the given classifier label.
    pub const fn of_label(self, label: usize) -> u8 {
        self.0[label]
    }

    /// Number of cells holding the given piece.
    pub fn of_piece(self, piece: Piece) -> u8 {
        self.0[piece.label()]
    }

    /// Number of empty cells.
    pub const fn empty(self) -> u8 {
        self.0[EMPTY_LABEL]
    }

    pub fn total(self) -> u32 {
        self.0.iter().map(|&c| c as u32).sum()
    }

    fn replace(&mut self, old: Option<Piece>, new: Option<Piece>) {
        self.0[cell_label(old)] -= 1;
        self.0[cell_label(new)] += 1;
    }
}

/// A single chess position.
///
/// Holds the 8x8 cell grid in the 13-label encoding of the piece classifier,
/// the side to move, castling rights, the en-passant target square and the
/// per-label piece histogram. Pure value; immutable once constructed. New
/// positions are produced by [`Board::legal_children`] / [`Board::apply`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Piece>; 64],
    to_move: Color,
    castling: Castling,
    en_passant: Option<Square>,
    counts: PieceCounts,
    in_check: bool,
}

impl Board {
    /// Assembles a board from parts, computing the histogram and the check
    /// flag. No legality validation happens here; [`fen::parse_fen`] and the
    /// move generator apply their own.
    fn from_parts(
        cells: [Option<Piece>; 64],
        to_move: Color,
        castling: Castling,
        en_passant: Option<Square>,
    ) -> Self {
        let counts = PieceCounts::from_cells(&cells);
        let in_check = match move_gen::king_square(&cells, to_move) {
            Some(king) => move_gen::is_attacked(&cells, king, to_move),
            None => false,
        };

        Self {
            cells,
            to_move,
            castling,
            en_passant,
            counts,
            in_check,
        }
    }

    /// Returns a [`Board`] representing the starting position of a standard
    /// chess game.
    pub fn starting_position() -> Self {
        Self::parse_fen(STARTING_POSITION_FEN).unwrap()
    }

    /// Parses the position/turn/castling/en-passant fields of a FEN string.
    ///
    /// The halfmove and fullmove fields are tolerated but ignored. Fails with
    /// [`FenParseError`] on syntactic errors or if the described position
    /// violates the board invariants (king counts, opponent in check,
    /// inconsistent en-passant target).
    pub fn parse_fen(fen: &str) -> Result<Self, FenParseError> {
        fen::parse_fen(fen)
    }

    /// Renders the position as a FEN string.
    ///
    /// The halfmove and fullmove counters are not modelled and always render
    /// as `0 1`.
    pub fn fen(&self) -> String {
        fen::board_to_fen(self)
    }

    /// Returns the [`Color`] of the current player.
    pub const fn to_move(&self) -> Color {
        self.to_move
    }

    /// Returns the castling rights in the current position.
    pub const fn castling(&self) -> Castling {
        self.castling
    }

    /// Returns the square onto which the current player could capture en
    /// passant, if the previous move was a double pawn push.
    pub const fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Returns whether the side to move is currently in check.
    pub const fn in_check(&self) -> bool {
        self.in_check
    }

    /// Returns the per-label piece histogram.
    pub const fn counts(&self) -> PieceCounts {
        self.counts
    }

    /// Returns the piece that's on a specific square.
    pub fn get_piece(&self, square: Square) -> Option<Piece> {
        self.cells[square.index()]
    }

    /// Returns the classifier label (0-12) of the cell at the given rank and
    /// file.
    pub fn label_at(&self, rank: u8, file: u8) -> usize {
        cell_label(self.cells[Square::new_unchecked(rank, file).index()])
    }

    /// Returns an iterator over all the pieces on the board and the square
    /// they're on, in increasing square order.
    pub fn pieces(&self) -> impl Iterator<Item = (Piece, Square)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.map(|piece| (piece, Square::from_index(i).unwrap())))
    }

    /// Finds the king of the given color, if present.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        move_gen::king_square(&self.cells, color)
    }

    pub(crate) const fn cells(&self) -> &[Option<Piece>; 64] {
        &self.cells
    }

    /// Generates the full set of legal successor positions, keyed by the
    /// [`Move`] that produces each.
    pub fn legal_children(&self) -> BTreeMap<Move, Board> {
        MoveGenerator::new(self).legal_children()
    }

    /// Plays a single move, semantically `legal_children()[mv]`.
    ///
    /// A promoting move must carry its promotion kind; `apply` of the bare
    /// pawn push is [`InvalidMove`].
    pub fn apply(&self, mv: Move) -> Result<Board, InvalidMove> {
        self.legal_children().remove(&mv).ok_or(InvalidMove(mv))
    }

    /// Produces the successor position for a candidate move without checking
    /// that the mover's king is left safe. The move generator filters the
    /// result.
    pub(crate) fn make_move(&self, mv: Move) -> Board {
        let mut cells = self.cells;
        let mut counts = self.counts;
        let mut castling = self.castling;
        let mut en_passant = None;

        let us = self.to_move;
        let from = mv.from_square();
        let to = mv.to_square();
        let moved = cells[from.index()].expect("candidate move from an empty square");

        if let Some(kind) = mv.promotion() {
            // Promotion: the pawn leaves the board and the promoted piece
            // appears, each counted exactly once.
            let promoted = Piece::new(us, kind);
            counts.replace(Some(moved), None);
            counts.replace(cells[to.index()], Some(promoted));

            cells[from.index()] = None;
            cells[to.index()] = Some(promoted);
        } else if moved.is_pawn() && Some(to) == self.en_passant {
            // En passant: the captured pawn sits behind the target square.
            let behind = Square::new_unchecked((to.rank() as i8 - us.forward()) as u8, to.file());

            counts.replace(cells[behind.index()], None);
            cells[behind.index()] = None;
            cells[from.index()] = None;
            cells[to.index()] = Some(moved);
        } else if moved.is_king() && from.file().abs_diff(to.file()) == 2 {
            // Castling: the rook jumps to the square the king passed over.
            let kingside = to.file() > from.file();
            let rook_from = Square::new_unchecked(from.rank(), if kingside { 7 } else { 0 });
            let rook_to = Square::new_unchecked(from.rank(), if kingside { 5 } else { 3 });

            cells[from.index()] = None;
            cells[to.index()] = Some(moved);
            cells[rook_from.index()] = None;
            cells[rook_to.index()] = Some(Piece::rook(us));
        } else {
            counts.replace(cells[to.index()], Some(moved));
            counts.replace(Some(moved), None);

            cells[from.index()] = None;
            cells[to.index()] = Some(moved);

            if moved.is_pawn() && from.rank().abs_diff(to.rank()) == 2 {
                en_passant =
                    Some(Square::new_unchecked((from.rank() as i8 + us.forward()) as u8, to.file()));
            }
        }

        // Any king move (castling included) forfeits both rights; a move from
        // or a capture on a rook home square forfeits that side's right.
        if moved.is_king() {
            castling -= Castling::both(us);
        }
        for square in [from, to] {
            match square {
                Square::A1 => castling -= Castling::WHITE_QUEENSIDE,
                Square::H1 => castling -= Castling::WHITE_KINGSIDE,
                Square::A8 => castling -= Castling::BLACK_QUEENSIDE,
                Square::H8 => castling -= Castling::BLACK_KINGSIDE,
                _ => {}
            }
        }

        debug_assert_eq!(counts, PieceCounts::from_cells(&cells));

        let them = us.flip();
        let in_check = match move_gen::king_square(&cells, them) {
            Some(king) => move_gen::is_attacked(&cells, king, them),
            None => false,
        };

        Board {
            cells,
            to_move: them,
            castling,
            en_passant,
            counts,
            in_check,
        }
    }
}

impl Color {
    /// Rank direction this colour's pawns advance in.
    pub(crate) const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl Display for Board {
    /// Renders the grid from black's back rank down, FEN piece letters with
    /// `.` for empty cells.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                match self.cells[Square::new_unchecked(rank, file).index()] {
                    Some(piece) => write!(f, "{piece}")?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Board({})", self.fen())
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

    #[test]
    fn starting_position_shape() {
        let board = Board::starting_position();
        assert_eq!(board.to_move(), Color::White);
        assert_eq!(board.castling(), Castling::all());
        assert_eq!(board.en_passant(), None);
        assert!(!board.in_check());
        assert_eq!(board.counts().of_piece(Piece::WHITE_PAWN), 8);
        assert_eq!(board.counts().of_piece(Piece::BLACK_KING), 1);
        assert_eq!(board.counts().empty(), 32);
        assert_eq!(board.counts().total(), 64);
    }

    #[test]
    fn apply_simple_pawn_push() {
        let next = Board::starting_position().apply(mv("e2e4")).unwrap();

        assert_eq!(next.to_move(), Color::Black);
        assert_eq!(next.get_piece(Square::E4), Some(Piece::WHITE_PAWN));
        assert_eq!(next.get_piece(Square::E2), None);
        assert_eq!(next.en_passant(), Some(Square::E3));
        assert_eq!(next.counts().total(), 64);
    }

    #[test]
    fn apply_rejects_illegal_move() {
        let board = Board::starting_position();
        assert_eq!(
            board.apply(mv("e2e5")),
            Err(InvalidMove(mv("e2e5")))
        );
        // A pawn cannot teleport sideways either.
        assert_eq!(
            board.apply(mv("e2d3")),
            Err(InvalidMove(mv("e2d3")))
        );
    }

    #[test]
    fn side_to_move_toggles_and_ep_clears() {
        let b1 = Board::starting_position().apply(mv("e2e4")).unwrap();
        let b2 = b1.apply(mv("g8f6")).unwrap();

        assert_eq!(b2.to_move(), Color::White);
        assert_eq!(b2.en_passant(), None);
    }

    #[test]
    fn capture_updates_counts() {
        let board = board("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let next = board.apply(mv("e4d5")).unwrap();

        assert_eq!(next.counts().of_piece(Piece::BLACK_PAWN), 7);
        assert_eq!(next.counts().of_piece(Piece::WHITE_PAWN), 8);
        assert_eq!(next.counts().empty(), 33);
        assert_eq!(next.counts().total(), 64);
    }

    #[test]
    fn king_move_clears_both_rights() {
        let board = board("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 2");
        let next = board.apply(mv("e8e7")).unwrap();

        assert!(!next.castling().intersects(Castling::BLACK));
        assert!(next.castling().contains(Castling::WHITE));
    }

    #[test]
    fn rook_move_and_rook_capture_clear_one_right() {
        let board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");

        let after_rook_move = board.apply(mv("h1h2")).unwrap();
        assert!(!after_rook_move.castling().contains(Castling::WHITE_KINGSIDE));
        assert!(after_rook_move.castling().contains(Castling::WHITE_QUEENSIDE));

        let after_capture = board.apply(mv("a1a8")).unwrap();
        assert!(!after_capture.castling().contains(Castling::WHITE_QUEENSIDE));
        assert!(!after_capture.castling().contains(Castling::BLACK_QUEENSIDE));
        assert!(after_capture.castling().contains(Castling::BLACK_KINGSIDE));
    }

    #[test]
    fn castling_moves_the_rook() {
        let board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");

        let kingside = board.apply(mv("e1g1")).unwrap();
        assert_eq!(kingside.get_piece(Square::G1), Some(Piece::WHITE_KING));
        assert_eq!(kingside.get_piece(Square::F1), Some(Piece::WHITE_ROOK));
        assert_eq!(kingside.get_piece(Square::H1), None);
        assert!(!kingside.castling().intersects(Castling::WHITE));

        let queenside = board.apply(mv("e1c1")).unwrap();
        assert_eq!(queenside.get_piece(Square::C1), Some(Piece::WHITE_KING));
        assert_eq!(queenside.get_piece(Square::D1), Some(Piece::WHITE_ROOK));
        assert_eq!(queenside.get_piece(Square::A1), None);
    }

    #[test]
    fn castling_rights_never_increase_along_a_game() {
        let mut board = Board::starting_position();
        let mut rights = board.castling();

        for m in ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1"] {
            board = board.apply(mv(m)).unwrap();
            assert!(rights.contains(board.castling()));
            rights = board.castling();
        }

        assert!(!rights.intersects(Castling::WHITE));
        assert!(rights.contains(Castling::BLACK));
    }

    #[test]
    fn promotion_counts_round_trip() {
        let board = board("8/P7/8/8/8/8/8/k6K w - - 0 1");
        let next = board.apply(mv("a7a8q")).unwrap();

        assert_eq!(next.counts().of_piece(Piece::WHITE_PAWN), 0);
        assert_eq!(next.counts().of_piece(Piece::WHITE_QUEEN), 1);
        assert_eq!(next.counts().total(), 64);
        assert_eq!(next.get_piece(Square::A8), Some(Piece::WHITE_QUEEN));
    }

    #[test]
    fn capturing_promotion_counts_each_piece_once() {
        let board = board("1n6/P7/8/8/8/8/8/k6K w - - 0 1");
        let next = board.apply(mv("a7b8r")).unwrap();

        assert_eq!(next.counts().of_piece(Piece::WHITE_PAWN), 0);
        assert_eq!(next.counts().of_piece(Piece::WHITE_ROOK), 1);
        assert_eq!(next.counts().of_piece(Piece::BLACK_KNIGHT), 0);
        assert_eq!(next.counts().total(), 64);
    }

    #[test]
    fn en_passant_capture_removes_bypassed_pawn() {
        let board = board("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        let next = board.apply(mv("e5f6")).unwrap();

        assert_eq!(next.get_piece(Square::F6), Some(Piece::WHITE_PAWN));
        assert_eq!(next.get_piece(Square::F5), None);
        assert_eq!(next.get_piece(Square::E5), None);
        assert_eq!(next.counts().of_piece(Piece::BLACK_PAWN), 7);
        assert_eq!(next.counts().total(), 64);
    }

    #[test]
    fn ep_flag_set_only_by_double_pushes() {
        let board = Board::starting_position();
        for (m, expected) in [
            ("e2e4", Some(Square::E3)),
            ("e2e3", None),
            ("b1c3", None),
        ] {
            let next = board.apply(mv(m)).unwrap();
            assert_eq!(next.en_passant(), expected, "after {m}");
        }
    }

    #[test]
    fn check_flag_follows_attacks() {
        let checked = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert!(checked.in_check());

        assert!(!Board::starting_position().in_check());
    }

    #[test]
    fn display_draws_the_grid() {
        let display = Board::starting_position().to_string();
        let expected = "rnbqkbnr\n\
                        pppppppp\n\
                        ........\n\
                        ........\n\
                        ........\n\
                        ........\n\
                        PPPPPPPP\n\
                        RNBQKBNR\n";
        assert_eq!(display, expected);
    }
}
