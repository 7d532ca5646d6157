use thiserror::Error;

use super::{Board, Castling, Color, Piece, Square};
use crate::move_gen;

/// Reasons a FEN string may be rejected.
///
/// Beyond syntax, parsing enforces the board invariants: exactly one king per
/// side, the side not to move may not be in check, and an en-passant target
/// must sit behind a pawn that could just have double-moved. Castling rights
/// are accepted as written; the move generator re-checks piece placement
/// before ever emitting a castle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenParseError {
    #[error("expected at least the placement, turn, castling and en-passant fields")]
    MissingFields,
    #[error("invalid piece placement field")]
    InvalidPlacement,
    #[error("invalid side-to-move field")]
    InvalidSideToMove,
    #[error("invalid castling field")]
    InvalidCastling,
    #[error("invalid en-passant field")]
    InvalidEnPassant,
    #[error("each side must have exactly one king")]
    KingCount,
    #[error("the side not to move is in check")]
    OpponentInCheck,
    #[error("en-passant target does not sit behind a double-moved pawn")]
    EnPassantTarget,
}

pub(super) fn parse_fen(fen: &str) -> Result<Board, FenParseError> {
    let mut fields = fen.split_whitespace();

    let placement = fields.next().ok_or(FenParseError::MissingFields)?;
    let to_move = fields.next().ok_or(FenParseError::MissingFields)?;
    let castling = fields.next().ok_or(FenParseError::MissingFields)?;
    let en_passant = fields.next().ok_or(FenParseError::MissingFields)?;
    // Halfmove clock and fullmove number are tolerated but not modelled.

    let cells = parse_placement(placement)?;

    let to_move = match to_move {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return Err(FenParseError::InvalidSideToMove),
    };

    let castling = parse_castling(castling)?;

    let en_passant = match en_passant {
        "-" => None,
        s => Some(
            s.parse::<Square>()
                .map_err(|_| FenParseError::InvalidEnPassant)?,
        ),
    };

    let board = Board::from_parts(cells, to_move, castling, en_passant);
    validate(&board)?;
    Ok(board)
}

fn parse_placement(placement: &str) -> Result<[Option<Piece>; 64], FenParseError> {
    let ranks: Vec<_> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenParseError::InvalidPlacement);
    }

    let mut cells = [None; 64];
    for (rank_index, rank_pieces) in ranks.into_iter().enumerate() {
        let rank = 7 - rank_index as u8;
        let mut file = 0u8;

        for c in rank_pieces.chars() {
            if let Some(digit) = c.to_digit(10) {
                if !(1..=8).contains(&digit) {
                    return Err(FenParseError::InvalidPlacement);
                }
                file += digit as u8;
            } else {
                let piece =
                    Piece::try_from_fen_char(c).ok_or(FenParseError::InvalidPlacement)?;
                if file >= 8 {
                    return Err(FenParseError::InvalidPlacement);
                }
                cells[Square::new_unchecked(rank, file).index()] = Some(piece);
                file += 1;
            }

            if file > 8 {
                return Err(FenParseError::InvalidPlacement);
            }
        }

        if file != 8 {
            return Err(FenParseError::InvalidPlacement);
        }
    }

    Ok(cells)
}

fn parse_castling(field: &str) -> Result<Castling, FenParseError> {
    if field == "-" {
        return Ok(Castling::empty());
    }

    let mut flags = Castling::empty();
    for c in field.chars() {
        flags |= match c {
            'K' => Castling::WHITE_KINGSIDE,
            'Q' => Castling::WHITE_QUEENSIDE,
            'k' => Castling::BLACK_KINGSIDE,
            'q' => Castling::BLACK_QUEENSIDE,
            _ => return Err(FenParseError::InvalidCastling),
        };
    }
    Ok(flags)
}

fn validate(board: &Board) -> Result<(), FenParseError> {
    for color in [Color::White, Color::Black] {
        if board.counts().of_piece(Piece::king(color)) != 1 {
            return Err(FenParseError::KingCount);
        }
    }

    let them = board.to_move().flip();
    let their_king = board
        .king_square(them)
        .ok_or(FenParseError::KingCount)?;
    if move_gen::is_attacked(board.cells(), their_king, them) {
        return Err(FenParseError::OpponentInCheck);
    }

    if let Some(target) = board.en_passant() {
        // The double-moved pawn belongs to the side that just played and
        // stands one rank past the target, which itself must be empty.
        let mover = them;
        let expected_rank = match mover {
            Color::White => 2,
            Color::Black => 5,
        };
        let pawn_square = Square::new_unchecked(
            (target.rank() as i8 + mover.forward()) as u8,
            target.file(),
        );

        if target.rank() != expected_rank
            || board.get_piece(target).is_some()
            || board.get_piece(pawn_square) != Some(Piece::pawn(mover))
        {
            return Err(FenParseError::EnPassantTarget);
        }
    }

    Ok(())
}

pub(super) fn board_to_fen(board: &Board) -> String {
    // One segment per rank, listed from black's back rank down, with runs of
    // empty cells collapsed into digits.
    let mut ranks = Vec::with_capacity(8);
    for rank in (0..8).rev() {
        let mut segment = String::new();
        let mut run = 0u8;

        for file in 0..8 {
            match board.get_piece(Square::new_unchecked(rank, file)) {
                None => run += 1,
                Some(piece) => {
                    if run > 0 {
                        segment.push(char::from(b'0' + run));
                        run = 0;
                    }
                    segment.push(piece.as_fen_char());
                }
            }
        }
        if run > 0 {
            segment.push(char::from(b'0' + run));
        }

        ranks.push(segment);
    }

    let to_move = match board.to_move() {
        Color::White => 'w',
        Color::Black => 'b',
    };
    let en_passant = match board.en_passant() {
        Some(square) => square.to_string(),
        None => "-".to_owned(),
    };

    // Ply counters are not modelled.
    format!(
        "{} {to_move} {} {en_passant} 0 1",
        ranks.join("/"),
        board.castling().as_fen_str(),
    )
}
