use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

/// Number of cell labels the piece classifier distinguishes: six white piece
/// kinds, six black, and the empty square.
pub const LABEL_COUNT: usize = 13;

/// Classifier label of an empty square.
pub const EMPTY_LABEL: usize = 12;

/// Kind of a chess piece, colour set aside.
///
/// Discriminants 0-5 follow the classifier's channel order, so that a
/// [`Piece`]'s label is simply `kind + colour offset`.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, ToPrimitive,
)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
    ];

    /// Piece kinds a pawn may promote to.
    pub const PROMOTABLE: [PieceType; 4] = [Self::Knight, Self::Bishop, Self::Rook, Self::Queen];

    /// Upper-case FEN letters, indexed by discriminant.
    const LETTERS: [char; 6] = ['P', 'N', 'B', 'R', 'Q', 'K'];

    /// The upper-case FEN letter for this kind.
    pub const fn letter(self) -> char {
        Self::LETTERS[self as usize]
    }

    /// Looks a kind up by its FEN letter, either case.
    pub fn from_letter(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        Self::ALL.into_iter().find(|kind| kind.letter() == upper)
    }
}

/// One of the two players.
///
/// The discriminant doubles as the colour's first classifier channel: white
/// pieces occupy channels 0-5 and black pieces 6-11.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    White = 0,
    Black = 6,
}

impl Color {
    pub const fn is_white(self) -> bool {
        matches!(self, Color::White)
    }

    pub const fn is_black(self) -> bool {
        matches!(self, Color::Black)
    }

    /// The opposing colour.
    pub const fn flip(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// A coloured piece, stored as its classifier label (0-11).
///
/// The empty square is channel 12 and is spelled [`None`] in an
/// [`Option<Piece>`] board cell rather than being a `Piece` value.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Piece(u8);

impl Piece {
    pub const fn new(color: Color, piece_type: PieceType) -> Self {
        Self(color as u8 + piece_type as u8)
    }

    /// A pawn of the given colour.
    pub const fn pawn(color: Color) -> Self {
        Self::new(color, PieceType::Pawn)
    }

    /// A rook of the given colour.
    pub const fn rook(color: Color) -> Self {
        Self::new(color, PieceType::Rook)
    }

    /// A queen of the given colour.
    pub const fn queen(color: Color) -> Self {
        Self::new(color, PieceType::Queen)
    }

    /// A king of the given colour.
    pub const fn king(color: Color) -> Self {
        Self::new(color, PieceType::King)
    }

    /// Reconstructs a piece from a classifier label.
    ///
    /// Returns [`None`] for the empty-square channel and for anything out of
    /// range.
    pub fn from_label(label: usize) -> Option<Self> {
        (label < EMPTY_LABEL).then(|| Self(label as u8))
    }

    /// The classifier channel this piece occupies (0-11).
    pub const fn label(self) -> usize {
        self.0 as usize
    }

    pub const fn color(self) -> Color {
        if self.0 < 6 {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn piece_type(self) -> PieceType {
        PieceType::from_u8(self.0 % 6).expect("piece label out of range")
    }

    pub fn is_pawn(self) -> bool {
        self.piece_type() == PieceType::Pawn
    }

    pub fn is_rook(self) -> bool {
        self.piece_type() == PieceType::Rook
    }

    pub fn is_king(self) -> bool {
        self.piece_type() == PieceType::King
    }

    /// The piece's FEN letter: upper case for white, lower case for black.
    pub fn as_fen_char(self) -> char {
        let letter = self.piece_type().letter();
        match self.color() {
            Color::White => letter,
            Color::Black => letter.to_ascii_lowercase(),
        }
    }

    /// Inverse of [`Piece::as_fen_char`]; `None` for anything that is not a
    /// FEN piece letter.
    pub fn try_from_fen_char(c: char) -> Option<Self> {
        let kind = PieceType::from_letter(c)?;
        let color = if c.is_ascii_lowercase() {
            Color::Black
        } else {
            Color::White
        };
        Some(Self::new(color, kind))
    }
}

/// Named constants for all twelve pieces.
impl Piece {
    pub const WHITE_PAWN: Piece = Piece::new(Color::White, PieceType::Pawn);
    pub const WHITE_KNIGHT: Piece = Piece::new(Color::White, PieceType::Knight);
    pub const WHITE_BISHOP: Piece = Piece::new(Color::White, PieceType::Bishop);
    pub const WHITE_ROOK: Piece = Piece::new(Color::White, PieceType::Rook);
    pub const WHITE_QUEEN: Piece = Piece::new(Color::White, PieceType::Queen);
    pub const WHITE_KING: Piece = Piece::new(Color::White, PieceType::King);
    pub const BLACK_PAWN: Piece = Piece::new(Color::Black, PieceType::Pawn);
    pub const BLACK_KNIGHT: Piece = Piece::new(Color::Black, PieceType::Knight);
    pub const BLACK_BISHOP: Piece = Piece::new(Color::Black, PieceType::Bishop);
    pub const BLACK_ROOK: Piece = Piece::new(Color::Black, PieceType::Rook);
    pub const BLACK_QUEEN: Piece = Piece::new(Color::Black, PieceType::Queen);
    pub const BLACK_KING: Piece = Piece::new(Color::Black, PieceType::King);
}

/// Returns the classifier label of a board cell, mapping the empty square to
/// [`EMPTY_LABEL`].
pub fn cell_label(cell: Option<Piece>) -> usize {
    match cell {
        Some(piece) => piece.label(),
        None => EMPTY_LABEL,
    }
}

impl Debug for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Piece({})", self.as_fen_char())
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_fen_char())
    }
}

impl FromStr for Piece {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            &[c] => Piece::try_from_fen_char(c as char).ok_or(()),
            _ => Err(()),
        }
    }
}
