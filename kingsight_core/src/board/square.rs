use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use paste::paste;
use seq_macro::seq;
use thiserror::Error;

/// A board coordinate, packed as `8 * rank + file` in a single byte.
///
/// Index 0 is a1 and index 63 is h8. Rank 0 is white's back rank; files run
/// from the a-file (0) to the h-file (7).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    /// Builds a square from a rank and a file, both counted from zero.
    ///
    /// Returns [`None`] when either coordinate lies off the board.
    pub const fn new(rank: u8, file: u8) -> Option<Self> {
        match (rank, file) {
            (0..=7, 0..=7) => Some(Self(8 * rank + file)),
            _ => None,
        }
    }

    /// Like [`Square::new`] but with the bounds check replaced by masking,
    /// for callers that already know both coordinates are in range.
    ///
    /// Out-of-range inputs wrap onto the board rather than being rejected,
    /// so the result is always a valid square, just not a meaningful one.
    pub const fn new_unchecked(rank: u8, file: u8) -> Self {
        Self(((rank & 7) << 3) | (file & 7))
    }

    /// Builds a square from its 0-63 index; [`None`] above 63.
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < 64 {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// This square's 0-63 index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Rank counted from zero; rank 0 is white's back rank.
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// File counted from zero; file 0 is the a-file.
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    /// Iterates the whole board, a1 through h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }

    /// Offsets this square by the given number of ranks and files, returning
    /// [`None`] if the result falls off the board.
    pub const fn try_offset(self, rank_delta: i8, file_delta: i8) -> Option<Self> {
        let rank = self.rank() as i8 + rank_delta;
        let file = self.file() as i8 + file_delta;

        if rank < 0 || rank >= 8 || file < 0 || file >= 8 {
            None
        } else {
            Some(Self::new_unchecked(rank as u8, file as u8))
        }
    }
}

impl Display for Square {
    /// Algebraic notation: file letter then rank digit, e.g. `e4`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            char::from(b'a' + self.file()),
            char::from(b'1' + self.rank())
        )
    }
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("not a square in algebraic notation")]
pub struct ParseSquareError;

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            &[file @ b'a'..=b'h', rank @ b'1'..=b'8'] => {
                Ok(Square::new_unchecked(rank - b'1', file - b'a'))
            }
            _ => Err(ParseSquareError),
        }
    }
}

/// Compile-time names for all 64 squares, `Square::A1` through `Square::H8`.
#[allow(clippy::eq_op, clippy::char_lit_as_u8)]
impl Square {
    seq!(FILE in 'A'..='H' {
        seq!(RANK in 1..=8 {
            paste! {
                pub const [<FILE RANK>]: Square = Square((RANK - 1) * 8 + (FILE as u8 - b'A'));
            }
        });
    });
}

impl Debug for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Square({self})")
    }
}
