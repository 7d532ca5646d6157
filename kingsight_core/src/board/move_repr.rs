use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use thiserror::Error;

use super::{PieceType, Square};

/// A move, identified by its source and destination squares plus the
/// promotion kind for pawn moves onto the back rank.
///
/// The promotion kind participates in equality and ordering, so the four
/// promotions of the same pawn push are four distinct keys in a children map.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Option<PieceType>,
}

impl Move {
    /// Constructs a non-promoting move.
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Constructs a promoting pawn move.
    pub const fn promoting(from: Square, to: Square, promotion: PieceType) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    pub const fn from_square(self) -> Square {
        self.from
    }

    pub const fn to_square(self) -> Square {
        self.to
    }

    pub const fn promotion(self) -> Option<PieceType> {
        self.promotion
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Move({self})")
    }
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("invalid move string")]
pub struct ParseMoveError;

impl FromStr for Move {
    type Err = ParseMoveError;

    /// Parses the 4-character wire form `e2e4`, with an optional 5th
    /// character `n`, `b`, `r` or `q` selecting a promotion kind.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return Err(ParseMoveError);
        }

        let from: Square = s[0..2].parse().map_err(|_| ParseMoveError)?;
        let to: Square = s[2..4].parse().map_err(|_| ParseMoveError)?;

        let promotion = match s.as_bytes().get(4) {
            None => None,
            Some(b'n') => Some(PieceType::Knight),
            Some(b'b') => Some(PieceType::Bishop),
            Some(b'r') => Some(PieceType::Rook),
            Some(b'q') => Some(PieceType::Queen),
            Some(_) => return Err(ParseMoveError),
        };

        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn move_display() {
        assert_eq!(Move::new(Square::E2, Square::E4).to_string(), "e2e4");
        assert_eq!(
            Move::promoting(Square::A7, Square::A8, PieceType::Queen).to_string(),
            "a7a8q"
        );
    }

    #[test]
    fn move_from_str() {
        assert_eq!("e2e4".parse(), Ok(Move::new(Square::E2, Square::E4)));
        assert_eq!(
            "a7a8n".parse(),
            Ok(Move::promoting(Square::A7, Square::A8, PieceType::Knight))
        );
        assert_eq!("e2".parse::<Move>(), Err(ParseMoveError));
        assert_eq!("e2e9".parse::<Move>(), Err(ParseMoveError));
        assert_eq!("a7a8k".parse::<Move>(), Err(ParseMoveError));
    }

    #[test]
    fn promotions_are_distinct_keys() {
        let push = Move::new(Square::A7, Square::A8);
        let promotions: Vec<_> = PieceType::PROMOTABLE
            .iter()
            .map(|&kind| Move::promoting(Square::A7, Square::A8, kind))
            .collect();

        for (i, a) in promotions.iter().enumerate() {
            assert_ne!(*a, push);
            for (j, b) in promotions.iter().enumerate() {
                assert_eq!(a == b, i == j);
            }
        }
    }

    #[test]
    fn moves_order_by_from_then_to() {
        let mut moves = vec![
            Move::new(Square::E2, Square::E4),
            Move::new(Square::A2, Square::A3),
            Move::new(Square::A2, Square::A4),
        ];
        moves.sort();
        assert_eq!(
            moves,
            vec![
                Move::new(Square::A2, Square::A3),
                Move::new(Square::A2, Square::A4),
                Move::new(Square::E2, Square::E4),
            ]
        );
    }
}
