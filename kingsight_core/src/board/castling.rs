use bitflags::bitflags;

use super::Color;

bitflags! {
    /// Castling rights still open to either player.
    ///
    /// A flag here means only that the game's history permits the castle:
    /// the king and the matching rook have neither moved nor been captured.
    /// Whether the castle is playable right now (no pieces in between, king
    /// not in check or crossing an attacked square) is the move generator's
    /// business.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Castling: u8 {
        /// White may still castle kingside.
        const WHITE_KINGSIDE  = 0b0001;
        /// White may still castle queenside.
        const WHITE_QUEENSIDE = 0b0010;
        /// Black may still castle kingside.
        const BLACK_KINGSIDE  = 0b0100;
        /// Black may still castle queenside.
        const BLACK_QUEENSIDE = 0b1000;

        const WHITE = Self::WHITE_KINGSIDE.bits() | Self::WHITE_QUEENSIDE.bits();
        const BLACK = Self::BLACK_KINGSIDE.bits() | Self::BLACK_QUEENSIDE.bits();
    }
}

impl Default for Castling {
    fn default() -> Self {
        Self::all()
    }
}

impl Castling {
    /// FEN letters for each right, in the order the third FEN field lists
    /// them.
    const FEN_FLAGS: [(Castling, char); 4] = [
        (Castling::WHITE_KINGSIDE, 'K'),
        (Castling::WHITE_QUEENSIDE, 'Q'),
        (Castling::BLACK_KINGSIDE, 'k'),
        (Castling::BLACK_QUEENSIDE, 'q'),
    ];

    /// Both castling flags for the given colour.
    pub const fn both(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE,
            Color::Black => Self::BLACK,
        }
    }

    /// The kingside castling flag for the given colour.
    pub const fn kingside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    /// The queenside castling flag for the given colour.
    pub const fn queenside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Renders the rights as the third FEN field: the letters of whichever
    /// of `KQkq` still apply, or `-` when none do.
    pub fn as_fen_str(self) -> String {
        let letters: String = Self::FEN_FLAGS
            .iter()
            .filter(|&&(flag, _)| self.contains(flag))
            .map(|&(_, letter)| letter)
            .collect();

        if letters.is_empty() {
            "-".to_owned()
        } else {
            letters
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn castling_as_fen_str() {
        assert_eq!(Castling::all().as_fen_str(), "KQkq");
        assert_eq!(Castling::empty().as_fen_str(), "-");
        assert_eq!(Castling::WHITE.as_fen_str(), "KQ");
        assert_eq!(
            (Castling::WHITE_KINGSIDE | Castling::BLACK_QUEENSIDE).as_fen_str(),
            "Kq"
        );
    }

    #[test]
    fn castling_per_color_helpers() {
        assert_eq!(Castling::both(Color::White), Castling::WHITE);
        assert_eq!(Castling::kingside(Color::Black), Castling::BLACK_KINGSIDE);
        assert_eq!(Castling::queenside(Color::White), Castling::WHITE_QUEENSIDE);
    }
}
