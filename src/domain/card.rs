/// Cards: identity (suit + pip count) and per-card board state.
/// Two cards form a pair iff their faces are equal; object identity
/// never matters, only `CardFace` equality.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Suit {
    Spades,
    Hearts,
    Clubs,
    Diamonds,
}

/// Default suit alphabet, in display order.
pub const SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds];

/// Default value alphabet: number of suit pips drawn on the face.
pub const VALUES: [u8; 5] = [1, 2, 3, 4, 5];

impl Suit {
    pub fn symbol(self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Clubs => '♣',
            Suit::Diamonds => '♦',
        }
    }

    /// Hearts and diamonds render red, the rest dark.
    pub fn is_red(self) -> bool {
        matches!(self, Suit::Hearts | Suit::Diamonds)
    }
}

/// The identity of a card. Exactly two cards in a deck share a face.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CardFace {
    pub suit: Suit,
    pub value: u8,
}

impl CardFace {
    pub fn new(suit: Suit, value: u8) -> Self {
        CardFace { suit, value }
    }

    /// Short label, e.g. `3♥`.
    pub fn label(&self) -> String {
        format!("{}{}", self.value, self.suit.symbol())
    }
}

#[derive(Clone, Debug)]
pub struct Card {
    pub face: CardFace,
    pub row: usize,
    pub col: usize,
    pub flipped: bool,  // face-up
    pub matched: bool,  // permanently resolved
}

impl Card {
    /// New cards start face-up for the memorize phase.
    pub fn new(face: CardFace, row: usize, col: usize) -> Self {
        Card { face, row, col, flipped: true, matched: false }
    }

    /// Can the player turn this card over right now?
    pub fn is_selectable(&self) -> bool {
        !self.matched && !self.flipped
    }

    pub fn matches(&self, other: &Card) -> bool {
        self.face == other.face
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_faces_match_regardless_of_position() {
        let a = Card::new(CardFace::new(Suit::Hearts, 3), 0, 0);
        let b = Card::new(CardFace::new(Suit::Hearts, 3), 2, 4);
        let c = Card::new(CardFace::new(Suit::Diamonds, 3), 0, 1);
        assert!(a.matches(&b));
        assert!(!a.matches(&c)); // same value, different suit
    }

    #[test]
    fn new_card_is_face_up_and_not_selectable() {
        let mut card = Card::new(CardFace::new(Suit::Clubs, 1), 0, 0);
        assert!(card.flipped);
        assert!(!card.is_selectable());
        card.flipped = false;
        assert!(card.is_selectable());
        card.matched = true;
        assert!(!card.is_selectable());
    }

    #[test]
    fn label_and_colour() {
        assert_eq!(CardFace::new(Suit::Spades, 5).label(), "5♠");
        assert!(Suit::Diamonds.is_red());
        assert!(!Suit::Clubs.is_red());
    }
}
