use anyhow::{Context, Result};
use std::fmt;

pub const MAX_RANK: u8 = 13;
pub const MAX_SUIT: u8 = 4;
pub const MAX_CARD: u8 = MAX_SUIT * MAX_RANK;

const SUITS: [char; 4] = ['♠', '♥', '♣', '♦'];
const RANKS: [char; 13] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Ace = 1,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; MAX_RANK as usize] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Ordinal value, Ace = 1 through King = 13.
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn to_char(self) -> char {
        RANKS[self.value() as usize - 1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Clubs,
    Diamonds,
}

impl Suit {
    pub const ALL: [Suit; MAX_SUIT as usize] =
        [Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn color(self) -> Color {
        match self {
            Suit::Spades | Suit::Clubs => Color::Black,
            Suit::Hearts | Suit::Diamonds => Color::Red,
        }
    }

    pub fn to_char(self) -> char {
        SUITS[self.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// The 52 cards in suit order, Ace to King within each suit.
    pub fn full_deck() -> Vec<Card> {
        Suit::ALL
            .iter()
            .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| Card::new(rank, suit)))
            .collect()
    }

    pub fn parse(rank: char, suit: char) -> Result<Self> {
        let rank_idx = RANKS
            .iter()
            .position(|&r| r == rank)
            .with_context(|| format!("Invalid rank at card {rank}{suit}"))?;
        let suit_idx = SUITS
            .iter()
            .position(|&s| s == suit)
            .with_context(|| format!("Invalid suit at card {rank}{suit}"))?;
        Ok(Card::new(Rank::ALL[rank_idx], Suit::ALL[suit_idx]))
    }

    /// Dense index in `0..MAX_CARD`, suit-major.
    pub fn id(&self) -> usize {
        self.suit.index() * MAX_RANK as usize + self.rank.value() as usize - 1
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn color(&self) -> Color {
        self.suit.color()
    }

    pub fn is_king(&self) -> bool {
        self.rank == Rank::King
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }

    /// Whether `self` may be placed on `top` in a tableau column.
    pub fn can_build_down(&self, top: &Card) -> bool {
        self.rank.value() + 1 == top.rank.value() && self.color() != top.color()
    }

    /// Whether `self` may be placed on `top` in a foundation pile.
    pub fn can_build_up(&self, top: &Card) -> bool {
        self.rank.value() == top.rank.value() + 1 && self.suit == top.suit
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_deck() {
        let deck = Card::full_deck();
        assert_eq!(deck.len(), MAX_CARD as usize);
        let mut seen = [false; MAX_CARD as usize];
        for card in &deck {
            assert!(!seen[card.id()]);
            seen[card.id()] = true;
        }
        assert_eq!(deck[0], Card::new(Rank::Ace, Suit::Spades));
        assert_eq!(deck[51], Card::new(Rank::King, Suit::Diamonds));
    }

    #[test]
    fn test_parse_card() {
        let card = Card::parse('T', '♥').unwrap();
        assert_eq!(card, Card::new(Rank::Ten, Suit::Hearts));
        assert_eq!(format!("{card}"), "T♥");
        assert!(Card::parse('1', '♥').is_err());
        assert!(Card::parse('A', 'x').is_err());
    }

    #[test]
    fn test_build_down() {
        let seven_spades = Card::new(Rank::Seven, Suit::Spades);
        assert!(Card::new(Rank::Six, Suit::Hearts).can_build_down(&seven_spades));
        assert!(Card::new(Rank::Six, Suit::Diamonds).can_build_down(&seven_spades));
        assert!(!Card::new(Rank::Six, Suit::Clubs).can_build_down(&seven_spades));
        assert!(!Card::new(Rank::Five, Suit::Hearts).can_build_down(&seven_spades));
        assert!(!Card::new(Rank::Eight, Suit::Hearts).can_build_down(&seven_spades));
    }

    #[test]
    fn test_build_up() {
        let ace_hearts = Card::new(Rank::Ace, Suit::Hearts);
        assert!(Card::new(Rank::Two, Suit::Hearts).can_build_up(&ace_hearts));
        assert!(!Card::new(Rank::Two, Suit::Diamonds).can_build_up(&ace_hearts));
        assert!(!Card::new(Rank::Three, Suit::Hearts).can_build_up(&ace_hearts));
    }
}
