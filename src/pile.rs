use crate::card::{Card, Suit};

use smallvec::SmallVec;

pub const PILE_SIZE: usize = 19;

pub type Run = SmallVec<[Card; PILE_SIZE]>;

/// Ordered cards, bottom first. Only the top is playable in single-card moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPile {
    cards: SmallVec<[Card; PILE_SIZE]>,
}

impl CardPile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: &[Card]) -> Self {
        Self {
            cards: cards.iter().copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn peek_top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn pop(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Removes `cards[start..]`, keeping their order.
    pub fn drain_run(&mut self, start: usize) -> Run {
        self.cards.drain(start..).collect()
    }

    pub fn extend_run(&mut self, run: Run) {
        self.cards.extend(run);
    }
}

/// A tableau column. Cards below `boundary` are face down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableauPile {
    pile: CardPile,
    boundary: usize,
}

impl TableauPile {
    pub fn new(cards: &[Card], face_up_count: usize) -> Self {
        let mut tableau = Self {
            pile: CardPile::from_cards(cards),
            boundary: cards.len().saturating_sub(face_up_count),
        };
        tableau.flip();
        tableau
    }

    pub fn is_empty(&self) -> bool {
        self.pile.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pile.len()
    }

    pub fn cards(&self) -> &[Card] {
        self.pile.cards()
    }

    pub fn boundary(&self) -> usize {
        self.boundary
    }

    pub fn face_up(&self) -> &[Card] {
        &self.pile.cards()[self.boundary..]
    }

    pub fn face_up_count(&self) -> usize {
        self.len() - self.boundary
    }

    pub fn is_face_up(&self, idx: usize) -> bool {
        idx >= self.boundary && idx < self.len()
    }

    pub fn peek_top(&self) -> Option<&Card> {
        self.pile.peek_top()
    }

    /// Whether `card` may be placed on this column.
    pub fn accepts(&self, card: &Card) -> bool {
        match self.peek_top() {
            Some(top) => card.can_build_down(top),
            None => card.is_king(),
        }
    }

    pub fn push(&mut self, card: Card) {
        debug_assert!(self.accepts(&card));
        if self.pile.is_empty() {
            self.boundary = 0;
        }
        self.pile.push(card);
    }

    pub fn pop(&mut self) -> Option<Card> {
        let card = self.pile.pop()?;
        self.flip();
        Some(card)
    }

    /// Index of the lowest face-up card whose run can be placed on `dest`.
    pub fn find_run_start(&self, dest: &TableauPile) -> Option<usize> {
        (self.boundary..self.len()).find(|&idx| dest.accepts(&self.pile.cards()[idx]))
    }

    /// Removes the face-up run starting at `start`, flipping the next card if needed.
    pub fn take_run(&mut self, start: usize) -> Run {
        debug_assert!(self.is_face_up(start));
        let run = self.pile.drain_run(start);
        self.flip();
        run
    }

    pub fn put_run(&mut self, run: Run) {
        if self.pile.is_empty() {
            self.boundary = 0;
        }
        self.pile.extend_run(run);
    }

    /// Whether the face-up run descends by one with alternating colours.
    pub fn is_built_down(&self) -> bool {
        self.face_up().windows(2).all(|w| w[1].can_build_down(&w[0]))
    }

    fn flip(&mut self) {
        let len = self.pile.len();
        if len == 0 {
            self.boundary = 0;
        } else if self.boundary >= len {
            self.boundary = len - 1;
        }
    }
}

/// A foundation pile holding one suit from Ace upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitPile {
    pile: CardPile,
    suit: Suit,
}

impl SuitPile {
    pub fn new(suit: Suit) -> Self {
        Self {
            pile: CardPile::new(),
            suit,
        }
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn is_empty(&self) -> bool {
        self.pile.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pile.len()
    }

    pub fn cards(&self) -> &[Card] {
        self.pile.cards()
    }

    pub fn peek_top(&self) -> Option<&Card> {
        self.pile.peek_top()
    }

    pub fn accepts(&self, card: &Card) -> bool {
        if card.suit() != self.suit {
            return false;
        }
        match self.peek_top() {
            Some(top) => card.can_build_up(top),
            None => card.is_ace(),
        }
    }

    pub fn push(&mut self, card: Card) {
        debug_assert!(self.accepts(&card));
        self.pile.push(card);
    }

    pub fn pop(&mut self) -> Option<Card> {
        self.pile.pop()
    }

    /// Whether the pile reads Ace, 2, 3, ... in its own suit.
    pub fn is_ordered(&self) -> bool {
        self.pile
            .cards()
            .iter()
            .enumerate()
            .all(|(i, card)| {
                card.suit() == self.suit && card.rank().value() as usize == i + 1
            })
    }
}
