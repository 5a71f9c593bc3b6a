use crate::card::{Card, MAX_CARD, Rank, Suit};
use crate::pile::{SuitPile, TableauPile};

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use smallvec::SmallVec;

pub const TOTAL_FOUNDATIONS: usize = 4;
pub const TOTAL_TABLEAUS: usize = 7;
pub const TALON_SIZE: usize = 24;

const DRAW_COUNTS: [usize; 2] = [1, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Playing,
    Won,
    Stuck,
}

/// Position of the talon/stock cursors within the draw pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub talon: usize,
    pub stock: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    // draw_pile[talon..stock] is the visible talon, draw_pile[stock..] is undrawn.
    draw_pile: SmallVec<[Card; TALON_SIZE]>,
    talon: usize,
    stock: usize,
    draw_count: usize,
    foundations: [SuitPile; TOTAL_FOUNDATIONS],
    tableaus: [TableauPile; TOTAL_TABLEAUS],
    status: Status,
    stuck_frame: Option<Frame>,
}

pub fn check_draw_count(draw_count: usize) -> Result<()> {
    if !DRAW_COUNTS.contains(&draw_count) {
        bail!("Draw count must be 1 or 3.");
    }
    Ok(())
}

impl Board {
    /// Deals a freshly shuffled game.
    pub fn new(draw_count: usize) -> Result<Self> {
        Self::with_rng(draw_count, &mut rand::rng())
    }

    pub fn from_seed(seed: u64, draw_count: usize) -> Result<Self> {
        Self::with_rng(draw_count, &mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng + ?Sized>(draw_count: usize, rng: &mut R) -> Result<Self> {
        check_draw_count(draw_count)?;
        let mut deck = Card::full_deck();
        deck.shuffle(rng);
        Self::from_deck(&deck, draw_count)
    }

    /// Deals `deck` in order: 1..=7 cards to the columns, the rest to the stock.
    pub fn from_deck(deck: &[Card], draw_count: usize) -> Result<Self> {
        check_draw_count(draw_count)?;
        if deck.len() != MAX_CARD as usize {
            bail!("A deck needs {MAX_CARD} cards, got {}", deck.len());
        }

        let mut board = Self::blank(draw_count);
        let mut m = 0;
        for (i, tableau) in board.tableaus.iter_mut().enumerate() {
            *tableau = TableauPile::new(&deck[m..m + i + 1], 1);
            m += i + 1;
        }
        board.draw_pile.extend_from_slice(&deck[m..]);

        info!(
            "Dealt a new game: {} cards in stock, draw count {draw_count}",
            board.draw_pile.len()
        );
        board.update_status(false);
        Ok(board)
    }

    /// Throws the current game away and deals a new one.
    pub fn reset(&mut self, draw_count: usize) -> Result<()> {
        *self = Self::new(draw_count)?;
        Ok(())
    }

    fn blank(draw_count: usize) -> Self {
        Self {
            draw_pile: SmallVec::new(),
            talon: 0,
            stock: 0,
            draw_count,
            foundations: Suit::ALL.map(SuitPile::new),
            tableaus: Default::default(),
            status: Status::Playing,
            stuck_frame: None,
        }
    }

    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    pub fn set_draw_count(&mut self, value: usize) -> Result<()> {
        check_draw_count(value)?;
        self.draw_count = value;
        Ok(())
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn frame(&self) -> Frame {
        Frame {
            talon: self.talon,
            stock: self.stock,
        }
    }

    pub fn is_talon_empty(&self) -> bool {
        self.talon == self.stock
    }

    pub fn is_stock_empty(&self) -> bool {
        self.stock == self.draw_pile.len()
    }

    pub fn is_draw_pile_empty(&self) -> bool {
        self.draw_pile.is_empty()
    }

    /// The visible talon run, playable card last.
    pub fn talon_cards(&self) -> &[Card] {
        &self.draw_pile[self.talon..self.stock]
    }

    pub fn talon_top(&self) -> Option<&Card> {
        self.talon_cards().last()
    }

    /// Cards drawn so far, including the visible run.
    pub fn waste_len(&self) -> usize {
        self.stock
    }

    pub fn stock_len(&self) -> usize {
        self.draw_pile.len() - self.stock
    }

    pub fn foundations(&self) -> &[SuitPile] {
        &self.foundations
    }

    pub fn foundation(&self, idx: usize) -> Option<&SuitPile> {
        self.foundations.get(idx)
    }

    pub fn tableaus(&self) -> &[TableauPile] {
        &self.tableaus
    }

    pub fn tableau(&self, idx: usize) -> Option<&TableauPile> {
        self.tableaus.get(idx)
    }

    pub fn foundation_score(&self) -> usize {
        self.foundations.iter().map(|pile| pile.len()).sum()
    }

    pub fn is_won(&self) -> bool {
        self.tableaus.iter().all(|tableau| tableau.is_empty())
    }

    /// Advances the talon by up to `draw_count` cards, or turns the talon over
    /// once the stock is exhausted.
    pub fn draw(&mut self) -> bool {
        if self.status != Status::Playing {
            return false;
        }
        let drawn = !self.draw_pile.is_empty();
        if drawn {
            if self.is_stock_empty() {
                self.talon = 0;
                self.stock = 0;
                debug!("Turned the talon over");
            } else {
                self.talon = self.stock;
                self.stock = (self.stock + self.draw_count).min(self.draw_pile.len());
                debug!("Drew {:?}", self.talon_cards());
            }
        }
        self.update_status(true);
        drawn
    }

    pub fn move_talon_to_foundation(&mut self) -> bool {
        if self.status != Status::Playing {
            return false;
        }
        let Some(&card) = self.talon_top() else {
            return false;
        };
        let foundation = &self.foundations[card.suit().index()];
        if !foundation.accepts(&card) {
            return false;
        }
        self.take_talon_top();
        self.foundations[card.suit().index()].push(card);
        debug!("Moved {card} from talon to foundation");
        self.finish_move();
        true
    }

    pub fn move_tableau_to_foundation(&mut self, tableau_idx: usize) -> bool {
        if self.status != Status::Playing || tableau_idx >= TOTAL_TABLEAUS {
            return false;
        }
        let Some(&card) = self.tableaus[tableau_idx].peek_top() else {
            return false;
        };
        if !self.foundations[card.suit().index()].accepts(&card) {
            return false;
        }
        self.tableaus[tableau_idx].pop();
        self.foundations[card.suit().index()].push(card);
        debug!("Moved {card} from tableau {tableau_idx} to foundation");
        self.finish_move();
        true
    }

    pub fn move_talon_to_tableau(&mut self, tableau_idx: usize) -> bool {
        if self.status != Status::Playing || tableau_idx >= TOTAL_TABLEAUS {
            return false;
        }
        let Some(&card) = self.talon_top() else {
            return false;
        };
        if !self.tableaus[tableau_idx].accepts(&card) {
            return false;
        }
        self.take_talon_top();
        self.tableaus[tableau_idx].push(card);
        debug!("Moved {card} from talon to tableau {tableau_idx}");
        self.finish_move();
        true
    }

    pub fn move_foundation_to_tableau(
        &mut self,
        foundation_idx: usize,
        tableau_idx: usize,
    ) -> bool {
        if self.status != Status::Playing
            || foundation_idx >= TOTAL_FOUNDATIONS
            || tableau_idx >= TOTAL_TABLEAUS
        {
            return false;
        }
        let Some(&card) = self.foundations[foundation_idx].peek_top() else {
            return false;
        };
        if !self.tableaus[tableau_idx].accepts(&card) {
            return false;
        }
        self.foundations[foundation_idx].pop();
        self.tableaus[tableau_idx].push(card);
        debug!("Moved {card} from foundation {foundation_idx} to tableau {tableau_idx}");
        self.finish_move();
        true
    }

    /// Moves the longest face-up run of `from_idx` that fits onto `to_idx`.
    pub fn move_tableau_to_tableau(&mut self, from_idx: usize, to_idx: usize) -> bool {
        if self.status != Status::Playing
            || from_idx == to_idx
            || from_idx >= TOTAL_TABLEAUS
            || to_idx >= TOTAL_TABLEAUS
        {
            return false;
        }
        let Some(start) = self.tableaus[from_idx].find_run_start(&self.tableaus[to_idx]) else {
            return false;
        };
        let run = self.tableaus[from_idx].take_run(start);
        debug!("Moved {run:?} from tableau {from_idx} to tableau {to_idx}");
        self.tableaus[to_idx].put_run(run);
        self.finish_move();
        true
    }

    /// Whether any move can be made without drawing.
    pub fn has_legal_move(&self) -> bool {
        let talon_top = self.talon_top();
        let fits_foundation = |card: &Card| self.foundations[card.suit().index()].accepts(card);

        if talon_top.is_some_and(fits_foundation) {
            return true;
        }
        if self
            .tableaus
            .iter()
            .filter_map(|tableau| tableau.peek_top())
            .any(fits_foundation)
        {
            return true;
        }

        for (to_idx, dest) in self.tableaus.iter().enumerate() {
            if talon_top.is_some_and(|card| dest.accepts(card)) {
                return true;
            }
            if self
                .foundations
                .iter()
                .filter_map(|pile| pile.peek_top())
                .any(|card| dest.accepts(card))
            {
                return true;
            }
            for (from_idx, src) in self.tableaus.iter().enumerate() {
                if from_idx == to_idx {
                    continue;
                }
                match src.find_run_start(dest) {
                    // Relocating a whole column onto an empty one changes nothing.
                    Some(0) if dest.is_empty() => {}
                    Some(_) => return true,
                    None => {}
                }
            }
        }
        false
    }

    pub fn hint(&self) -> bool {
        self.has_legal_move()
    }

    fn take_talon_top(&mut self) -> Option<Card> {
        if self.is_talon_empty() {
            return None;
        }
        self.stock -= 1;
        let card = self.draw_pile.remove(self.stock);
        if self.talon == self.stock && self.talon > 0 {
            self.talon -= 1;
        }
        Some(card)
    }

    fn finish_move(&mut self) {
        self.stuck_frame = None;
        self.update_status(false);
    }

    fn update_status(&mut self, after_draw: bool) {
        if self.status != Status::Playing {
            return;
        }
        let status = if self.is_won() {
            Status::Won
        } else if self.has_legal_move() {
            self.stuck_frame = None;
            Status::Playing
        } else {
            let frame = self.frame();
            match self.stuck_frame {
                None if self.is_cycle_frame(frame) => {
                    debug!("No legal move at {frame:?}");
                    self.stuck_frame = Some(frame);
                    Status::Playing
                }
                Some(seen) if after_draw && seen == frame => Status::Stuck,
                _ => Status::Playing,
            }
        };
        if status != self.status {
            info!("Game status changed: {:?} -> {status:?}", self.status);
            self.status = status;
        }
    }

    /// Whether drawing from a turned-over pile passes through `frame`.
    /// A talon play in draw-3 leaves the cursors off that path until the next recycle.
    fn is_cycle_frame(&self, frame: Frame) -> bool {
        if frame.stock == 0 {
            return true;
        }
        frame.talon < frame.stock
            && frame.talon % self.draw_count == 0
            && frame.stock == (frame.talon + self.draw_count).min(self.draw_pile.len())
    }

    /// Checks that the board holds a full deck and every pile is well formed.
    pub fn is_valid(&self) -> bool {
        if check_draw_count(self.draw_count).is_err() {
            return false;
        }
        if self.stock > self.draw_pile.len() || self.talon > self.stock {
            return false;
        }
        if self.stock > 0 && self.talon == self.stock {
            return false;
        }

        let mut seen = [false; MAX_CARD as usize];
        let mut count = 0;
        let mut check_cards = |cards: &[Card]| -> bool {
            for card in cards {
                let id = card.id();
                if seen[id] {
                    return false;
                }
                seen[id] = true;
                count += 1;
            }
            true
        };

        if !check_cards(&self.draw_pile) {
            return false;
        }
        for pile in &self.foundations {
            if !pile.is_ordered() || !check_cards(pile.cards()) {
                return false;
            }
        }
        for tableau in &self.tableaus {
            if !tableau.is_built_down() || !check_cards(tableau.cards()) {
                return false;
            }
        }
        count == MAX_CARD as usize
    }

    /// What the player can see of the board.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            stock_len: self.stock_len(),
            waste_len: self.waste_len(),
            talon: self.talon_cards().to_vec(),
            foundations: std::array::from_fn(|i| self.foundations[i].peek_top().copied()),
            tableaus: std::array::from_fn(|i| {
                let tableau = &self.tableaus[i];
                tableau
                    .cards()
                    .iter()
                    .enumerate()
                    .map(|(j, &card)| {
                        if tableau.is_face_up(j) {
                            Slot::FaceUp(card)
                        } else {
                            Slot::FaceDown
                        }
                    })
                    .collect()
            }),
            draw_count: self.draw_count,
            status: self.status,
        }
    }

    pub fn render(&self) -> String {
        self.snapshot().render()
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut board = Self::blank(1);

        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty())
        {
            let line_context = || format!("Failed to parse at '{line}'");
            if let Some(rest) = line.strip_prefix("Stock:") {
                let cards = Self::parse_cards(rest.trim()).with_context(line_context)?;
                board.draw_pile.extend(cards);
            } else if let Some(rest) = line.strip_prefix("Talon:") {
                let (covered, visible) = split_bar(rest);
                let covered = Self::parse_cards(covered.trim()).with_context(line_context)?;
                let visible = Self::parse_cards(visible.trim()).with_context(line_context)?;
                // Drawn cards go in front of whatever stock was already read.
                let drawn: Vec<Card> = [covered.as_slice(), visible.as_slice()].concat();
                board.stock = drawn.len();
                board.talon = if visible.is_empty() {
                    drawn.len().saturating_sub(1)
                } else {
                    covered.len()
                };
                board.draw_pile.insert_many(0, drawn);
            } else if let Some(rest) = line.strip_prefix("Foundation") {
                let (idx, cards) = Self::parse_indexed(rest, TOTAL_FOUNDATIONS)
                    .context("Invalid foundation index")
                    .with_context(line_context)?;
                let pile = &mut board.foundations[idx];
                *pile = SuitPile::new(pile.suit());
                let Some(top) = cards.last() else {
                    continue;
                };
                if top.suit() != pile.suit() {
                    return Err(anyhow!(
                        "Foundation{} only holds {}",
                        idx + 1,
                        pile.suit().to_char()
                    ))
                    .with_context(line_context);
                }
                for &rank in &Rank::ALL[..top.rank().value() as usize] {
                    pile.push(Card::new(rank, top.suit()));
                }
            } else if let Some(rest) = line.strip_prefix("Tableau") {
                let (idx, _) = Self::parse_indexed(rest, TOTAL_TABLEAUS)
                    .context("Invalid tableau index")
                    .with_context(line_context)?;
                let cards_str = rest.split_once(':').map(|(_, v)| v).unwrap_or("");
                let (face_down, face_up) = split_bar(cards_str);
                let face_down = Self::parse_cards(face_down.trim()).with_context(line_context)?;
                let face_up = Self::parse_cards(face_up.trim()).with_context(line_context)?;
                board.tableaus[idx] =
                    TableauPile::new(&[face_down, face_up.clone()].concat(), face_up.len());
            } else if let Some(rest) = line.strip_prefix("DrawCount:") {
                let value = rest
                    .trim()
                    .parse::<usize>()
                    .context("Invalid DrawCount")
                    .with_context(line_context)?;
                check_draw_count(value).with_context(line_context)?;
                board.draw_count = value;
            }
        }

        board.update_status(false);
        Ok(board)
    }

    fn parse_indexed(rest: &str, limit: usize) -> Result<(usize, Vec<Card>)> {
        let mut parts = rest.splitn(2, ':');
        let idx = parts.next().unwrap_or("").trim().parse::<usize>()?;
        if idx == 0 || idx > limit {
            bail!("Index {idx} is out of range 1..={limit}");
        }
        let cards = Self::parse_cards(parts.next().unwrap_or("").trim())?;
        Ok((idx - 1, cards))
    }

    fn parse_cards(s: &str) -> Result<Vec<Card>> {
        let mut cards = Vec::new();
        let mut chars = s.chars().peekable();
        while let Some(&c1) = chars.peek() {
            if c1.is_whitespace() || c1 == '|' {
                chars.next();
                continue;
            }
            let rank = c1;
            chars.next();
            let suit = match chars.next() {
                Some(s) => s,
                None => bail!("Missing suit after '{rank}'"),
            };
            cards.push(Card::parse(rank, suit)?);
        }
        Ok(cards)
    }

    /// Full state, including face-down cards, in the format read by [`Board::parse`].
    pub fn pretty_print(&self) -> String {
        let mut output = String::new();

        if !self.is_stock_empty() {
            output.push_str("Stock: ");
            for card in &self.draw_pile[self.stock..] {
                output.push_str(&card.to_string());
            }
            output.push('\n');
        }

        if self.stock > 0 {
            output.push_str("Talon: ");
            for (i, card) in self.draw_pile[..self.stock].iter().enumerate() {
                if i == self.talon {
                    output.push('|');
                }
                output.push_str(&card.to_string());
            }
            output.push('\n');
        }

        for (i, pile) in self.foundations.iter().enumerate() {
            if let Some(card) = pile.peek_top() {
                output.push_str(&format!("Foundation{}: {card}\n", i + 1));
            }
        }

        for (i, tableau) in self.tableaus.iter().enumerate() {
            if tableau.is_empty() {
                continue;
            }
            output.push_str(&format!("Tableau{}: ", i + 1));
            for (j, card) in tableau.cards().iter().enumerate() {
                if j == tableau.boundary() {
                    output.push('|');
                }
                output.push_str(&card.to_string());
            }
            output.push('\n');
        }

        output.push_str(&format!("DrawCount: {}", self.draw_count));

        output
    }
}

fn split_bar(s: &str) -> (&str, &str) {
    s.split_once('|').unwrap_or((s, ""))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    FaceDown,
    FaceUp(Card),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub stock_len: usize,
    pub waste_len: usize,
    pub talon: Vec<Card>,
    pub foundations: [Option<Card>; TOTAL_FOUNDATIONS],
    pub tableaus: [Vec<Slot>; TOTAL_TABLEAUS],
    pub draw_count: usize,
    pub status: Status,
}

impl Snapshot {
    pub fn render(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Draw {}  Stock ({})  Waste ({})  Talon: ",
            self.draw_count,
            self.stock_len,
            self.waste_len - self.talon.len()
        ));
        if self.talon.is_empty() {
            output.push_str("--");
        }
        let talon: Vec<String> = self.talon.iter().map(|c| c.to_string()).collect();
        output.push_str(&talon.join(" "));
        output.push('\n');

        for (i, top) in self.foundations.iter().enumerate() {
            let top = top.map(|c| c.to_string()).unwrap_or_else(|| "--".into());
            output.push_str(&format!("F{} {top:<4}", i + 1));
        }
        output.push('\n');

        for (i, slots) in self.tableaus.iter().enumerate() {
            output.push_str(&format!("T{}", i + 1));
            for slot in slots {
                match slot {
                    Slot::FaceDown => output.push_str(" ##"),
                    Slot::FaceUp(card) => output.push_str(&format!(" {card}")),
                }
            }
            output.push('\n');
        }

        match self.status {
            Status::Playing => {}
            Status::Won => output.push_str("Status: Won\n"),
            Status::Stuck => output.push_str("Status: Stuck\n"),
        }

        output
    }
}
