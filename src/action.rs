use crate::board::{Board, TOTAL_FOUNDATIONS, TOTAL_TABLEAUS};
use crate::card::{Card, Suit};

use anyhow::{Context, Result, bail};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Draw,
    TalonToFoundation,
    TableauToFoundation(usize),
    TalonToTableau(usize),
    FoundationToTableau(usize, usize), // (foundation_index, tableau_index)
    TableauToTableau(usize, usize),    // (from_index, to_index)
}

impl Action {
    /// Parses the compact notation: `D`, `W:F`, `T3:F`, `W:T3`, `F1:T3`, `T1:T3`.
    /// Pile numbers are 1-based.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_uppercase();
        if s == "D" {
            return Ok(Action::Draw);
        }
        let (from, to) = s
            .split_once(':')
            .with_context(|| format!("Invalid action '{s}'"))?;
        let action = match (Pile::parse(from)?, Pile::parse(to)?) {
            (Pile::Talon, Pile::Foundation(None)) => Action::TalonToFoundation,
            (Pile::Tableau(i), Pile::Foundation(None)) => Action::TableauToFoundation(i),
            (Pile::Talon, Pile::Tableau(i)) => Action::TalonToTableau(i),
            (Pile::Foundation(Some(j)), Pile::Tableau(i)) => Action::FoundationToTableau(j, i),
            (Pile::Tableau(i), Pile::Tableau(j)) => Action::TableauToTableau(i, j),
            _ => bail!("Unsupported move '{s}'"),
        };
        Ok(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Draw => write!(f, "D"),
            Action::TalonToFoundation => write!(f, "W:F"),
            Action::TableauToFoundation(idx) => write!(f, "T{}:F", idx + 1),
            Action::TalonToTableau(idx) => write!(f, "W:T{}", idx + 1),
            Action::FoundationToTableau(from_idx, to_idx) => {
                write!(f, "F{}:T{}", from_idx + 1, to_idx + 1)
            }
            Action::TableauToTableau(from_idx, to_idx) => {
                write!(f, "T{}:T{}", from_idx + 1, to_idx + 1)
            }
        }
    }
}

enum Pile {
    Talon,
    Foundation(Option<usize>),
    Tableau(usize),
}

impl Pile {
    fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "W" {
            return Ok(Pile::Talon);
        }
        if s == "F" {
            return Ok(Pile::Foundation(None));
        }
        let (kind, limit) = match s.chars().next() {
            Some('F') => ('F', TOTAL_FOUNDATIONS),
            Some('T') => ('T', TOTAL_TABLEAUS),
            _ => bail!("Unknown pile '{s}'"),
        };
        let idx = s[1..]
            .parse::<usize>()
            .with_context(|| format!("Invalid pile number in '{s}'"))?;
        if idx == 0 || idx > limit {
            bail!("Pile number in '{s}' must be between 1 and {limit}");
        }
        Ok(match kind {
            'F' => Pile::Foundation(Some(idx - 1)),
            _ => Pile::Tableau(idx - 1),
        })
    }
}

pub fn apply_action(board: &mut Board, action: &Action) -> bool {
    match action {
        Action::Draw => board.draw(),
        Action::TalonToFoundation => board.move_talon_to_foundation(),
        Action::TableauToFoundation(tableau_index) => {
            board.move_tableau_to_foundation(*tableau_index)
        }
        Action::TalonToTableau(tableau_index) => board.move_talon_to_tableau(*tableau_index),
        Action::FoundationToTableau(foundation_index, tableau_index) => {
            board.move_foundation_to_tableau(*foundation_index, *tableau_index)
        }
        Action::TableauToTableau(from_index, to_index) => {
            board.move_tableau_to_tableau(*from_index, *to_index)
        }
    }
}

pub fn describe_action(board: &Board, action: &Action) -> String {
    let format_card =
        |card: Option<&Card>| -> String { card.map(|c| c.to_string()).unwrap_or_default() };
    let foundation_top = |card: Option<&Card>| {
        card.and_then(|c| board.foundation(c.suit().index()))
            .and_then(|pile| pile.peek_top())
    };

    match action {
        Action::Draw => "Draw".to_string(),
        Action::TalonToFoundation => {
            let from_card = board.talon_top();
            format!(
                "(Talon) {} -> (Foundation) {}",
                format_card(from_card),
                format_card(foundation_top(from_card))
            )
        }
        Action::TableauToFoundation(tableau_index) => {
            let from_card = board.tableau(*tableau_index).and_then(|t| t.peek_top());
            format!(
                "(Tableau{}) {} -> (Foundation) {}",
                tableau_index + 1,
                format_card(from_card),
                format_card(foundation_top(from_card))
            )
        }
        Action::TalonToTableau(tableau_index) => {
            let to_card = board.tableau(*tableau_index).and_then(|t| t.peek_top());
            format!(
                "(Talon) {} -> (Tableau{}) {}",
                format_card(board.talon_top()),
                tableau_index + 1,
                format_card(to_card)
            )
        }
        Action::FoundationToTableau(foundation_index, tableau_index) => {
            let from_card = board.foundation(*foundation_index).and_then(|f| f.peek_top());
            let to_card = board.tableau(*tableau_index).and_then(|t| t.peek_top());
            let suit = Suit::ALL.get(*foundation_index).map(|s| s.to_char()).unwrap_or('?');
            format!(
                "(Foundation{suit}) {} -> (Tableau{}) {}",
                format_card(from_card),
                tableau_index + 1,
                format_card(to_card)
            )
        }
        Action::TableauToTableau(from_index, to_index) => {
            let (Some(from), Some(to)) = (board.tableau(*from_index), board.tableau(*to_index))
            else {
                return action.to_string();
            };
            let from_cards = match from.find_run_start(to) {
                Some(start) => from.cards()[start..]
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<String>(),
                None => format_card(from.peek_top()),
            };
            format!(
                "(Tableau{}) {from_cards} -> (Tableau{}) {}",
                from_index + 1,
                to_index + 1,
                format_card(to.peek_top())
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(Action::parse("d").unwrap(), Action::Draw);
        assert_eq!(Action::parse("W:F").unwrap(), Action::TalonToFoundation);
        assert_eq!(Action::parse("t3:f").unwrap(), Action::TableauToFoundation(2));
        assert_eq!(Action::parse("W:T7").unwrap(), Action::TalonToTableau(6));
        assert_eq!(Action::parse("F2:T1").unwrap(), Action::FoundationToTableau(1, 0));
        assert_eq!(Action::parse(" T1:T5 ").unwrap(), Action::TableauToTableau(0, 4));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(Action::parse("").is_err());
        assert!(Action::parse("X").is_err());
        assert!(Action::parse("T8:F").is_err());
        assert!(Action::parse("T0:T1").is_err());
        assert!(Action::parse("F5:T1").is_err());
        assert!(Action::parse("F:T1").is_err());
        assert!(Action::parse("W:W").is_err());
        assert!(Action::parse("T1:F2").is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for action in [
            Action::Draw,
            Action::TalonToFoundation,
            Action::TableauToFoundation(4),
            Action::TalonToTableau(0),
            Action::FoundationToTableau(3, 6),
            Action::TableauToTableau(2, 1),
        ] {
            assert_eq!(Action::parse(&action.to_string()).unwrap(), action);
        }
    }

    #[test]
    fn test_apply_and_describe() {
        let mut board =
            Board::parse("Talon: |5♦\nTableau1: 2♠|9♠8♥\nTableau2: |6♣\nTableau3: |9♥\nDrawCount: 1")
                .unwrap();

        let action = Action::parse("W:T2").unwrap();
        assert_eq!(describe_action(&board, &action), "(Talon) 5♦ -> (Tableau2) 6♣");
        assert!(apply_action(&mut board, &action));
        assert!(board.is_talon_empty());

        let action = Action::parse("T1:T3").unwrap();
        assert!(!apply_action(&mut board, &action));

        let action = Action::TableauToTableau(2, 0);
        assert!(!apply_action(&mut board, &action));

        let action = Action::parse("T2:F").unwrap();
        assert!(!apply_action(&mut board, &action));
    }

    #[test]
    fn test_describe_run_move() {
        let board =
            Board::parse("Tableau1: 2♠|9♠8♥7♣\nTableau2: |9♣\nDrawCount: 1").unwrap();
        let action = Action::TableauToTableau(0, 1);
        assert_eq!(describe_action(&board, &action), "(Tableau1) 8♥7♣ -> (Tableau2) 9♣");
    }
}
