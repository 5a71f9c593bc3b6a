//! Klondike Solitaire: cards, piles and the board rule engine.
pub mod action;
pub mod board;
pub mod card;
pub mod pile;
