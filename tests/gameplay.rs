use klondike::action::{Action, apply_action};
use klondike::board::{Board, Status, TOTAL_FOUNDATIONS, TOTAL_TABLEAUS};
use klondike::card::Card;
use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

fn all_actions() -> Vec<Action> {
    let mut actions = vec![Action::Draw, Action::TalonToFoundation];
    for i in 0..TOTAL_TABLEAUS {
        actions.push(Action::TableauToFoundation(i));
        actions.push(Action::TalonToTableau(i));
        for j in 0..TOTAL_FOUNDATIONS {
            actions.push(Action::FoundationToTableau(j, i));
        }
        for j in (0..TOTAL_TABLEAUS).filter(|&j| j != i) {
            actions.push(Action::TableauToTableau(i, j));
        }
    }
    actions
}

fn assert_invariants(board: &Board) {
    assert!(board.is_valid(), "invalid board:\n{}", board.pretty_print());
    for pile in board.foundations() {
        assert!(pile.is_ordered());
    }
    for tableau in board.tableaus() {
        assert!(tableau.is_built_down());
        assert!(tableau.is_empty() || tableau.face_up_count() >= 1);
    }
}

#[test]
fn random_play_keeps_invariants() {
    let actions = all_actions();
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let draw_count = if seed % 2 == 0 { 1 } else { 3 };
        let mut board = Board::with_rng(draw_count, &mut rng).unwrap();
        assert_invariants(&board);

        for _ in 0..2000 {
            let action = actions.choose(&mut rng).unwrap();
            let before = board.clone();
            let applied = apply_action(&mut board, action);
            assert_invariants(&board);
            if !applied && *action != Action::Draw {
                assert_eq!(board, before, "failed {action} changed the board");
            }
            if board.status() != Status::Playing {
                break;
            }
        }
    }
}

#[test]
fn hint_means_some_move_succeeds() {
    let actions = all_actions();
    let mut rng = StdRng::seed_from_u64(2024);
    let mut board = Board::with_rng(1, &mut rng).unwrap();

    for _ in 0..300 {
        if board.status() != Status::Playing {
            break;
        }
        if board.hint() {
            let found = actions
                .iter()
                .filter(|action| **action != Action::Draw)
                .any(|action| apply_action(&mut board.clone(), action));
            assert!(found, "hint without a move:\n{}", board.pretty_print());
        }
        let action = actions.choose(&mut rng).unwrap();
        apply_action(&mut board, action);
    }
}

#[test]
fn ordered_deck_deal() {
    let board = Board::from_deck(&Card::full_deck(), 1).unwrap();
    let expected = "Stock: 3♣4♣5♣6♣7♣8♣9♣T♣J♣Q♣K♣A♦2♦3♦4♦5♦6♦7♦8♦9♦T♦J♦Q♦K♦
Tableau1: |A♠
Tableau2: 2♠|3♠
Tableau3: 4♠5♠|6♠
Tableau4: 7♠8♠9♠|T♠
Tableau5: J♠Q♠K♠A♥|2♥
Tableau6: 3♥4♥5♥6♥7♥|8♥
Tableau7: 9♥T♥J♥Q♥K♥A♣|2♣
DrawCount: 1";
    assert_eq!(board.pretty_print(), expected);

    let mut board = board;
    assert!(apply_action(&mut board, &Action::TableauToFoundation(0)));
    assert!(board.tableau(0).unwrap().is_empty());
    assert_eq!(board.foundation_score(), 1);
    assert!(!apply_action(&mut board, &Action::TableauToFoundation(1)));
    assert_invariants(&board);
}

#[test]
fn deadlock_turns_stuck_only_after_a_full_cycle() {
    let mut board = Board::parse(
        "Stock: 2♦4♣6♦\nTableau1: 5♣|J♥\nTableau2: 8♦|Q♥\nTableau3: |4♥\nDrawCount: 3",
    )
    .unwrap();
    assert!(!board.hint());
    assert!(board.draw());
    assert_eq!(board.talon_cards().len(), 3);
    assert_eq!(board.status(), Status::Playing);
    assert!(board.draw());
    assert_eq!(board.status(), Status::Stuck);
}
