//! Tic-tac-toe rules: a 9-cell board, first joiner plays `X` and opens.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use parlor_protocol::{PeerId, TerminalResult};

use crate::{MoveRejected, StepOutcome};

/// The 8 winning line combinations (rows, columns, diagonals).
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A player's symbol on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

/// Full tic-tac-toe state, broadcast verbatim to both clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicTacToeState {
    /// Cells 0–8, row-major. `None` while unclaimed.
    pub board: [Option<Mark>; 9],
    /// Which symbol each peer plays.
    pub symbols: HashMap<PeerId, Mark>,
}

/// Creates a fresh board. The first joiner gets `X`.
pub fn init(players: &[PeerId; 2]) -> TicTacToeState {
    let mut symbols = HashMap::new();
    symbols.insert(players[0].clone(), Mark::X);
    symbols.insert(players[1].clone(), Mark::O);
    TicTacToeState {
        board: [None; 9],
        symbols,
    }
}

/// Claims `cell` for `peer`. Rejects out-of-range and occupied cells
/// without touching the board.
pub fn apply(
    state: &mut TicTacToeState,
    peer: &PeerId,
    cell: usize,
) -> Result<StepOutcome, MoveRejected> {
    let mark = *state
        .symbols
        .get(peer)
        .ok_or(MoveRejected::UnknownPlayer)?;
    if cell >= state.board.len() {
        return Err(MoveRejected::CellOutOfRange(cell));
    }
    if state.board[cell].is_some() {
        return Err(MoveRejected::CellOccupied(cell));
    }

    state.board[cell] = Some(mark);

    if wins(&state.board, mark) {
        return Ok(StepOutcome {
            next_turn: None,
            terminal: Some(TerminalResult::Winner(peer.clone())),
            flip_back: false,
        });
    }
    if state.board.iter().all(Option::is_some) {
        return Ok(StepOutcome {
            next_turn: None,
            terminal: Some(TerminalResult::Tie),
            flip_back: false,
        });
    }

    let opponent = state
        .symbols
        .keys()
        .find(|p| *p != peer)
        .cloned()
        .ok_or(MoveRejected::UnknownPlayer)?;
    Ok(StepOutcome::next(opponent))
}

fn wins(board: &[Option<Mark>; 9], mark: Mark) -> bool {
    WIN_LINES
        .iter()
        .any(|line| line.iter().all(|&i| board[i] == Some(mark)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> [PeerId; 2] {
        [PeerId::new("alice"), PeerId::new("bob")]
    }

    fn alice() -> PeerId {
        PeerId::new("alice")
    }

    fn bob() -> PeerId {
        PeerId::new("bob")
    }

    #[test]
    fn test_init_first_joiner_plays_x() {
        let state = init(&players());
        assert_eq!(state.symbols[&alice()], Mark::X);
        assert_eq!(state.symbols[&bob()], Mark::O);
        assert!(state.board.iter().all(Option::is_none));
    }

    #[test]
    fn test_apply_places_mark_and_passes_turn() {
        let mut state = init(&players());
        let outcome = apply(&mut state, &alice(), 0).unwrap();
        assert_eq!(state.board[0], Some(Mark::X));
        assert_eq!(outcome.next_turn, Some(bob()));
        assert!(outcome.terminal.is_none());
    }

    #[test]
    fn test_apply_rejects_occupied_cell_unchanged() {
        let mut state = init(&players());
        apply(&mut state, &alice(), 4).unwrap();
        let before = state.board;
        let result = apply(&mut state, &bob(), 4);
        assert_eq!(result, Err(MoveRejected::CellOccupied(4)));
        assert_eq!(state.board, before);
    }

    #[test]
    fn test_apply_rejects_out_of_range() {
        let mut state = init(&players());
        assert_eq!(
            apply(&mut state, &alice(), 9),
            Err(MoveRejected::CellOutOfRange(9))
        );
    }

    #[test]
    fn test_win_detection_all_eight_lines() {
        for line in WIN_LINES {
            let mut state = init(&players());
            for &cell in &line {
                state.board[cell] = Some(Mark::X);
            }
            assert!(wins(&state.board, Mark::X), "line {line:?}");
            assert!(!wins(&state.board, Mark::O), "line {line:?}");
        }
    }

    #[test]
    fn test_winning_move_reports_winner() {
        let mut state = init(&players());
        // X takes the top row, O fills the middle.
        apply(&mut state, &alice(), 0).unwrap();
        apply(&mut state, &bob(), 3).unwrap();
        apply(&mut state, &alice(), 1).unwrap();
        apply(&mut state, &bob(), 4).unwrap();
        let outcome = apply(&mut state, &alice(), 2).unwrap();
        assert_eq!(outcome.terminal, Some(TerminalResult::Winner(alice())));
        assert_eq!(outcome.next_turn, None);
    }

    #[test]
    fn test_full_board_without_line_is_tie() {
        // X O X / X O X / O X O — no line for either side.
        let mut state = init(&players());
        let xs = [0, 2, 3, 5, 7];
        let os = [1, 4, 6, 8];
        for &c in &xs {
            state.board[c] = Some(Mark::X);
        }
        for &c in &os[..3] {
            state.board[c] = Some(Mark::O);
        }
        let outcome = apply(&mut state, &bob(), 8).unwrap();
        assert_eq!(outcome.terminal, Some(TerminalResult::Tie));
    }

    #[test]
    fn test_turn_alternates_through_valid_sequence() {
        let mut state = init(&players());
        let mut mover = alice();
        for cell in [0, 3, 1, 4] {
            let outcome = apply(&mut state, &mover, cell).unwrap();
            let next = outcome.next_turn.expect("game still running");
            assert_ne!(next, mover, "turn must alternate");
            mover = next;
        }
    }

    #[test]
    fn test_state_wire_shape() {
        let state = init(&players());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["board"].as_array().unwrap().len(), 9);
        assert!(json["board"][0].is_null());
        assert_eq!(json["symbols"]["alice"], "X");
    }
}
