//! Pure rule engines for the three Parlor mini-games.
//!
//! Each engine is a set of plain functions over plain data: validate a
//! move against the current state, produce the next state, and report a
//! terminal result when the game ends. No IO, no clocks, no channels —
//! all timing (the memory-match flip-back delay in particular) lives in
//! the room layer, which calls back into [`resolve_pending_flips`] when
//! its timer fires.
//!
//! # Key types
//!
//! - [`GameState`] — one variant per game type, serialized as the bare
//!   game payload for `game-start`/`game-update` broadcasts
//! - [`StepOutcome`] — what a successfully applied move did: the new
//!   turn holder, an optional terminal result, and whether a flip-back
//!   needs scheduling
//! - [`MoveRejected`] — why an engine refused a move

pub mod memory;
pub mod rps;
pub mod tictactoe;

use serde::Serialize;

use parlor_protocol::{GameType, Move, PeerId, TerminalResult};

pub use memory::FlipResolution;

/// The engine-owned game payload of a room.
///
/// Opaque to every layer above the engines: the room broadcasts it as a
/// raw JSON value and never reaches inside. `#[serde(untagged)]` keeps
/// the wire payload free of a wrapper tag — the client already knows
/// its room's game type.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GameState {
    TicTacToe(tictactoe::TicTacToeState),
    Rps(rps::RpsState),
    Memory(memory::MemoryState),
}

/// The result of successfully applying a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Who may move next. `None` for rock-paper-scissors, where both
    /// players submit without turn gating, and after a terminal result.
    pub next_turn: Option<PeerId>,
    /// `Some` when this move ended the game.
    pub terminal: Option<TerminalResult>,
    /// `true` when a non-matching memory pair is left face-up and the
    /// room must schedule [`resolve_pending_flips`] after the delay
    /// window.
    pub flip_back: bool,
}

impl StepOutcome {
    fn next(turn: PeerId) -> Self {
        Self {
            next_turn: Some(turn),
            terminal: None,
            flip_back: false,
        }
    }
}

/// Why an engine refused a move. The state is untouched whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejected {
    #[error("cell index {0} is out of range")]
    CellOutOfRange(usize),

    #[error("cell {0} is already occupied")]
    CellOccupied(usize),

    #[error("choice already submitted this round")]
    AlreadyChosen,

    #[error("no card with id {0}")]
    NoSuchCard(usize),

    #[error("card {0} is already face-up or matched")]
    CardUnavailable(usize),

    #[error("a flipped pair is awaiting resolution")]
    FlipPending,

    #[error("move does not belong to this game type")]
    WrongMoveKind,

    #[error("player is not part of this game")]
    UnknownPlayer,

    #[error("no game in progress")]
    NoActiveGame,
}

/// Creates the initial state for a game between two seated players, in
/// join order.
pub fn initial_state(game: GameType, players: &[PeerId; 2]) -> GameState {
    match game {
        GameType::Tictactoe => GameState::TicTacToe(tictactoe::init(players)),
        GameType::Rps => GameState::Rps(rps::init(players)),
        GameType::Memory => GameState::Memory(memory::init(players)),
    }
}

/// The first turn holder for a fresh game.
///
/// The first joiner opens in tic-tac-toe (they hold `X`) and in
/// memory-match. Rock-paper-scissors has no turn order — both players
/// submit a choice each round.
pub fn initial_turn(game: GameType, players: &[PeerId; 2]) -> Option<PeerId> {
    match game {
        GameType::Tictactoe | GameType::Memory => Some(players[0].clone()),
        GameType::Rps => None,
    }
}

/// Validates and applies one move. Dispatches to the engine matching
/// the state variant; a move payload of the wrong kind is rejected.
pub fn apply_move(
    state: &mut GameState,
    peer: &PeerId,
    mv: &Move,
) -> Result<StepOutcome, MoveRejected> {
    match (state, mv) {
        (GameState::TicTacToe(s), Move::CellClick { cell_index }) => {
            tictactoe::apply(s, peer, *cell_index)
        }
        (GameState::Rps(s), Move::Choice { choice }) => rps::apply(s, peer, *choice),
        (GameState::Memory(s), Move::CardFlip { card_id }) => {
            memory::apply(s, peer, *card_id)
        }
        _ => Err(MoveRejected::WrongMoveKind),
    }
}

/// Resolves a pending memory-match pair, if any.
///
/// A no-op returning `None` for the other game types and when nothing
/// is pending, so a timer that fires after the game ended (or after the
/// pair was already resolved) is harmless.
pub fn resolve_pending_flips(state: &mut GameState) -> Option<FlipResolution> {
    match state {
        GameState::Memory(s) => memory::resolve_pending_flips(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers() -> [PeerId; 2] {
        [PeerId::new("alice"), PeerId::new("bob")]
    }

    #[test]
    fn test_initial_turn_first_joiner_opens_turn_games() {
        let p = peers();
        assert_eq!(initial_turn(GameType::Tictactoe, &p), Some(p[0].clone()));
        assert_eq!(initial_turn(GameType::Memory, &p), Some(p[0].clone()));
    }

    #[test]
    fn test_initial_turn_rps_has_none() {
        assert_eq!(initial_turn(GameType::Rps, &peers()), None);
    }

    #[test]
    fn test_apply_move_wrong_kind_rejected() {
        let p = peers();
        let mut state = initial_state(GameType::Tictactoe, &p);
        let result = apply_move(
            &mut state,
            &p[0],
            &Move::Choice {
                choice: parlor_protocol::Choice::Rock,
            },
        );
        assert_eq!(result, Err(MoveRejected::WrongMoveKind));
    }

    #[test]
    fn test_resolve_pending_flips_noop_for_other_games() {
        let p = peers();
        let mut state = initial_state(GameType::Rps, &p);
        assert!(resolve_pending_flips(&mut state).is_none());
    }
}
