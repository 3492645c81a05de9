//! Memory-match rules: 8 shuffled symbol pairs, match to score.
//!
//! Flip two cards; a matching pair stays up, scores, and keeps your
//! turn. A non-matching pair stays face-up until the room's timer calls
//! [`resolve_pending_flips`], which flips both back and passes the
//! turn. The delay itself is not modeled here — the engine only exposes
//! the pure transition.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use parlor_protocol::{PeerId, TerminalResult};

use crate::{MoveRejected, StepOutcome};

/// The 8 card faces. Each appears twice in a deck.
pub const SYMBOLS: [&str; 8] = ["🎮", "🎯", "🎲", "🎪", "🎨", "🎭", "🎵", "🎸"];

/// One card on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: usize,
    pub symbol: String,
    pub face_up: bool,
    pub matched: bool,
}

/// Full memory-match state.
///
/// `turn` tracks whose flips are on the table so a pending resolution
/// knows who scores or loses the turn; the room mirrors it as the
/// broadcast `currentTurn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    pub cards: Vec<Card>,
    pub scores: HashMap<PeerId, u32>,
    /// Ids of the up-to-two cards flipped this turn and not yet
    /// resolved. Empty after every resolution.
    pub pending_flips: Vec<usize>,
    pub turn: PeerId,
}

/// What a [`resolve_pending_flips`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipResolution {
    /// `true` if the pair matched (and stayed up), `false` if it
    /// flipped back.
    pub matched: bool,
    /// Who moves next: the scorer on a match, the other player
    /// otherwise.
    pub next_turn: PeerId,
    /// `Some` once every card is matched.
    pub terminal: Option<TerminalResult>,
}

/// Creates a freshly shuffled table. The first joiner flips first.
pub fn init(players: &[PeerId; 2]) -> MemoryState {
    let mut deck: Vec<String> = SYMBOLS
        .iter()
        .flat_map(|s| [s.to_string(), s.to_string()])
        .collect();
    deck.shuffle(&mut rand::rng());
    with_deck(players, deck)
}

/// Creates a table from an explicit card order. Used by [`init`] after
/// shuffling, and directly by tests that need a known layout.
pub fn with_deck(players: &[PeerId; 2], deck: Vec<String>) -> MemoryState {
    let cards = deck
        .into_iter()
        .enumerate()
        .map(|(id, symbol)| Card {
            id,
            symbol,
            face_up: false,
            matched: false,
        })
        .collect();
    let mut scores = HashMap::new();
    scores.insert(players[0].clone(), 0);
    scores.insert(players[1].clone(), 0);
    MemoryState {
        cards,
        scores,
        pending_flips: Vec::new(),
        turn: players[0].clone(),
    }
}

/// Flips one face-down, unmatched card for `peer`.
///
/// The second flip of a turn resolves immediately when the pair
/// matches; otherwise the pair stays face-up and the outcome asks the
/// room to schedule the flip-back.
pub fn apply(
    state: &mut MemoryState,
    peer: &PeerId,
    card_id: usize,
) -> Result<StepOutcome, MoveRejected> {
    if !state.scores.contains_key(peer) {
        return Err(MoveRejected::UnknownPlayer);
    }
    if state.pending_flips.len() >= 2 {
        return Err(MoveRejected::FlipPending);
    }
    let idx = state
        .cards
        .iter()
        .position(|c| c.id == card_id)
        .ok_or(MoveRejected::NoSuchCard(card_id))?;
    if state.cards[idx].face_up || state.cards[idx].matched {
        return Err(MoveRejected::CardUnavailable(card_id));
    }

    state.cards[idx].face_up = true;
    state.pending_flips.push(card_id);

    if state.pending_flips.len() < 2 {
        return Ok(StepOutcome::next(state.turn.clone()));
    }

    if pending_pair_matches(state) {
        // A match resolves on the spot — no delay window needed.
        let resolution = resolve_pending_flips(state)
            .ok_or(MoveRejected::FlipPending)?;
        Ok(StepOutcome {
            next_turn: Some(resolution.next_turn),
            terminal: resolution.terminal,
            flip_back: false,
        })
    } else {
        // Leave the mismatched pair face-up; the room schedules the
        // flip-back after its delay window.
        Ok(StepOutcome {
            next_turn: Some(state.turn.clone()),
            terminal: None,
            flip_back: true,
        })
    }
}

/// Resolves the pending pair: marks a match (scorer keeps the turn) or
/// flips a mismatch back face-down (turn passes).
///
/// Returns `None` when fewer than two flips are pending — a late timer
/// after the pair was already resolved, or after a rematch reset, does
/// nothing.
pub fn resolve_pending_flips(state: &mut MemoryState) -> Option<FlipResolution> {
    if state.pending_flips.len() != 2 {
        return None;
    }
    let (first, second) = (state.pending_flips[0], state.pending_flips[1]);
    let a = state.cards.iter().position(|c| c.id == first)?;
    let b = state.cards.iter().position(|c| c.id == second)?;

    let matched = state.cards[a].symbol == state.cards[b].symbol;
    if matched {
        state.cards[a].matched = true;
        state.cards[b].matched = true;
        if let Some(score) = state.scores.get_mut(&state.turn) {
            *score += 1;
        }
    } else {
        state.cards[a].face_up = false;
        state.cards[b].face_up = false;
        if let Some(other) = state.scores.keys().find(|p| **p != state.turn) {
            state.turn = other.clone();
        }
    }
    state.pending_flips.clear();

    let terminal = if state.cards.iter().all(|c| c.matched) {
        Some(final_result(&state.scores))
    } else {
        None
    };

    Some(FlipResolution {
        matched,
        next_turn: state.turn.clone(),
        terminal,
    })
}

fn pending_pair_matches(state: &MemoryState) -> bool {
    let symbol_of = |id: usize| {
        state
            .cards
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.symbol.as_str())
    };
    match state.pending_flips.as_slice() {
        [a, b] => symbol_of(*a) == symbol_of(*b),
        _ => false,
    }
}

fn final_result(scores: &HashMap<PeerId, u32>) -> TerminalResult {
    let mut entries: Vec<_> = scores.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    match entries.as_slice() {
        [(winner, top), (_, runner_up)] if top > runner_up => {
            TerminalResult::Winner((*winner).clone())
        }
        _ => TerminalResult::Tie,
    }
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

    /// A deterministic table: pairs sit next to each other, so cards
    /// (2k, 2k+1) always match and (2k, 2k+2) never do.
    fn table() -> MemoryState {
        let deck = ["A", "A", "B", "B", "C", "C", "D", "D"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        with_deck(&players(), deck)
    }

    #[test]
    fn test_init_builds_full_shuffled_deck() {
        let state = init(&players());
        assert_eq!(state.cards.len(), SYMBOLS.len() * 2);
        for symbol in SYMBOLS {
            let count = state.cards.iter().filter(|c| c.symbol == symbol).count();
            assert_eq!(count, 2, "symbol {symbol} must appear twice");
        }
        assert!(state.pending_flips.is_empty());
        assert_eq!(state.turn, alice());
    }

    #[test]
    fn test_first_flip_stays_pending() {
        let mut state = table();
        let outcome = apply(&mut state, &alice(), 0).unwrap();
        assert!(state.cards[0].face_up);
        assert_eq!(state.pending_flips, vec![0]);
        assert!(!outcome.flip_back);
        assert_eq!(outcome.next_turn, Some(alice()));
    }

    #[test]
    fn test_matching_pair_scores_and_keeps_turn() {
        let mut state = table();
        apply(&mut state, &alice(), 0).unwrap();
        let outcome = apply(&mut state, &alice(), 1).unwrap();

        assert!(state.cards[0].matched && state.cards[1].matched);
        assert_eq!(state.scores[&alice()], 1);
        assert!(state.pending_flips.is_empty());
        assert_eq!(outcome.next_turn, Some(alice()));
        assert!(!outcome.flip_back);
        assert!(outcome.terminal.is_none());
    }

    #[test]
    fn test_mismatch_requests_flip_back() {
        let mut state = table();
        apply(&mut state, &alice(), 0).unwrap();
        let outcome = apply(&mut state, &alice(), 2).unwrap();

        assert!(outcome.flip_back);
        assert!(state.cards[0].face_up && state.cards[2].face_up);
        assert_eq!(state.pending_flips, vec![0, 2]);
        // Turn doesn't pass until the flip-back resolves.
        assert_eq!(outcome.next_turn, Some(alice()));
    }

    #[test]
    fn test_resolve_mismatch_flips_back_and_passes_turn() {
        let mut state = table();
        apply(&mut state, &alice(), 0).unwrap();
        apply(&mut state, &alice(), 2).unwrap();

        let resolution = resolve_pending_flips(&mut state).unwrap();
        assert!(!resolution.matched);
        assert_eq!(resolution.next_turn, bob());
        assert!(!state.cards[0].face_up && !state.cards[2].face_up);
        assert!(state.pending_flips.is_empty());
        assert_eq!(state.scores[&alice()], 0);
    }

    #[test]
    fn test_resolve_with_nothing_pending_is_noop() {
        let mut state = table();
        assert!(resolve_pending_flips(&mut state).is_none());
        apply(&mut state, &alice(), 0).unwrap();
        assert!(resolve_pending_flips(&mut state).is_none());
    }

    #[test]
    fn test_third_flip_during_pending_pair_rejected() {
        let mut state = table();
        apply(&mut state, &alice(), 0).unwrap();
        apply(&mut state, &alice(), 2).unwrap();
        let result = apply(&mut state, &alice(), 4);
        assert_eq!(result, Err(MoveRejected::FlipPending));
        assert!(!state.cards[4].face_up);
    }

    #[test]
    fn test_flipping_face_up_or_matched_card_rejected() {
        let mut state = table();
        apply(&mut state, &alice(), 0).unwrap();
        assert_eq!(
            apply(&mut state, &alice(), 0),
            Err(MoveRejected::CardUnavailable(0))
        );
        apply(&mut state, &alice(), 1).unwrap(); // pair matched
        assert_eq!(
            apply(&mut state, &alice(), 1),
            Err(MoveRejected::CardUnavailable(1))
        );
    }

    #[test]
    fn test_unknown_card_rejected() {
        let mut state = table();
        assert_eq!(
            apply(&mut state, &alice(), 99),
            Err(MoveRejected::NoSuchCard(99))
        );
    }

    #[test]
    fn test_all_matched_ends_with_higher_score_winning() {
        let mut state = table();
        // Every match keeps Alice's turn, so she can clear the table.
        for id in 0..7 {
            apply(&mut state, &alice(), id).unwrap();
        }
        let outcome = apply(&mut state, &alice(), 7).unwrap();

        assert_eq!(outcome.terminal, Some(TerminalResult::Winner(alice())));
        assert_eq!(state.scores[&alice()], 4);
        assert!(state.cards.iter().all(|c| c.matched));
    }

    #[test]
    fn test_equal_scores_end_in_tie() {
        let mut state = table();
        // Alice matches A and B.
        for id in 0..4 {
            apply(&mut state, &alice(), id).unwrap();
        }
        // Hand the turn to Bob via a mismatch resolution.
        apply(&mut state, &alice(), 4).unwrap();
        apply(&mut state, &alice(), 6).unwrap();
        resolve_pending_flips(&mut state).unwrap();
        assert_eq!(state.turn, bob());
        // Bob matches C and D.
        apply(&mut state, &bob(), 4).unwrap();
        apply(&mut state, &bob(), 5).unwrap();
        apply(&mut state, &bob(), 6).unwrap();
        let outcome = apply(&mut state, &bob(), 7).unwrap();

        assert_eq!(outcome.terminal, Some(TerminalResult::Tie));
        assert_eq!(state.scores[&alice()], 2);
        assert_eq!(state.scores[&bob()], 2);
    }

    #[test]
    fn test_state_wire_shape() {
        let mut state = table();
        apply(&mut state, &alice(), 0).unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["cards"][0]["faceUp"], true);
        assert_eq!(json["cards"][0]["matched"], false);
        assert_eq!(json["pendingFlips"][0], 0);
        assert_eq!(json["scores"]["alice"], 0);
        assert_eq!(json["turn"], "alice");
    }
}
