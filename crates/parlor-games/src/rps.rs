//! Rock-paper-scissors rules: best of rounds, first to three wins.
//!
//! The one game without turn order. Both players submit a choice for
//! the current round in either order; the round resolves once both are
//! buffered. A terminal result fires only when a score reaches
//! [`TARGET_SCORE`], never per round.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use parlor_protocol::{Choice, PeerId, TerminalResult};

use crate::{MoveRejected, StepOutcome};

/// Round wins needed to take the match.
pub const TARGET_SCORE: u32 = 3;

/// Full rock-paper-scissors state.
///
/// `choices` holds this round's buffered submissions and is cleared on
/// every resolution, so between rounds it is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpsState {
    pub round: u32,
    pub choices: HashMap<PeerId, Choice>,
    pub scores: HashMap<PeerId, u32>,
}

/// Creates round 1 with zeroed scores.
pub fn init(players: &[PeerId; 2]) -> RpsState {
    let mut scores = HashMap::new();
    scores.insert(players[0].clone(), 0);
    scores.insert(players[1].clone(), 0);
    RpsState {
        round: 1,
        choices: HashMap::new(),
        scores,
    }
}

/// `true` when `a` beats `b` in the standard win table.
pub fn beats(a: Choice, b: Choice) -> bool {
    matches!(
        (a, b),
        (Choice::Rock, Choice::Scissors)
            | (Choice::Scissors, Choice::Paper)
            | (Choice::Paper, Choice::Rock)
    )
}

/// Buffers `peer`'s choice for the current round and resolves the round
/// once both choices are present. A second submission in the same round
/// is rejected.
pub fn apply(
    state: &mut RpsState,
    peer: &PeerId,
    choice: Choice,
) -> Result<StepOutcome, MoveRejected> {
    if !state.scores.contains_key(peer) {
        return Err(MoveRejected::UnknownPlayer);
    }
    if state.choices.contains_key(peer) {
        return Err(MoveRejected::AlreadyChosen);
    }

    state.choices.insert(peer.clone(), choice);
    if state.choices.len() < 2 {
        return Ok(StepOutcome {
            next_turn: None,
            terminal: None,
            flip_back: false,
        });
    }

    // Both choices are in: resolve the round.
    let opponent = state
        .scores
        .keys()
        .find(|p| *p != peer)
        .cloned()
        .ok_or(MoveRejected::UnknownPlayer)?;
    let theirs = state.choices[&opponent];

    let round_winner = if choice == theirs {
        None
    } else if beats(choice, theirs) {
        Some(peer.clone())
    } else {
        Some(opponent)
    };

    if let Some(winner) = &round_winner {
        if let Some(score) = state.scores.get_mut(winner) {
            *score += 1;
        }
    }
    state.choices.clear();
    state.round += 1;

    let terminal = round_winner
        .filter(|w| state.scores[w] >= TARGET_SCORE)
        .map(TerminalResult::Winner);

    Ok(StepOutcome {
        next_turn: None,
        terminal,
        flip_back: false,
    })
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

    /// Plays one full round and returns its outcome.
    fn round(state: &mut RpsState, a: Choice, b: Choice) -> StepOutcome {
        apply(state, &alice(), a).unwrap();
        apply(state, &bob(), b).unwrap()
    }

    #[test]
    fn test_beats_table() {
        assert!(beats(Choice::Rock, Choice::Scissors));
        assert!(beats(Choice::Scissors, Choice::Paper));
        assert!(beats(Choice::Paper, Choice::Rock));
        assert!(!beats(Choice::Scissors, Choice::Rock));
        assert!(!beats(Choice::Rock, Choice::Rock));
    }

    #[test]
    fn test_first_choice_buffers_without_resolving() {
        let mut state = init(&players());
        let outcome = apply(&mut state, &alice(), Choice::Rock).unwrap();
        assert!(outcome.terminal.is_none());
        assert_eq!(state.round, 1);
        assert_eq!(state.choices.len(), 1);
        assert_eq!(state.scores[&alice()], 0);
    }

    #[test]
    fn test_round_resolves_when_both_chosen() {
        let mut state = init(&players());
        let outcome = round(&mut state, Choice::Rock, Choice::Scissors);
        assert!(outcome.terminal.is_none());
        assert_eq!(state.scores[&alice()], 1);
        assert_eq!(state.scores[&bob()], 0);
        assert_eq!(state.round, 2);
        assert!(state.choices.is_empty());
    }

    #[test]
    fn test_identical_choices_never_change_scores() {
        let mut state = init(&players());
        round(&mut state, Choice::Paper, Choice::Paper);
        assert_eq!(state.scores[&alice()], 0);
        assert_eq!(state.scores[&bob()], 0);
        assert_eq!(state.round, 2, "tied round still advances");
    }

    #[test]
    fn test_double_submission_in_round_rejected() {
        let mut state = init(&players());
        apply(&mut state, &alice(), Choice::Rock).unwrap();
        let result = apply(&mut state, &alice(), Choice::Paper);
        assert_eq!(result, Err(MoveRejected::AlreadyChosen));
        assert_eq!(state.choices[&alice()], Choice::Rock);
    }

    #[test]
    fn test_match_ends_exactly_at_target_score() {
        let mut state = init(&players());
        // Alice wins two rounds — no terminal yet.
        for _ in 0..2 {
            let outcome = round(&mut state, Choice::Rock, Choice::Scissors);
            assert!(outcome.terminal.is_none());
        }
        // A tied round in between must not end anything.
        assert!(
            round(&mut state, Choice::Rock, Choice::Rock)
                .terminal
                .is_none()
        );
        // Third win ends the match.
        let outcome = round(&mut state, Choice::Paper, Choice::Rock);
        assert_eq!(outcome.terminal, Some(TerminalResult::Winner(alice())));
        assert_eq!(state.scores[&alice()], TARGET_SCORE);
    }

    #[test]
    fn test_opponent_can_win_the_resolving_round() {
        let mut state = init(&players());
        // Bob's buffered choice beats Alice's resolving one.
        apply(&mut state, &bob(), Choice::Rock).unwrap();
        apply(&mut state, &alice(), Choice::Scissors).unwrap();
        assert_eq!(state.scores[&bob()], 1);
        assert_eq!(state.scores[&alice()], 0);
    }

    #[test]
    fn test_state_wire_shape() {
        let mut state = init(&players());
        apply(&mut state, &alice(), Choice::Rock).unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["round"], 1);
        assert_eq!(json["choices"]["alice"], "rock");
        assert_eq!(json["scores"]["bob"], 0);
    }
}
