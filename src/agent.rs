//! Computer players

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

use ludo_engine::{
    is_safe_cell, try_apply_move, Color, GameState, NextStep, PieceId, PieceState, DIE_FACES,
    HOME_RUN_START, RING_LEN,
};

/// Anything that can pick which piece to move: a random policy, a heuristic,
/// or a person at the keyboard.
pub trait Agent {
    /// Choose one of `legal` for the settled roll in `state`.
    ///
    /// Requirement:
    /// - Must return an element of `legal`, which is never empty.
    fn select_piece(&mut self, state: &GameState, legal: &[PieceId], rng: &mut impl Rng) -> PieceId;
}

/// Uniform over legal pieces
#[derive(Clone, Debug, Default)]
pub struct RandomAgent;

impl RandomAgent {
    pub fn new() -> Self {
        Self
    }
}

impl Agent for RandomAgent {
    fn select_piece(&mut self, _state: &GameState, legal: &[PieceId], rng: &mut impl Rng) -> PieceId {
        assert!(!legal.is_empty(), "No legal pieces available for agent");
        legal[rng.random_range(0..legal.len())]
    }
}

// Move priorities, highest first
const WIN_SCORE: i32 = 10_000;
const CAPTURE_SCORE: i32 = 1_000;
const FINISH_SCORE: i32 = 500;
const RELEASE_SCORE: i32 = 300;
const SAFE_LANDING_SCORE: i32 = 100;
const THREAT_PENALTY: i32 = 80;

/// One-ply heuristic: win, then capture, finish, leave base, land safe, and
/// otherwise push the piece furthest along. Ties go to the lowest id.
#[derive(Clone, Debug, Default)]
pub struct GreedyAgent;

impl GreedyAgent {
    pub fn new() -> Self {
        Self
    }

    /// Heuristic value of moving `id`, or `None` if the move is not legal
    pub fn score_move(state: &GameState, id: PieceId) -> Option<i32> {
        let outcome = try_apply_move(state, id).ok()?;
        let before = state.piece(id)?;
        let after = &outcome.state.pieces[id as usize];

        let mut score = 0;
        if let NextStep::Won(_) = outcome.next {
            score += WIN_SCORE;
        }
        score += CAPTURE_SCORE * outcome.captured.len() as i32;
        if outcome.finished {
            score += FINISH_SCORE;
        }
        if before.state == PieceState::Base {
            score += RELEASE_SCORE;
        }
        if let Some(cell) = after.ring_cell() {
            if is_safe_cell(cell) {
                score += SAFE_LANDING_SCORE;
            } else {
                score -= THREAT_PENALTY * threats_to(&outcome.state, after.color, cell) as i32;
            }
        }
        score += after.distance() as i32;
        Some(score)
    }
}

/// Opposing ring pieces within one roll behind `cell`
fn threats_to(state: &GameState, color: Color, cell: u8) -> usize {
    state
        .pieces
        .iter()
        .filter(|p| p.color != color)
        .filter(|p| {
            let (Some(from), PieceState::OnTrack(d)) = (p.ring_cell(), p.state) else {
                return false;
            };
            let gap = (cell as usize + RING_LEN - from as usize) % RING_LEN;
            (1..=DIE_FACES as usize).contains(&gap) && d as usize + gap < HOME_RUN_START as usize
        })
        .count()
}

impl Agent for GreedyAgent {
    fn select_piece(&mut self, state: &GameState, legal: &[PieceId], _rng: &mut impl Rng) -> PieceId {
        assert!(!legal.is_empty(), "No legal pieces available for agent");
        let mut best = legal[0];
        let mut best_score = i32::MIN;
        for &id in legal {
            if let Some(score) = Self::score_move(state, id) {
                if score > best_score {
                    best = id;
                    best_score = score;
                }
            }
        }
        best
    }
}

/// Built-in computer players, selectable by name
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Bot {
    Random,
    Greedy,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown agent `{0}` (expected `random` or `greedy`)")]
pub struct ParseAgentError(String);

impl FromStr for Bot {
    type Err = ParseAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Bot::Random),
            "greedy" => Ok(Bot::Greedy),
            _ => Err(ParseAgentError(s.to_string())),
        }
    }
}

impl fmt::Display for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bot::Random => "random",
            Bot::Greedy => "greedy",
        })
    }
}

impl Agent for Bot {
    fn select_piece(&mut self, state: &GameState, legal: &[PieceId], rng: &mut impl Rng) -> PieceId {
        match self {
            Bot::Random => RandomAgent.select_piece(state, legal, rng),
            Bot::Greedy => GreedyAgent.select_piece(state, legal, rng),
        }
    }
}
