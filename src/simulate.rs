//! Un-animated games between computer players

use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use ludo_engine::{
    advance_turn, legal_moves, new_game, roll_dice, try_apply_move, Color, MoveError, NextStep,
    RollError, Rules, NUM_COLORS,
};

use crate::agent::Agent;

/// How a finished (or abandoned) game went
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct GameRecord {
    /// `None` if the turn limit ran out first
    pub winner: Option<Color>,
    /// Turn hand-overs
    pub turns: u32,
    pub rolls: u32,
    pub captures: u32,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PlayError {
    #[error("roll refused: {0}")]
    Roll(#[from] RollError),

    #[error("agent chose an unplayable piece: {0}")]
    Move(#[from] MoveError),
}

/// Play one game to a winner or until `max_turns` hand-overs have happened.
/// `agents` is indexed by color.
pub fn play_game<A: Agent>(
    agents: &mut [A; NUM_COLORS],
    rules: Rules,
    max_turns: u32,
    rng: &mut impl Rng,
) -> Result<GameRecord, PlayError> {
    let mut record = GameRecord::default();
    let mut state = new_game(rules);

    while !state.is_over() && record.turns < max_turns {
        state = roll_dice(&state, rng)?;
        record.rolls += 1;

        if !state.can_move {
            trace!(color = %state.current_turn, dice = ?state.dice_value, "no legal move");
            state = advance_turn(state);
            record.turns += 1;
            continue;
        }

        let legal = legal_moves(&state);
        let id = agents[state.current_turn.index()].select_piece(&state, &legal, rng);
        let outcome = try_apply_move(&state, id)?;
        record.captures += outcome.captured.len() as u32;

        state = match outcome.next {
            NextStep::AdvanceTurn => {
                record.turns += 1;
                advance_turn(outcome.state)
            }
            NextStep::RollAgain | NextStep::Won(_) => outcome.state,
        };
    }

    record.winner = state.winner;
    debug!(winner = ?record.winner, turns = record.turns, rolls = record.rolls, "game over");
    Ok(record)
}
