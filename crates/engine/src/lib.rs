//! Ludo Game Engine
//!
//! A four-color Ludo engine. Core object is a single `GameState` (plain data);
//! pure functions take the current state and return the next one, so every
//! rule can be exercised without a UI. Board geometry lives in [`topology`],
//! the timed roll/skip/hand-over flow a front-end needs in [`controller`].

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

pub mod controller;
pub mod topology;

pub use controller::{
    Clock, ControllerConfig, Deferred, Die, GameController, ManualClock, RandomDie, SystemClock,
};
pub use topology::{
    base_coordinate, board_glyphs, is_safe_cell, piece_coordinate, ring_cell, track_coordinate,
    BoardTopology, Cell, Glyph, GlyphGrid, TopologyError, BOARD, GRID_SIZE,
};

// =============================================================================
// Section 1: Basic types and constants
// =============================================================================

/// Stable piece identifier: 0..NUM_PIECES, four consecutive ids per color
pub type PieceId = u8;

pub const NUM_COLORS: usize = 4;
pub const PIECES_PER_COLOR: usize = 4;
pub const NUM_PIECES: usize = NUM_COLORS * PIECES_PER_COLOR;

/// Cells on the shared outer ring
pub const RING_LEN: usize = 52;

/// Cells in each color's private home run
pub const HOME_RUN_LEN: usize = 5;

/// First distance that lies in the home run (0..=50 is the ring)
pub const HOME_RUN_START: u8 = 51;

/// Distance at which a piece reaches the center and is finished
pub const FINISH_DISTANCE: u8 = 56;

pub const DIE_FACES: u8 = 6;

/// Only this roll releases a piece from Base
pub const BASE_RELEASE_ROLL: u8 = 6;

/// Rolling this lets the same color roll again after moving
pub const BONUS_ROLL: u8 = 6;

/// Ring index where each color enters play, indexed by `Color::index()`
pub const ENTRY_OFFSETS: [u8; NUM_COLORS] = [0, 13, 26, 39];

/// Ring indices where no capture can happen (entry cells and stars)
pub const SAFE_CELLS: [u8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];

pub const STARTING_COLOR: Color = Color::Red;

/// Team colors, in turn order
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Color {
    Red = 0,
    Green = 1,
    Yellow = 2,
    Blue = 3,
}

impl Color {
    pub fn from_index(idx: u8) -> Option<Color> {
        match idx {
            0 => Some(Color::Red),
            1 => Some(Color::Green),
            2 => Some(Color::Yellow),
            3 => Some(Color::Blue),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Next color in the fixed turn order red → green → yellow → blue → red
    pub const fn next(self) -> Color {
        match self {
            Color::Red => Color::Green,
            Color::Green => Color::Yellow,
            Color::Yellow => Color::Blue,
            Color::Blue => Color::Red,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
        }
    }

    /// Ids of this color's four pieces
    pub fn piece_ids(self) -> std::ops::Range<PieceId> {
        let first = (self.index() * PIECES_PER_COLOR) as PieceId;
        first..first + PIECES_PER_COLOR as PieceId
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown color {0:?} (expected red, green, yellow or blue)")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_COLORS
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}

pub const ALL_COLORS: [Color; NUM_COLORS] = [Color::Red, Color::Green, Color::Yellow, Color::Blue];

/// Where a piece is
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PieceState {
    /// Waiting in the yard; needs a six to enter
    Base,
    /// Travelled this many steps from the color's entry cell.
    /// 0..=50 on the shared ring, 51..=55 in the home run.
    OnTrack(u8),
    /// Reached the center
    Finished,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Piece {
    pub id: PieceId,
    pub color: Color,
    pub state: PieceState,
}

impl Piece {
    /// Steps travelled: -1 in Base, 56 once Finished
    pub fn distance(&self) -> i8 {
        match self.state {
            PieceState::Base => -1,
            PieceState::OnTrack(d) => d as i8,
            PieceState::Finished => FINISH_DISTANCE as i8,
        }
    }

    /// Absolute ring index while on the shared ring
    pub fn ring_cell(&self) -> Option<u8> {
        match self.state {
            PieceState::OnTrack(d) if d < HOME_RUN_START => Some(ring_cell(self.color, d)),
            _ => None,
        }
    }

    pub fn in_home_run(&self) -> bool {
        matches!(self.state, PieceState::OnTrack(d) if d >= HOME_RUN_START)
    }

    /// Position among the color's four pieces (0..=3)
    pub fn slot(&self) -> usize {
        self.id as usize % PIECES_PER_COLOR
    }
}

/// Where a piece would end up after moving `value` steps, if it may move
fn destination(state: PieceState, value: u8) -> Option<PieceState> {
    match state {
        PieceState::Base if value == BASE_RELEASE_ROLL => Some(PieceState::OnTrack(0)),
        PieceState::OnTrack(d) => match d.checked_add(value)? {
            FINISH_DISTANCE => Some(PieceState::Finished),
            d if d < FINISH_DISTANCE => Some(PieceState::OnTrack(d)),
            _ => None,
        },
        _ => None,
    }
}

/// A piece may leave Base only on a six, and may never overshoot the center
pub fn is_legal_move(piece: &Piece, value: u8) -> bool {
    destination(piece.state, value).is_some()
}

// =============================================================================
// Section 2: Game state
// =============================================================================

/// Rule variations
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Rules {
    /// Forfeit the turn on this many sixes in a row. `None` means unlimited.
    pub max_consecutive_sixes: Option<u8>,
}

impl Rules {
    /// Rule set with an optional six cap; a cap of zero would forfeit every six
    pub fn new(max_consecutive_sixes: Option<u8>) -> Result<Self, RulesError> {
        if max_consecutive_sixes == Some(0) {
            return Err(RulesError::ZeroSixCap);
        }
        Ok(Rules {
            max_consecutive_sixes,
        })
    }
}

#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum RulesError {
    #[error("the consecutive-six cap must be at least 1")]
    ZeroSixCap,
}

/// Turn state machine position, derived from `GameState`
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Current color must roll
    AwaitingRoll,
    /// Die is tumbling; settles into a value
    Rolling,
    /// Roll settled with at least one legal move
    AwaitingMove(u8),
    /// Nothing left to do with this roll; the turn passes next
    TurnEnding(u8),
    /// Terminal
    Won(Color),
}

/// Complete game state
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameState {
    /// Indexed by piece id
    pub pieces: [Piece; NUM_PIECES],
    pub current_turn: Color,
    /// Last settled roll, cleared when the turn passes or a six is used
    pub dice_value: Option<u8>,
    /// `dice_value` has at least one unplayed legal move
    pub can_move: bool,
    pub rolling: bool,
    pub winner: Option<Color>,
    /// Sixes rolled in a row by `current_turn`
    pub consecutive_sixes: u8,
    pub rules: Rules,
}

impl Default for GameState {
    fn default() -> Self {
        new_game(Rules::default())
    }
}

impl GameState {
    pub fn phase(&self) -> Phase {
        if let Some(color) = self.winner {
            return Phase::Won(color);
        }
        if self.rolling {
            return Phase::Rolling;
        }
        match self.dice_value {
            None => Phase::AwaitingRoll,
            Some(value) if self.can_move => Phase::AwaitingMove(value),
            Some(value) => Phase::TurnEnding(value),
        }
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id as usize)
    }

    pub fn pieces_of(&self, color: Color) -> &[Piece] {
        let start = color.index() * PIECES_PER_COLOR;
        &self.pieces[start..start + PIECES_PER_COLOR]
    }

    pub fn finished_count(&self, color: Color) -> usize {
        self.pieces_of(color)
            .iter()
            .filter(|p| p.state == PieceState::Finished)
            .count()
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }
}

// =============================================================================
// Section 3: Outcomes and errors
// =============================================================================

/// Why a roll was refused
#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum RollError {
    #[error("the game is over")]
    GameOver,

    #[error("the die is already rolling")]
    AlreadyRolling,

    #[error("a move is pending for the current roll")]
    MovePending,

    #[error("the turn is being handed over")]
    TurnEnding,

    #[error("the die is not rolling")]
    NotRolling,

    #[error("{0} is not a face of the die")]
    InvalidValue(u8),
}

/// Why a piece selection was refused
#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum MoveError {
    #[error("the game is over")]
    GameOver,

    #[error("no roll is waiting for a move")]
    NoActiveRoll,

    #[error("no piece with id {0}")]
    UnknownPiece(PieceId),

    #[error("piece {piece} belongs to {owner}, not {turn}")]
    NotYourPiece {
        piece: PieceId,
        owner: Color,
        turn: Color,
    },

    #[error("piece {piece} cannot move {value}")]
    IllegalMove { piece: PieceId, value: u8 },
}

/// What happens after a resolved move
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NextStep {
    /// A six was used; the same color rolls again
    RollAgain,
    /// Hand the turn to the next color (`advance_turn`)
    AdvanceTurn,
    Won(Color),
}

/// Result of applying a move
#[derive(Clone, Debug)]
pub struct MoveOutcome {
    pub state: GameState,
    pub moved: PieceId,
    /// Opposing pieces sent back to Base, in id order
    pub captured: Vec<PieceId>,
    /// The moved piece reached the center
    pub finished: bool,
    pub next: NextStep,
}

// =============================================================================
// Section 4: State transitions as pure functions
// =============================================================================

/// Fresh game: all 16 pieces in Base, red to roll
pub fn new_game(rules: Rules) -> GameState {
    GameState {
        pieces: std::array::from_fn(|i| Piece {
            id: i as PieceId,
            color: ALL_COLORS[i / PIECES_PER_COLOR],
            state: PieceState::Base,
        }),
        current_turn: STARTING_COLOR,
        dice_value: None,
        can_move: false,
        rolling: false,
        winner: None,
        consecutive_sixes: 0,
        rules,
    }
}

/// Back to the initial configuration, keeping the rule set
pub fn reset(state: GameState) -> GameState {
    new_game(state.rules)
}

/// Does `color` have any piece that can move `value` steps?
pub fn legal_move_exists(state: &GameState, color: Color, value: u8) -> bool {
    state
        .pieces_of(color)
        .iter()
        .any(|piece| is_legal_move(piece, value))
}

/// Pieces the current color may move with the settled roll
pub fn legal_moves(state: &GameState) -> Vec<PieceId> {
    match state.phase() {
        Phase::AwaitingMove(value) => state
            .pieces_of(state.current_turn)
            .iter()
            .filter(|piece| is_legal_move(piece, value))
            .map(|piece| piece.id)
            .collect(),
        _ => Vec::new(),
    }
}

/// Start rolling the die for the current color
pub fn begin_roll(state: &GameState) -> Result<GameState, RollError> {
    match state.phase() {
        Phase::Won(_) => Err(RollError::GameOver),
        Phase::Rolling => Err(RollError::AlreadyRolling),
        Phase::AwaitingMove(_) => Err(RollError::MovePending),
        Phase::TurnEnding(_) => Err(RollError::TurnEnding),
        Phase::AwaitingRoll => {
            let mut next = state.clone();
            next.rolling = true;
            Ok(next)
        }
    }
}

/// Land the rolling die on `value` and work out whether it can be played.
///
/// A roll with no legal move (or one that hits the six cap) leaves the state in
/// `Phase::TurnEnding`; the caller passes the turn with `advance_turn`.
pub fn settle_roll(state: &GameState, value: u8) -> Result<GameState, RollError> {
    if !(1..=DIE_FACES).contains(&value) {
        return Err(RollError::InvalidValue(value));
    }
    if state.winner.is_some() {
        return Err(RollError::GameOver);
    }
    if !state.rolling {
        return Err(RollError::NotRolling);
    }

    let mut next = state.clone();
    next.rolling = false;
    next.dice_value = Some(value);

    if value == BONUS_ROLL {
        next.consecutive_sixes += 1;
    } else {
        next.consecutive_sixes = 0;
    }

    let forfeit = value == BONUS_ROLL
        && next
            .rules
            .max_consecutive_sixes
            .is_some_and(|cap| next.consecutive_sixes >= cap);

    next.can_move = !forfeit && legal_move_exists(&next, next.current_turn, value);

    if forfeit {
        debug!(color = %next.current_turn, sixes = next.consecutive_sixes, "six cap reached, turn forfeited");
    } else if !next.can_move {
        debug!(color = %next.current_turn, value, "no legal move, turn will be skipped");
    }

    Ok(next)
}

/// Roll and settle in one step with a uniformly random face
pub fn roll_dice(state: &GameState, rng: &mut impl Rng) -> Result<GameState, RollError> {
    let rolling = begin_roll(state)?;
    let value = rng.random_range(1..=DIE_FACES);
    settle_roll(&rolling, value)
}

/// Pass the turn to the next color and clear the die
pub fn advance_turn(mut state: GameState) -> GameState {
    if state.winner.is_some() {
        return state;
    }
    state.dice_value = None;
    state.can_move = false;
    state.rolling = false;
    state.consecutive_sixes = 0;
    state.current_turn = state.current_turn.next();
    state
}

/// Move `piece_id` by the settled roll, resolving captures and victory
pub fn try_apply_move(state: &GameState, piece_id: PieceId) -> Result<MoveOutcome, MoveError> {
    if state.winner.is_some() {
        return Err(MoveError::GameOver);
    }
    let value = match state.phase() {
        Phase::AwaitingMove(value) => value,
        _ => return Err(MoveError::NoActiveRoll),
    };
    let piece = *state
        .piece(piece_id)
        .ok_or(MoveError::UnknownPiece(piece_id))?;
    if piece.color != state.current_turn {
        return Err(MoveError::NotYourPiece {
            piece: piece_id,
            owner: piece.color,
            turn: state.current_turn,
        });
    }
    let dest = destination(piece.state, value).ok_or(MoveError::IllegalMove {
        piece: piece_id,
        value,
    })?;

    let mut next = state.clone();
    let color = piece.color;
    next.pieces[piece_id as usize].state = dest;

    // Captures only happen on the shared ring, never on a safe cell
    let mut captured = Vec::new();
    if let Some(cell) = next.pieces[piece_id as usize].ring_cell() {
        if !is_safe_cell(cell) {
            for other in next.pieces.iter_mut() {
                if other.color != color && other.ring_cell() == Some(cell) {
                    other.state = PieceState::Base;
                    captured.push(other.id);
                }
            }
        }
    }
    if !captured.is_empty() {
        debug!(%color, piece = piece_id, cell = ?next.pieces[piece_id as usize].ring_cell(), ?captured, "capture");
    }

    next.can_move = false;
    let finished = dest == PieceState::Finished;

    let step = if next.finished_count(color) == PIECES_PER_COLOR {
        next.winner = Some(color);
        info!(%color, "game won");
        NextStep::Won(color)
    } else if value == BONUS_ROLL {
        next.dice_value = None;
        NextStep::RollAgain
    } else {
        NextStep::AdvanceTurn
    };

    Ok(MoveOutcome {
        state: next,
        moved: piece_id,
        captured,
        finished,
        next: step,
    })
}

/// Permissive form of `try_apply_move`: an invalid selection leaves the
/// state untouched
pub fn apply_move(state: GameState, piece_id: PieceId) -> GameState {
    match try_apply_move(&state, piece_id) {
        Ok(outcome) => outcome.state,
        Err(error) => {
            debug!(%error, piece = piece_id, "ignoring piece selection");
            state
        }
    }
}

// =============================================================================
// Debug assertions for invariants
// =============================================================================

#[cfg(debug_assertions)]
pub fn assert_piece_invariants(state: &GameState) {
    for (i, piece) in state.pieces.iter().enumerate() {
        assert_eq!(piece.id as usize, i, "piece id out of place");
        assert_eq!(
            Some(piece.color),
            Color::from_index((i / PIECES_PER_COLOR) as u8),
            "piece {i} has the wrong color"
        );
        match piece.state {
            PieceState::Base => assert_eq!(piece.distance(), -1),
            PieceState::OnTrack(d) => assert!(d < FINISH_DISTANCE, "piece {i} on track at {d}"),
            PieceState::Finished => assert_eq!(piece.distance(), FINISH_DISTANCE as i8),
        }
    }

    let complete: Vec<Color> = ALL_COLORS
        .into_iter()
        .filter(|&c| state.finished_count(c) == PIECES_PER_COLOR)
        .collect();
    match state.winner {
        Some(color) => assert_eq!(complete, vec![color], "winner does not match finished pieces"),
        None => assert!(complete.is_empty(), "{complete:?} finished without a winner"),
    }

    if let Some(value) = state.dice_value {
        assert!((1..=DIE_FACES).contains(&value), "die shows {value}");
    }
    if state.can_move {
        assert!(state.dice_value.is_some() && !state.rolling);
    }
    if state.rolling {
        assert!(state.dice_value.is_none(), "rolling with a settled value");
    }
}
