use std::cell::Cell as StdCell;
use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use ludo_engine::{
    board_glyphs, piece_coordinate, Clock, Color, ControllerConfig, GameController, GameState,
    Glyph, Piece, PieceState, RandomDie, Rules,
};

/// Milliseconds from `Date.now()`, clamped so it never runs backwards
pub struct JsClock {
    origin: f64,
    last: StdCell<f64>,
}

impl JsClock {
    pub fn new() -> Self {
        Self {
            origin: js_sys::Date::now(),
            last: StdCell::new(0.0),
        }
    }
}

impl Default for JsClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for JsClock {
    fn now(&self) -> Duration {
        let elapsed = (js_sys::Date::now() - self.origin).max(self.last.get());
        self.last.set(elapsed);
        Duration::from_secs_f64(elapsed / 1000.0)
    }
}

fn color_char(color: Color) -> char {
    match color {
        Color::Red => 'R',
        Color::Green => 'G',
        Color::Yellow => 'Y',
        Color::Blue => 'B',
    }
}

fn color_slug(color: Color) -> &'static str {
    match color {
        Color::Red => "red",
        Color::Green => "emerald",
        Color::Yellow => "yellow",
        Color::Blue => "blue",
    }
}

fn state_label(piece: &Piece) -> &'static str {
    match piece.state {
        PieceState::Base => "base",
        PieceState::OnTrack(_) if piece.in_home_run() => "home",
        PieceState::OnTrack(_) => "track",
        PieceState::Finished => "finished",
    }
}

fn glyph_text(glyph: Glyph) -> [char; 2] {
    match glyph {
        Glyph::Blank => [' ', ' '],
        Glyph::Yard(color) => [color_char(color).to_ascii_lowercase(), ' '],
        Glyph::Ring { entry: Some(_), .. } => ['>', ' '],
        Glyph::Ring { safe: true, .. } => ['*', ' '],
        Glyph::Ring { safe: false, .. } => ['.', ' '],
        Glyph::HomeRun(_) => ['=', ' '],
        Glyph::Center => ['#', '#'],
        Glyph::Pieces { color, count } => {
            let count = if count > 1 {
                char::from_digit(count as u32, 10).unwrap_or('+')
            } else {
                ' '
            };
            [color_char(color), count]
        }
    }
}

fn render_state_text(state: &GameState) -> String {
    let mut out = String::new();
    for row in board_glyphs(state).iter() {
        for &glyph in row.iter() {
            out.extend(glyph_text(glyph));
        }
        let _ = writeln!(&mut out);
    }

    let _ = writeln!(&mut out);
    match (state.winner, state.dice_value) {
        (Some(color), _) => {
            let _ = writeln!(&mut out, "{color} wins");
        }
        (None, Some(value)) => {
            let _ = writeln!(&mut out, "{} rolled {}", state.current_turn, value);
        }
        (None, None) => {
            let _ = writeln!(&mut out, "{} to roll", state.current_turn);
        }
    }
    out
}

#[derive(Serialize)]
struct PieceView {
    id: u8,
    color: String,
    state: String,
    distance: i8,
    row: u8,
    col: u8,
}

#[derive(Serialize)]
struct GameView {
    current_turn: String,
    dice_value: Option<u8>,
    flicker_value: Option<u8>,
    can_move: bool,
    rolling: bool,
    winner: Option<String>,
    legal_piece_ids: Vec<u8>,
    pieces: Vec<PieceView>,
}

fn piece_views(state: &GameState) -> Vec<PieceView> {
    state
        .pieces
        .iter()
        .map(|piece| {
            let cell = piece_coordinate(piece);
            PieceView {
                id: piece.id,
                color: color_slug(piece.color).to_string(),
                state: state_label(piece).to_string(),
                distance: piece.distance(),
                row: cell.row,
                col: cell.col,
            }
        })
        .collect()
}

#[wasm_bindgen]
pub struct LudoHandle {
    controller: GameController<JsClock>,
}

#[wasm_bindgen]
pub fn new_game(seed: u64) -> LudoHandle {
    LudoHandle {
        controller: GameController::new(
            Rules::default(),
            ControllerConfig::default(),
            JsClock::new(),
            RandomDie::seeded(seed),
        ),
    }
}

#[wasm_bindgen]
impl LudoHandle {
    /// Start the roll animation; false if a roll is not allowed now
    #[wasm_bindgen]
    pub fn roll(&mut self) -> bool {
        self.controller.roll()
    }

    /// Move a piece with the settled roll; false if the selection was ignored
    #[wasm_bindgen]
    pub fn select_piece(&mut self, id: u8) -> bool {
        self.controller.select_piece(id).is_some()
    }

    /// Call from the frame loop; true when the board changed
    #[wasm_bindgen]
    pub fn tick(&mut self) -> bool {
        self.controller.tick()
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.controller.reset();
    }

    #[wasm_bindgen]
    pub fn current_turn(&self) -> String {
        color_slug(self.controller.state().current_turn).to_string()
    }

    #[wasm_bindgen]
    pub fn dice_value(&self) -> Option<u8> {
        self.controller.state().dice_value
    }

    #[wasm_bindgen]
    pub fn flicker_value(&self) -> Option<u8> {
        self.controller.flicker_value()
    }

    #[wasm_bindgen]
    pub fn can_move(&self) -> bool {
        self.controller.state().can_move
    }

    #[wasm_bindgen]
    pub fn winner(&self) -> Option<String> {
        self.controller.state().winner.map(|c| color_slug(c).to_string())
    }

    #[wasm_bindgen]
    pub fn is_rolling(&self) -> bool {
        self.controller.state().rolling
    }

    /// Milliseconds until the next deferred transition, if one is pending
    #[wasm_bindgen]
    pub fn ms_until_next_deadline(&self) -> Option<f64> {
        let left = self.controller.time_until_deadline()?;
        Some(left.as_secs_f64() * 1000.0)
    }

    #[wasm_bindgen]
    pub fn legal_piece_ids(&self) -> Vec<u8> {
        self.controller.legal_moves()
    }

    #[wasm_bindgen]
    pub fn render_text(&self) -> String {
        render_state_text(self.controller.state())
    }

    #[wasm_bindgen]
    pub fn state_view(&self) -> Result<JsValue, JsValue> {
        let state = self.controller.state();
        let view = GameView {
            current_turn: color_slug(state.current_turn).to_string(),
            dice_value: state.dice_value,
            flicker_value: self.controller.flicker_value(),
            can_move: state.can_move,
            rolling: state.rolling,
            winner: state.winner.map(|c| color_slug(c).to_string()),
            legal_piece_ids: self.controller.legal_moves(),
            pieces: piece_views(state),
        };

        serde_wasm_bindgen::to_value(&view)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize state: {e}")))
    }
}
