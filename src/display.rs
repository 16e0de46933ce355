//! Shared display utilities for rendering Ludo game state in the terminal
//!
//! Provides colorized, human-readable output for the board, pieces and moves.

use std::fmt::Write as _;

use ludo_engine::{board_glyphs, Color, GameState, Glyph, Phase, Piece, PieceState, GRID_SIZE};

// ANSI color codes
pub const RED: &str = "\x1b[91m";
pub const GREEN: &str = "\x1b[92m";
pub const YELLOW: &str = "\x1b[93m";
pub const BLUE: &str = "\x1b[94m";
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub fn color_code(color: Color) -> &'static str {
    match color {
        Color::Red => RED,
        Color::Green => GREEN,
        Color::Yellow => YELLOW,
        Color::Blue => BLUE,
    }
}

pub fn color_char(color: Color) -> char {
    match color {
        Color::Red => 'R',
        Color::Green => 'G',
        Color::Yellow => 'Y',
        Color::Blue => 'B',
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::Red => "Red",
        Color::Green => "Green",
        Color::Yellow => "Yellow",
        Color::Blue => "Blue",
    }
}

pub fn colored(color: Color, text: &str) -> String {
    format!("{}{}{}", color_code(color), text, RESET)
}

/// Two-column cell for one glyph
fn glyph_cell(glyph: Glyph) -> String {
    match glyph {
        Glyph::Blank => "  ".to_string(),
        Glyph::Yard(color) => colored(color, "░░"),
        Glyph::Ring { entry: Some(color), .. } => colored(color, "▶ "),
        Glyph::Ring { safe: true, .. } => format!("{BOLD}* {RESET}"),
        Glyph::Ring { safe: false, .. } => format!("{DIM}. {RESET}"),
        Glyph::HomeRun(color) => colored(color, "= "),
        Glyph::Center => format!("{BOLD}##{RESET}"),
        Glyph::Pieces { color, count } => {
            let count = if count > 1 { count.to_string() } else { " ".to_string() };
            format!("{BOLD}{}{RESET}", colored(color, &format!("{}{}", color_char(color), count)))
        }
    }
}

/// Render the board as ANSI text, one line per grid row
pub fn render_board(state: &GameState) -> String {
    let grid = board_glyphs(state);
    let mut out = String::with_capacity(GRID_SIZE * GRID_SIZE * 12);
    for row in grid.iter() {
        out.push_str("  ");
        for &glyph in row.iter() {
            out.push_str(&glyph_cell(glyph));
        }
        out.push('\n');
    }
    out
}

/// One-line summary of whose turn it is and what the die shows
pub fn format_status(state: &GameState, flicker: Option<u8>) -> String {
    let turn = colored(state.current_turn, color_name(state.current_turn));
    match state.phase() {
        Phase::Won(color) => format!("{BOLD}{} wins!{RESET}", colored(color, color_name(color))),
        Phase::AwaitingRoll => format!("{turn} to roll"),
        Phase::Rolling => format!("{turn} rolling... {}", flicker.map_or("-".to_string(), |v| v.to_string())),
        Phase::AwaitingMove(value) => format!("{turn} rolled {BOLD}{value}{RESET}, choose a piece"),
        Phase::TurnEnding(value) => format!("{turn} rolled {BOLD}{value}{RESET}, turn passes"),
    }
}

/// Piece label such as `R2 track 14`
pub fn format_piece(piece: &Piece) -> String {
    let label = format!("{}{}", color_char(piece.color), piece.slot() + 1);
    let label = colored(piece.color, &label);
    match piece.state {
        PieceState::Base => format!("{label} base"),
        PieceState::OnTrack(d) if piece.in_home_run() => format!("{label} home run {d}"),
        PieceState::OnTrack(d) => format!("{label} track {d}"),
        PieceState::Finished => format!("{label} finished"),
    }
}

/// Display the board with a status line and per-color progress
pub fn display_board(state: &GameState, flicker: Option<u8>) {
    let mut out = String::new();
    let _ = writeln!(&mut out, "\n{BOLD}══════════════════════════════════{RESET}");
    let _ = writeln!(&mut out, "  {}", format_status(state, flicker));
    let _ = writeln!(&mut out, "{BOLD}══════════════════════════════════{RESET}");
    out.push_str(&render_board(state));

    for color in ludo_engine::ALL_COLORS {
        let marker = if color == state.current_turn { ">" } else { " " };
        let _ = write!(&mut out, "{marker} {:<7}", color_name(color));
        for piece in state.pieces_of(color) {
            let _ = write!(&mut out, " {:>6}", piece.distance());
        }
        let _ = writeln!(&mut out, "   finished {}/4", state.finished_count(color));
    }
    println!("{out}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludo_engine::{new_game, Rules};

    #[test]
    fn test_render_board_has_grid_rows() {
        let state = new_game(Rules::default());
        let text = render_board(&state);
        assert_eq!(text.lines().count(), GRID_SIZE);
        assert!(text.contains("R "));
        assert!(text.contains("##"));
    }

    #[test]
    fn test_format_piece() {
        let mut state = new_game(Rules::default());
        state.pieces[5].state = PieceState::OnTrack(52);
        let text = format_piece(&state.pieces[5]);
        assert!(text.contains("G2"));
        assert!(text.ends_with("home run 52"));
        assert!(format_piece(&state.pieces[0]).ends_with("base"));
    }

    #[test]
    fn test_status_reports_winner() {
        let mut state = new_game(Rules::default());
        state.winner = Some(Color::Yellow);
        assert!(format_status(&state, None).contains("Yellow"));
        assert!(format_status(&state, None).contains("wins"));
    }
}
