//! Board topology for a 15x15 Ludo board.
//!
//! The 52-cell ring, the four home runs and the base yards are authored once
//! for red as straight segments and rotated a quarter turn per color. The
//! resulting tables are validated when they are built.

use std::collections::HashSet;
use std::sync::LazyLock;

use thiserror::Error;

use crate::{
    Color, GameState, Piece, PieceState, ALL_COLORS, ENTRY_OFFSETS, FINISH_DISTANCE, HOME_RUN_LEN,
    HOME_RUN_START, NUM_COLORS, PIECES_PER_COLOR, RING_LEN, SAFE_CELLS,
};

pub const GRID_SIZE: usize = 15;

/// Width of a base yard (the 6x6 corner squares)
pub const YARD_SIZE: u8 = 6;

/// A square on the board grid. Row 0 is the top edge, col 0 the left edge.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    pub const fn new(row: u8, col: u8) -> Self {
        Cell { row, col }
    }

    /// Rotate a quarter turn clockwise about the center of the board
    pub const fn rotate_cw(self) -> Self {
        Cell {
            row: self.col,
            col: GRID_SIZE as u8 - 1 - self.row,
        }
    }

    fn rotated(self, quarter_turns: usize) -> Self {
        (0..quarter_turns).fold(self, |cell, _| cell.rotate_cw())
    }

    pub fn is_adjacent(self, other: Cell) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// One step along the ring: orthogonally adjacent, or diagonal where the
    /// path turns round a corner of the center square
    pub fn is_ring_step(self, other: Cell) -> bool {
        let diagonal = self.row.abs_diff(other.row) == 1 && self.col.abs_diff(other.col) == 1;
        self.is_adjacent(other)
            || (diagonal
                && (Cell::new(self.row, other.col).in_center()
                    || Cell::new(other.row, self.col).in_center()))
    }

    /// Inside the 3x3 finishing square
    pub fn in_center(self) -> bool {
        (6..=8).contains(&self.row) && (6..=8).contains(&self.col)
    }
}

pub const CENTER: Cell = Cell::new(7, 7);

/// Straight run of `len` cells starting at `start`
struct Segment {
    start: Cell,
    step: (i8, i8),
    len: u8,
}

/// Red's quarter of the ring, from its entry cell up to green's entry
const RED_QUARTER: [Segment; 3] = [
    Segment {
        start: Cell::new(6, 1),
        step: (0, 1),
        len: 5,
    },
    Segment {
        start: Cell::new(5, 6),
        step: (-1, 0),
        len: 6,
    },
    Segment {
        start: Cell::new(0, 7),
        step: (0, 1),
        len: 2,
    },
];

const RED_HOME_RUN: [Segment; 1] = [Segment {
    start: Cell::new(7, 1),
    step: (0, 1),
    len: HOME_RUN_LEN as u8,
}];

const RED_YARD: [Cell; PIECES_PER_COLOR] = [
    Cell::new(1, 1),
    Cell::new(1, 4),
    Cell::new(4, 1),
    Cell::new(4, 4),
];

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TopologyError {
    #[error("ring has {len} cells, expected {expected}")]
    RingLength { len: usize, expected: usize },

    #[error("home run for {color} has {len} cells, expected {expected}")]
    HomeRunLength {
        color: Color,
        len: usize,
        expected: usize,
    },

    #[error("expected one home run per color, got {0}")]
    HomeRunCount(usize),

    #[error("cell ({row}, {col}) is outside the board")]
    OffGrid { row: i16, col: i16 },

    #[error("cell {0:?} is used more than once")]
    DuplicateCell(Cell),

    #[error("ring cells {0} and {1} are not one step apart")]
    BrokenRing(usize, usize),

    #[error("home run for {0} does not connect its ring exit to the center")]
    DetachedHomeRun(Color),

    #[error("cell {0:?} overlaps the center square")]
    CenterOverlap(Cell),
}

/// The cell one step past `to`, continuing the direction `from -> to`
fn step_beyond(from: Cell, to: Cell) -> Option<Cell> {
    let row = 2 * to.row as i16 - from.row as i16;
    let col = 2 * to.col as i16 - from.col as i16;
    let on_grid = |v: i16| (0..GRID_SIZE as i16).contains(&v);
    (on_grid(row) && on_grid(col)).then(|| Cell::new(row as u8, col as u8))
}

fn expand(segments: &[Segment]) -> Result<Vec<Cell>, TopologyError> {
    let mut cells = Vec::new();
    for segment in segments {
        for i in 0..segment.len as i16 {
            let row = segment.start.row as i16 + segment.step.0 as i16 * i;
            let col = segment.start.col as i16 + segment.step.1 as i16 * i;
            if !(0..GRID_SIZE as i16).contains(&row) || !(0..GRID_SIZE as i16).contains(&col) {
                return Err(TopologyError::OffGrid { row, col });
            }
            cells.push(Cell::new(row as u8, col as u8));
        }
    }
    Ok(cells)
}

/// Validated board geometry
#[derive(Clone, Debug)]
pub struct BoardTopology {
    ring: [Cell; RING_LEN],
    home_runs: [[Cell; HOME_RUN_LEN]; NUM_COLORS],
    yards: [[Cell; PIECES_PER_COLOR]; NUM_COLORS],
    center: Cell,
}

impl BoardTopology {
    /// The classic cross-shaped board
    pub fn standard() -> Result<Self, TopologyError> {
        let red_quarter = expand(&RED_QUARTER)?;
        let red_home_run = expand(&RED_HOME_RUN)?;

        let mut ring = Vec::with_capacity(RING_LEN);
        for turns in 0..NUM_COLORS {
            ring.extend(red_quarter.iter().map(|cell| cell.rotated(turns)));
        }

        let home_runs = (0..NUM_COLORS)
            .map(|turns| red_home_run.iter().map(|cell| cell.rotated(turns)).collect())
            .collect();

        let yards = std::array::from_fn(|turns| RED_YARD.map(|cell| cell.rotated(turns)));

        Self::from_parts(ring, home_runs, yards, CENTER)
    }

    /// Build a topology from explicit tables, checking every structural rule.
    ///
    /// `home_runs` is indexed by `Color::index()`.
    pub fn from_parts(
        ring: Vec<Cell>,
        home_runs: Vec<Vec<Cell>>,
        yards: [[Cell; PIECES_PER_COLOR]; NUM_COLORS],
        center: Cell,
    ) -> Result<Self, TopologyError> {
        let ring: [Cell; RING_LEN] =
            ring.try_into()
                .map_err(|ring: Vec<Cell>| TopologyError::RingLength {
                    len: ring.len(),
                    expected: RING_LEN,
                })?;

        if home_runs.len() != NUM_COLORS {
            return Err(TopologyError::HomeRunCount(home_runs.len()));
        }

        let mut runs = [[Cell::default(); HOME_RUN_LEN]; NUM_COLORS];
        for (color, run) in ALL_COLORS.into_iter().zip(home_runs) {
            runs[color.index()] =
                run.try_into()
                    .map_err(|run: Vec<Cell>| TopologyError::HomeRunLength {
                        color,
                        len: run.len(),
                        expected: HOME_RUN_LEN,
                    })?;
        }

        let all_cells = ring
            .iter()
            .chain(runs.iter().flatten())
            .chain(yards.iter().flatten())
            .chain(std::iter::once(&center));
        let mut seen = HashSet::new();
        for &cell in all_cells {
            if cell.row as usize >= GRID_SIZE || cell.col as usize >= GRID_SIZE {
                return Err(TopologyError::OffGrid {
                    row: cell.row as i16,
                    col: cell.col as i16,
                });
            }
            if !seen.insert(cell) {
                return Err(TopologyError::DuplicateCell(cell));
            }
        }

        for (i, cell) in ring.iter().enumerate() {
            if cell.in_center() {
                return Err(TopologyError::CenterOverlap(*cell));
            }
            let next = (i + 1) % RING_LEN;
            if !cell.is_ring_step(ring[next]) {
                return Err(TopologyError::BrokenRing(i, next));
            }
        }

        for color in ALL_COLORS {
            let run = &runs[color.index()];
            let exit = ring[ring_cell(color, HOME_RUN_START - 1) as usize];
            let last = run[HOME_RUN_LEN - 1];
            let connected = exit.is_adjacent(run[0])
                && run.windows(2).all(|w| w[0].is_adjacent(w[1]))
                && run.iter().all(|cell| !cell.in_center())
                && step_beyond(run[HOME_RUN_LEN - 2], last).is_some_and(Cell::in_center);
            if !connected {
                return Err(TopologyError::DetachedHomeRun(color));
            }
        }

        if !center.in_center() {
            return Err(TopologyError::CenterOverlap(center));
        }

        Ok(BoardTopology {
            ring,
            home_runs: runs,
            yards,
            center,
        })
    }

    pub fn ring(&self) -> &[Cell; RING_LEN] {
        &self.ring
    }

    pub fn home_run(&self, color: Color) -> &[Cell; HOME_RUN_LEN] {
        &self.home_runs[color.index()]
    }

    pub fn yard(&self, color: Color) -> &[Cell; PIECES_PER_COLOR] {
        &self.yards[color.index()]
    }

    pub fn center(&self) -> Cell {
        self.center
    }

    /// Grid cell for a piece of `color` that has travelled `distance` steps.
    ///
    /// 0..=50 is the shared ring, 51..=55 the color's home run and 56 the
    /// center. Anything larger has no cell.
    pub fn track_coordinate(&self, color: Color, distance: u8) -> Option<Cell> {
        match distance {
            d if d < HOME_RUN_START => Some(self.ring[ring_cell(color, d) as usize]),
            d if d < FINISH_DISTANCE => {
                Some(self.home_runs[color.index()][(d - HOME_RUN_START) as usize])
            }
            FINISH_DISTANCE => Some(self.center),
            _ => None,
        }
    }

    pub fn base_coordinate(&self, color: Color, slot: usize) -> Cell {
        self.yards[color.index()][slot % PIECES_PER_COLOR]
    }

    pub fn piece_coordinate(&self, piece: &Piece) -> Cell {
        match piece.state {
            PieceState::Base => self.base_coordinate(piece.color, piece.slot()),
            PieceState::OnTrack(d) => self
                .track_coordinate(piece.color, d)
                .unwrap_or(self.center),
            PieceState::Finished => self.center,
        }
    }

    /// Color owning the yard square that contains `cell`, if any
    pub fn yard_owner(&self, cell: Cell) -> Option<Color> {
        ALL_COLORS.into_iter().find(|&color| {
            // the yard is the 6x6 corner the color's slots sit in
            let corner = Cell::new(0, 0).rotated(color.index());
            let near = |a: u8, b: u8| a.abs_diff(b) < YARD_SIZE;
            near(cell.row, corner.row) && near(cell.col, corner.col)
        })
    }
}

/// Absolute ring index of a piece of `color` at ring `distance` (0..=50)
pub fn ring_cell(color: Color, distance: u8) -> u8 {
    ((ENTRY_OFFSETS[color.index()] as usize + distance as usize) % RING_LEN) as u8
}

pub fn is_safe_cell(ring_index: u8) -> bool {
    SAFE_CELLS.contains(&ring_index)
}

/// Shared standard board. Panics on first use if the tables are malformed.
pub static BOARD: LazyLock<BoardTopology> =
    LazyLock::new(|| BoardTopology::standard().expect("standard board tables are malformed"));

pub fn track_coordinate(color: Color, distance: u8) -> Option<Cell> {
    BOARD.track_coordinate(color, distance)
}

pub fn base_coordinate(color: Color, slot: usize) -> Cell {
    BOARD.base_coordinate(color, slot)
}

pub fn piece_coordinate(piece: &Piece) -> Cell {
    BOARD.piece_coordinate(piece)
}

// =============================================================================
// Board glyphs for renderers
// =============================================================================

/// What occupies one grid square, for text and terminal renderers
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Glyph {
    Blank,
    Yard(Color),
    Ring { safe: bool, entry: Option<Color> },
    HomeRun(Color),
    Center,
    Pieces { color: Color, count: u8 },
}

pub type GlyphGrid = [[Glyph; GRID_SIZE]; GRID_SIZE];

/// Lay the board and the current pieces out on the grid
pub fn board_glyphs(state: &GameState) -> GlyphGrid {
    let board = &*BOARD;
    let mut grid = [[Glyph::Blank; GRID_SIZE]; GRID_SIZE];

    for (r, row) in grid.iter_mut().enumerate() {
        for (c, glyph) in row.iter_mut().enumerate() {
            let cell = Cell::new(r as u8, c as u8);
            if let Some(color) = board.yard_owner(cell) {
                *glyph = Glyph::Yard(color);
            } else if cell.in_center() {
                *glyph = Glyph::Center;
            }
        }
    }

    for (i, cell) in board.ring.iter().enumerate() {
        let entry = ALL_COLORS
            .into_iter()
            .find(|&color| ENTRY_OFFSETS[color.index()] as usize == i);
        grid[cell.row as usize][cell.col as usize] = Glyph::Ring {
            safe: is_safe_cell(i as u8),
            entry,
        };
    }

    for color in ALL_COLORS {
        for cell in board.home_run(color) {
            grid[cell.row as usize][cell.col as usize] = Glyph::HomeRun(color);
        }
    }

    for piece in &state.pieces {
        let cell = board.piece_coordinate(piece);
        let glyph = &mut grid[cell.row as usize][cell.col as usize];
        *glyph = match *glyph {
            Glyph::Pieces { color, count } => Glyph::Pieces {
                color,
                count: count + 1,
            },
            _ => Glyph::Pieces {
                color: piece.color,
                count: 1,
            },
        };
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_board_is_valid() {
        let board = BoardTopology::standard().unwrap();
        assert_eq!(board.ring().len(), RING_LEN);
        for color in ALL_COLORS {
            assert_eq!(board.home_run(color).len(), HOME_RUN_LEN);
        }
    }

    #[test]
    fn test_ring_turns_diagonally_round_the_center() {
        let board = BoardTopology::standard().unwrap();
        for color in ALL_COLORS {
            let start = ENTRY_OFFSETS[color.index()] as usize;
            let before = board.ring()[start + 4];
            let after = board.ring()[start + 5];
            assert!(!before.is_adjacent(after));
            assert!(before.is_ring_step(after), "{color} corner {before:?} -> {after:?}");
        }
        assert_eq!(board.ring()[4], Cell::new(6, 5));
        assert_eq!(board.ring()[5], Cell::new(5, 6));

        assert!(Cell::new(6, 1).is_ring_step(Cell::new(6, 2)));
        assert!(!Cell::new(6, 2).is_ring_step(Cell::new(5, 3)));
        assert!(!Cell::new(6, 5).is_ring_step(Cell::new(4, 6)));
    }

    #[test]
    fn test_entry_cells() {
        assert_eq!(track_coordinate(Color::Red, 0), Some(Cell::new(6, 1)));
        assert_eq!(track_coordinate(Color::Green, 0), Some(Cell::new(1, 8)));
        assert_eq!(track_coordinate(Color::Yellow, 0), Some(Cell::new(8, 13)));
        assert_eq!(track_coordinate(Color::Blue, 0), Some(Cell::new(13, 6)));

        let board = BoardTopology::standard().unwrap();
        for color in ALL_COLORS {
            let entry = board.ring()[ENTRY_OFFSETS[color.index()] as usize];
            assert_eq!(board.track_coordinate(color, 0), Some(entry));
        }
    }

    #[test]
    fn test_ring_wraps_per_color() {
        // green at distance 39 is back on red's entry cell
        assert_eq!(ring_cell(Color::Green, 39), 0);
        assert_eq!(
            track_coordinate(Color::Green, 39),
            track_coordinate(Color::Red, 0)
        );
        assert_eq!(ring_cell(Color::Blue, 13), 0);
        assert_eq!(ring_cell(Color::Red, 50), 50);
    }

    #[test]
    fn test_home_run_and_center() {
        assert_eq!(track_coordinate(Color::Red, 50), Some(Cell::new(7, 0)));
        assert_eq!(track_coordinate(Color::Red, 51), Some(Cell::new(7, 1)));
        assert_eq!(track_coordinate(Color::Red, 55), Some(Cell::new(7, 5)));
        assert_eq!(track_coordinate(Color::Green, 51), Some(Cell::new(1, 7)));
        assert_eq!(track_coordinate(Color::Yellow, 51), Some(Cell::new(7, 13)));
        assert_eq!(track_coordinate(Color::Blue, 55), Some(Cell::new(9, 7)));

        for color in ALL_COLORS {
            assert_eq!(track_coordinate(color, FINISH_DISTANCE), Some(CENTER));
            assert_eq!(track_coordinate(color, FINISH_DISTANCE + 1), None);
        }
    }

    #[test]
    fn test_track_coordinate_total_and_deterministic() {
        for color in ALL_COLORS {
            for d in 0..=FINISH_DISTANCE {
                let a = track_coordinate(color, d);
                assert!(a.is_some(), "{color} at {d} has no cell");
                assert_eq!(a, track_coordinate(color, d));
            }
        }
    }

    #[test]
    fn test_safe_cells_are_stars_and_entries() {
        assert!(is_safe_cell(0));
        assert!(is_safe_cell(8));
        assert!(!is_safe_cell(48));
        assert_eq!(BOARD.ring()[8], Cell::new(2, 6));
        assert_eq!(BOARD.ring()[21], Cell::new(6, 12));
        assert_eq!(BOARD.ring()[34], Cell::new(12, 8));
        assert_eq!(BOARD.ring()[47], Cell::new(8, 2));
    }

    #[test]
    fn test_short_ring_rejected() {
        let board = BoardTopology::standard().unwrap();
        let mut ring = board.ring().to_vec();
        ring.pop();
        let runs = ALL_COLORS
            .iter()
            .map(|&c| board.home_run(c).to_vec())
            .collect();
        let yards = std::array::from_fn(|i| *board.yard(ALL_COLORS[i]));

        let err = BoardTopology::from_parts(ring, runs, yards, CENTER).unwrap_err();
        assert_eq!(
            err,
            TopologyError::RingLength {
                len: 51,
                expected: RING_LEN
            }
        );
    }

    #[test]
    fn test_broken_ring_rejected() {
        let board = BoardTopology::standard().unwrap();
        let mut ring = board.ring().to_vec();
        ring.swap(3, 4);
        let runs = ALL_COLORS
            .iter()
            .map(|&c| board.home_run(c).to_vec())
            .collect();
        let yards = std::array::from_fn(|i| *board.yard(ALL_COLORS[i]));

        let err = BoardTopology::from_parts(ring, runs, yards, CENTER).unwrap_err();
        assert!(matches!(err, TopologyError::BrokenRing(2, 3)));
    }

    #[test]
    fn test_long_home_run_rejected() {
        let board = BoardTopology::standard().unwrap();
        let mut runs: Vec<Vec<Cell>> = ALL_COLORS
            .iter()
            .map(|&c| board.home_run(c).to_vec())
            .collect();
        runs[1].push(Cell::new(6, 7));
        let yards = std::array::from_fn(|i| *board.yard(ALL_COLORS[i]));

        let err =
            BoardTopology::from_parts(board.ring().to_vec(), runs, yards, CENTER).unwrap_err();
        assert_eq!(
            err,
            TopologyError::HomeRunLength {
                color: Color::Green,
                len: 6,
                expected: HOME_RUN_LEN
            }
        );
    }

    #[test]
    fn test_swapped_home_runs_rejected() {
        let board = BoardTopology::standard().unwrap();
        let mut runs: Vec<Vec<Cell>> = ALL_COLORS
            .iter()
            .map(|&c| board.home_run(c).to_vec())
            .collect();
        runs.swap(0, 2);
        let yards = std::array::from_fn(|i| *board.yard(ALL_COLORS[i]));

        let err =
            BoardTopology::from_parts(board.ring().to_vec(), runs, yards, CENTER).unwrap_err();
        assert_eq!(err, TopologyError::DetachedHomeRun(Color::Red));
    }

    #[test]
    fn test_yards_sit_in_their_corners() {
        for color in ALL_COLORS {
            for slot in 0..PIECES_PER_COLOR {
                let cell = base_coordinate(color, slot);
                assert_eq!(BOARD.yard_owner(cell), Some(color));
            }
        }
        assert_eq!(BOARD.yard_owner(Cell::new(7, 7)), None);
        assert_eq!(BOARD.yard_owner(Cell::new(6, 1)), None);
    }

    #[test]
    fn test_glyphs_for_fresh_game() {
        let state = GameState::default();
        let grid = board_glyphs(&state);

        assert_eq!(
            grid[6][1],
            Glyph::Ring {
                safe: true,
                entry: Some(Color::Red)
            }
        );
        assert_eq!(grid[7][3], Glyph::HomeRun(Color::Red));
        assert_eq!(grid[7][7], Glyph::Center);
        assert_eq!(
            grid[1][1],
            Glyph::Pieces {
                color: Color::Red,
                count: 1
            }
        );
        assert_eq!(grid[0][0], Glyph::Yard(Color::Red));
        assert_eq!(grid[14][0], Glyph::Yard(Color::Blue));

        let pieces: u8 = grid
            .iter()
            .flatten()
            .map(|g| match g {
                Glyph::Pieces { count, .. } => *count,
                _ => 0,
            })
            .sum();
        assert_eq!(pieces as usize, crate::NUM_PIECES);
    }
}
