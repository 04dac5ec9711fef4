use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use engine::GameLogic;
use engine::rng::Rng;
use serde::{Deserialize, Serialize};

pub const BOARD_ROWS: usize = 20;
pub const BOARD_COLS: usize = 10;
pub const LINE_CLEAR_BONUS: u32 = 100;

pub const CELL_EMPTY: u8 = 0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Piece {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl Piece {
    pub const ALL: [Piece; 7] = [
        Piece::I,
        Piece::O,
        Piece::T,
        Piece::S,
        Piece::Z,
        Piece::J,
        Piece::L,
    ];

    /// Board label, 1-7. Doubles as the render colour index.
    pub fn label(self) -> u8 {
        match self {
            Piece::I => 1,
            Piece::O => 2,
            Piece::T => 3,
            Piece::S => 4,
            Piece::Z => 5,
            Piece::J => 6,
            Piece::L => 7,
        }
    }

    /// Spawn orientation, top row first.
    pub fn shape(self) -> Shape {
        let rows: &[&[u8]] = match self {
            Piece::I => &[&[1, 1, 1, 1]],
            Piece::O => &[&[1, 1], &[1, 1]],
            Piece::T => &[&[0, 1, 0], &[1, 1, 1]],
            Piece::S => &[&[0, 1, 1], &[1, 1, 0]],
            Piece::Z => &[&[1, 1, 0], &[0, 1, 1]],
            Piece::J => &[&[1, 0, 0], &[1, 1, 1]],
            Piece::L => &[&[0, 0, 1], &[1, 1, 1]],
        };
        Shape(
            rows.iter()
                .map(|r| r.iter().map(|&c| c == 1).collect())
                .collect(),
        )
    }
}

/// A boolean block matrix, row 0 on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape(pub Vec<Vec<bool>>);

impl Shape {
    pub fn height(&self) -> usize {
        self.0.len()
    }

    pub fn width(&self) -> usize {
        self.0.first().map(Vec::len).unwrap_or(0)
    }

    /// Rotates 90 degrees clockwise.
    pub fn rotated_cw(&self) -> Shape {
        let (h, w) = (self.height(), self.width());
        let mut out = vec![vec![false; h]; w];
        for (y, row) in self.0.iter().enumerate() {
            for (x, &filled) in row.iter().enumerate() {
                out[x][h - 1 - y] = filled;
            }
        }
        Shape(out)
    }

    /// Offsets `(dx, dy)` of every filled block.
    pub fn blocks(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.0.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(x, _)| (x as i32, y as i32))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePiece {
    pub kind: Piece,
    pub shape: Shape,
    /// Column of the shape's left edge.
    pub x: i32,
    /// Row of the shape's top edge; rows grow downward.
    pub y: i32,
}

impl ActivePiece {
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.blocks().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedCurve {
    pub initial_ms: u64,
    pub floor_ms: u64,
    /// Milliseconds shaved off per 100 points.
    pub step_ms: u64,
}

impl Difficulty {
    pub fn curve(self) -> SpeedCurve {
        match self {
            Difficulty::Easy => SpeedCurve {
                initial_ms: 800,
                floor_ms: 300,
                step_ms: 25,
            },
            Difficulty::Normal => SpeedCurve {
                initial_ms: 500,
                floor_ms: 150,
                step_ms: 30,
            },
            Difficulty::Hard => SpeedCurve {
                initial_ms: 300,
                floor_ms: 80,
                step_ms: 20,
            },
        }
    }

    pub fn drop_interval(self, score: u32) -> Duration {
        let curve = self.curve();
        let shaved = curve.step_ms.saturating_mul(u64::from(score / 100));
        let ms = curve.initial_ms.saturating_sub(shaved).max(curve.floor_ms);
        Duration::from_millis(ms)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        })
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty {other:?} (expected easy, normal or hard)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TetrisState {
    pub board: Vec<Vec<u8>>,
    pub current: Option<ActivePiece>,
    pub score: u32,
    pub lines: u32,
    pub drop_interval: Duration,
    pub difficulty: Difficulty,
    pub game_over: bool,
    pub rng: Rng,
}

impl TetrisState {
    pub fn new(rows: usize, cols: usize, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            board: vec![vec![CELL_EMPTY; cols]; rows],
            current: None,
            score: 0,
            lines: 0,
            drop_interval: difficulty.drop_interval(0),
            difficulty,
            game_over: false,
            rng: Rng::new(seed),
        }
    }

    pub fn rows(&self) -> usize {
        self.board.len()
    }

    pub fn cols(&self) -> usize {
        self.board.first().map(Vec::len).unwrap_or(0)
    }

    /// True when `shape` at `(x, y)` stays inside the walls and floor and hits no settled block.
    pub fn is_valid_position(&self, shape: &Shape, x: i32, y: i32) -> bool {
        let (rows, cols) = (self.rows() as i32, self.cols() as i32);
        shape.blocks().all(|(dx, dy)| {
            let (bx, by) = (x + dx, y + dy);
            bx >= 0
                && bx < cols
                && by >= 0
                && by < rows
                && self.board[by as usize][bx as usize] == CELL_EMPTY
        })
    }

    pub fn spawn_piece(&mut self, kind: Piece) -> bool {
        let shape = kind.shape();
        let x = (self.cols() as i32 - shape.width() as i32) / 2;
        let fits = self.is_valid_position(&shape, x, 0);
        self.current = Some(ActivePiece { kind, shape, x, y: 0 });
        if !fits {
            self.game_over = true;
            tracing::debug!(?kind, score = self.score, "spawn blocked, game over");
        }
        fits
    }

    pub fn spawn_random(&mut self) -> bool {
        let kind = Piece::ALL[self.rng.below(Piece::ALL.len())];
        self.spawn_piece(kind)
    }

    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        if self.game_over {
            return false;
        }
        let Some(piece) = self.current.as_ref() else {
            return false;
        };
        let (nx, ny) = (piece.x + dx, piece.y + dy);
        if !self.is_valid_position(&piece.shape, nx, ny) {
            return false;
        }
        if let Some(piece) = self.current.as_mut() {
            piece.x = nx;
            piece.y = ny;
        }
        true
    }

    /// Clockwise, no wall kicks: a colliding rotation is ignored.
    pub fn rotate_piece(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        let Some(piece) = self.current.as_ref() else {
            return false;
        };
        let rotated = piece.shape.rotated_cw();
        if !self.is_valid_position(&rotated, piece.x, piece.y) {
            return false;
        }
        if let Some(piece) = self.current.as_mut() {
            piece.shape = rotated;
        }
        true
    }

    /// One gravity step: move down, or lock, clear and spawn the next piece.
    pub fn drop_step(&mut self) {
        if self.game_over || self.current.is_none() {
            return;
        }
        if self.move_piece(0, 1) {
            return;
        }
        self.lock_piece();
    }

    /// Drops until blocked and locks. Returns the rows fallen.
    pub fn hard_drop(&mut self) -> u32 {
        if self.game_over || self.current.is_none() {
            return 0;
        }
        let mut fallen = 0;
        while self.move_piece(0, 1) {
            fallen += 1;
        }
        self.lock_piece();
        fallen
    }

    fn lock_piece(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };
        let label = piece.kind.label();
        for (x, y) in piece.cells() {
            if let Some(cell) = self
                .board
                .get_mut(y as usize)
                .and_then(|row| row.get_mut(x as usize))
            {
                *cell = label;
            }
        }

        let cleared = self.clear_lines();
        if cleared > 0 {
            self.score += LINE_CLEAR_BONUS * cleared as u32;
            self.lines += cleared as u32;
            self.drop_interval = self.difficulty.drop_interval(self.score);
        }
        self.spawn_random();
    }

    /// Removes every full row, prepending empty rows. Returns the count cleared.
    pub fn clear_lines(&mut self) -> usize {
        let cols = self.cols();
        let mut cleared = 0;
        let mut y = self.rows();
        while y > 0 {
            let row = y - 1;
            if self.board[row].iter().all(|&c| c != CELL_EMPTY) {
                self.board.remove(row);
                self.board.insert(0, vec![CELL_EMPTY; cols]);
                cleared += 1;
                // Same index again: the rows above just shifted into it.
                continue;
            }
            y -= 1;
        }
        cleared
    }

    /// Board with the falling piece painted in, row 0 on top.
    pub fn board_with_active_piece(&self) -> Vec<Vec<u8>> {
        let mut board = self.board.clone();
        if let Some(piece) = &self.current {
            let label = piece.kind.label();
            for (x, y) in piece.cells() {
                if let Some(cell) = board
                    .get_mut(y as usize)
                    .and_then(|row| row.get_mut(x as usize))
                {
                    *cell = label;
                }
            }
        }
        board
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TetrisInput {
    Left,
    Right,
    SoftDrop,
    Rotate,
    HardDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TetrisGame {
    pub rows: usize,
    pub cols: usize,
    pub difficulty: Difficulty,
}

impl Default for TetrisGame {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

impl TetrisGame {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            rows: BOARD_ROWS,
            cols: BOARD_COLS,
            difficulty,
        }
    }

    pub fn with_size(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }
}

impl GameLogic for TetrisGame {
    type State = TetrisState;
    type Input = TetrisInput;

    fn initial_state(&self, seed: u64) -> TetrisState {
        let mut state = TetrisState::new(self.rows, self.cols, self.difficulty, seed);
        state.spawn_random();
        state
    }

    fn step(&self, state: &mut TetrisState) {
        state.drop_step();
    }

    fn apply_input(&self, state: &mut TetrisState, input: TetrisInput) {
        match input {
            TetrisInput::Left => {
                state.move_piece(-1, 0);
            }
            TetrisInput::Right => {
                state.move_piece(1, 0);
            }
            TetrisInput::SoftDrop => state.drop_step(),
            TetrisInput::Rotate => {
                state.rotate_piece();
            }
            TetrisInput::HardDrop => {
                state.hard_drop();
            }
        }
    }

    fn tick_interval(&self, state: &TetrisState) -> Duration {
        state.drop_interval
    }

    fn is_terminal(&self, state: &TetrisState) -> bool {
        state.game_over
    }
}
