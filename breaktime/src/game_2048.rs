//! 2048 on a 4x4 board. Turn based: the tick loop is never armed.

use std::time::Duration;

use engine::GameLogic;
use engine::rng::Rng;
use serde::{Deserialize, Serialize};

pub const SIZE: usize = 4;
pub const WIN_TILE: u32 = 2048;

pub type Board = [[u32; SIZE]; SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State2048 {
    pub board: Board,
    pub score: u32,
    pub rng: Rng,
}

impl State2048 {
    pub fn empty(seed: u64) -> Self {
        Self {
            board: [[0; SIZE]; SIZE],
            score: 0,
            rng: Rng::new(seed),
        }
    }

    pub fn from_board(board: Board, seed: u64) -> Self {
        Self {
            board,
            score: 0,
            rng: Rng::new(seed),
        }
    }

    pub fn has_won(&self) -> bool {
        self.board.iter().flatten().any(|&v| v >= WIN_TILE)
    }

    pub fn is_full(&self) -> bool {
        self.board.iter().flatten().all(|&v| v != 0)
    }

    pub fn can_move(&self) -> bool {
        if !self.is_full() {
            return true;
        }
        for r in 0..SIZE {
            for c in 0..SIZE {
                let v = self.board[r][c];
                if c + 1 < SIZE && self.board[r][c + 1] == v {
                    return true;
                }
                if r + 1 < SIZE && self.board[r + 1][c] == v {
                    return true;
                }
            }
        }
        false
    }

    /// Places a 2 (90%) or a 4 on a random empty cell. Returns false on a full board.
    pub fn spawn_tile(&mut self) -> bool {
        let empty: Vec<(usize, usize)> = (0..SIZE)
            .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.board[r][c] == 0)
            .collect();
        if empty.is_empty() {
            return false;
        }
        let (r, c) = empty[self.rng.below(empty.len())];
        self.board[r][c] = if self.rng.chance(0.9) { 2 } else { 4 };
        true
    }

    /// Applies a move. Returns whether the board changed; only then is a tile spawned.
    pub fn apply_move(&mut self, dir: Move) -> bool {
        let mut moved = false;
        for i in 0..SIZE {
            let line = read_line(&self.board, dir, i);
            let (slid, gained) = slide_line(line);
            if slid != line {
                moved = true;
                write_line(&mut self.board, dir, i, slid);
                self.score += gained;
            }
        }
        if moved {
            self.spawn_tile();
        }
        moved
    }
}

/// Reads line `i` oriented so the move direction faces index 0.
fn read_line(board: &Board, dir: Move, i: usize) -> [u32; SIZE] {
    let mut line = [0; SIZE];
    for (k, slot) in line.iter_mut().enumerate() {
        *slot = match dir {
            Move::Left => board[i][k],
            Move::Right => board[i][SIZE - 1 - k],
            Move::Up => board[k][i],
            Move::Down => board[SIZE - 1 - k][i],
        };
    }
    line
}

fn write_line(board: &mut Board, dir: Move, i: usize, line: [u32; SIZE]) {
    for (k, v) in line.into_iter().enumerate() {
        match dir {
            Move::Left => board[i][k] = v,
            Move::Right => board[i][SIZE - 1 - k] = v,
            Move::Up => board[k][i] = v,
            Move::Down => board[SIZE - 1 - k][i] = v,
        }
    }
}

/// Compress, merge each pair once, compress again, pad. Returns the line and the points gained.
pub fn slide_line(line: [u32; SIZE]) -> ([u32; SIZE], u32) {
    let mut tiles: Vec<u32> = line.into_iter().filter(|&v| v != 0).collect();
    let mut gained = 0;
    let mut i = 0;
    while i + 1 < tiles.len() {
        if tiles[i] == tiles[i + 1] {
            tiles[i] *= 2;
            gained += tiles[i];
            tiles[i + 1] = 0;
            i += 2;
        } else {
            i += 1;
        }
    }
    let mut out = [0; SIZE];
    for (slot, v) in out.iter_mut().zip(tiles.into_iter().filter(|&v| v != 0)) {
        *slot = v;
    }
    (out, gained)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Game2048;

/// Placeholder rate; `Session` never arms a loop for 2048.
const IDLE_INTERVAL: Duration = Duration::from_secs(3600);

impl GameLogic for Game2048 {
    type State = State2048;
    type Input = Move;

    fn initial_state(&self, seed: u64) -> State2048 {
        let mut state = State2048::empty(seed);
        state.spawn_tile();
        state.spawn_tile();
        state
    }

    fn step(&self, _state: &mut State2048) {}

    fn apply_input(&self, state: &mut State2048, input: Move) {
        state.apply_move(input);
    }

    fn tick_interval(&self, _state: &State2048) -> Duration {
        IDLE_INTERVAL
    }

    fn is_terminal(&self, state: &State2048) -> bool {
        !state.can_move()
    }
}
