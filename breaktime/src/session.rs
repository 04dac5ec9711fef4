//! One running minigame inside the popup.

use std::collections::HashMap;
use std::time::Duration;

use engine::TickRunner;
use engine::app::Key;

use crate::flappy::{FlappyGame, FlappyInput};
use crate::game_2048::{Game2048, Move};
use crate::snake::{Direction, SnakeGame, SnakeInput, SnakeMode};
use crate::tetris_core::{Difficulty, TetrisGame, TetrisInput};
use crate::view::GameKind;

#[derive(Debug)]
pub enum Session {
    Snake(TickRunner<SnakeGame>),
    Flappy(TickRunner<FlappyGame>),
    Game2048(TickRunner<Game2048>),
    Tetris(TickRunner<TetrisGame>),
}

fn arrow(key: Key) -> Option<Direction> {
    match key {
        Key::Up => Some(Direction::Up),
        Key::Down => Some(Direction::Down),
        Key::Left => Some(Direction::Left),
        Key::Right => Some(Direction::Right),
        _ => None,
    }
}

fn wasd(key: Key) -> Option<Direction> {
    match key {
        Key::W => Some(Direction::Up),
        Key::S => Some(Direction::Down),
        Key::A => Some(Direction::Left),
        Key::D => Some(Direction::Right),
        _ => None,
    }
}

impl Session {
    /// Builds a fresh engine and arms its tick loop (2048 has none).
    pub fn start(kind: GameKind, difficulty: Difficulty, seed: u64) -> Self {
        let mut session = match kind {
            GameKind::Snake => Session::Snake(TickRunner::new(SnakeGame::single(), seed)),
            GameKind::SnakeDuo => Session::Snake(TickRunner::new(SnakeGame::duo(), seed)),
            GameKind::Flappy => Session::Flappy(TickRunner::new(FlappyGame, seed)),
            GameKind::Game2048 => Session::Game2048(TickRunner::new(Game2048, seed)),
            GameKind::Tetris => Session::Tetris(TickRunner::new(TetrisGame::new(difficulty), seed)),
        };
        match &mut session {
            Session::Snake(r) => r.start(),
            Session::Flappy(r) => r.start(),
            Session::Tetris(r) => r.start(),
            Session::Game2048(_) => {}
        }
        tracing::info!(%kind, seed, "game started");
        session
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Session::Snake(r) => match r.game().mode {
                SnakeMode::Single => GameKind::Snake,
                SnakeMode::Duo => GameKind::SnakeDuo,
            },
            Session::Flappy(_) => GameKind::Flappy,
            Session::Game2048(_) => GameKind::Game2048,
            Session::Tetris(_) => GameKind::Tetris,
        }
    }

    pub fn advance(&mut self, dt: Duration) -> usize {
        match self {
            Session::Snake(r) => r.advance(dt),
            Session::Flappy(r) => r.advance(dt),
            Session::Game2048(r) => r.advance(dt),
            Session::Tetris(r) => r.advance(dt),
        }
    }

    /// Routes a key press to the engine. Returns whether the engine accepted it.
    pub fn key(&mut self, key: Key) -> bool {
        match self {
            Session::Snake(r) => {
                let duo = r.game().mode == SnakeMode::Duo;
                let input = match (arrow(key), wasd(key)) {
                    (Some(direction), _) => SnakeInput {
                        player: 0,
                        direction,
                    },
                    (None, Some(direction)) if duo => SnakeInput {
                        player: 1,
                        direction,
                    },
                    _ => return false,
                };
                r.input(input)
            }
            Session::Flappy(r) => match key {
                Key::Space | Key::Up => r.input(FlappyInput::Flap),
                _ => false,
            },
            Session::Game2048(r) => {
                let mv = match key {
                    Key::Up => Move::Up,
                    Key::Down => Move::Down,
                    Key::Left => Move::Left,
                    Key::Right => Move::Right,
                    _ => return false,
                };
                r.input(mv)
            }
            Session::Tetris(r) => {
                let input = match key {
                    Key::Left => TetrisInput::Left,
                    Key::Right => TetrisInput::Right,
                    Key::Down => TetrisInput::SoftDrop,
                    Key::Up => TetrisInput::Rotate,
                    Key::Space => TetrisInput::HardDrop,
                    _ => return false,
                };
                r.input(input)
            }
        }
    }

    /// Clicks only matter to Flappy.
    pub fn click(&mut self) -> bool {
        match self {
            Session::Flappy(r) => r.input(FlappyInput::Flap),
            _ => false,
        }
    }

    /// One score per player.
    pub fn scores(&self) -> Vec<u32> {
        match self {
            Session::Snake(r) => r.state().players.iter().map(|p| p.score).collect(),
            Session::Flappy(r) => vec![r.state().score],
            Session::Game2048(r) => vec![r.state().score],
            Session::Tetris(r) => vec![r.state().score],
        }
    }

    pub fn best_score(&self) -> u32 {
        self.scores().into_iter().max().unwrap_or(0)
    }

    pub fn is_over(&self) -> bool {
        match self {
            Session::Snake(r) => r.is_terminal(),
            Session::Flappy(r) => r.is_terminal(),
            Session::Game2048(r) => r.is_terminal(),
            Session::Tetris(r) => r.is_terminal(),
        }
    }

    pub fn is_ticking(&self) -> bool {
        match self {
            Session::Snake(r) => r.is_running(),
            Session::Flappy(r) => r.is_running(),
            Session::Game2048(r) => r.is_running(),
            Session::Tetris(r) => r.is_running(),
        }
    }

    pub fn stop(&mut self) {
        let was_running = match self {
            Session::Snake(r) => r.stop(),
            Session::Flappy(r) => r.stop(),
            Session::Game2048(r) => r.stop(),
            Session::Tetris(r) => r.stop(),
        };
        tracing::debug!(kind = %self.kind(), was_running, "game stopped");
    }
}

/// Best score per game for as long as the popup lives.
#[derive(Debug, Clone, Default)]
pub struct HighScores {
    best: HashMap<GameKind, u32>,
}

impl HighScores {
    pub fn best(&self, kind: GameKind) -> u32 {
        self.best.get(&kind).copied().unwrap_or(0)
    }

    /// Returns true when `score` beats the previous best.
    pub fn record(&mut self, kind: GameKind, score: u32) -> bool {
        let best = self.best.entry(kind).or_insert(0);
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }
}
