//! Flappy: gravity, flaps and a stream of pipes.

use std::time::Duration;

use engine::GameLogic;
use engine::rng::Rng;
use serde::{Deserialize, Serialize};

pub const WIDTH: f64 = 300.0;
pub const HEIGHT: f64 = 400.0;
pub const TICK: Duration = Duration::from_millis(20);

pub const GRAVITY: f64 = 0.5;
pub const FLAP_VELOCITY: f64 = -8.0;
pub const BIRD_X: f64 = 50.0;
pub const BIRD_RADIUS: f64 = 15.0;
pub const BIRD_START_Y: f64 = 200.0;

pub const PIPE_WIDTH: f64 = 50.0;
pub const PIPE_SPEED: f64 = 3.0;
pub const PIPE_GAP: f64 = 150.0;
pub const PIPE_SPAWN_FRAMES: u64 = 90;
/// Gap tops are drawn from `[GAP_MARGIN, HEIGHT - GAP_MARGIN - 100)`.
const GAP_MARGIN: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    /// Left edge.
    pub x: f64,
    /// Top of the gap.
    pub gap_y: f64,
    pub gap: f64,
    pub scored: bool,
}

impl Pipe {
    pub fn trailing_edge(&self) -> f64 {
        self.x + PIPE_WIDTH
    }

    fn overlaps_bird_x(&self) -> bool {
        BIRD_X + BIRD_RADIUS > self.x && BIRD_X - BIRD_RADIUS < self.x + PIPE_WIDTH
    }

    fn bird_outside_gap(&self, y: f64) -> bool {
        y - BIRD_RADIUS < self.gap_y || y + BIRD_RADIUS > self.gap_y + self.gap
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlappyState {
    pub bird_y: f64,
    pub velocity: f64,
    pub pipes: Vec<Pipe>,
    pub frame: u64,
    pub score: u32,
    pub game_over: bool,
    pub rng: Rng,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlappyInput {
    Flap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlappyGame;

impl FlappyGame {
    fn spawn_pipe(state: &mut FlappyState) {
        let gap_y = state.rng.next_f64() * (HEIGHT - 250.0) + GAP_MARGIN;
        state.pipes.push(Pipe {
            x: WIDTH,
            gap_y,
            gap: PIPE_GAP,
            scored: false,
        });
    }
}

impl GameLogic for FlappyGame {
    type State = FlappyState;
    type Input = FlappyInput;

    fn initial_state(&self, seed: u64) -> FlappyState {
        FlappyState {
            bird_y: BIRD_START_Y,
            velocity: 0.0,
            pipes: vec![Pipe {
                x: 400.0,
                gap_y: 150.0,
                gap: PIPE_GAP,
                scored: false,
            }],
            frame: 0,
            score: 0,
            game_over: false,
            rng: Rng::new(seed),
        }
    }

    fn step(&self, state: &mut FlappyState) {
        if state.game_over {
            return;
        }
        state.frame += 1;
        state.velocity += GRAVITY;
        state.bird_y += state.velocity;

        if state.bird_y - BIRD_RADIUS < 0.0 || state.bird_y + BIRD_RADIUS > HEIGHT {
            state.game_over = true;
            return;
        }

        for pipe in state.pipes.iter_mut() {
            let before = pipe.trailing_edge();
            pipe.x -= PIPE_SPEED;

            if pipe.overlaps_bird_x() && pipe.bird_outside_gap(state.bird_y) {
                state.game_over = true;
            }

            // One-sided crossing: never missed whatever the speed.
            if !pipe.scored && before > BIRD_X && pipe.trailing_edge() <= BIRD_X {
                pipe.scored = true;
                state.score += 1;
            }
        }

        if state.frame % PIPE_SPAWN_FRAMES == 0 {
            Self::spawn_pipe(state);
        }

        state.pipes.retain(|p| p.x > -PIPE_WIDTH);
    }

    fn apply_input(&self, state: &mut FlappyState, input: FlappyInput) {
        match input {
            FlappyInput::Flap => state.velocity = FLAP_VELOCITY,
        }
    }

    fn tick_interval(&self, _state: &FlappyState) -> Duration {
        TICK
    }

    fn is_terminal(&self, state: &FlappyState) -> bool {
        state.game_over
    }
}
