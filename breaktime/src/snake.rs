//! Snake, for one player or two sharing a board.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use engine::GameLogic;
use engine::render::{CELL_DEAD, CELL_FOOD, CELL_SNAKE_ONE, CELL_SNAKE_TWO};
use engine::rng::Rng;
use serde::{Deserialize, Serialize};

pub const GRID_SIZE: i32 = 20;
pub const TICK: Duration = Duration::from_millis(150);
pub const FOOD_REWARD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    fn in_bounds(self, size: i32) -> bool {
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Screen deltas: y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn is_perpendicular(self, other: Direction) -> bool {
        self.is_horizontal() != other.is_horizontal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snake {
    /// Head first.
    pub body: VecDeque<Cell>,
    pub direction: Direction,
    pub pending: Direction,
    pub score: u32,
    pub alive: bool,
}

impl Snake {
    pub fn new(head: Cell, direction: Direction) -> Self {
        Self {
            body: VecDeque::from([head]),
            direction,
            pending: direction,
            score: 0,
            alive: true,
        }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Queues a turn. Only perpendicular turns relative to the current heading are accepted.
    pub fn turn(&mut self, dir: Direction) -> bool {
        if !self.alive || !dir.is_perpendicular(self.direction) {
            return false;
        }
        self.pending = dir;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnakeMode {
    Single,
    Duo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeState {
    pub size: i32,
    pub players: Vec<Snake>,
    pub food: Option<Cell>,
    pub rng: Rng,
}

impl SnakeState {
    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.players.iter().any(|p| p.body.contains(&cell))
    }

    /// Picks a uniformly random cell no snake occupies, or `None` on a full board.
    pub fn random_empty_cell(&mut self) -> Option<Cell> {
        self.random_cell_avoiding(&[])
    }

    /// Like `random_empty_cell`, also skipping `reserved`.
    fn random_cell_avoiding(&mut self, reserved: &[Cell]) -> Option<Cell> {
        let occupied: HashSet<Cell> = self
            .players
            .iter()
            .flat_map(|p| p.body.iter().copied())
            .chain(reserved.iter().copied())
            .collect();
        let free: Vec<Cell> = (0..self.size)
            .flat_map(|y| (0..self.size).map(move |x| Cell::new(x, y)))
            .filter(|c| !occupied.contains(c))
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[self.rng.below(free.len())])
    }

    /// Board labels, row 0 at the top.
    pub fn cells(&self) -> Vec<Vec<u8>> {
        let mut grid = vec![vec![0u8; self.size as usize]; self.size as usize];
        if let Some(food) = self.food {
            grid[food.y as usize][food.x as usize] = CELL_FOOD;
        }
        for (i, snake) in self.players.iter().enumerate() {
            let label = match (snake.alive, i) {
                (false, _) => CELL_DEAD,
                (true, 0) => CELL_SNAKE_ONE,
                (true, _) => CELL_SNAKE_TWO,
            };
            for c in snake.body.iter().filter(|c| c.in_bounds(self.size)) {
                grid[c.y as usize][c.x as usize] = label;
            }
        }
        grid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeInput {
    pub player: usize,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnakeGame {
    pub mode: SnakeMode,
}

impl SnakeGame {
    pub fn single() -> Self {
        Self {
            mode: SnakeMode::Single,
        }
    }

    pub fn duo() -> Self {
        Self { mode: SnakeMode::Duo }
    }
}

impl GameLogic for SnakeGame {
    type State = SnakeState;
    type Input = SnakeInput;

    fn initial_state(&self, seed: u64) -> SnakeState {
        match self.mode {
            SnakeMode::Single => SnakeState {
                size: GRID_SIZE,
                players: vec![Snake::new(Cell::new(10, 10), Direction::Right)],
                food: Some(Cell::new(15, 15)),
                rng: Rng::new(seed),
            },
            SnakeMode::Duo => {
                let mut state = SnakeState {
                    size: GRID_SIZE,
                    players: vec![
                        Snake::new(Cell::new(5, 10), Direction::Right),
                        Snake::new(Cell::new(14, 9), Direction::Left),
                    ],
                    food: None,
                    rng: Rng::new(seed),
                };
                state.food = state.random_empty_cell();
                state
            }
        }
    }

    fn step(&self, state: &mut SnakeState) {
        if self.is_terminal(state) {
            return;
        }

        // Every collision is judged against where the snakes were before this tick.
        let snapshot: HashSet<Cell> = state
            .players
            .iter()
            .flat_map(|p| p.body.iter().copied())
            .collect();

        let mut heads: Vec<Option<Cell>> = Vec::with_capacity(state.players.len());
        for snake in state.players.iter_mut() {
            if !snake.alive {
                heads.push(None);
                continue;
            }
            snake.direction = snake.pending;
            let head = snake.head().step(snake.direction);
            if !head.in_bounds(state.size) || snapshot.contains(&head) {
                snake.alive = false;
                heads.push(None);
            } else {
                heads.push(Some(head));
            }
        }

        // Two heads racing into one cell take each other out.
        for i in 0..heads.len() {
            for j in (i + 1)..heads.len() {
                if let (Some(a), Some(b)) = (heads[i], heads[j]) {
                    if a == b {
                        state.players[i].alive = false;
                        state.players[j].alive = false;
                    }
                }
            }
        }

        let heads: Vec<Option<Cell>> = heads
            .into_iter()
            .enumerate()
            .map(|(i, head)| head.filter(|_| state.players[i].alive))
            .collect();

        for (i, head) in heads.iter().enumerate() {
            let Some(head) = *head else { continue };
            state.players[i].body.push_front(head);
            if state.food == Some(head) {
                state.players[i].score += FOOD_REWARD;
                // Heads still to move this tick are off limits, so one pickup scores once.
                let pending: Vec<Cell> = heads[i + 1..].iter().flatten().copied().collect();
                state.food = state.random_cell_avoiding(&pending);
                if state.food.is_none() {
                    tracing::debug!("board full, no room for food");
                }
            } else {
                state.players[i].body.pop_back();
            }
        }
    }

    fn apply_input(&self, state: &mut SnakeState, input: SnakeInput) {
        if let Some(snake) = state.players.get_mut(input.player) {
            snake.turn(input.direction);
        }
    }

    fn tick_interval(&self, _state: &SnakeState) -> Duration {
        TICK
    }

    fn is_terminal(&self, state: &SnakeState) -> bool {
        state.alive_count() == 0 || state.food.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_checks_axis() {
        assert!(Direction::Up.is_perpendicular(Direction::Left));
        assert!(!Direction::Up.is_perpendicular(Direction::Down));
        assert!(!Direction::Right.is_perpendicular(Direction::Right));
    }

    #[test]
    fn turn_is_checked_against_current_not_pending() {
        let mut snake = Snake::new(Cell::new(3, 3), Direction::Right);
        assert!(snake.turn(Direction::Up));
        // Still heading right until the next tick, so Down is perpendicular too.
        assert!(snake.turn(Direction::Down));
        assert!(!snake.turn(Direction::Left));
        assert_eq!(snake.pending, Direction::Down);
    }

    #[test]
    fn cells_label_food_and_players() {
        let game = SnakeGame::single();
        let state = game.initial_state(1);
        let cells = state.cells();
        assert_eq!(cells[10][10], CELL_SNAKE_ONE);
        assert_eq!(cells[15][15], CELL_FOOD);
    }
}
