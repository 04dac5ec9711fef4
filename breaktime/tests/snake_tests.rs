use std::collections::VecDeque;

use engine::render::{CELL_DEAD, CELL_FOOD, CELL_SNAKE_ONE, CELL_SNAKE_TWO};
use engine::{GameLogic, TickRunner};
use breaktime::snake::{
    Cell, Direction, FOOD_REWARD, GRID_SIZE, Snake, SnakeGame, SnakeInput, TICK,
};

fn snake_at(body: &[(i32, i32)], direction: Direction) -> Snake {
    let mut snake = Snake::new(Cell::new(body[0].0, body[0].1), direction);
    snake.body = body.iter().map(|&(x, y)| Cell::new(x, y)).collect::<VecDeque<_>>();
    snake
}

#[test]
fn single_snake_starts_centered_heading_right() {
    let state = SnakeGame::single().initial_state(1);
    assert_eq!(state.size, GRID_SIZE);
    assert_eq!(state.players.len(), 1);
    assert_eq!(state.players[0].head(), Cell::new(10, 10));
    assert_eq!(state.players[0].direction, Direction::Right);
    assert_eq!(state.food, Some(Cell::new(15, 15)));
}

#[test]
fn eating_grows_scores_and_moves_food() {
    let mut runner = TickRunner::new(SnakeGame::single(), 3);
    runner.state_mut().food = Some(Cell::new(11, 10));
    runner.start();

    assert_eq!(runner.advance(TICK), 1);
    let state = runner.state();
    assert_eq!(state.players[0].head(), Cell::new(11, 10));
    assert_eq!(state.players[0].len(), 2);
    assert_eq!(state.players[0].score, FOOD_REWARD);
    let food = state.food.expect("room for food");
    assert!(!state.is_occupied(food));
}

#[test]
fn moving_without_food_keeps_length() {
    let mut runner = TickRunner::new(SnakeGame::single(), 3);
    runner.start();
    runner.advance(TICK * 3);
    assert_eq!(runner.state().players[0].head(), Cell::new(13, 10));
    assert_eq!(runner.state().players[0].len(), 1);
}

#[test]
fn hitting_the_wall_ends_the_game_and_the_loop() {
    let mut runner = TickRunner::new(SnakeGame::single(), 3);
    runner.start();
    runner.advance(TICK * 20);

    assert!(runner.is_terminal());
    assert!(!runner.is_running());
    assert_eq!(runner.ticks(), 10);
    assert!(!runner.state().players[0].alive);
}

#[test]
fn reversing_is_ignored() {
    let mut runner = TickRunner::new(SnakeGame::single(), 3);
    runner.input(SnakeInput {
        player: 0,
        direction: Direction::Left,
    });
    assert_eq!(runner.state().players[0].pending, Direction::Right);

    runner.input(SnakeInput {
        player: 0,
        direction: Direction::Up,
    });
    runner.start();
    runner.advance(TICK);
    assert_eq!(runner.state().players[0].head(), Cell::new(10, 9));
}

#[test]
fn running_into_a_vacating_tail_still_collides() {
    let game = SnakeGame::single();
    let mut state = game.initial_state(1);
    state.players[0] = snake_at(&[(5, 5), (5, 6), (6, 6), (6, 5)], Direction::Right);

    game.step(&mut state);
    assert!(!state.players[0].alive);
    assert!(game.is_terminal(&state));
}

#[test]
fn head_on_collision_kills_both_snakes() {
    let game = SnakeGame::duo();
    let mut state = game.initial_state(1);
    state.players[0] = snake_at(&[(9, 10)], Direction::Right);
    state.players[1] = snake_at(&[(11, 10)], Direction::Left);
    state.food = Some(Cell::new(0, 0));

    game.step(&mut state);
    assert_eq!(state.alive_count(), 0);
    assert!(game.is_terminal(&state));
}

#[test]
fn dead_snake_stays_on_the_board_as_an_obstacle() {
    let game = SnakeGame::duo();
    let mut state = game.initial_state(1);
    state.players[0] = snake_at(&[(9, 10), (8, 10)], Direction::Right);
    state.players[1] = snake_at(&[(10, 12), (10, 11), (10, 10)], Direction::Down);
    state.food = Some(Cell::new(0, 0));

    game.step(&mut state);
    assert!(!state.players[0].alive);
    assert!(state.players[1].alive);
    assert!(!game.is_terminal(&state));

    let cells = state.cells();
    assert_eq!(cells[10][9], CELL_DEAD);
    assert_eq!(cells[13][10], CELL_SNAKE_TWO);
    assert_eq!(cells[0][0], CELL_FOOD);

    // The survivor keeps playing; the corpse does not move.
    game.step(&mut state);
    assert_eq!(state.players[0].head(), Cell::new(9, 10));
    assert_eq!(state.players[1].head(), Cell::new(10, 14));
}

#[test]
fn duo_players_steer_independently() {
    let mut runner = TickRunner::new(SnakeGame::duo(), 5);
    runner.input(SnakeInput {
        player: 1,
        direction: Direction::Up,
    });
    runner.start();
    runner.advance(TICK);

    let state = runner.state();
    assert_eq!(state.players[0].head(), Cell::new(6, 10));
    assert_eq!(state.players[1].head(), Cell::new(14, 8));
    let cells = state.cells();
    assert_eq!(cells[10][6], CELL_SNAKE_ONE);
    assert_eq!(cells[8][14], CELL_SNAKE_TWO);
}

#[test]
fn full_board_leaves_no_food_and_ends_the_game() {
    let game = SnakeGame::single();
    let mut state = game.initial_state(1);
    state.size = 2;
    state.players[0] = snake_at(&[(0, 0), (0, 1), (1, 1)], Direction::Right);
    state.food = Some(Cell::new(1, 0));

    game.step(&mut state);
    assert_eq!(state.players[0].score, FOOD_REWARD);
    assert_eq!(state.food, None);
    assert!(game.is_terminal(&state));
}

#[test]
fn respawned_food_never_lands_under_the_other_head() {
    let game = SnakeGame::duo();
    let mut state = game.initial_state(1);
    state.size = 3;
    // Only (1, 0) and (2, 0) are free: player one eats at (1, 0) while player two moves into (2, 0).
    state.players[0] = snake_at(&[(0, 0), (0, 1), (1, 1), (1, 2), (0, 2)], Direction::Right);
    state.players[1] = snake_at(&[(2, 1), (2, 2)], Direction::Up);
    state.food = Some(Cell::new(1, 0));

    game.step(&mut state);
    assert_eq!(state.players[0].score, FOOD_REWARD);
    assert_eq!(state.players[0].len(), 6);
    assert_eq!(state.players[1].score, 0);
    assert_eq!(state.players[1].len(), 2);
    assert_eq!(state.players[1].head(), Cell::new(2, 0));
    assert_eq!(state.food, None);
    assert!(game.is_terminal(&state));
}

#[test]
fn same_seed_same_food() {
    let a = SnakeGame::duo().initial_state(42);
    let b = SnakeGame::duo().initial_state(42);
    assert_eq!(a.food, b.food);
}
