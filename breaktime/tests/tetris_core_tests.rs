use engine::{GameLogic, TickRunner};
use breaktime::tetris_core::{
    BOARD_COLS, BOARD_ROWS, CELL_EMPTY, Difficulty, LINE_CLEAR_BONUS, Piece, TetrisGame,
    TetrisInput, TetrisState,
};

fn empty(difficulty: Difficulty) -> TetrisState {
    TetrisState::new(BOARD_ROWS, BOARD_COLS, difficulty, 1)
}

#[test]
fn new_game_has_a_falling_piece() {
    let state = TetrisGame::default().initial_state(3);
    assert_eq!(state.rows(), BOARD_ROWS);
    assert_eq!(state.cols(), BOARD_COLS);
    let piece = state.current.as_ref().expect("spawned");
    assert_eq!(piece.y, 0);
    assert!(!state.game_over);
}

#[test]
fn spawn_centers_the_piece() {
    let mut state = empty(Difficulty::Normal);
    state.spawn_piece(Piece::I);
    assert_eq!(state.current.as_ref().map(|p| p.x), Some(3));
    state.spawn_piece(Piece::O);
    assert_eq!(state.current.as_ref().map(|p| p.x), Some(4));
}

#[test]
fn walls_stop_sideways_moves() {
    let mut state = empty(Difficulty::Normal);
    state.spawn_piece(Piece::O);
    for _ in 0..10 {
        state.move_piece(-1, 0);
    }
    assert_eq!(state.current.as_ref().map(|p| p.x), Some(0));
    assert!(!state.move_piece(-1, 0));
}

#[test]
fn blocked_rotation_is_ignored() {
    let mut state = empty(Difficulty::Normal);
    state.spawn_piece(Piece::I);
    // Flat I at the floor cannot stand up.
    let bottom = BOARD_ROWS as i32 - 1;
    if let Some(piece) = state.current.as_mut() {
        piece.y = bottom;
    }
    assert!(!state.rotate_piece());
    assert_eq!(state.current.as_ref().map(|p| p.shape.height()), Some(1));
}

#[test]
fn hard_drop_lands_on_the_floor() {
    let mut state = empty(Difficulty::Normal);
    state.spawn_piece(Piece::O);
    let fallen = state.hard_drop();

    assert_eq!(fallen, BOARD_ROWS as u32 - 2);
    let last = BOARD_ROWS - 1;
    assert_eq!(state.board[last][4], Piece::O.label());
    assert_eq!(state.board[last][5], Piece::O.label());
    assert_eq!(state.board[last - 1][4], Piece::O.label());
    assert!(state.current.is_some());
}

#[test]
fn full_rows_clear_and_score() {
    let mut state = empty(Difficulty::Normal);
    let last = BOARD_ROWS - 1;
    for row in [last, last - 1] {
        for x in 0..BOARD_COLS {
            if x != 4 && x != 5 {
                state.board[row][x] = 7;
            }
        }
    }
    state.board[last - 2][0] = 3;
    state.spawn_piece(Piece::O);
    state.hard_drop();

    assert_eq!(state.lines, 2);
    assert_eq!(state.score, 2 * LINE_CLEAR_BONUS);
    assert_eq!(state.board[last][0], 3);
    assert!(state.board[last][1..].iter().all(|&c| c == CELL_EMPTY));
    assert_eq!(state.drop_interval, Difficulty::Normal.drop_interval(200));
}

#[test]
fn blocked_spawn_ends_the_game() {
    let mut state = empty(Difficulty::Normal);
    state.board[0][4] = 1;
    assert!(!state.spawn_piece(Piece::O));
    assert!(state.game_over);
    assert!(!state.move_piece(1, 0));
}

#[test]
fn gravity_follows_the_difficulty_curve() {
    let mut runner = TickRunner::new(TetrisGame::new(Difficulty::Hard), 2);
    runner.start();
    assert_eq!(runner.tick_interval(), Difficulty::Hard.drop_interval(0));

    let y0 = runner.state().current.as_ref().map(|p| p.y);
    runner.advance(Difficulty::Hard.drop_interval(0));
    let y1 = runner.state().current.as_ref().map(|p| p.y);
    assert_eq!(y1, y0.map(|y| y + 1));
}

#[test]
fn soft_drop_moves_one_row() {
    let mut runner = TickRunner::new(TetrisGame::default(), 2);
    runner.input(TetrisInput::SoftDrop);
    assert_eq!(runner.state().current.as_ref().map(|p| p.y), Some(1));
}

#[test]
fn topping_out_stops_the_loop() {
    let mut runner = TickRunner::new(TetrisGame::default(), 9);
    runner.start();
    for row in 1..BOARD_ROWS {
        for x in 0..BOARD_COLS {
            if x != row % BOARD_COLS {
                runner.state_mut().board[row][x] = 1;
            }
        }
    }

    assert!(runner.input(TetrisInput::HardDrop));
    assert!(runner.is_terminal());
    assert!(!runner.is_running());
    assert!(!runner.input(TetrisInput::Left));
}

#[test]
fn line_clear_speeds_up_the_loop_without_resetting_the_board() {
    let mut runner = TickRunner::new(TetrisGame::default(), 4);
    runner.start();
    let before = runner.tick_interval();
    assert_eq!(before, Difficulty::Normal.drop_interval(0));

    let last = BOARD_ROWS - 1;
    {
        let state = runner.state_mut();
        for x in 0..BOARD_COLS {
            if x != 4 && x != 5 {
                state.board[last][x] = 7;
            }
        }
        state.board[last - 1][0] = 3;
        state.spawn_piece(Piece::O);
    }

    assert!(runner.input(TetrisInput::HardDrop));

    let after = Difficulty::Normal.drop_interval(LINE_CLEAR_BONUS);
    assert_ne!(after, before);
    assert_eq!(runner.tick_interval(), after);
    assert!(runner.is_running());
    assert_eq!(runner.clock().scheduled_len(), 1);

    let state = runner.state();
    assert_eq!(state.lines, 1);
    assert_eq!(state.board[last][0], 3);
    assert_eq!(state.board[last][4], Piece::O.label());
    assert_eq!(state.board[last][5], Piece::O.label());
    let y0 = state.current.as_ref().map(|p| p.y).expect("next piece");
    assert_eq!(y0, 0);

    // Gravity now runs on the faster interval.
    assert_eq!(runner.advance(after), 1);
    assert_eq!(runner.state().current.as_ref().map(|p| p.y), Some(1));
    assert_eq!(runner.state().board[last][0], 3);
}

#[test]
fn board_size_is_configurable() {
    let game = TetrisGame::default().with_size(12, 6);
    let mut state = game.initial_state(4);
    assert_eq!(state.rows(), 12);
    assert_eq!(state.cols(), 6);
    assert!(state.current.is_some());

    state.spawn_piece(Piece::O);
    assert_eq!(state.current.as_ref().map(|p| p.x), Some(2));
    assert_eq!(state.hard_drop(), 10);
    assert_eq!(state.board[11][2], Piece::O.label());
    assert_eq!(state.board[10][3], Piece::O.label());
}
