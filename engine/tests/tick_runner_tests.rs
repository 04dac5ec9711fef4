use std::time::Duration;

use engine::clock::VirtualClock;
use engine::rng::Rng;
use engine::{GameLogic, TickRunner};

/// A dot walking right on a line; inputs speed it up.
#[derive(Debug)]
struct Walker {
    width: u32,
}

#[derive(Debug)]
struct WalkerState {
    x: u32,
    speed_ms: u64,
}

impl GameLogic for Walker {
    type State = WalkerState;
    type Input = ();

    fn initial_state(&self, _seed: u64) -> WalkerState {
        WalkerState { x: 0, speed_ms: 100 }
    }

    fn step(&self, state: &mut WalkerState) {
        state.x += 1;
    }

    fn apply_input(&self, state: &mut WalkerState, _input: ()) {
        state.speed_ms = (state.speed_ms / 2).max(10);
    }

    fn tick_interval(&self, state: &WalkerState) -> Duration {
        Duration::from_millis(state.speed_ms)
    }

    fn is_terminal(&self, state: &WalkerState) -> bool {
        state.x >= self.width
    }
}

#[test]
fn input_rearms_the_loop_at_the_new_speed() {
    let mut runner = TickRunner::new(Walker { width: 100 }, 0);
    runner.start();
    runner.advance(Duration::from_millis(250));
    assert_eq!(runner.state().x, 2);

    runner.input(());
    assert_eq!(runner.tick_interval(), Duration::from_millis(50));
    // The re-armed loop starts a full period from the input, not from the last tick.
    assert_eq!(runner.advance(Duration::from_millis(49)), 0);
    assert_eq!(runner.advance(Duration::from_millis(1)), 1);
    assert_eq!(runner.clock().scheduled_len(), 1);
}

#[test]
fn short_walk_ends_and_disarms() {
    let mut runner = TickRunner::new(Walker { width: 3 }, 0);
    runner.start();
    assert_eq!(runner.advance(Duration::from_secs(60)), 3);
    assert!(!runner.is_running());
    assert_eq!(runner.clock().scheduled_len(), 0);
}

#[test]
fn clock_reports_firings_in_order() {
    let mut clock = VirtualClock::new();
    let slow = clock.schedule(Duration::from_millis(30), Duration::from_millis(30));
    let fast = clock.schedule(Duration::from_millis(20), Duration::from_millis(20));

    let fired = clock.advance(Duration::from_millis(60));
    assert_eq!(fired, vec![fast, slow, fast, slow, fast]);
    assert_eq!(clock.now(), Duration::from_millis(60));
}

#[test]
fn rng_is_reproducible_per_seed() {
    let mut a = Rng::new(9);
    let mut b = Rng::new(9);
    let xs: Vec<usize> = (0..16).map(|_| a.below(10)).collect();
    let ys: Vec<usize> = (0..16).map(|_| b.below(10)).collect();
    assert_eq!(xs, ys);
    assert!(xs.iter().all(|&x| x < 10));
}
