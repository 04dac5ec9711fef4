pub mod app;
pub mod clock;
pub mod graphics;
pub mod pixels_renderer;
pub mod regression;
pub mod render;
pub mod rng;
pub mod surface;
pub mod ui;

use std::time::Duration;

use clock::{TaskId, VirtualClock};

/// A discrete-time game: one `step` per tick, inputs applied between ticks.
pub trait GameLogic {
    type State;
    type Input;

    fn initial_state(&self, seed: u64) -> Self::State;
    fn step(&self, state: &mut Self::State);
    fn apply_input(&self, state: &mut Self::State, input: Self::Input);
    fn tick_interval(&self, state: &Self::State) -> Duration;
    fn is_terminal(&self, state: &Self::State) -> bool;
}

/// Drives a `GameLogic` with a repeating task on a `VirtualClock`.
///
/// The tick loop is cancelled the moment the state turns terminal, and re-armed without touching
/// the state when the game asks for a different tick interval.
#[derive(Debug)]
pub struct TickRunner<G: GameLogic> {
    game: G,
    state: G::State,
    clock: VirtualClock,
    task: Option<TaskId>,
    interval: Duration,
    ticks: u64,
}

impl<G: GameLogic> TickRunner<G> {
    pub fn new(game: G, seed: u64) -> Self {
        let state = game.initial_state(seed);
        let interval = game.tick_interval(&state);
        Self {
            game,
            state,
            clock: VirtualClock::new(),
            task: None,
            interval,
            ticks: 0,
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn state(&self) -> &G::State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut G::State {
        &mut self.state
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Interval of the currently armed tick loop (or the one it would be armed with).
    pub fn tick_interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn is_terminal(&self) -> bool {
        self.game.is_terminal(&self.state)
    }

    /// Arms the tick loop. Does nothing for a terminal state.
    pub fn start(&mut self) {
        self.arm();
    }

    /// Cancels the tick loop. Returns whether a loop was running.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => self.clock.cancel(task),
            None => false,
        }
    }

    /// Throws the current state away and starts a fresh game.
    pub fn restart(&mut self, seed: u64) {
        self.stop();
        self.state = self.game.initial_state(seed);
        self.ticks = 0;
        self.arm();
    }

    /// Applies an input. Inputs to a finished game are dropped.
    pub fn input(&mut self, input: G::Input) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.game.apply_input(&mut self.state, input);
        self.after_update();
        true
    }

    /// Moves the clock forward by `dt`, running every tick that falls due. Returns the tick count.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let until = self.clock.now().saturating_add(dt);
        let mut ran = 0;
        while let Some(id) = self.clock.pop_due(until) {
            if Some(id) != self.task {
                continue;
            }
            self.game.step(&mut self.state);
            self.ticks += 1;
            ran += 1;
            self.after_update();
        }
        self.clock.settle(until);
        ran
    }

    fn arm(&mut self) {
        if let Some(task) = self.task.take() {
            self.clock.cancel(task);
        }
        if self.is_terminal() {
            return;
        }
        self.interval = self.game.tick_interval(&self.state);
        self.task = Some(self.clock.schedule(self.interval, self.interval));
    }

    fn after_update(&mut self) {
        if self.is_terminal() {
            if self.stop() {
                tracing::debug!(ticks = self.ticks, "tick loop stopped on terminal state");
            }
            return;
        }
        let wanted = self.game.tick_interval(&self.state);
        if self.task.is_some() && wanted != self.interval {
            tracing::debug!(
                from_ms = self.interval.as_millis() as u64,
                to_ms = wanted.as_millis() as u64,
                "re-arming tick loop"
            );
            self.arm();
        }
    }
}
