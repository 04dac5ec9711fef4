//! The popup window: menu, start screens and the running game.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use engine::app::{AppConfig, AppControl, GameApp, HostSignal, InputFrame, Key, WindowPlacement};
use engine::graphics::Renderer2d;
use engine::surface::SurfaceSize;

use crate::draw::{self, Layout, POPUP_SIZE};
use crate::popup::SurfaceConfig;
use crate::session::{HighScores, Session};
use crate::tetris_core::Difficulty;
use crate::view::{GameKind, PopupView, PopupViewEffect, PopupViewEvent};

/// Longest stretch simulated in one frame; a stalled window does not fast-forward a game.
const MAX_FRAME_STEP: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct PopupModel {
    pub view: PopupView,
    pub session: Option<Session>,
    pub high_scores: HighScores,
    pub difficulty: Difficulty,
    layout: Layout,
    seed: u64,
}

impl PopupModel {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            view: PopupView::Menu,
            session: None,
            high_scores: HighScores::default(),
            difficulty,
            layout: Layout::new(POPUP_SIZE),
            seed,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn next_seed(&mut self) -> u64 {
        self.seed = self.seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        self.seed
    }

    pub fn dispatch(&mut self, event: PopupViewEvent) {
        let (view, effect) = self.view.handle(event);
        if view != self.view {
            tracing::debug!(from = ?self.view, to = ?view, "popup view change");
        }
        self.view = view;
        match effect {
            PopupViewEffect::None => {}
            PopupViewEffect::StartSession => {
                if let Some(mut old) = self.session.take() {
                    old.stop();
                }
                if let Some(kind) = self.view.game() {
                    let seed = self.next_seed();
                    self.session = Some(Session::start(kind, self.difficulty, seed));
                }
            }
            PopupViewEffect::StopSession => {
                if let Some(mut session) = self.session.take() {
                    session.stop();
                }
            }
        }
    }

    /// Handles one frame of input, then advances the running game by `dt`.
    pub fn update(&mut self, input: &InputFrame, dt: Duration) -> AppControl {
        if input.mouse_clicked {
            if let Some((x, y)) = input.mouse_pos {
                if self.layout.close.contains(x, y) {
                    return AppControl::Exit;
                }
                self.click(x, y);
            }
        }
        for &key in &input.keys_pressed {
            self.key(key);
        }

        if self.view.is_playing() {
            if let Some(session) = self.session.as_mut() {
                session.advance(dt.min(MAX_FRAME_STEP));
            }
            self.check_game_over();
        }
        AppControl::Continue
    }

    fn key(&mut self, key: Key) {
        if matches!(key, Key::Escape | Key::H) && self.view != PopupView::Menu {
            self.dispatch(PopupViewEvent::Home);
            return;
        }
        match self.view {
            PopupView::Menu => {
                if let Key::Digit(n) = key {
                    if let Some(kind) = GameKind::ALL.get(usize::from(n).wrapping_sub(1)) {
                        self.dispatch(PopupViewEvent::Select(*kind));
                    }
                }
            }
            PopupView::Ready(_) | PopupView::GameOver(_) => {
                if matches!(key, Key::Enter | Key::Space | Key::R) {
                    self.dispatch(PopupViewEvent::Start);
                }
            }
            PopupView::Playing(kind) => {
                if kind.starts_immediately() && matches!(key, Key::R | Key::Enter) {
                    self.dispatch(PopupViewEvent::Start);
                } else if let Some(session) = self.session.as_mut() {
                    session.key(key);
                }
            }
        }
    }

    fn click(&mut self, x: u32, y: u32) {
        if self.view != PopupView::Menu && self.layout.home.contains(x, y) {
            self.dispatch(PopupViewEvent::Home);
            return;
        }
        match self.view {
            PopupView::Menu => {
                if let Some(kind) = self.layout.menu_hit(x, y) {
                    self.dispatch(PopupViewEvent::Select(kind));
                }
            }
            PopupView::Ready(_) => {
                if self.layout.start.contains(x, y) {
                    self.dispatch(PopupViewEvent::Start);
                }
            }
            PopupView::GameOver(_) => self.dispatch(PopupViewEvent::Start),
            PopupView::Playing(kind) => {
                if kind.starts_immediately() && self.layout.start.contains(x, y) {
                    self.dispatch(PopupViewEvent::Start);
                } else if let Some(session) = self.session.as_mut() {
                    session.click();
                }
            }
        }
    }

    fn check_game_over(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.is_over() {
            return;
        }
        let kind = session.kind();
        let score = session.best_score();
        if self.high_scores.record(kind, score) {
            tracing::info!(%kind, score, "new high score");
        }
        tracing::info!(%kind, score, "game over");
        self.dispatch(PopupViewEvent::GameOver);
    }

    pub fn render(&self, gfx: &mut dyn Renderer2d) {
        draw::draw_popup(
            gfx,
            &self.layout,
            self.view,
            self.session.as_ref(),
            &self.high_scores,
        );
    }
}

#[derive(Debug, Clone)]
pub struct PopupOptions {
    pub surface: SurfaceConfig,
    pub difficulty: Difficulty,
    /// Jump straight to a game's start screen.
    pub initial_game: Option<GameKind>,
    /// Spawned by the daemon: obey `focus`/`close` on stdin and sit in the bottom-right corner.
    pub managed: bool,
}

#[derive(Debug)]
pub struct PopupApp {
    options: PopupOptions,
}

impl PopupApp {
    pub fn new(options: PopupOptions) -> Self {
        Self { options }
    }

    pub fn app_config(&self) -> AppConfig {
        let surface = self.options.surface;
        let placement = if self.options.managed {
            WindowPlacement::BottomRight {
                margin_x: surface.margin_x,
                margin_y: surface.margin_y,
            }
        } else {
            WindowPlacement::Default
        };
        AppConfig {
            title: "Break Time".to_string(),
            size: POPUP_SIZE,
            window: SurfaceSize::new(surface.width, surface.height),
            placement,
            listen_stdin: self.options.managed,
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED)
}

impl GameApp for PopupApp {
    type State = PopupModel;

    fn init_state(&mut self) -> PopupModel {
        let mut model = PopupModel::new(self.options.difficulty, clock_seed());
        if let Some(kind) = self.options.initial_game {
            model.dispatch(PopupViewEvent::Select(kind));
        }
        model
    }

    fn update(&mut self, state: &mut PopupModel, input: &InputFrame, dt: Duration) -> AppControl {
        state.update(input, dt)
    }

    fn render(&self, state: &PopupModel, gfx: &mut dyn Renderer2d) {
        state.render(gfx);
    }

    fn on_signal(&mut self, state: &mut PopupModel, signal: HostSignal) -> AppControl {
        match signal {
            HostSignal::Focus => AppControl::Continue,
            HostSignal::Close => {
                if let Some(mut session) = state.session.take() {
                    session.stop();
                }
                AppControl::Exit
            }
        }
    }
}

pub fn run_popup(options: PopupOptions) -> Result<(), Box<dyn std::error::Error>> {
    let app = PopupApp::new(options);
    let config = app.app_config();
    engine::app::run_game(config, app)
}
