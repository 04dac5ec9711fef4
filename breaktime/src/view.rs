use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Snake,
    SnakeDuo,
    Flappy,
    Game2048,
    Tetris,
}

impl GameKind {
    /// Menu order.
    pub const ALL: [GameKind; 5] = [
        GameKind::Snake,
        GameKind::SnakeDuo,
        GameKind::Flappy,
        GameKind::Game2048,
        GameKind::Tetris,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GameKind::Snake => "SNAKE",
            GameKind::SnakeDuo => "SNAKE 2P",
            GameKind::Flappy => "FLAPPY BIRD",
            GameKind::Game2048 => "2048",
            GameKind::Tetris => "TETRIS",
        }
    }

    pub fn controls_hint(self) -> &'static str {
        match self {
            GameKind::Snake => "ARROWS TO STEER",
            GameKind::SnakeDuo => "P1 ARROWS  P2 WASD",
            GameKind::Flappy => "SPACE OR CLICK TO FLAP",
            GameKind::Game2048 => "ARROWS TO SLIDE",
            GameKind::Tetris => "ARROWS  UP ROTATES  SPACE DROPS",
        }
    }

    /// Turn-based games have no start screen: selecting one deals a board.
    pub fn starts_immediately(self) -> bool {
        matches!(self, GameKind::Game2048)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameKind::Snake => "snake",
            GameKind::SnakeDuo => "snake2p",
            GameKind::Flappy => "flappy",
            GameKind::Game2048 => "2048",
            GameKind::Tetris => "tetris",
        })
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snake" => Ok(GameKind::Snake),
            "snake2p" | "snake-duo" | "duo" => Ok(GameKind::SnakeDuo),
            "flappy" | "flappybird" => Ok(GameKind::Flappy),
            "2048" => Ok(GameKind::Game2048),
            "tetris" => Ok(GameKind::Tetris),
            other => Err(format!(
                "unknown game {other:?} (expected snake, snake2p, flappy, 2048 or tetris)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PopupView {
    #[default]
    Menu,
    /// Game chosen, waiting for the start action.
    Ready(GameKind),
    Playing(GameKind),
    GameOver(GameKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopupViewEvent {
    Select(GameKind),
    Start,
    Home,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopupViewEffect {
    None,
    /// Build a fresh engine for the current game and arm its tick loop.
    StartSession,
    /// Stop the tick loop and drop the engine.
    StopSession,
}

impl PopupView {
    /// Pure transition function; engine work is reported as an effect.
    pub fn handle(self, event: PopupViewEvent) -> (PopupView, PopupViewEffect) {
        match (self, event) {
            (PopupView::Menu, PopupViewEvent::Select(kind)) if kind.starts_immediately() => {
                (PopupView::Playing(kind), PopupViewEffect::StartSession)
            }
            (PopupView::Menu, PopupViewEvent::Select(kind)) => {
                (PopupView::Ready(kind), PopupViewEffect::None)
            }

            (PopupView::Ready(kind), PopupViewEvent::Start) => {
                (PopupView::Playing(kind), PopupViewEffect::StartSession)
            }

            // 2048's "new game" button.
            (PopupView::Playing(kind), PopupViewEvent::Start) if kind.starts_immediately() => {
                (PopupView::Playing(kind), PopupViewEffect::StartSession)
            }
            (PopupView::Playing(kind), PopupViewEvent::GameOver) => {
                (PopupView::GameOver(kind), PopupViewEffect::None)
            }

            (PopupView::GameOver(kind), PopupViewEvent::Start) => {
                (PopupView::Playing(kind), PopupViewEffect::StartSession)
            }

            (PopupView::Ready(_), PopupViewEvent::Home) => (PopupView::Menu, PopupViewEffect::None),
            (PopupView::Playing(_) | PopupView::GameOver(_), PopupViewEvent::Home) => {
                (PopupView::Menu, PopupViewEffect::StopSession)
            }

            (state, _) => (state, PopupViewEffect::None),
        }
    }

    pub fn game(self) -> Option<GameKind> {
        match self {
            PopupView::Menu => None,
            PopupView::Ready(k) | PopupView::Playing(k) | PopupView::GameOver(k) => Some(k),
        }
    }

    pub fn is_playing(self) -> bool {
        matches!(self, PopupView::Playing(_))
    }
}
