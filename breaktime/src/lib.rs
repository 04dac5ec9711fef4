pub mod commands;
pub mod control_api;
pub mod daemon;
pub mod draw;
pub mod error;
pub mod flappy;
pub mod game_2048;
pub mod popup;
pub mod popup_app;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod snake;
pub mod tetris_core;
pub mod view;
