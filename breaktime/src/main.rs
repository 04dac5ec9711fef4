use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use breaktime::commands::{Command as TimerCommand, PRESET_MINUTES, SchedulerStatus, validate_minutes};
use breaktime::control_api::ControlClient;
use breaktime::daemon::{self, DaemonConfig};
use breaktime::popup::SurfaceConfig;
use breaktime::popup_app::{PopupOptions, run_popup};
use breaktime::tetris_core::Difficulty;
use breaktime::view::GameKind;

/// Periodic break reminders that open a small window of minigames.
#[derive(Parser)]
#[command(name = "breaktime", version, about)]
struct Cli {
    /// Control API address (defaults to BREAKTIME_ADDR, BREAKTIME_PORT or 127.0.0.1:4117).
    #[arg(long, global = true)]
    addr: Option<SocketAddr>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the scheduler and its control API until Ctrl-C.
    Daemon,

    /// Open the minigame window.
    Popup {
        #[arg(long, default_value_t = 420)]
        width: u32,
        #[arg(long, default_value_t = 650)]
        height: u32,
        #[arg(long)]
        margin_x: Option<u32>,
        #[arg(long)]
        margin_y: Option<u32>,
        /// Tetris speed curve: easy, normal or hard.
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },

    /// Start the break timer.
    Start { minutes: f64 },

    /// Stop the break timer. An open popup stays until it is closed.
    Stop,

    /// Change the interval, restarting the countdown if the timer is running.
    Interval { minutes: f64 },

    /// Print the scheduler state.
    Status,

    /// Open the window straight on one game, without a daemon.
    Play {
        /// snake, snake2p, flappy, 2048 or tetris.
        game: GameKind,
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("breaktime=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_difficulty(flag: Option<Difficulty>) -> Difficulty {
    if let Some(difficulty) = flag {
        return difficulty;
    }
    match std::env::var("BREAKTIME_DIFFICULTY") {
        Ok(raw) => raw.parse().unwrap_or_else(|err: String| {
            tracing::warn!(error = %err, "ignoring BREAKTIME_DIFFICULTY");
            Difficulty::default()
        }),
        Err(_) => Difficulty::default(),
    }
}

fn checked_minutes(minutes: f64) -> anyhow::Result<f64> {
    validate_minutes(minutes).with_context(|| {
        let presets: Vec<String> = PRESET_MINUTES.iter().map(f64::to_string).collect();
        format!("common intervals: {} minutes", presets.join(", "))
    })
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")
}

fn print_status(status: &SchedulerStatus) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(status)?);
    Ok(())
}

fn send(addr: SocketAddr, command: TimerCommand) -> anyhow::Result<()> {
    let status = runtime()?.block_on(async move { ControlClient::new(addr).send(command).await })?;
    print_status(&status)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = DaemonConfig::from_env();
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }
    let addr = config.addr;

    match cli.command {
        Cmd::Daemon => runtime()?.block_on(daemon::serve(config)),
        Cmd::Popup {
            width,
            height,
            margin_x,
            margin_y,
            difficulty,
        } => {
            let defaults = SurfaceConfig::default();
            let surface = SurfaceConfig {
                width,
                height,
                margin_x: margin_x.unwrap_or(defaults.margin_x),
                margin_y: margin_y.unwrap_or(defaults.margin_y),
            };
            run_popup(PopupOptions {
                surface,
                difficulty: resolve_difficulty(difficulty),
                initial_game: None,
                managed: true,
            })
            .map_err(|err| anyhow::anyhow!("popup window failed: {err}"))
        }
        Cmd::Start { minutes } => {
            let interval_minutes = checked_minutes(minutes)?;
            send(addr, TimerCommand::StartTimer { interval_minutes })
        }
        Cmd::Stop => send(addr, TimerCommand::StopTimer),
        Cmd::Interval { minutes } => {
            let interval_minutes = checked_minutes(minutes)?;
            send(addr, TimerCommand::SetInterval { interval_minutes })
        }
        Cmd::Status => {
            let status = runtime()?.block_on(async move { ControlClient::new(addr).status().await })?;
            print_status(&status)
        }
        Cmd::Play { game, difficulty } => run_popup(PopupOptions {
            surface: SurfaceConfig::default(),
            difficulty: resolve_difficulty(difficulty),
            initial_game: Some(game),
            managed: false,
        })
        .map_err(|err| anyhow::anyhow!("popup window failed: {err}")),
    }
}
