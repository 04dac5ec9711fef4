//! The background process: owns the scheduler and serializes every event onto one task.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command as ProcessCommand};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::commands::{Command, SchedulerStatus, dispatch};
use crate::error::{CommandError, ControlError, HostError};
use crate::popup::{SurfaceConfig, SurfaceHandle, SurfaceStatus, WindowHost};
use crate::scheduler::{AlarmHost, BreakScheduler};
use crate::settings::{SettingsStore, StateStore};

pub const DEFAULT_ADDR: &str = "127.0.0.1:4117";

/// How long a popup gets to exit on its own after `close` before it is killed.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

pub type CommandReply = Result<SchedulerStatus, CommandError>;

#[derive(Debug)]
pub enum DaemonEvent {
    Command(Command, oneshot::Sender<CommandReply>),
    Status(oneshot::Sender<SchedulerStatus>),
    AlarmFired { name: String, generation: u64 },
    SurfaceClosed(SurfaceHandle),
    Shutdown,
}

pub type EventSender = mpsc::UnboundedSender<DaemonEvent>;

#[derive(Debug)]
struct ArmedAlarm {
    generation: u64,
    task: JoinHandle<()>,
}

/// Recurring triggers backed by tokio intervals.
///
/// Each arming gets a fresh generation; a firing that raced with a cancel carries a stale one and
/// is dropped by the event loop.
#[derive(Debug)]
pub struct TokioAlarmHost {
    events: EventSender,
    next_generation: u64,
    armed: HashMap<String, ArmedAlarm>,
}

impl TokioAlarmHost {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            next_generation: 0,
            armed: HashMap::new(),
        }
    }

    pub fn generation(&self, name: &str) -> Option<u64> {
        self.armed.get(name).map(|a| a.generation)
    }

    pub fn is_current(&self, name: &str, generation: u64) -> bool {
        self.generation(name) == Some(generation)
    }
}

impl AlarmHost for TokioAlarmHost {
    fn schedule(&mut self, name: &str, initial_delay: Duration, period: Duration) {
        self.cancel(name);
        self.next_generation += 1;
        let generation = self.next_generation;
        let events = self.events.clone();
        let alarm = name.to_string();
        let period = period.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let fired = DaemonEvent::AlarmFired {
                    name: alarm.clone(),
                    generation,
                };
                if events.send(fired).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(name, generation, delay_s = initial_delay.as_secs_f64(), "alarm armed");
        self.armed
            .insert(name.to_string(), ArmedAlarm { generation, task });
    }

    fn cancel(&mut self, name: &str) -> bool {
        match self.armed.remove(name) {
            Some(alarm) => {
                alarm.task.abort();
                tracing::debug!(name, generation = alarm.generation, "alarm cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioAlarmHost {
    fn drop(&mut self) {
        for (_, alarm) in self.armed.drain() {
            alarm.task.abort();
        }
    }
}

#[derive(Debug)]
struct PopupProcess {
    control: mpsc::UnboundedSender<&'static str>,
    exited: Arc<AtomicBool>,
}

/// Window host that runs each popup as a child process of the daemon.
#[derive(Debug)]
pub struct ProcessWindowHost {
    program: PathBuf,
    args: Vec<String>,
    events: EventSender,
    next_handle: u64,
    surfaces: HashMap<SurfaceHandle, PopupProcess>,
}

impl ProcessWindowHost {
    /// `program args... --width ...` must start a popup that reads control lines from stdin.
    pub fn new(program: PathBuf, args: Vec<String>, events: EventSender) -> Self {
        Self {
            program,
            args,
            events,
            next_handle: 0,
            surfaces: HashMap::new(),
        }
    }

    /// Re-runs the current executable with the `popup` subcommand.
    pub fn current_exe(events: EventSender) -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, vec!["popup".to_string()], events))
    }

    fn send(&self, handle: SurfaceHandle, line: &'static str) -> Result<(), HostError> {
        let process = self
            .surfaces
            .get(&handle)
            .ok_or(HostError::UnknownHandle(handle.0))?;
        process
            .control
            .send(line)
            .map_err(|_| HostError::Unreachable(handle.0))
    }
}

async fn supervise_popup(
    handle: SurfaceHandle,
    mut child: Child,
    mut stdin: Option<ChildStdin>,
    mut control: mpsc::UnboundedReceiver<&'static str>,
    exited: Arc<AtomicBool>,
    events: EventSender,
) {
    let mut detached = false;
    loop {
        tokio::select! {
            status = child.wait() => {
                match status {
                    Ok(status) => tracing::info!(%handle, %status, "popup exited"),
                    Err(err) => tracing::warn!(%handle, error = %err, "waiting on popup failed"),
                }
                break;
            }
            line = control.recv() => match line {
                Some(line) => {
                    let Some(pipe) = stdin.as_mut() else { continue };
                    let written = async {
                        pipe.write_all(line.as_bytes()).await?;
                        pipe.write_all(b"\n").await?;
                        pipe.flush().await
                    }
                    .await;
                    if let Err(err) = written {
                        tracing::debug!(%handle, error = %err, "popup stdin closed");
                        stdin = None;
                    }
                }
                None => {
                    detached = true;
                    break;
                }
            },
        }
    }

    if detached {
        drop(stdin);
        if tokio::time::timeout(CLOSE_GRACE, child.wait()).await.is_err() {
            tracing::warn!(%handle, "popup ignored close, killing it");
            if let Err(err) = child.kill().await {
                tracing::warn!(%handle, error = %err, "failed to kill popup");
            }
        }
    }

    exited.store(true, Ordering::SeqCst);
    let _ = events.send(DaemonEvent::SurfaceClosed(handle));
}

impl WindowHost for ProcessWindowHost {
    fn create_surface(&mut self, config: &SurfaceConfig) -> Result<SurfaceHandle, HostError> {
        self.surfaces
            .retain(|_, p| !p.exited.load(Ordering::SeqCst));

        let mut child = ProcessCommand::new(&self.program)
            .args(&self.args)
            .arg("--width")
            .arg(config.width.to_string())
            .arg("--height")
            .arg(config.height.to_string())
            .arg("--margin-x")
            .arg(config.margin_x.to_string())
            .arg("--margin-y")
            .arg(config.margin_y.to_string())
            .stdin(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(HostError::Spawn)?;

        self.next_handle += 1;
        let handle = SurfaceHandle(self.next_handle);
        let stdin = child.stdin.take();
        let (control, control_rx) = mpsc::unbounded_channel();
        let exited = Arc::new(AtomicBool::new(false));

        tokio::spawn(supervise_popup(
            handle,
            child,
            stdin,
            control_rx,
            exited.clone(),
            self.events.clone(),
        ));
        self.surfaces
            .insert(handle, PopupProcess { control, exited });
        Ok(handle)
    }

    fn surface_status(&self, handle: SurfaceHandle) -> SurfaceStatus {
        match self.surfaces.get(&handle) {
            Some(p) if !p.exited.load(Ordering::SeqCst) => SurfaceStatus::Exists,
            _ => SurfaceStatus::Gone,
        }
    }

    fn focus_surface(&mut self, handle: SurfaceHandle) -> Result<(), HostError> {
        self.send(handle, "focus")
    }

    fn remove_surface(&mut self, handle: SurfaceHandle) {
        if let Err(err) = self.send(handle, "close") {
            tracing::debug!(%handle, error = %err, "popup already gone");
        }
        // Dropping the control sender lets the supervisor reap or kill the child.
        self.surfaces.remove(&handle);
    }
}

/// Cheap, cloneable way into the event loop.
#[derive(Debug, Clone)]
pub struct DaemonHandle {
    events: EventSender,
}

impl DaemonHandle {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    pub async fn command(&self, command: Command) -> Result<CommandReply, ControlError> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(DaemonEvent::Command(command, tx))
            .map_err(|_| ControlError::Closed)?;
        rx.await.map_err(|_| ControlError::Closed)
    }

    pub async fn status(&self) -> Result<SchedulerStatus, ControlError> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(DaemonEvent::Status(tx))
            .map_err(|_| ControlError::Closed)?;
        rx.await.map_err(|_| ControlError::Closed)
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(DaemonEvent::Shutdown);
    }
}

/// Whether the loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

pub fn handle_event<W, S>(
    scheduler: &mut BreakScheduler<TokioAlarmHost, W, S>,
    event: DaemonEvent,
) -> LoopControl
where
    W: WindowHost,
    S: StateStore,
{
    match event {
        DaemonEvent::Command(command, reply) => {
            let result = dispatch(scheduler, command);
            if let Err(err) = &result {
                tracing::warn!(?command, error = %err, "command rejected");
            }
            let _ = reply.send(result);
        }
        DaemonEvent::Status(reply) => {
            let _ = reply.send(scheduler.status());
        }
        DaemonEvent::AlarmFired { name, generation } => {
            if !scheduler.alarms().is_current(&name, generation) {
                tracing::debug!(name = %name, generation, "dropping stale alarm firing");
                return LoopControl::Continue;
            }
            let outcome = scheduler.on_trigger(&name);
            tracing::debug!(name = %name, ?outcome, "alarm handled");
        }
        DaemonEvent::SurfaceClosed(handle) => {
            scheduler.on_surface_closed(handle);
        }
        DaemonEvent::Shutdown => {
            scheduler.shutdown();
            return LoopControl::Exit;
        }
    }
    LoopControl::Continue
}

/// Drains events until `Shutdown`. Returns the scheduler for inspection.
pub async fn run_event_loop<W, S>(
    mut scheduler: BreakScheduler<TokioAlarmHost, W, S>,
    mut events: mpsc::UnboundedReceiver<DaemonEvent>,
) -> BreakScheduler<TokioAlarmHost, W, S>
where
    W: WindowHost,
    S: StateStore,
{
    while let Some(event) = events.recv().await {
        if handle_event(&mut scheduler, event) == LoopControl::Exit {
            break;
        }
    }
    scheduler
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub addr: SocketAddr,
    pub surface: SurfaceConfig,
    pub settings: SettingsStore,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self {
            addr: resolve_daemon_addr(|k| std::env::var(k).ok()),
            surface: SurfaceConfig::default(),
            settings: SettingsStore::from_env(),
        }
    }
}

pub fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4117))
}

pub fn resolve_daemon_addr<F>(mut get_env: F) -> SocketAddr
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(addr) = get_env("BREAKTIME_ADDR").and_then(|v| v.parse().ok()) {
        return addr;
    }

    if let Some(port) = get_env("BREAKTIME_PORT").and_then(|v| v.parse::<u16>().ok()) {
        return SocketAddr::from(([127, 0, 0, 1], port));
    }

    default_addr()
}

/// Runs the daemon until Ctrl-C.
pub async fn serve(config: DaemonConfig) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let alarms = TokioAlarmHost::new(tx.clone());
    let windows =
        ProcessWindowHost::current_exe(tx.clone()).context("locating the popup executable")?;
    tracing::info!(settings = %config.settings.path().display(), "loading timer settings");
    let scheduler = BreakScheduler::restore(alarms, windows, config.settings, config.surface);
    let event_loop = tokio::spawn(run_event_loop(scheduler, rx));

    let handle = DaemonHandle::new(tx);
    let app = crate::control_api::router(handle.clone());
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding control api on {}", config.addr))?;
    tracing::info!(addr = %config.addr, "control api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %err, "ctrl-c handler failed");
            }
            tracing::info!("shutting down");
        })
        .await
        .context("serving control api")?;

    handle.shutdown();
    event_loop.await.context("joining event loop")?;
    Ok(())
}
