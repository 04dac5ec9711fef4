//! The break scheduler: a recurring trigger that pauses while a popup is open.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::commands::{MAX_INTERVAL_MINUTES, validate_minutes};
use crate::error::CommandError;
use crate::popup::{EnsureOutcome, PopupCoordinator, SurfaceConfig, SurfaceHandle, WindowHost};
use crate::settings::{StateStore, TimerSettings};

pub const ALARM_NAME: &str = "gamePopup";

/// Recurring-trigger host. Firings come back as `fired(name)` events.
pub trait AlarmHost {
    fn schedule(&mut self, name: &str, initial_delay: Duration, period: Duration);
    /// Returns whether a trigger by that name was armed.
    fn cancel(&mut self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerMode {
    Stopped,
    Armed,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub mode: SchedulerMode,
    pub interval_minutes: f64,
    pub running: bool,
    pub paused: bool,
    pub popup_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Foreign trigger name, or the scheduler is not armed.
    Ignored,
    Created(SurfaceHandle),
    Focused(SurfaceHandle),
    /// The window host failed; the trigger stays armed and the next firing retries.
    HostFailed,
}

/// Converts minutes to a period, clamped to `MAX_INTERVAL_MINUTES`.
pub fn minutes(value: f64) -> Duration {
    let ceiling = Duration::from_secs_f64(MAX_INTERVAL_MINUTES * 60.0);
    Duration::try_from_secs_f64(value * 60.0).map_or(ceiling, |d| d.min(ceiling))
}

#[derive(Debug)]
pub struct BreakScheduler<A: AlarmHost, W: WindowHost, S: StateStore> {
    alarms: A,
    popup: PopupCoordinator<W>,
    store: S,
    interval_minutes: f64,
    running: bool,
    paused: bool,
}

impl<A: AlarmHost, W: WindowHost, S: StateStore> BreakScheduler<A, W, S> {
    /// Loads the persisted state and arms the trigger if it was running.
    pub fn restore(alarms: A, windows: W, store: S, surface: SurfaceConfig) -> Self {
        let TimerSettings {
            interval_minutes,
            running,
            ..
        } = store.load().sanitized();
        let mut scheduler = Self {
            alarms,
            popup: PopupCoordinator::new(windows, surface),
            store,
            interval_minutes,
            running,
            paused: false,
        };
        if scheduler.running {
            scheduler.arm();
        }
        tracing::info!(interval_minutes, running, "scheduler restored");
        scheduler
    }

    pub fn mode(&self) -> SchedulerMode {
        match (self.running, self.paused) {
            (false, _) => SchedulerMode::Stopped,
            (true, true) => SchedulerMode::Paused,
            (true, false) => SchedulerMode::Armed,
        }
    }

    pub fn interval_minutes(&self) -> f64 {
        self.interval_minutes
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn popup(&self) -> &PopupCoordinator<W> {
        &self.popup
    }

    pub fn alarms(&self) -> &A {
        &self.alarms
    }

    pub fn windows(&self) -> &W {
        self.popup.host()
    }

    pub fn windows_mut(&mut self) -> &mut W {
        self.popup.host_mut()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            mode: self.mode(),
            interval_minutes: self.interval_minutes,
            running: self.running,
            paused: self.paused,
            popup_open: self.popup.is_open(),
        }
    }

    pub fn start(&mut self, interval_minutes: f64) -> Result<(), CommandError> {
        let interval_minutes = validate_minutes(interval_minutes)?;
        self.interval_minutes = interval_minutes;
        self.running = true;
        if self.paused {
            tracing::info!(interval_minutes, "timer started; waiting for popup to close");
        } else {
            self.arm();
            tracing::info!(interval_minutes, "timer started");
        }
        self.persist();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.alarms.cancel(ALARM_NAME);
        tracing::info!("timer stopped");
        self.persist();
    }

    pub fn set_interval(&mut self, interval_minutes: f64) -> Result<(), CommandError> {
        let interval_minutes = validate_minutes(interval_minutes)?;
        self.interval_minutes = interval_minutes;
        if self.mode() == SchedulerMode::Armed {
            self.arm();
        }
        tracing::info!(interval_minutes, mode = ?self.mode(), "interval updated");
        self.persist();
        Ok(())
    }

    pub fn on_trigger(&mut self, name: &str) -> TriggerOutcome {
        if name != ALARM_NAME {
            tracing::debug!(name, "ignoring foreign trigger");
            return TriggerOutcome::Ignored;
        }
        if self.mode() != SchedulerMode::Armed {
            tracing::debug!(mode = ?self.mode(), "ignoring trigger while not armed");
            return TriggerOutcome::Ignored;
        }

        let outcome = match self.popup.ensure_surface() {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "could not open popup, staying armed");
                return TriggerOutcome::HostFailed;
            }
        };

        self.paused = true;
        self.alarms.cancel(ALARM_NAME);
        self.persist();
        match outcome {
            EnsureOutcome::Created(handle) => TriggerOutcome::Created(handle),
            EnsureOutcome::AlreadyOpen(handle) => {
                tracing::info!(%handle, "popup already open, focused");
                TriggerOutcome::Focused(handle)
            }
        }
    }

    /// Returns true when the tracked popup closed and the scheduler resumed (or stayed stopped).
    pub fn on_surface_closed(&mut self, handle: SurfaceHandle) -> bool {
        if !self.popup.on_closed(handle) {
            return false;
        }
        self.paused = false;
        if self.running {
            self.arm();
            tracing::info!(%handle, interval_minutes = self.interval_minutes, "popup closed, timer re-armed");
        } else {
            tracing::info!(%handle, "popup closed while stopped");
        }
        self.persist();
        true
    }

    /// Removes an open popup and disarms, leaving `running` as persisted.
    pub fn shutdown(&mut self) {
        self.popup.remove();
        self.paused = false;
        self.alarms.cancel(ALARM_NAME);
        tracing::info!("scheduler shut down");
    }

    fn arm(&mut self) {
        let period = minutes(self.interval_minutes);
        self.alarms.cancel(ALARM_NAME);
        self.alarms.schedule(ALARM_NAME, period, period);
    }

    fn persist(&self) {
        let settings = TimerSettings::new(self.interval_minutes, self.running);
        if let Err(err) = self.store.save(&settings) {
            tracing::warn!(error = %err, "failed to persist timer settings");
        }
    }
}
