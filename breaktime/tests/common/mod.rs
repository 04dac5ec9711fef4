#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use breaktime::error::{HostError, SettingsError};
use breaktime::popup::{SurfaceConfig, SurfaceHandle, SurfaceStatus, WindowHost};
use breaktime::scheduler::{AlarmHost, BreakScheduler};
use breaktime::settings::{StateStore, TimerSettings};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Armed {
    pub initial_delay: Duration,
    pub period: Duration,
}

/// Alarm host that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingAlarms {
    pub armed: HashMap<String, Armed>,
    pub schedules: usize,
    pub cancels: usize,
}

impl RecordingAlarms {
    pub fn get(&self, name: &str) -> Option<Armed> {
        self.armed.get(name).copied()
    }
}

impl AlarmHost for RecordingAlarms {
    fn schedule(&mut self, name: &str, initial_delay: Duration, period: Duration) {
        self.schedules += 1;
        self.armed.insert(
            name.to_string(),
            Armed {
                initial_delay,
                period,
            },
        );
    }

    fn cancel(&mut self, name: &str) -> bool {
        self.cancels += 1;
        self.armed.remove(name).is_some()
    }
}

/// Window host whose surfaces live in a set; tests close them by hand.
#[derive(Debug, Default)]
pub struct ScriptedWindows {
    next: u64,
    pub open: HashSet<SurfaceHandle>,
    pub created: Vec<SurfaceConfig>,
    pub focused: Vec<SurfaceHandle>,
    pub removed: Vec<SurfaceHandle>,
    pub fail_create: bool,
    pub fail_focus: bool,
}

impl ScriptedWindows {
    /// Simulates the user closing the window.
    pub fn close(&mut self, handle: SurfaceHandle) {
        self.open.remove(&handle);
    }
}

impl WindowHost for ScriptedWindows {
    fn create_surface(&mut self, config: &SurfaceConfig) -> Result<SurfaceHandle, HostError> {
        if self.fail_create {
            return Err(HostError::Spawn(std::io::Error::other("no display")));
        }
        self.next += 1;
        let handle = SurfaceHandle(self.next);
        self.open.insert(handle);
        self.created.push(*config);
        Ok(handle)
    }

    fn surface_status(&self, handle: SurfaceHandle) -> SurfaceStatus {
        if self.open.contains(&handle) {
            SurfaceStatus::Exists
        } else {
            SurfaceStatus::Gone
        }
    }

    fn focus_surface(&mut self, handle: SurfaceHandle) -> Result<(), HostError> {
        if self.fail_focus {
            return Err(HostError::Unreachable(handle.0));
        }
        self.focused.push(handle);
        Ok(())
    }

    fn remove_surface(&mut self, handle: SurfaceHandle) {
        self.open.remove(&handle);
        self.removed.push(handle);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub stored: Cell<Option<TimerSettings>>,
    pub saves: Cell<usize>,
    pub fail_save: bool,
    pub log: RefCell<Vec<TimerSettings>>,
}

impl MemoryStore {
    pub fn with(settings: TimerSettings) -> Self {
        Self {
            stored: Cell::new(Some(settings)),
            ..Self::default()
        }
    }

    pub fn last(&self) -> Option<TimerSettings> {
        self.stored.get()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> TimerSettings {
        self.stored.get().unwrap_or_default()
    }

    fn save(&self, settings: &TimerSettings) -> Result<(), SettingsError> {
        if self.fail_save {
            return Err(SettingsError::Io(std::io::Error::other("read-only")));
        }
        self.saves.set(self.saves.get() + 1);
        self.stored.set(Some(*settings));
        self.log.borrow_mut().push(*settings);
        Ok(())
    }
}

pub type TestScheduler = BreakScheduler<RecordingAlarms, ScriptedWindows, MemoryStore>;

pub fn scheduler_with(settings: TimerSettings) -> TestScheduler {
    BreakScheduler::restore(
        RecordingAlarms::default(),
        ScriptedWindows::default(),
        MemoryStore::with(settings),
        SurfaceConfig::default(),
    )
}

pub fn stopped_scheduler() -> TestScheduler {
    scheduler_with(TimerSettings::new(1.0, false))
}
