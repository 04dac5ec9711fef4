use breaktime::popup::SurfaceConfig;
use breaktime::scheduler::{ALARM_NAME, BreakScheduler, SchedulerMode};
use breaktime::settings::{SettingsStore, StateStore, TimerSettings};

mod common;

#[test]
fn missing_file_loads_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SettingsStore::new(dir.path().join("settings.json"));
    assert_eq!(store.load(), TimerSettings::default());
}

#[test]
fn save_creates_parent_dirs_and_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SettingsStore::new(dir.path().join("nested").join("breaktime").join("settings.json"));

    store.save(&TimerSettings::new(15.0, false)).expect("save");
    assert!(store.path().exists());
    assert_eq!(store.load(), TimerSettings::new(15.0, false));
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ nope").expect("write");

    assert_eq!(SettingsStore::new(path).load(), TimerSettings::default());
}

#[test]
fn partial_file_keeps_known_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"intervalMinutes": 30}"#).expect("write");

    let loaded = SettingsStore::new(path).load();
    assert_eq!(loaded.interval_minutes, 30.0);
    assert!(loaded.running);
}

#[test]
fn scheduler_state_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");

    let mut first = BreakScheduler::restore(
        common::RecordingAlarms::default(),
        common::ScriptedWindows::default(),
        SettingsStore::new(&path),
        SurfaceConfig::default(),
    );
    first.start(5.0).expect("start");
    first.on_trigger(ALARM_NAME);
    assert_eq!(first.mode(), SchedulerMode::Paused);
    drop(first);

    // Paused is transient: a restart comes back armed.
    let second = BreakScheduler::restore(
        common::RecordingAlarms::default(),
        common::ScriptedWindows::default(),
        SettingsStore::new(&path),
        SurfaceConfig::default(),
    );
    assert_eq!(second.mode(), SchedulerMode::Armed);
    assert_eq!(second.interval_minutes(), 5.0);
    assert!(second.alarms().get(ALARM_NAME).is_some());
}
