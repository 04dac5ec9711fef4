mod common;

use std::time::Duration;

use breaktime::commands::Command;
use breaktime::daemon::{DaemonEvent, LoopControl, TokioAlarmHost, handle_event, run_event_loop};
use breaktime::popup::{SurfaceConfig, SurfaceHandle};
use breaktime::scheduler::{ALARM_NAME, AlarmHost, BreakScheduler, SchedulerMode};
use breaktime::settings::TimerSettings;
use common::{MemoryStore, ScriptedWindows};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

type DaemonScheduler = BreakScheduler<TokioAlarmHost, ScriptedWindows, MemoryStore>;

fn daemon_scheduler(events: mpsc::UnboundedSender<DaemonEvent>, running: bool) -> DaemonScheduler {
    BreakScheduler::restore(
        TokioAlarmHost::new(events),
        ScriptedWindows::default(),
        MemoryStore::with(TimerSettings::new(1.0, running)),
        SurfaceConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn alarm_fires_after_the_initial_delay_and_repeats() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut alarms = TokioAlarmHost::new(tx);
    let start = Instant::now();
    alarms.schedule("break", Duration::from_secs(60), Duration::from_secs(60));

    for expected in [60, 120] {
        match rx.recv().await {
            Some(DaemonEvent::AlarmFired { name, generation }) => {
                assert_eq!(name, "break");
                assert!(alarms.is_current(&name, generation));
            }
            other => panic!("expected an alarm, got {other:?}"),
        }
        assert!(start.elapsed() >= Duration::from_secs(expected));
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_alarm_stays_quiet() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut alarms = TokioAlarmHost::new(tx);
    alarms.schedule("break", Duration::from_secs(60), Duration::from_secs(60));
    assert!(alarms.cancel("break"));
    assert!(!alarms.cancel("break"));

    let quiet = tokio::time::timeout(Duration::from_secs(600), rx.recv()).await;
    assert!(quiet.is_err());
    assert_eq!(alarms.generation("break"), None);
}

#[tokio::test]
async fn rescheduling_bumps_the_generation() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut alarms = TokioAlarmHost::new(tx);
    alarms.schedule("break", Duration::from_secs(60), Duration::from_secs(60));
    let first = alarms.generation("break").expect("armed");
    alarms.schedule("break", Duration::from_secs(60), Duration::from_secs(60));
    let second = alarms.generation("break").expect("armed");

    assert!(second > first);
    assert!(!alarms.is_current("break", first));
}

#[tokio::test]
async fn stale_alarm_firings_are_dropped() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut scheduler = daemon_scheduler(tx, true);
    let stale = scheduler.alarms().generation(ALARM_NAME).expect("armed on restore");

    let (reply, answer) = oneshot::channel();
    handle_event(
        &mut scheduler,
        DaemonEvent::Command(Command::StartTimer { interval_minutes: 2.0 }, reply),
    );
    assert!(answer.await.expect("reply").is_ok());
    let current = scheduler.alarms().generation(ALARM_NAME).expect("re-armed");

    let stale_event = DaemonEvent::AlarmFired {
        name: ALARM_NAME.to_string(),
        generation: stale,
    };
    assert_eq!(handle_event(&mut scheduler, stale_event), LoopControl::Continue);
    assert!(scheduler.windows().created.is_empty());

    let fresh = DaemonEvent::AlarmFired {
        name: ALARM_NAME.to_string(),
        generation: current,
    };
    handle_event(&mut scheduler, fresh);
    assert_eq!(scheduler.windows().created.len(), 1);
    assert_eq!(scheduler.mode(), SchedulerMode::Paused);
}

#[tokio::test]
async fn rejected_commands_reply_with_the_error() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut scheduler = daemon_scheduler(tx, false);

    let (reply, answer) = oneshot::channel();
    handle_event(
        &mut scheduler,
        DaemonEvent::Command(Command::SetInterval { interval_minutes: 0.0 }, reply),
    );
    assert!(answer.await.expect("reply").is_err());
    assert_eq!(scheduler.interval_minutes(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn event_loop_opens_popup_on_alarm_and_resumes_after_close() {
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = daemon_scheduler(tx.clone(), true);
    let event_loop = tokio::spawn(run_event_loop(scheduler, rx));

    let handle = breaktime::daemon::DaemonHandle::new(tx.clone());
    tokio::time::sleep(Duration::from_secs(61)).await;
    let status = handle.status().await.expect("status");
    assert_eq!(status.mode, SchedulerMode::Paused);
    assert!(status.popup_open);

    tx.send(DaemonEvent::SurfaceClosed(SurfaceHandle(1))).expect("send");
    let status = handle.status().await.expect("status");
    assert_eq!(status.mode, SchedulerMode::Armed);
    assert!(!status.popup_open);

    handle.shutdown();
    let scheduler = event_loop.await.expect("join");
    assert_eq!(scheduler.windows().created.len(), 1);
    assert!(scheduler.alarms().generation(ALARM_NAME).is_none());
}
