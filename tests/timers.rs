//! Supervisor and watcher integration tests
//!
//! The supervisor's countdown is driven per-tick, so these tests call
//! `tick` directly instead of sleeping.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ottocook::domain::{Notifier, SessionStore, TimerStatus};
use ottocook::{
    Engine, MemorySource, MemoryStore, Result, Supervisor, SupervisorConfig, Watcher,
    WatcherConfig,
};

#[derive(Default)]
struct CollectingNotifier {
    messages: Mutex<Vec<String>>,
    urgent: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    fn urgent_count(&self) -> usize {
        self.urgent.lock().unwrap().len()
    }
    fn normal_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
    fn notify_urgent(&self, message: &str) -> Result<()> {
        self.urgent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

struct Rig {
    engine: Engine<MemorySource, MemoryStore>,
    store: Arc<MemoryStore>,
    notifier: Arc<CollectingNotifier>,
}

fn rig() -> Rig {
    let store = Arc::new(MemoryStore::new());
    Rig {
        engine: Engine::new(Arc::new(MemorySource::new()), Arc::clone(&store)),
        store,
        notifier: Arc::new(CollectingNotifier::default()),
    }
}

fn supervisor(r: &Rig, config: SupervisorConfig) -> Supervisor<MemoryStore> {
    Supervisor::new(Arc::clone(&r.store), r.notifier.clone(), config)
}

#[test]
fn pending_timer_runs_then_fires_with_one_urgent_notification() {
    let r = rig();
    let session = r.engine.start_session("chicken-alfredo", 2).unwrap();

    assert!(r.engine.has_pending_timers(&session.id).unwrap());
    assert_eq!(r.engine.start_pending_timers(&session.id).unwrap(), 1);

    let sup = supervisor(&r, SupervisorConfig::default());

    // Walk the full 8 minutes, one second per tick.
    for _ in 0..(8 * 60) {
        sup.tick();
    }

    let s = r.store.load(&session.id).unwrap();
    let ts = &s.timer_states["timer-ca-1"];
    assert_eq!(ts.status, TimerStatus::Fired);
    assert_eq!(ts.remaining, Duration::ZERO);
    assert_eq!(ts.escalation_level, 1);

    // Exactly one urgent notification, at escalation level 0.
    assert_eq!(r.notifier.urgent_count(), 1);
    assert_eq!(
        r.notifier.urgent.lock().unwrap()[0],
        "[Timer] Water boiling is up."
    );
}

#[test]
fn remaining_decrements_exactly_per_tick() {
    let r = rig();
    let session = r.engine.start_session("chicken-alfredo", 2).unwrap();
    r.engine.start_pending_timers(&session.id).unwrap();

    let sup = supervisor(&r, SupervisorConfig::default());
    for _ in 0..30 {
        sup.tick();
    }

    let s = r.store.load(&session.id).unwrap();
    let ts = &s.timer_states["timer-ca-1"];
    assert_eq!(ts.remaining, Duration::from_secs(8 * 60 - 30));
    assert!(ts.remaining <= ts.duration);
}

#[test]
fn pause_freezes_countdown_resume_continues() {
    let r = rig();
    let session = r.engine.start_session("chicken-alfredo", 2).unwrap();
    r.engine.start_pending_timers(&session.id).unwrap();

    let sup = supervisor(&r, SupervisorConfig::default());
    for _ in 0..30 {
        sup.tick();
    }

    r.engine.pause(&session.id).unwrap();
    let frozen = r.store.load(&session.id).unwrap().timer_states["timer-ca-1"].remaining;
    assert_eq!(frozen, Duration::from_secs(8 * 60 - 30));

    // A paused session is skipped wholesale; another minute of ticks
    // must not move the countdown.
    for _ in 0..60 {
        sup.tick();
    }
    let s = r.store.load(&session.id).unwrap();
    assert_eq!(s.timer_states["timer-ca-1"].status, TimerStatus::Paused);
    assert_eq!(s.timer_states["timer-ca-1"].remaining, frozen);

    // Resume: running again, and ticking again.
    r.engine.resume(&session.id).unwrap();
    sup.tick();
    let s = r.store.load(&session.id).unwrap();
    assert_eq!(s.timer_states["timer-ca-1"].status, TimerStatus::Running);
    assert_eq!(
        s.timer_states["timer-ca-1"].remaining,
        frozen - Duration::from_secs(1)
    );
}

#[test]
fn escalation_caps_at_four_notifications_total() {
    let r = rig();
    let session = r.engine.start_session("chicken-alfredo", 2).unwrap();
    r.engine.start_pending_timers(&session.id).unwrap();

    // Zero cooldown lets every tick escalate, so the ladder runs to
    // its cap immediately and the count is exact.
    let sup = supervisor(
        &r,
        SupervisorConfig {
            notify_cooldown: Duration::ZERO,
            ..SupervisorConfig::default()
        },
    );

    // Fire the timer, then give the supervisor another minute.
    for _ in 0..(8 * 60 + 60) {
        sup.tick();
    }

    // Initial urgent fire + three escalations, then silence. The
    // periodic "N remaining" reminders are not part of the ladder.
    assert_eq!(r.notifier.urgent_count(), 1);
    let messages = r.notifier.messages.lock().unwrap();
    let escalations: Vec<&String> = messages
        .iter()
        .filter(|m| {
            m.starts_with("[Timer] Water boiling")
                && !m.contains("remaining")
                && !m.contains("almost")
        })
        .collect();
    assert_eq!(escalations.len(), 3);
    assert_eq!(escalations[0], "[Timer] Water boiling — check it now.");
    assert_eq!(escalations[1], "[Timer] Water boiling. Now.");
    assert_eq!(escalations[2], "[Timer] Water boiling.");

    let s = r.store.load(&session.id).unwrap();
    assert_eq!(s.timer_states["timer-ca-1"].escalation_level, 4);
}

#[test]
fn dismissed_timer_stops_escalating() {
    let r = rig();
    let session = r.engine.start_session("chicken-alfredo", 2).unwrap();
    r.engine.start_pending_timers(&session.id).unwrap();

    let sup = supervisor(
        &r,
        SupervisorConfig {
            notify_cooldown: Duration::ZERO,
            ..SupervisorConfig::default()
        },
    );
    for _ in 0..(8 * 60) {
        sup.tick();
    }

    r.engine.dismiss_timer(&session.id, "timer-ca-1").unwrap();
    let before = r.notifier.normal_count();
    for _ in 0..30 {
        sup.tick();
    }
    assert_eq!(r.notifier.normal_count(), before);

    let s = r.store.load(&session.id).unwrap();
    assert_eq!(s.timer_states["timer-ca-1"].status, TimerStatus::Dismissed);
}

#[test]
fn watcher_never_mutates_session_state() {
    let r = rig();
    let session = r.engine.start_session("chicken-alfredo", 2).unwrap();
    r.engine.start_pending_timers(&session.id).unwrap();
    r.engine.pause(&session.id).unwrap();

    let before = r.store.load(&session.id).unwrap();

    let watcher = Watcher::new(
        Arc::clone(&r.store),
        Arc::new(MemorySource::new()),
        r.notifier.clone(),
        WatcherConfig::default(),
    );
    watcher.check();
    watcher.check();

    // The paused nudge was emitted...
    assert!(r.notifier.normal_count() >= 1);
    assert!(r.notifier.messages.lock().unwrap()[0].contains("paused"));

    // ...but nothing about the session changed.
    let after = r.store.load(&session.id).unwrap();
    assert_eq!(after.status, before.status);
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(
        after.timer_states["timer-ca-1"].remaining,
        before.timer_states["timer-ca-1"].remaining
    );
}
