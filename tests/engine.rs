//! Engine integration tests over the seeded recipes

use std::sync::Arc;

use ottocook::domain::{SessionStatus, SessionStore, StepStatus, TimerStatus};
use ottocook::{Engine, Error, MemorySource, MemoryStore};

fn setup() -> (Engine<MemorySource, MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(Arc::new(MemorySource::new()), Arc::clone(&store));
    (engine, store)
}

#[test]
fn happy_path_advance_through_stir_fry() {
    let (engine, _) = setup();

    let session = engine.start_session("vegetable-stir-fry", 0).unwrap();
    assert_eq!(session.servings, 2);

    let (step, state) = engine.current_step(&session.id).unwrap();
    assert_eq!(step.order, 1);
    assert_eq!(state.status, StepStatus::Active);

    // Seven advances walk steps 2 through 8.
    for expected in 2..=8u32 {
        let step = engine.advance(&session.id).unwrap();
        assert_eq!(step.order, expected);
    }

    // The eighth advance runs off the end and completes the session.
    assert!(matches!(engine.advance(&session.id), Err(Error::NoMoreSteps)));
    let s = engine.status(&session.id).unwrap();
    assert_eq!(s.status, SessionStatus::Completed);

    // Every step is done; none are active.
    assert!(s
        .step_states
        .values()
        .all(|st| st.status == StepStatus::Done));
}

#[test]
fn save_then_load_round_trips() {
    let (engine, store) = setup();
    let session = engine.start_session("chicken-alfredo", 3).unwrap();

    let loaded = store.load(&session.id).unwrap();
    assert_eq!(loaded.id, session.id);
    assert_eq!(loaded.servings, 3);
    assert_eq!(loaded.recipe_name, "Chicken Alfredo");
    assert_eq!(loaded.step_states.len(), session.step_states.len());
    assert_eq!(loaded.timer_states.len(), session.timer_states.len());
    assert_eq!(loaded.started_at, session.started_at);
}

#[test]
fn timestamps_are_ordered() {
    let (engine, _) = setup();
    let session = engine.start_session("vegetable-stir-fry", 2).unwrap();

    engine.advance(&session.id).unwrap();
    let s = engine.status(&session.id).unwrap();

    assert!(s.started_at <= s.updated_at);
    let first = &s.step_states[&0];
    assert!(first.started_at.unwrap() <= first.completed_at.unwrap());
}

#[test]
fn pause_and_resume_restore_timer_statuses() {
    let (engine, _) = setup();
    let session = engine.start_session("chicken-alfredo", 2).unwrap();
    engine.start_pending_timers(&session.id).unwrap();

    let before = engine.status(&session.id).unwrap();
    engine.pause(&session.id).unwrap();
    engine.resume(&session.id).unwrap();
    let after = engine.status(&session.id).unwrap();

    for (id, ts) in &before.timer_states {
        assert_eq!(after.timer_states[id].status, ts.status);
    }
}

#[test]
fn start_pending_timers_is_idempotent() {
    let (engine, _) = setup();
    let session = engine.start_session("chicken-alfredo", 2).unwrap();

    assert_eq!(engine.start_pending_timers(&session.id).unwrap(), 1);
    assert_eq!(engine.start_pending_timers(&session.id).unwrap(), 0);
}

#[test]
fn timers_accumulate_across_steps_and_keep_running() {
    let (engine, _) = setup();
    let session = engine.start_session("chicken-alfredo", 2).unwrap();
    engine.start_pending_timers(&session.id).unwrap();

    // Walk to step 4; steps 1, 3, and 4 carry timer configs.
    engine.advance(&session.id).unwrap();
    engine.advance(&session.id).unwrap();
    engine.advance(&session.id).unwrap();

    let s = engine.status(&session.id).unwrap();
    assert_eq!(s.timer_states.len(), 3);
    // The step-1 timer was started and survives the advances.
    assert_eq!(s.timer_states["timer-ca-1"].status, TimerStatus::Running);
    // The later timers materialized pending.
    assert_eq!(s.timer_states["timer-ca-3"].status, TimerStatus::Pending);
    assert_eq!(s.timer_states["timer-ca-4"].status, TimerStatus::Pending);
}

#[test]
fn abandoned_sessions_leave_active_listing() {
    let (engine, store) = setup();
    let session = engine.start_session("vegetable-stir-fry", 2).unwrap();
    assert_eq!(store.list_active().unwrap().len(), 1);

    engine.abandon(&session.id).unwrap();
    assert!(store.list_active().unwrap().is_empty());
    // The session itself is still loadable for audit.
    assert_eq!(
        store.load(&session.id).unwrap().status,
        SessionStatus::Abandoned
    );
}
