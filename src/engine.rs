//! Cooking session state machine
//!
//! The engine is the only component that mutates sessions. Every
//! operation takes the session's lock from the store for the whole
//! load -> mutate -> save sequence, so concurrent operations on the
//! same session see either the pre- or post-state, never a partial
//! update.

use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;

use crate::domain::{
    Recipe, RecipeSource, RecipeSummary, Session, SessionStatus, SessionStore, Step, StepState,
    StepStatus, TimerState, TimerStatus,
};
use crate::{Error, Result};

const DEFAULT_SERVINGS: u32 = 2;

/// Session state machine over a recipe source and a session store
pub struct Engine<R, S> {
    recipes: Arc<R>,
    store: Arc<S>,
    default_servings: u32,
}

impl<R: RecipeSource, S: SessionStore> Engine<R, S> {
    pub fn new(recipes: Arc<R>, store: Arc<S>) -> Self {
        Self {
            recipes,
            store,
            default_servings: DEFAULT_SERVINGS,
        }
    }

    /// Override the default servings used when a session starts with
    /// zero or negative servings
    #[must_use]
    pub fn with_default_servings(mut self, n: u32) -> Self {
        self.default_servings = n;
        self
    }

    /// List all available recipes
    ///
    /// # Errors
    ///
    /// Propagates recipe source failures.
    pub fn list_recipes(&self) -> Result<Vec<RecipeSummary>> {
        self.recipes.list()
    }

    /// Fetch a full recipe by id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown recipe.
    pub fn get_recipe(&self, id: &str) -> Result<Recipe> {
        self.recipes.get(id)
    }

    /// Persist a mutated recipe
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` if the source does not support updates.
    pub fn update_recipe(&self, recipe: &Recipe) -> Result<()> {
        self.recipes.update(recipe)
    }

    /// Begin a new cooking session for the given recipe
    ///
    /// Step 0 becomes active immediately; if it carries a timer config,
    /// a pending timer is materialized (it does not count down until
    /// the user confirms with `start_pending_timers`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown recipe.
    pub fn start_session(&self, recipe_id: &str, servings: u32) -> Result<Session> {
        let recipe = self.recipes.get(recipe_id)?;
        let servings = if servings == 0 {
            self.default_servings
        } else {
            servings
        };

        let now = Utc::now();
        let mut session = Session {
            id: generate_id(),
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
            servings,
            current_step_index: 0,
            step_states: (0..recipe.steps.len())
                .map(|i| (i, StepState::default()))
                .collect(),
            timer_states: Default::default(),
            status: SessionStatus::Active,
            started_at: now,
            updated_at: now,
        };

        if let Some(first) = session.step_states.get_mut(&0) {
            first.status = StepStatus::Active;
            first.started_at = Some(now);
        }
        maybe_create_timer(&mut session, &recipe.steps[0]);

        self.store.save(&session)?;
        tracing::info!(
            session = %session.id,
            recipe = %recipe.name,
            servings,
            "started session"
        );
        Ok(session)
    }

    /// Return the current step and its state
    ///
    /// # Errors
    ///
    /// Returns `NoMoreSteps` when the session is past its last step.
    pub fn current_step(&self, session_id: &str) -> Result<(Step, StepState)> {
        let session = self.store.load(session_id)?;
        let recipe = self.recipes.get(&session.recipe_id)?;

        let idx = session.current_step_index;
        if idx >= recipe.steps.len() {
            return Err(Error::NoMoreSteps);
        }
        let state = session.step_states.get(&idx).cloned().unwrap_or_default();
        Ok((recipe.steps[idx].clone(), state))
    }

    /// Move the session to the next step, marking the current one done
    ///
    /// Running timers for earlier steps keep running; they are only
    /// dismissed by the user or when they fire and are acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotActive` unless the session is active, and
    /// `NoMoreSteps` when the last step completes (the session is then
    /// marked completed).
    pub fn advance(&self, session_id: &str) -> Result<Step> {
        self.step_forward(session_id, StepStatus::Done)
    }

    /// Like `advance` but the current step ends up skipped
    ///
    /// # Errors
    ///
    /// Same error semantics as `advance`.
    pub fn skip(&self, session_id: &str) -> Result<Step> {
        self.step_forward(session_id, StepStatus::Skipped)
    }

    fn step_forward(&self, session_id: &str, final_status: StepStatus) -> Result<Step> {
        let lock = self.store.lock_for(session_id);
        let _guard = lock.lock().expect("session lock poisoned");

        let mut session = self.store.load(session_id)?;
        if session.status != SessionStatus::Active {
            return Err(Error::SessionNotActive);
        }
        let recipe = self.recipes.get(&session.recipe_id)?;

        let now = Utc::now();
        if let Some(current) = session.step_states.get_mut(&session.current_step_index) {
            current.status = final_status;
            current.completed_at = Some(now);
        }

        let next_idx = session.current_step_index + 1;
        if next_idx >= recipe.steps.len() {
            session.status = SessionStatus::Completed;
            session.updated_at = now;
            self.store.save(&session)?;
            tracing::info!(session = %session_id, "session completed");
            return Err(Error::NoMoreSteps);
        }

        session.current_step_index = next_idx;
        if let Some(next) = session.step_states.get_mut(&next_idx) {
            next.status = StepStatus::Active;
            next.started_at = Some(now);
        }
        session.updated_at = now;

        let step = recipe.steps[next_idx].clone();
        maybe_create_timer(&mut session, &step);

        self.store.save(&session)?;
        tracing::debug!(
            session = %session_id,
            step = next_idx + 1,
            total = recipe.steps.len(),
            "session advanced"
        );
        Ok(step)
    }

    /// Return the current step without changing state
    ///
    /// # Errors
    ///
    /// Same read errors as `current_step`.
    pub fn repeat(&self, session_id: &str) -> Result<Step> {
        let (step, _) = self.current_step(session_id)?;
        Ok(step)
    }

    /// Pause the session; every running timer freezes
    ///
    /// Pending, fired, and dismissed timers are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotActive` unless the session is active.
    pub fn pause(&self, session_id: &str) -> Result<()> {
        let lock = self.store.lock_for(session_id);
        let _guard = lock.lock().expect("session lock poisoned");

        let mut session = self.store.load(session_id)?;
        if session.status != SessionStatus::Active {
            return Err(Error::SessionNotActive);
        }

        session.status = SessionStatus::Paused;
        session.updated_at = Utc::now();
        for ts in session.timer_states.values_mut() {
            if ts.status == TimerStatus::Running {
                ts.status = TimerStatus::Paused;
            }
        }

        self.store.save(&session)?;
        tracing::info!(session = %session_id, "session paused");
        Ok(())
    }

    /// Resume a paused session; every paused timer runs again
    ///
    /// # Errors
    ///
    /// Returns `SessionPaused` unless the session is paused.
    pub fn resume(&self, session_id: &str) -> Result<Session> {
        let lock = self.store.lock_for(session_id);
        let _guard = lock.lock().expect("session lock poisoned");

        let mut session = self.store.load(session_id)?;
        if session.status != SessionStatus::Paused {
            return Err(Error::SessionPaused);
        }

        session.status = SessionStatus::Active;
        session.updated_at = Utc::now();
        for ts in session.timer_states.values_mut() {
            if ts.status == TimerStatus::Paused {
                ts.status = TimerStatus::Running;
            }
        }

        self.store.save(&session)?;
        tracing::info!(session = %session_id, "session resumed");
        Ok(session)
    }

    /// Full session state snapshot
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session.
    pub fn status(&self, session_id: &str) -> Result<Session> {
        self.store.load(session_id)
    }

    /// Mark a session abandoned, unconditionally
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session.
    pub fn abandon(&self, session_id: &str) -> Result<()> {
        let lock = self.store.lock_for(session_id);
        let _guard = lock.lock().expect("session lock poisoned");

        let mut session = self.store.load(session_id)?;
        session.status = SessionStatus::Abandoned;
        session.updated_at = Utc::now();
        self.store.save(&session)?;
        tracing::info!(session = %session_id, "session abandoned");
        Ok(())
    }

    /// Transition every pending timer in the session to running.
    /// Returns how many were started; idempotent (a second call
    /// returns 0).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session.
    pub fn start_pending_timers(&self, session_id: &str) -> Result<usize> {
        let lock = self.store.lock_for(session_id);
        let _guard = lock.lock().expect("session lock poisoned");

        let mut session = self.store.load(session_id)?;
        let mut started = 0;
        for ts in session.timer_states.values_mut() {
            if ts.status == TimerStatus::Pending {
                ts.status = TimerStatus::Running;
                started += 1;
                tracing::debug!(timer = %ts.id, duration = ?ts.duration, "started timer");
            }
        }

        if started > 0 {
            session.updated_at = Utc::now();
            self.store.save(&session)?;
        }
        Ok(started)
    }

    /// True if the session has any timers waiting to start
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session.
    pub fn has_pending_timers(&self, session_id: &str) -> Result<bool> {
        let session = self.store.load(session_id)?;
        Ok(session
            .timer_states
            .values()
            .any(|ts| ts.status == TimerStatus::Pending))
    }

    /// All running or fired timers for a session
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session.
    pub fn active_timers(&self, session_id: &str) -> Result<Vec<TimerState>> {
        let session = self.store.load(session_id)?;
        Ok(session
            .timer_states
            .values()
            .filter(|ts| matches!(ts.status, TimerStatus::Running | TimerStatus::Fired))
            .cloned()
            .collect())
    }

    /// Dismiss a single timer by id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown timer and `InvalidInput` when
    /// the timer is neither running nor fired.
    pub fn dismiss_timer(&self, session_id: &str, timer_id: &str) -> Result<()> {
        let lock = self.store.lock_for(session_id);
        let _guard = lock.lock().expect("session lock poisoned");

        let mut session = self.store.load(session_id)?;
        let ts = session
            .timer_states
            .get_mut(timer_id)
            .ok_or_else(|| Error::NotFound(format!("timer {timer_id}")))?;

        if !matches!(ts.status, TimerStatus::Running | TimerStatus::Fired) {
            return Err(Error::InvalidInput(format!(
                "timer {timer_id} is {}, cannot dismiss",
                ts.status
            )));
        }

        ts.status = TimerStatus::Dismissed;
        let label = ts.label.clone();
        session.updated_at = Utc::now();
        self.store.save(&session)?;
        tracing::info!(timer = %timer_id, label = %label, "dismissed timer");
        Ok(())
    }

    /// The step after the current one, or `None` on the last step
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session or recipe.
    pub fn next_step(&self, session_id: &str) -> Result<Option<Step>> {
        let session = self.store.load(session_id)?;
        let recipe = self.recipes.get(&session.recipe_id)?;

        let next_idx = session.current_step_index + 1;
        Ok(recipe.steps.get(next_idx).cloned())
    }
}

/// Materialize a pending timer for a step that has a timer config.
/// The timer does not count down until the user explicitly confirms.
fn maybe_create_timer(session: &mut Session, step: &Step) {
    let Some(cfg) = &step.timer else { return };
    let ts = TimerState::pending(&step.id, &cfg.label, cfg.duration);
    tracing::debug!(timer = %ts.id, step = %step.id, duration = ?cfg.duration, "created pending timer");
    session.timer_states.insert(ts.id.clone(), ts);
}

/// Short random hex id for sessions
fn generate_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::recipes::MemorySource;
    use crate::store::MemoryStore;

    fn setup() -> Engine<MemorySource, MemoryStore> {
        Engine::new(Arc::new(MemorySource::new()), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn start_session_initializes_first_step() {
        let eng = setup();
        let session = eng.start_session("chicken-alfredo", 2).unwrap();

        assert_eq!(session.id.len(), 16);
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.current_step_index, 0);
        assert_eq!(session.step_states[&0].status, StepStatus::Active);
        assert!(session.step_states[&0].started_at.is_some());
    }

    #[test]
    fn start_session_uses_default_servings() {
        let eng = setup();
        let session = eng.start_session("vegetable-stir-fry", 0).unwrap();
        assert_eq!(session.servings, 2);
    }

    #[test]
    fn start_session_unknown_recipe_fails() {
        let eng = setup();
        assert!(matches!(
            eng.start_session("nonexistent", 2),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn exactly_one_step_active_through_advances() {
        let eng = setup();
        let session = eng.start_session("vegetable-stir-fry", 2).unwrap();

        for _ in 0..7 {
            eng.advance(&session.id).unwrap();
            let s = eng.status(&session.id).unwrap();
            let active = s
                .step_states
                .values()
                .filter(|st| st.status == StepStatus::Active)
                .count();
            assert_eq!(active, 1);
        }
    }

    #[test]
    fn advance_past_last_step_completes_session() {
        let eng = setup();
        let session = eng.start_session("vegetable-stir-fry", 2).unwrap();

        for i in 0..7 {
            let step = eng.advance(&session.id).unwrap();
            assert_eq!(step.order as usize, i + 2);
        }
        assert!(matches!(eng.advance(&session.id), Err(Error::NoMoreSteps)));

        let s = eng.status(&session.id).unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
    }

    #[test]
    fn skip_marks_step_skipped() {
        let eng = setup();
        let session = eng.start_session("vegetable-stir-fry", 2).unwrap();

        let step = eng.skip(&session.id).unwrap();
        assert_eq!(step.order, 2);

        let s = eng.status(&session.id).unwrap();
        assert_eq!(s.step_states[&0].status, StepStatus::Skipped);
        assert!(s.step_states[&0].completed_at.is_some());
    }

    #[test]
    fn repeat_is_a_pure_read() {
        let eng = setup();
        let session = eng.start_session("vegetable-stir-fry", 2).unwrap();

        let before = eng.status(&session.id).unwrap();
        let step = eng.repeat(&session.id).unwrap();
        assert_eq!(step.order, 1);

        let after = eng.status(&session.id).unwrap();
        assert_eq!(before.current_step_index, after.current_step_index);
        assert_eq!(before.updated_at, after.updated_at);
    }

    #[test]
    fn pause_freezes_running_timers_resume_restores() {
        let eng = setup();
        let session = eng.start_session("chicken-alfredo", 2).unwrap();
        eng.start_pending_timers(&session.id).unwrap();

        eng.pause(&session.id).unwrap();
        let s = eng.status(&session.id).unwrap();
        assert_eq!(s.status, SessionStatus::Paused);
        assert!(s
            .timer_states
            .values()
            .all(|ts| ts.status != TimerStatus::Running));

        // Advance is rejected while paused.
        assert!(matches!(
            eng.advance(&session.id),
            Err(Error::SessionNotActive)
        ));

        let resumed = eng.resume(&session.id).unwrap();
        assert_eq!(resumed.status, SessionStatus::Active);
        assert!(resumed
            .timer_states
            .values()
            .any(|ts| ts.status == TimerStatus::Running));
    }

    #[test]
    fn resume_requires_paused() {
        let eng = setup();
        let session = eng.start_session("chicken-alfredo", 2).unwrap();
        assert!(matches!(eng.resume(&session.id), Err(Error::SessionPaused)));
    }

    #[test]
    fn pause_leaves_pending_timers_pending() {
        let eng = setup();
        let session = eng.start_session("chicken-alfredo", 2).unwrap();

        eng.pause(&session.id).unwrap();
        let s = eng.status(&session.id).unwrap();
        assert!(s
            .timer_states
            .values()
            .all(|ts| ts.status == TimerStatus::Pending));
    }

    #[test]
    fn abandon_is_unconditional() {
        let eng = setup();
        let session = eng.start_session("vegetable-stir-fry", 2).unwrap();
        eng.pause(&session.id).unwrap();

        eng.abandon(&session.id).unwrap();
        let s = eng.status(&session.id).unwrap();
        assert_eq!(s.status, SessionStatus::Abandoned);
    }

    #[test]
    fn first_step_timer_starts_pending_then_runs() {
        let eng = setup();
        let session = eng.start_session("chicken-alfredo", 2).unwrap();

        assert!(eng.has_pending_timers(&session.id).unwrap());
        let ts = &session.timer_states["timer-ca-1"];
        assert_eq!(ts.label, "Water boiling");
        assert_eq!(ts.status, TimerStatus::Pending);

        let n = eng.start_pending_timers(&session.id).unwrap();
        assert_eq!(n, 1);

        let s = eng.status(&session.id).unwrap();
        assert_eq!(s.timer_states["timer-ca-1"].status, TimerStatus::Running);

        // Idempotent: nothing left to start.
        assert_eq!(eng.start_pending_timers(&session.id).unwrap(), 0);
        assert!(!eng.has_pending_timers(&session.id).unwrap());
    }

    #[test]
    fn timers_keep_running_across_advance() {
        let eng = setup();
        let session = eng.start_session("chicken-alfredo", 2).unwrap();
        eng.start_pending_timers(&session.id).unwrap();

        eng.advance(&session.id).unwrap();

        let s = eng.status(&session.id).unwrap();
        assert_eq!(s.timer_states["timer-ca-1"].status, TimerStatus::Running);
    }

    #[test]
    fn dismiss_requires_running_or_fired() {
        let eng = setup();
        let session = eng.start_session("chicken-alfredo", 2).unwrap();

        // Pending timer cannot be dismissed.
        assert!(matches!(
            eng.dismiss_timer(&session.id, "timer-ca-1"),
            Err(Error::InvalidInput(_))
        ));

        eng.start_pending_timers(&session.id).unwrap();
        eng.dismiss_timer(&session.id, "timer-ca-1").unwrap();

        let s = eng.status(&session.id).unwrap();
        assert_eq!(s.timer_states["timer-ca-1"].status, TimerStatus::Dismissed);

        // Already dismissed.
        assert!(eng.dismiss_timer(&session.id, "timer-ca-1").is_err());
    }

    #[test]
    fn dismiss_paused_timer_fails() {
        let eng = setup();
        let session = eng.start_session("chicken-alfredo", 2).unwrap();
        eng.start_pending_timers(&session.id).unwrap();
        eng.pause(&session.id).unwrap();

        assert!(matches!(
            eng.dismiss_timer(&session.id, "timer-ca-1"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn next_step_peeks_without_advancing() {
        let eng = setup();
        let session = eng.start_session("vegetable-stir-fry", 2).unwrap();

        let next = eng.next_step(&session.id).unwrap().unwrap();
        assert_eq!(next.order, 2);
        assert_eq!(eng.status(&session.id).unwrap().current_step_index, 0);

        for _ in 0..7 {
            eng.advance(&session.id).unwrap();
        }
        assert!(eng.next_step(&session.id).unwrap().is_none());
    }
}
