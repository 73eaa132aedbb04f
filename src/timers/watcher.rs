//! Session watcher: the slow contextual loop.
//!
//! Inspects every active or paused session on a long cycle and nudges
//! the user about paused sessions, fired timers, and overdue steps.
//! The watcher never mutates session state; it only talks.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::domain::{
    Notifier, RecipeSource, Session, SessionStatus, SessionStore, Step, TimerStatus,
};

use super::{format_duration, format_remaining};

/// How long a user can sit on an untimed step before a nudge
const UNTIMED_STEP_PATIENCE: Duration = Duration::from_secs(3 * 60);

/// Tuning knobs for the watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// How often session state is inspected
    pub interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Contextual session commentary on a slow cycle
pub struct Watcher<S, R> {
    store: Arc<S>,
    recipes: Arc<R>,
    notifier: Arc<dyn Notifier>,
    config: WatcherConfig,
}

impl<S: SessionStore + 'static, R: RecipeSource + 'static> Watcher<S, R> {
    pub fn new(
        store: Arc<S>,
        recipes: Arc<R>,
        notifier: Arc<dyn Notifier>,
        config: WatcherConfig,
    ) -> Self {
        Self {
            store,
            recipes,
            notifier,
            config,
        }
    }

    /// Spawn the watcher loop. Returns when the shutdown flag flips.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.interval;
        tokio::spawn(async move {
            tracing::info!(interval = ?period, "watcher started");
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately; skip it so
            // a fresh session isn't narrated the moment it starts.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => self.check(),
                    _ = shutdown.changed() => {
                        tracing::info!("watcher stopped");
                        return;
                    }
                }
            }
        });
    }

    /// One watcher cycle across all active sessions
    pub fn check(&self) {
        let sessions = match self.store.list_active() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "watcher: listing active sessions");
                return;
            }
        };
        for session in sessions {
            self.inspect(&session);
        }
    }

    fn inspect(&self, session: &Session) {
        tracing::debug!(
            session = %session.id,
            recipe = %session.recipe_name,
            status = %session.status,
            step = session.current_step_index + 1,
            total = session.step_states.len(),
            "watcher: checked status"
        );
        for ts in session.timer_states.values() {
            tracing::debug!(
                timer = %ts.id,
                label = %ts.label,
                status = %ts.status,
                remaining = ?ts.remaining,
                escalation = ts.escalation_level,
                "watcher: timer state"
            );
        }

        let recipe = match self.recipes.get(&session.recipe_id) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(recipe = %session.recipe_id, error = %e, "watcher: loading recipe");
                return;
            }
        };

        let idx = session.current_step_index;
        let Some(step) = recipe.steps.get(idx) else {
            return;
        };
        let state = session.step_states.get(&idx).cloned().unwrap_or_default();

        let on_step_for = state
            .started_at
            .map(|t| (Utc::now() - t).to_std().unwrap_or(Duration::ZERO))
            .unwrap_or(Duration::ZERO);

        let Some(msg) = build_message(session, step, on_step_for) else {
            tracing::debug!(
                session = %session.id,
                step = step.order,
                on_step = ?on_step_for,
                "watcher: nothing to report"
            );
            return;
        };

        if let Err(e) = self.notifier.notify(&msg) {
            tracing::error!(error = %e, "watcher: notify");
        }
    }
}

/// Decide what to tell the user based on current state. Returns `None`
/// when everything looks fine.
fn build_message(session: &Session, step: &Step, on_step_for: Duration) -> Option<String> {
    // Paused session takes priority.
    if session.status == SessionStatus::Paused {
        let elapsed = (Utc::now() - session.updated_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        return Some(format!(
            "[Watcher] Session paused for {}. Your food isn't cooking itself.",
            format_duration(elapsed)
        ));
    }

    let mut running: Vec<String> = Vec::new();
    let mut fired: Vec<String> = Vec::new();
    for ts in session.timer_states.values() {
        match ts.status {
            TimerStatus::Running => running.push(format!(
                "{} ({} left)",
                ts.label,
                format_remaining(ts.remaining)
            )),
            TimerStatus::Fired => fired.push(ts.label.clone()),
            _ => {}
        }
    }

    // Fired timers mean something needs attention right now.
    if !fired.is_empty() {
        fired.sort();
        return Some(format!(
            "[Watcher] Heads up — {} fired and waiting on you.",
            join_names(&fired)
        ));
    }

    // Timed step and the user is way over the expected duration.
    if !step.duration.is_zero() && on_step_for > step.duration * 2 {
        let mut msg = format!(
            "[Watcher] You've been on step {} for {} (expected ~{}). Everything okay?",
            step.order,
            format_duration(on_step_for),
            format_duration(step.duration)
        );
        if !running.is_empty() {
            running.sort();
            msg.push_str(&format!(" Active timers: {}.", join_names(&running)));
        }
        return Some(msg);
    }

    // Untimed step the user has been sitting on for a while.
    if step.duration.is_zero() && on_step_for > UNTIMED_STEP_PATIENCE {
        return Some(format!(
            "[Watcher] Still on step {} ({}). Take your time, but don't forget about it.",
            step.order,
            format_duration(on_step_for)
        ));
    }

    None
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
