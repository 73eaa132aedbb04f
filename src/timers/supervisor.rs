//! Timer supervisor: the 1 s tick loop.
//!
//! Decrements running timers, fires them at zero, escalates fired
//! timers on a cooldown, and emits "almost done" and periodic
//! reminders. Never propagates errors: a session that can't be
//! persisted is retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::domain::{Notifier, Session, SessionStatus, SessionStore, TimerState, TimerStatus};

use super::format_remaining;

/// Tuning knobs for the supervisor
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// How often timers are decremented
    pub tick_interval: Duration,
    /// Minimum spacing between repeated fired-timer notifications
    pub notify_cooldown: Duration,
    /// Escalation level after which the supervisor stops nagging
    pub max_escalation: u32,
    /// Spacing of periodic "N remaining" reminders; zero disables them
    pub reminder_interval: Duration,
    /// How close to expiry the one-shot "almost done" warning fires
    pub almost_done_threshold: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            notify_cooldown: Duration::from_secs(15),
            max_escalation: 3,
            reminder_interval: Duration::from_secs(120),
            almost_done_threshold: Duration::from_secs(30),
        }
    }
}

/// Background timer countdown and notification driver
pub struct Supervisor<S> {
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
    config: SupervisorConfig,
}

impl<S: SessionStore + 'static> Supervisor<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>, config: SupervisorConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Spawn the tick loop. Returns when the shutdown flag flips.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let tick = self.config.tick_interval;
        tokio::spawn(async move {
            tracing::info!(
                tick = ?tick,
                cooldown = ?self.config.notify_cooldown,
                "timer supervisor started"
            );
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately; skip it so
            // countdowns don't lose a tick at startup.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => self.tick(),
                    _ = shutdown.changed() => {
                        tracing::info!("timer supervisor stopped");
                        return;
                    }
                }
            }
        });
    }

    /// One supervisor cycle over every active session
    pub fn tick(&self) {
        let sessions = match self.store.list_active() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "supervisor: listing active sessions");
                return;
            }
        };
        for session in sessions {
            self.process_session(session);
        }
    }

    fn process_session(&self, session: Session) {
        // Paused sessions are skipped wholesale. A running timer on a
        // paused session is a transient inconsistency and must not fire.
        if session.status != SessionStatus::Active {
            return;
        }

        let lock = self.store.lock_for(&session.id);
        let _guard = lock.lock().expect("session lock poisoned");

        // Re-load under the lock so we never clobber a concurrent
        // engine mutation with the pre-lock snapshot.
        let mut session = match self.store.load(&session.id) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "supervisor: reloading session");
                return;
            }
        };
        if session.status != SessionStatus::Active {
            return;
        }

        let mut changed = false;
        let now = Utc::now();

        let mut timer_ids: Vec<String> = session.timer_states.keys().cloned().collect();
        timer_ids.sort();

        for id in &timer_ids {
            let ts = session.timer_states.get_mut(id).expect("timer vanished");
            if ts.status != TimerStatus::Running {
                continue;
            }

            ts.remaining = ts.remaining.saturating_sub(self.config.tick_interval);
            changed = true;

            if ts.remaining.is_zero() {
                ts.status = TimerStatus::Fired;
                tracing::debug!(timer = %ts.id, session = %session.id, "timer fired");

                let msg = escalation_message(ts);
                if let Err(e) = self.notifier.notify_urgent(&msg) {
                    tracing::error!(error = %e, "supervisor: fired-timer notify");
                }
                ts.last_notified = Some(now);
                ts.escalation_level = 1;
                continue;
            }

            // One-shot "almost done" warning when remaining crosses the
            // threshold. Only for timers long enough that it isn't noise.
            if !ts.warned_almost
                && ts.remaining <= self.config.almost_done_threshold
                && ts.duration > self.config.almost_done_threshold * 2
            {
                ts.warned_almost = true;
                let msg = format!(
                    "[Timer] {} — almost done, {} left.",
                    ts.label,
                    format_remaining(ts.remaining)
                );
                if let Err(e) = self.notifier.notify(&msg) {
                    tracing::error!(error = %e, "supervisor: almost-done notify");
                }
                ts.last_reminded_at = Some(now);
                continue;
            }

            // Periodic reminder.
            if !self.config.reminder_interval.is_zero()
                && ts.duration > self.config.reminder_interval
            {
                let due = match ts.last_reminded_at {
                    // First reminder fires once elapsed reaches the interval.
                    None => ts.duration - ts.remaining >= self.config.reminder_interval,
                    Some(last) => {
                        let since = (now - last).to_std().unwrap_or(Duration::ZERO);
                        since >= self.config.reminder_interval
                    }
                };
                if due {
                    ts.last_reminded_at = Some(now);
                    let msg = format!(
                        "[Timer] {} — {} remaining.",
                        ts.label,
                        format_remaining(ts.remaining)
                    );
                    if let Err(e) = self.notifier.notify(&msg) {
                        tracing::error!(error = %e, "supervisor: reminder notify");
                    }
                }
            }
        }

        // Fired timers that need follow-up.
        for id in &timer_ids {
            let ts = session.timer_states.get_mut(id).expect("timer vanished");
            if ts.status != TimerStatus::Fired {
                continue;
            }
            if ts.escalation_level > self.config.max_escalation {
                continue;
            }
            if let Some(last) = ts.last_notified {
                let since = (now - last).to_std().unwrap_or(Duration::ZERO);
                if since < self.config.notify_cooldown {
                    continue;
                }
            }

            let msg = escalation_message(ts);
            if let Err(e) = self.notifier.notify(&msg) {
                tracing::error!(error = %e, "supervisor: escalation notify");
            }
            ts.last_notified = Some(now);
            ts.escalation_level += 1;
            changed = true;
        }

        if changed {
            if let Err(e) = self.store.save(&session) {
                tracing::error!(session = %session.id, error = %e, "supervisor: saving session");
            }
        }
    }
}

/// Progressively terser message for a fired timer
fn escalation_message(ts: &TimerState) -> String {
    match ts.escalation_level {
        0 => format!("[Timer] {} is up.", ts.label),
        1 => format!("[Timer] {} — check it now.", ts.label),
        2 => format!("[Timer] {}. Now.", ts.label),
        _ => format!("[Timer] {}.", ts.label),
    }
}
