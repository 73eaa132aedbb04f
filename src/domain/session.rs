//! Cooking session state

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// One run of a recipe by a user
#[derive(Debug, Clone)]
pub struct Session {
    /// 8-byte random hex id
    pub id: String,
    pub recipe_id: String,
    pub recipe_name: String,
    pub servings: u32,
    /// 0-based index into the recipe's steps
    pub current_step_index: usize,
    pub step_states: HashMap<usize, StepState>,
    pub timer_states: HashMap<String, TimerState>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}

/// Progress of a single step within a session
#[derive(Debug, Clone, Default)]
pub struct StepState {
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// State of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Pending,
    Active,
    Done,
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Done => "done",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// A countdown timer attached to a step within a session
///
/// Timers are never destroyed; dismissed and fired timers stay in the
/// session for audit.
#[derive(Debug, Clone)]
pub struct TimerState {
    /// "timer-" + step id
    pub id: String,
    pub step_id: String,
    pub label: String,
    pub duration: Duration,
    pub remaining: Duration,
    pub status: TimerStatus,
    /// Last fired/escalation notification
    pub last_notified: Option<DateTime<Utc>>,
    /// Last periodic reminder
    pub last_reminded_at: Option<DateTime<Utc>>,
    /// True after the one-shot "almost done" warning
    pub warned_almost: bool,
    pub escalation_level: u32,
}

impl TimerState {
    /// Create a pending timer for a step
    #[must_use]
    pub fn pending(step_id: &str, label: &str, duration: Duration) -> Self {
        Self {
            id: format!("timer-{step_id}"),
            step_id: step_id.to_string(),
            label: label.to_string(),
            duration,
            remaining: duration,
            status: TimerStatus::Pending,
            last_notified: None,
            last_reminded_at: None,
            warned_almost: false,
            escalation_level: 0,
        }
    }
}

/// Timer lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Pending,
    Running,
    Paused,
    Fired,
    Dismissed,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Fired => "fired",
            Self::Dismissed => "dismissed",
        };
        f.write_str(s)
    }
}
