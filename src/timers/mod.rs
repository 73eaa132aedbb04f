//! Background timer supervision
//!
//! Two loops run against the session store: the supervisor ticks every
//! second driving countdowns, firing, and escalation; the watcher runs
//! on a slower cycle and narrates session state without mutating it.

mod supervisor;
mod watcher;

pub use supervisor::{Supervisor, SupervisorConfig};
pub use watcher::{Watcher, WatcherConfig};

use std::time::Duration;

/// Human-friendly spoken duration for timer reminders. Rounds to the
/// nearest minute once there's at least a minute left.
#[must_use]
pub fn format_remaining(d: Duration) -> String {
    let total_secs = d.as_secs();
    if total_secs < 60 {
        return if total_secs == 1 {
            "1 second".to_string()
        } else {
            format!("{total_secs} seconds")
        };
    }
    let m = (total_secs + 30) / 60;
    let m = m.max(1);
    if m == 1 {
        "1 minute".to_string()
    } else {
        format!("{m} minutes")
    }
}

/// Compact display duration: "45s", "8m", "1m30s", "1h5m"
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        return format!("{secs}s");
    }
    if secs < 3600 {
        let m = secs / 60;
        let s = secs % 60;
        return if s == 0 {
            format!("{m}m")
        } else {
            format!("{m}m{s}s")
        };
    }
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    format!("{h}h{m}m")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_rounds_to_nearest_minute() {
        assert_eq!(format_remaining(Duration::from_secs(1)), "1 second");
        assert_eq!(format_remaining(Duration::from_secs(45)), "45 seconds");
        assert_eq!(format_remaining(Duration::from_secs(61)), "1 minute");
        assert_eq!(format_remaining(Duration::from_secs(150)), "3 minutes");
        assert_eq!(format_remaining(Duration::from_secs(119)), "2 minutes");
    }

    #[test]
    fn display_duration_is_compact() {
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(480)), "8m");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3900)), "1h5m");
    }
}
