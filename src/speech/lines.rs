//! Every spoken string lives here
//!
//! Edit this file to change OttoCook's personality. Keep lines short
//! and direct; the TTS engine handles inflection.

use std::fmt::Write as _;
use std::time::Duration;

use rand::seq::SliceRandom;

// ── Greeting / global ────────────────────────────────────────────

#[must_use]
pub fn line_welcome() -> String {
    "Hello. What are we cooking today?".to_string()
}

#[must_use]
pub fn line_bye() -> String {
    "Bye.".to_string()
}

#[must_use]
pub fn line_nothing_to_repeat() -> String {
    "I haven't said anything yet.".to_string()
}

// ── Recipe selection ─────────────────────────────────────────────

/// Spoken after the user picks a recipe number; reads out the
/// ingredients so they can gather them.
#[must_use]
pub fn line_recipe_selected(name: &str, ingredients: &[String]) -> String {
    let mut b = String::new();
    let _ = write!(b, "{name}. You'll need: ");
    for (i, ing) in ingredients.iter().enumerate() {
        if i > 0 && i == ingredients.len() - 1 {
            b.push_str(", and ");
        } else if i > 0 {
            b.push_str(", ");
        }
        b.push_str(ing);
    }
    b.push_str(". Say start when you're ready.");
    b
}

#[must_use]
pub fn line_invalid_selection(payload: &str) -> String {
    format!("Invalid selection: {payload}. Pick a number from the list.")
}

#[must_use]
pub fn line_pick_recipe_first() -> String {
    "Pick a recipe first.".to_string()
}

#[must_use]
pub fn line_already_active() -> String {
    "You already have an active session. Say quit to abandon it first.".to_string()
}

// ── Cooking session ──────────────────────────────────────────────

#[must_use]
pub fn line_cooking_start(recipe_name: &str) -> String {
    format!("Cooking {recipe_name}. Here we go.")
}

#[must_use]
pub fn line_no_session() -> String {
    "No active session.".to_string()
}

#[must_use]
pub fn line_session_done() -> String {
    "All done.".to_string()
}

#[must_use]
pub fn line_last_step_done() -> String {
    "That was the last step. You're done.".to_string()
}

#[must_use]
pub fn line_skipped_last_step() -> String {
    "Skipped the last step.".to_string()
}

#[must_use]
pub fn line_skipped() -> String {
    "Skipped.".to_string()
}

#[must_use]
pub fn line_paused() -> String {
    "Paused. Timers are on hold. Say resume when ready.".to_string()
}

#[must_use]
pub fn line_not_paused() -> String {
    "Session isn't paused.".to_string()
}

#[must_use]
pub fn line_is_paused() -> String {
    "Session is paused. Say resume first.".to_string()
}

#[must_use]
pub fn line_resumed() -> String {
    "Resumed.".to_string()
}

#[must_use]
pub fn line_abandoned() -> String {
    "Session abandoned.".to_string()
}

#[must_use]
pub fn line_timer_ack() -> String {
    "Timer acknowledged.".to_string()
}

#[must_use]
pub fn line_timer_dismissed(label: &str) -> String {
    format!("{label} timer dismissed.")
}

#[must_use]
pub fn line_no_active_timers() -> String {
    "No active timers to dismiss.".to_string()
}

/// Tells the user they can move on while a timer keeps running
#[must_use]
pub fn line_can_continue(timer_label: &str) -> String {
    format!("The {timer_label} timer keeps running when you move on. Carry on.")
}

#[must_use]
pub fn line_unknown(input: &str) -> String {
    format!("Didn't catch that: {input}.")
}

// ── AI agent ─────────────────────────────────────────────────────

#[must_use]
pub fn line_ai_disabled() -> String {
    "The AI assistant is not available. Set GPT_CHAT_KEY and GPT_CHAT_ENDPOINT to enable it."
        .to_string()
}

#[must_use]
pub fn line_ai_error() -> String {
    "Something went wrong with the AI. Try again.".to_string()
}

// ── Fillers ──────────────────────────────────────────────────────
// Spoken to cover latency. Randomized to avoid repetition.

const THINKING_QUESTION: &[&str] = &[
    "Let me think about that.",
    "Good question. Give me a second.",
    "Hmm, one moment.",
    "Let me look into that for you.",
    "Hang on, thinking.",
    "Bear with me a sec.",
    "Let me consider that.",
    "One second, looking that up.",
    "That's a fair question. Hold on.",
    "Let me work that out.",
    "Give me a beat.",
    "Okay, let me think.",
];

const THINKING_MODIFY: &[&str] = &[
    "Let me see what I can do.",
    "Alright, working on that.",
    "Give me a moment to figure this out.",
    "Okay, let me adjust things.",
    "One second, reworking the recipe.",
    "Hang on, making changes.",
    "Let me sort that out for you.",
    "On it. Give me a second.",
    "Alright, let me tweak that.",
    "Hold on, recalculating.",
    "Let me see how that affects things.",
    "Working on it.",
];

const THINKING_CLASSIFY: &[&str] = &[
    "Hmm, one second.",
    "Let me figure out what you mean.",
    "Hold on.",
    "Give me a moment.",
    "One second.",
    "Let me think about that.",
];

const LISTENING: &[&str] = &[
    "I'm listening.",
    "Listening.",
    "Yes chef?",
    "What do you need?",
    "I'm here.",
    "What's up?",
    "Yes?",
];

fn pick(options: &[&str]) -> String {
    options
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

/// Random filler while a question is being processed
#[must_use]
pub fn line_thinking_question() -> String {
    pick(THINKING_QUESTION)
}

/// Random filler while a modification is being processed
#[must_use]
pub fn line_thinking_modify() -> String {
    pick(THINKING_MODIFY)
}

/// Random filler while unknown input is being classified
#[must_use]
pub fn line_thinking_classify() -> String {
    pick(THINKING_CLASSIFY)
}

/// Random acknowledgment when the wake word fires
#[must_use]
pub fn line_listening() -> String {
    pick(LISTENING)
}

/// Every thinking filler, for prefetching into the TTS cache
#[must_use]
pub fn thinking_fillers() -> Vec<String> {
    THINKING_QUESTION
        .iter()
        .chain(THINKING_MODIFY)
        .chain(THINKING_CLASSIFY)
        .map(|s| (*s).to_string())
        .collect()
}

/// Every listening acknowledgment, for prefetching
#[must_use]
pub fn listening_fillers() -> Vec<String> {
    LISTENING.iter().map(|s| (*s).to_string()).collect()
}

// ── Step narration ───────────────────────────────────────────────

/// Spoken text for a cooking step: instruction, conditions, tips, and
/// timer info in one continuous utterance
#[must_use]
pub fn line_step(
    order: u32,
    total: usize,
    instruction: &str,
    conditions: &[String],
    tips: &[String],
    timer_label: &str,
    timer_duration: Duration,
) -> String {
    let mut b = String::new();
    let _ = write!(b, "Step {order} of {total}. {instruction}");
    for c in conditions {
        let _ = write!(b, " {c}.");
    }
    for t in tips {
        let _ = write!(b, " Tip: {t}.");
    }
    if !timer_label.is_empty() {
        let _ = write!(
            b,
            " Timer set: {timer_label}, {}.",
            format_duration_speech(timer_duration)
        );
    }
    b
}

// ── Status ───────────────────────────────────────────────────────

#[must_use]
pub fn line_status(step: usize, total: usize, recipe_name: &str, active_timers: usize) -> String {
    let mut s = format!("Step {step} of {total}, cooking {recipe_name}.");
    match active_timers {
        0 => {}
        1 => s.push_str(" 1 timer running."),
        n => {
            let _ = write!(s, " {n} timers running.");
        }
    }
    s
}

// ── Helpers ──────────────────────────────────────────────────────

/// Human-friendly spoken duration: "8 minutes", "1 minute 30 seconds"
#[must_use]
pub fn format_duration_speech(d: Duration) -> String {
    let total = d.as_secs();
    let m = total / 60;
    let s = total % 60;
    match (m, s) {
        (0, s) => format!("{s} seconds"),
        (1, 0) => "1 minute".to_string(),
        (m, 0) => format!("{m} minutes"),
        (m, s) => format!("{m} minutes {s} seconds"),
    }
}
