//! Structured modification actions returned by the model

use std::time::Duration;

use serde::Deserialize;

/// What kind of recipe modification an action performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    UpdateIngredient,
    RemoveIngredient,
    AddIngredient,
    UpdateStep,
    RemoveStep,
    AddStep,
    UpdateServings,
    UpdateTimer,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpdateIngredient => "update_ingredient",
            Self::RemoveIngredient => "remove_ingredient",
            Self::AddIngredient => "add_ingredient",
            Self::UpdateStep => "update_step",
            Self::RemoveStep => "remove_step",
            Self::AddStep => "add_step",
            Self::UpdateServings => "update_servings",
            Self::UpdateTimer => "update_timer",
        }
    }
}

/// The structured JSON the model returns for modification requests
#[derive(Debug, Clone, Deserialize)]
pub struct ModifyResponse {
    /// Ordered mutations to apply to the recipe
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Short, TTS-friendly confirmation spoken to the user
    #[serde(default)]
    pub summary: String,
}

impl ModifyResponse {
    /// A response with no actions, used when the model's output can't
    /// be parsed; the raw text becomes the spoken summary.
    #[must_use]
    pub fn summary_only(summary: impl Into<String>) -> Self {
        Self {
            actions: Vec::new(),
            summary: summary.into(),
        }
    }
}

/// The JSON the model returns for timer dismissal
#[derive(Debug, Clone, Deserialize)]
pub struct DismissTimerResponse {
    #[serde(default)]
    pub timer_ids: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// A single recipe mutation. Which fields matter depends on `kind`;
/// missing fields mean "leave unchanged".
#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,

    // Ingredient fields (update/add/remove)
    #[serde(default)]
    pub ingredient_name: String,
    #[serde(default)]
    pub new_ingredient_name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub size_descriptor: String,

    // Step fields (update/add/remove), 1-based
    #[serde(default)]
    pub step_index: i64,
    #[serde(default)]
    pub instruction: String,

    // Timer fields
    #[serde(default)]
    pub timer_label: String,
    /// Suffix-formatted, e.g. "5m", "30s", "1h2m"
    #[serde(default)]
    pub timer_duration: String,

    // Servings
    #[serde(default)]
    pub servings: i64,
}

impl Action {
    /// Parse the timer duration field, or zero if absent/invalid
    #[must_use]
    pub fn parsed_timer_duration(&self) -> Duration {
        parse_duration(&self.timer_duration).unwrap_or(Duration::ZERO)
    }
}

/// Parse a suffix-formatted duration like "10m", "30s", "1h2m", "1h2m3s".
/// Returns `None` for anything else.
#[must_use]
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut total = 0u64;
    let mut digits = String::new();
    let mut saw_unit = false;

    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: u64 = digits.parse().ok()?;
        digits.clear();
        let mult = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total += value * mult;
        saw_unit = true;
    }

    // Trailing digits without a unit make the whole string invalid.
    if !digits.is_empty() || !saw_unit {
        return None;
    }
    Some(Duration::from_secs(total))
}
