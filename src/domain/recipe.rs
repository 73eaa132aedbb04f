//! Recipe data model

use std::time::Duration;

/// A complete cooking recipe
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub description: String,
    pub servings: u32,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub tags: Vec<String>,
    /// Monotonic version, incremented on every successful update
    pub version: u32,
}

/// Lightweight recipe view for listings
#[derive(Debug, Clone)]
pub struct RecipeSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// A single ingredient with human-style quantities
///
/// A quantity of 0 means "to taste".
#[derive(Debug, Clone)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    /// "pieces", "cups", "tablespoons", "grams", ""
    pub unit: String,
    /// "small", "medium", "large", "grated", ""
    pub size_descriptor: String,
    pub optional: bool,
}

/// A single cooking step
#[derive(Debug, Clone)]
pub struct Step {
    pub id: String,
    /// 1-based position in the recipe
    pub order: u32,
    pub instruction: String,
    /// Expected duration, zero if untimed
    pub duration: Duration,
    pub conditions: Vec<StepCondition>,
    /// Suggestions like "while waiting, chop X"
    pub parallel_hints: Vec<String>,
    pub timer: Option<TimerConfig>,
}

/// How step completion is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// The user confirms completion
    Manual,
    /// The step completes after a duration
    Time,
    /// A visual cue ("golden brown")
    Visual,
    /// A temperature target
    Temperature,
}

/// A completion condition attached to a step
#[derive(Debug, Clone)]
pub struct StepCondition {
    pub kind: ConditionKind,
    pub description: String,
}

/// An optional countdown timer attached to a step
#[derive(Debug, Clone)]
pub struct TimerConfig {
    pub duration: Duration,
    pub label: String,
}
