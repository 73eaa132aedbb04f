//! Core domain types and collaborator traits
//!
//! Every other module depends on `domain`; `domain` depends on nothing
//! but the error type.

mod intent;
mod ports;
mod recipe;
mod session;

pub use intent::{Intent, IntentKind};
pub use ports::{IntentParser, Notifier, RecipeSource, SessionStore};
pub use recipe::{
    ConditionKind, Ingredient, Recipe, RecipeSummary, Step, StepCondition, TimerConfig,
};
pub use session::{Session, SessionStatus, StepState, StepStatus, TimerState, TimerStatus};
