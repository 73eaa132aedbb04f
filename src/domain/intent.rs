//! Parsed user intents

use std::fmt;

/// What the user wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Unknown,
    ListRecipes,
    SelectRecipe,
    StartCooking,
    Advance,
    Skip,
    Repeat,
    /// Replay the last thing the mouth said
    RepeatLast,
    Pause,
    Resume,
    Status,
    Quit,
    Help,
    DismissTimer,
    /// Free-form question sent to the AI agent
    AskQuestion,
    /// The AI should change something (recipe, servings, etc.)
    Modify,
    /// User confirms they're ready, start pending timers
    StartTimer,
}

impl IntentKind {
    /// Parse a snake_case intent name, as returned by the classifier.
    /// Unrecognized names map to `Unknown`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "list_recipes" => Self::ListRecipes,
            "select_recipe" => Self::SelectRecipe,
            "start_cooking" => Self::StartCooking,
            "advance" => Self::Advance,
            "skip" => Self::Skip,
            "repeat" => Self::Repeat,
            "repeat_last" => Self::RepeatLast,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "status" => Self::Status,
            "quit" => Self::Quit,
            "help" => Self::Help,
            "dismiss_timer" => Self::DismissTimer,
            "ask_question" => Self::AskQuestion,
            "modify" => Self::Modify,
            "start_timer" => Self::StartTimer,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::ListRecipes => "list_recipes",
            Self::SelectRecipe => "select_recipe",
            Self::StartCooking => "start_cooking",
            Self::Advance => "advance",
            Self::Skip => "skip",
            Self::Repeat => "repeat",
            Self::RepeatLast => "repeat_last",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Status => "status",
            Self::Quit => "quit",
            Self::Help => "help",
            Self::DismissTimer => "dismiss_timer",
            Self::AskQuestion => "ask_question",
            Self::Modify => "modify",
            Self::StartTimer => "start_timer",
        };
        f.write_str(s)
    }
}

/// A parsed user action with optional free-form payload
#[derive(Debug, Clone)]
pub struct Intent {
    pub kind: IntentKind,
    /// Context such as a recipe number for select, or the full input
    /// for modify / dismiss / questions
    pub payload: String,
}

impl Intent {
    #[must_use]
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            payload: String::new(),
        }
    }

    #[must_use]
    pub fn with_payload(kind: IntentKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }
}
