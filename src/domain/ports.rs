//! Collaborator traits
//!
//! Each collaborator is a small capability set. Implementations can be
//! in-memory, file-based, API-backed, or model-powered.

use std::sync::{Arc, Mutex};

use crate::Result;

use super::{Intent, Recipe, RecipeSummary, Session};

/// Provides recipes
pub trait RecipeSource: Send + Sync {
    /// List all recipes, sorted by name
    fn list(&self) -> Result<Vec<RecipeSummary>>;

    /// Fetch a full recipe by id
    fn get(&self, id: &str) -> Result<Recipe>;

    /// Case-insensitive substring search against name/description/tags
    fn search(&self, query: &str) -> Result<Vec<RecipeSummary>>;

    /// Replace a recipe in place, bumping its version. Sources that do
    /// not support mutation return `Error::NotImplemented`.
    fn update(&self, _recipe: &Recipe) -> Result<()> {
        Err(crate::Error::NotImplemented)
    }
}

/// Persists cooking sessions
///
/// Readers may proceed concurrently; saves and deletes are mutually
/// exclusive with readers and each other.
pub trait SessionStore: Send + Sync {
    /// Upsert a session
    fn save(&self, session: &Session) -> Result<()>;

    /// Load a session by id
    fn load(&self, id: &str) -> Result<Session>;

    /// Remove a session by id
    fn delete(&self, id: &str) -> Result<()>;

    /// Every session whose status is active or paused
    fn list_active(&self) -> Result<Vec<Session>>;

    /// Per-session critical-section handle. The engine and the timer
    /// supervisor hold this for the whole load -> mutate -> save sequence
    /// so a concurrent mutation never sees a partial update.
    fn lock_for(&self, id: &str) -> Arc<Mutex<()>>;
}

/// Converts raw user input into structured intents
pub trait IntentParser: Send + Sync {
    fn parse(&self, input: &str) -> Intent;
}

/// Delivers messages to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> Result<()>;
    fn notify_urgent(&self, message: &str) -> Result<()>;
}
