//! OttoCook, a conversational chef assistant.
//!
//! Guides a user through a recipe one step at a time, keeps any number
//! of background timers counting down with escalating reminders, and
//! speaks/listens when the speech stack is enabled.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     Inputs                           │
//! │       keyboard          │        Ear (wake + STT)    │
//! └───────────┬─────────────┴─────────────┬──────────────┘
//!             │        intent parser      │
//! ┌───────────▼───────────────────────────▼──────────────┐
//! │                  Orchestrator (app)                  │
//! │   Engine  │  AI agent  │  Mouth (TTS)  │  Notifier  │
//! └───────────┬──────────────────────────────────────────┘
//!             │ session store
//! ┌───────────▼──────────────────────────────────────────┐
//! │        Timer supervisor  +  session watcher          │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod app;
pub mod domain;
pub mod engine;
pub mod error;
pub mod parser;
pub mod recipes;
pub mod speech;
pub mod store;
pub mod timers;
pub mod ui;
pub mod wakeword;

pub use app::App;
pub use engine::Engine;
pub use error::{Error, Result};
pub use parser::KeywordParser;
pub use recipes::MemorySource;
pub use store::MemoryStore;
pub use timers::{Supervisor, SupervisorConfig, Watcher, WatcherConfig};
