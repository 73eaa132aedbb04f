//! Console output styling and the printing notifier
//!
//! The terminal rendering itself is deliberately plain: styled lines
//! to stdout, nothing stateful. The orchestrator is the only writer.

use crate::domain::Notifier;
use crate::Result;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";

/// Styled stdout printing
#[derive(Clone, Copy, Default)]
pub struct Console;

impl Console {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Section headers: step banners, list titles
    pub fn step(&self, text: &str) {
        println!("{BOLD}{GREEN}{text}{RESET}");
    }

    /// Body text: instructions, list entries
    pub fn instruction(&self, text: &str) {
        println!("{text}");
    }

    /// Secondary detail: conditions, tips, metadata
    pub fn hint(&self, text: &str) {
        println!("{DIM}{text}{RESET}");
    }

    /// Conversational lines the assistant also speaks
    pub fn chat(&self, text: &str) {
        println!("{CYAN}{text}{RESET}");
    }

    /// Urgent attention-grabbing lines
    pub fn urgent(&self, text: &str) {
        println!("{BOLD}{RED}{text}{RESET}");
    }

    /// Echo of a recognized voice command
    pub fn voice(&self, text: &str) {
        println!("{YELLOW}[heard] {text}{RESET}");
    }

    pub fn blank(&self) {
        println!();
    }
}

/// Notifier that writes styled lines to stdout
pub struct CliNotifier {
    console: Console,
}

impl CliNotifier {
    #[must_use]
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl Notifier for CliNotifier {
    fn notify(&self, message: &str) -> Result<()> {
        tracing::debug!(message = %message, "notify");
        println!("{CYAN}{BOLD}{message}{RESET}");
        Ok(())
    }

    fn notify_urgent(&self, message: &str) -> Result<()> {
        tracing::debug!(message = %message, "notify urgent");
        self.console.urgent(message);
        Ok(())
    }
}
