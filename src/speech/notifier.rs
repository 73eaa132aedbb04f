//! Speaking notifier: prints and speaks every notification.

use std::sync::Arc;

use regex::Regex;

use crate::domain::Notifier;
use crate::Result;

use super::mouth::{AudioSink, Mouth, Synthesizer};
use super::Priority;

/// Wraps a printing notifier and also routes messages through the
/// Mouth: normal notifications speak at normal priority, urgent ones
/// at high priority.
pub struct SpeakingNotifier<T, P> {
    text: Arc<dyn Notifier>,
    mouth: Mouth<T, P>,
    bracket_prefix: Regex,
    ansi_codes: Regex,
}

impl<T: Synthesizer, P: AudioSink> SpeakingNotifier<T, P> {
    /// Create a notifier that both prints and speaks
    ///
    /// # Panics
    ///
    /// Panics if the built-in cleanup patterns fail to compile.
    #[must_use]
    pub fn new(text: Arc<dyn Notifier>, mouth: Mouth<T, P>) -> Self {
        Self {
            text,
            mouth,
            bracket_prefix: Regex::new(r"^\[[A-Za-z]+\]\s*").expect("prefix pattern"),
            ansi_codes: Regex::new(r"\x1b\[[0-9;]*m").expect("ansi pattern"),
        }
    }

    /// Strip formatting artifacts that shouldn't be spoken: ANSI codes
    /// and a leading `[Label]` prefix.
    fn clean_for_speech(&self, msg: &str) -> String {
        let cleaned = self.ansi_codes.replace_all(msg, "");
        let cleaned = self.bracket_prefix.replace(&cleaned, "");
        cleaned.trim().to_string()
    }
}

impl<T: Synthesizer, P: AudioSink> Notifier for SpeakingNotifier<T, P> {
    fn notify(&self, message: &str) -> Result<()> {
        self.text.notify(message)?;
        self.mouth.say(&self.clean_for_speech(message), Priority::Normal);
        Ok(())
    }

    fn notify_urgent(&self, message: &str) -> Result<()> {
        self.text.notify_urgent(message)?;
        self.mouth.say(&self.clean_for_speech(message), Priority::High);
        Ok(())
    }
}
