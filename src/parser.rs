//! Keyword intent parsing
//!
//! A fixed ordered regex table plus a couple of heuristics. The AI
//! classifier (agent) is the fallback when this parser returns unknown.

use regex::Regex;

use crate::domain::{Intent, IntentKind, IntentParser};

/// Matches user input to intents using keywords and simple patterns
pub struct KeywordParser {
    rules: Vec<(Regex, IntentKind)>,
}

impl Default for KeywordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordParser {
    /// Build the parser with its fixed rule table
    ///
    /// # Panics
    ///
    /// Panics if a built-in pattern fails to compile, which would be a
    /// programming error.
    #[must_use]
    pub fn new() -> Self {
        let table: &[(&str, IntentKind)] = &[
            (r"(?i)^(next|done|continue|n|advance)$", IntentKind::Advance),
            (r"(?i)^(skip|s)$", IntentKind::Skip),
            (r"(?i)^(repeat|again|what\??|r|re)$", IntentKind::Repeat),
            (
                r"(?i)^(repeat last|say that again|what did you say|come again)$",
                IntentKind::RepeatLast,
            ),
            (r"(?i)^(pause|brb|wait|p)$", IntentKind::Pause),
            (r"(?i)^(resume|back|continue|unpause)$", IntentKind::Resume),
            (r"(?i)^(status|where|progress|info)$", IntentKind::Status),
            (r"(?i)^(quit|exit|stop|q|abandon)$", IntentKind::Quit),
            (r"(?i)^(help|h|\?)$", IntentKind::Help),
            (
                r"(?i)^(dismiss|ok|got it|acknowledged)$",
                IntentKind::DismissTimer,
            ),
            (r"(?i)^dismiss\b", IntentKind::DismissTimer),
            (r"(?i)^(list|recipes|show|browse)$", IntentKind::ListRecipes),
            (
                r"(?i)^(start|cook|go|begin|let'?s go)$",
                IntentKind::StartCooking,
            ),
            (
                r"(?i)^(timer|start timer|ready|set timer)$",
                IntentKind::StartTimer,
            ),
            // Modify verbs anchor at the start and keep the full input.
            (
                r"(?i)^(modify|change|swap|replace|double|halve|adjust|substitute)\b",
                IntentKind::Modify,
            ),
        ];
        let rules = table
            .iter()
            .map(|(pat, kind)| (Regex::new(pat).expect("intent pattern"), *kind))
            .collect();
        Self { rules }
    }
}

impl IntentParser for KeywordParser {
    fn parse(&self, input: &str) -> Intent {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Intent::new(IntentKind::Unknown);
        }

        tracing::debug!(input = %trimmed, "parsing input");

        // Recipe selection by number ("1", "2", ... up to two digits).
        if trimmed.len() <= 2 && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Intent::with_payload(IntentKind::SelectRecipe, trimmed);
        }

        for (regex, kind) in &self.rules {
            if regex.is_match(trimmed) {
                tracing::debug!(intent = %kind, "matched intent");
                // Modify and dismiss carry the whole input downstream.
                if matches!(kind, IntentKind::Modify | IntentKind::DismissTimer) {
                    return Intent::with_payload(*kind, trimmed);
                }
                return Intent::new(*kind);
            }
        }

        // "select X" / "pick X" with an explicit payload.
        let lower = trimmed.to_lowercase();
        for prefix in ["select ", "pick "] {
            if lower.starts_with(prefix) {
                let payload = trimmed[prefix.len()..].trim();
                if !payload.is_empty() {
                    return Intent::with_payload(IntentKind::SelectRecipe, payload);
                }
            }
        }

        if is_question(trimmed) {
            return Intent::with_payload(IntentKind::AskQuestion, trimmed);
        }

        tracing::debug!("no match, returning unknown intent");
        Intent::with_payload(IntentKind::Unknown, trimmed)
    }
}

/// Common English question starters
const QUESTION_PREFIXES: &[&str] = &[
    "how", "what", "why", "when", "where", "who", "can", "could", "should", "would", "will", "do",
    "does", "is", "are", "am i", "tell me", "explain",
];

fn is_question(s: &str) -> bool {
    if s.ends_with('?') {
        return true;
    }
    let lower = s.to_lowercase();
    QUESTION_PREFIXES
        .iter()
        .any(|p| lower == *p || lower.starts_with(&format!("{p} ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Intent {
        KeywordParser::new().parse(input)
    }

    #[test]
    fn empty_input_is_unknown() {
        assert_eq!(parse("").kind, IntentKind::Unknown);
        assert_eq!(parse("   ").kind, IntentKind::Unknown);
    }

    #[test]
    fn digits_select_a_recipe() {
        let intent = parse("2");
        assert_eq!(intent.kind, IntentKind::SelectRecipe);
        assert_eq!(intent.payload, "2");

        assert_eq!(parse("12").kind, IntentKind::SelectRecipe);
        // Three digits is not a menu pick.
        assert_ne!(parse("123").kind, IntentKind::SelectRecipe);
    }

    #[test]
    fn core_verbs_match_case_insensitively() {
        let cases = [
            ("next", IntentKind::Advance),
            ("DONE", IntentKind::Advance),
            ("n", IntentKind::Advance),
            ("skip", IntentKind::Skip),
            ("repeat", IntentKind::Repeat),
            ("again", IntentKind::Repeat),
            ("repeat last", IntentKind::RepeatLast),
            ("say that again", IntentKind::RepeatLast),
            ("pause", IntentKind::Pause),
            ("brb", IntentKind::Pause),
            ("resume", IntentKind::Resume),
            ("unpause", IntentKind::Resume),
            ("status", IntentKind::Status),
            ("where", IntentKind::Status),
            ("quit", IntentKind::Quit),
            ("exit", IntentKind::Quit),
            ("help", IntentKind::Help),
            ("?", IntentKind::Help),
            ("ok", IntentKind::DismissTimer),
            ("got it", IntentKind::DismissTimer),
            ("list", IntentKind::ListRecipes),
            ("start", IntentKind::StartCooking),
            ("let's go", IntentKind::StartCooking),
            ("timer", IntentKind::StartTimer),
            ("ready", IntentKind::StartTimer),
        ];
        for (input, want) in cases {
            assert_eq!(parse(input).kind, want, "input {input:?}");
        }
    }

    #[test]
    fn dismiss_with_description_keeps_payload() {
        let intent = parse("dismiss the simmer timer");
        assert_eq!(intent.kind, IntentKind::DismissTimer);
        assert_eq!(intent.payload, "dismiss the simmer timer");
    }

    #[test]
    fn modify_verbs_keep_full_input() {
        let intent = parse("double the servings");
        assert_eq!(intent.kind, IntentKind::Modify);
        assert_eq!(intent.payload, "double the servings");

        let intent = parse("swap butter for olive oil");
        assert_eq!(intent.kind, IntentKind::Modify);

        let intent = parse("substitute gruyere with parmesan");
        assert_eq!(intent.kind, IntentKind::Modify);
    }

    #[test]
    fn select_and_pick_with_payload() {
        let intent = parse("select 3");
        assert_eq!(intent.kind, IntentKind::SelectRecipe);
        assert_eq!(intent.payload, "3");

        let intent = parse("pick the pasta");
        assert_eq!(intent.kind, IntentKind::SelectRecipe);
        assert_eq!(intent.payload, "the pasta");
    }

    #[test]
    fn questions_are_detected() {
        let intent = parse("can I use butter instead of margarine");
        assert_eq!(intent.kind, IntentKind::AskQuestion);
        assert_eq!(intent.payload, "can I use butter instead of margarine");

        assert_eq!(parse("the water looks cloudy?").kind, IntentKind::AskQuestion);
        assert_eq!(parse("how long do I sear this").kind, IntentKind::AskQuestion);
        assert_eq!(parse("tell me about step 4").kind, IntentKind::AskQuestion);
    }

    #[test]
    fn gibberish_is_unknown_with_payload() {
        let intent = parse("flibber jabber");
        assert_eq!(intent.kind, IntentKind::Unknown);
        assert_eq!(intent.payload, "flibber jabber");
    }

    #[test]
    fn bare_what_is_repeat_not_question() {
        // "what" alone means "say that again" in a kitchen.
        assert_eq!(parse("what").kind, IntentKind::Repeat);
        assert_eq!(parse("what?").kind, IntentKind::Repeat);
    }
}
