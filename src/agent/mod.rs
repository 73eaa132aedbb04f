//! AI agent: cooking-context prompt building and structured responses.
//!
//! Wraps the chat client with the four cooking operations. Responses
//! degrade gracefully: unparseable structured output becomes a
//! summary-only response, and classification falls back to unknown.

mod actions;
mod apply;
mod client;
mod prompts;

pub use actions::{parse_duration, Action, ActionKind, DismissTimerResponse, ModifyResponse};
pub use apply::apply_actions;
pub use client::{ChatClient, Message, ROLE_ASSISTANT, ROLE_SYSTEM, ROLE_USER};

use std::fmt::Write as _;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;

use crate::domain::{Intent, IntentKind, Recipe, Session, TimerStatus};
use crate::timers::format_duration;
use crate::Result;

/// The single entry point for AI-powered features
pub struct Agent {
    client: ChatClient,
}

impl Agent {
    #[must_use]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Answer a free-form question with full cooking context
    ///
    /// # Errors
    ///
    /// Propagates backend failures; the orchestrator maps them to a
    /// spoken error line.
    pub async fn ask_question(
        &self,
        question: &str,
        recipe: Option<&Recipe>,
        session: Option<&Session>,
    ) -> Result<String> {
        let messages = build_messages(prompts::PROMPT_QUESTION, question, recipe, session);
        self.client.chat(&messages).await
    }

    /// Turn a modification request into structured actions
    ///
    /// # Errors
    ///
    /// Propagates backend failures. An unparseable reply is not an
    /// error: it comes back as a summary-only response.
    pub async fn modify(
        &self,
        request: &str,
        recipe: Option<&Recipe>,
        session: Option<&Session>,
    ) -> Result<ModifyResponse> {
        let messages = build_messages(prompts::PROMPT_MODIFY, request, recipe, session);
        let raw = self.client.chat(&messages).await?;
        let raw = strip_code_fence(&raw);

        match serde_json::from_str::<ModifyResponse>(raw) {
            Ok(resp) => {
                tracing::debug!(
                    actions = resp.actions.len(),
                    summary = %truncate(&resp.summary, 80),
                    "modify response"
                );
                Ok(resp)
            }
            Err(e) => {
                tracing::error!(error = %e, raw = %raw, "failed to parse modify JSON");
                Ok(ModifyResponse::summary_only(raw))
            }
        }
    }

    /// Ask which timer(s) the user wants dismissed
    ///
    /// # Errors
    ///
    /// Propagates backend failures; unparseable replies degrade to a
    /// summary-only response.
    pub async fn dismiss_timer(
        &self,
        request: &str,
        recipe: Option<&Recipe>,
        session: Option<&Session>,
    ) -> Result<DismissTimerResponse> {
        let messages = build_messages(prompts::PROMPT_DISMISS_TIMER, request, recipe, session);
        let raw = self.client.chat(&messages).await?;
        let raw = strip_code_fence(&raw);

        match serde_json::from_str::<DismissTimerResponse>(raw) {
            Ok(resp) => {
                tracing::debug!(ids = ?resp.timer_ids, summary = %resp.summary, "dismiss timer response");
                Ok(resp)
            }
            Err(e) => {
                tracing::error!(error = %e, raw = %raw, "failed to parse dismiss timer JSON");
                Ok(DismissTimerResponse {
                    timer_ids: Vec::new(),
                    summary: raw.to_string(),
                })
            }
        }
    }

    /// Classify input the keyword parser couldn't handle
    ///
    /// # Errors
    ///
    /// Propagates backend failures; unparseable replies come back as
    /// an unknown intent carrying the original input.
    pub async fn classify(
        &self,
        input: &str,
        recipe: Option<&Recipe>,
        session: Option<&Session>,
    ) -> Result<Intent> {
        #[derive(Deserialize)]
        struct ClassifyResponse {
            #[serde(default)]
            intent: String,
            #[serde(default)]
            payload: String,
        }

        let messages = build_messages(prompts::PROMPT_CLASSIFY, input, recipe, session);
        let raw = self.client.chat(&messages).await?;
        let raw = strip_code_fence(&raw);

        let Ok(resp) = serde_json::from_str::<ClassifyResponse>(raw) else {
            tracing::error!(raw = %raw, "failed to parse classify JSON");
            return Ok(Intent::with_payload(IntentKind::Unknown, input));
        };

        let kind = IntentKind::from_name(&resp.intent);
        tracing::debug!(input = %input, intent = %kind, payload = %resp.payload, "classified");

        let payload = if resp.payload.is_empty() {
            input.to_string()
        } else {
            resp.payload
        };
        Ok(Intent::with_payload(kind, payload))
    }
}

/// Assemble `[system, context, ack, query]`. The context block is
/// skipped when there's no recipe, and the fake assistant ack keeps the
/// model treating the context as established history.
fn build_messages(
    system_prompt: &str,
    user_query: &str,
    recipe: Option<&Recipe>,
    session: Option<&Session>,
) -> Vec<Message> {
    let mut msgs = vec![Message::text(ROLE_SYSTEM, system_prompt)];

    if let Some(block) = build_context(recipe, session) {
        msgs.push(Message::text(ROLE_USER, block));
        msgs.push(Message::text(ROLE_ASSISTANT, "Got it, I have the context."));
    }

    msgs.push(Message::text(ROLE_USER, user_query));
    msgs
}

/// Serialize the recipe and session into a plain-text block the model
/// can reason over: full recipe, numbered steps with timer annotations,
/// session status, current-step detail, per-step progress, and per-timer
/// state.
fn build_context(recipe: Option<&Recipe>, session: Option<&Session>) -> Option<String> {
    let recipe = recipe?;

    let mut b = String::new();
    b.push_str("[Current Recipe Context]\n");
    let _ = writeln!(b, "Recipe: {}", recipe.name);
    let _ = writeln!(b, "Description: {}", recipe.description);
    let _ = writeln!(b, "Servings: {}", recipe.servings);

    b.push_str("\nIngredients:\n");
    for ing in &recipe.ingredients {
        let opt = if ing.optional { " (optional)" } else { "" };
        if ing.quantity > 0.0 {
            let qualifier = if ing.size_descriptor.is_empty() {
                &ing.unit
            } else {
                &ing.size_descriptor
            };
            let _ = writeln!(b, "- {:.0} {} {}{}", ing.quantity, qualifier, ing.name, opt);
        } else {
            let _ = writeln!(b, "- {}{}", ing.name, opt);
        }
    }

    b.push_str("\nSteps:\n");
    for step in &recipe.steps {
        let _ = write!(b, "{}. {}", step.order, step.instruction);
        match &step.timer {
            Some(cfg) => {
                let _ = write!(
                    b,
                    " [has timer: {}, {}]",
                    cfg.label,
                    format_duration(cfg.duration)
                );
            }
            None => b.push_str(" [no timer]"),
        }
        b.push('\n');
        for c in &step.conditions {
            let _ = writeln!(b, "   condition: {}", c.description);
        }
    }

    match session {
        Some(session) => {
            b.push_str("\n[Session State]\n");
            let _ = writeln!(b, "Status: {}", session.status);

            let total = recipe.steps.len();
            let current = session.current_step_index;
            let _ = writeln!(b, "Current step: {} of {}", current + 1, total);
            let elapsed = (Utc::now() - session.started_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            let _ = writeln!(b, "Elapsed: {}", format_duration(elapsed));

            if let Some(step) = recipe.steps.get(current) {
                b.push_str("\n[Current Step Detail]\n");
                let _ = writeln!(b, "Step {}: {}", step.order, step.instruction);
                match &step.timer {
                    Some(cfg) => {
                        let _ = writeln!(
                            b,
                            "This step has a timer: {} ({})",
                            cfg.label,
                            format_duration(cfg.duration)
                        );
                    }
                    None => b.push_str("This step does NOT have a timer.\n"),
                }
                for c in &step.conditions {
                    let _ = writeln!(b, "Done when: {}", c.description);
                }
            }

            b.push_str("\n[Step Progress]\n");
            for (i, step) in recipe.steps.iter().enumerate() {
                let status = session
                    .step_states
                    .get(&i)
                    .map(|ss| ss.status.to_string())
                    .unwrap_or_else(|| "pending".to_string());
                let _ = writeln!(
                    b,
                    "Step {} ({}): {}",
                    step.order,
                    status,
                    truncate(&step.instruction, 50)
                );
            }

            b.push_str("\n[Timers]\n");
            let mut running = Vec::new();
            let mut paused = Vec::new();
            let mut fired = Vec::new();
            let mut ids: Vec<&String> = session.timer_states.keys().collect();
            ids.sort();
            for id in ids {
                let ts = &session.timer_states[id];
                match ts.status {
                    TimerStatus::Running => running.push(format!(
                        "{}: {} remaining",
                        ts.label,
                        format_duration(ts.remaining)
                    )),
                    TimerStatus::Paused => paused.push(format!(
                        "{}: paused ({} remaining)",
                        ts.label,
                        format_duration(ts.remaining)
                    )),
                    TimerStatus::Fired => fired.push(format!(
                        "{}: DONE — waiting for acknowledgment",
                        ts.label
                    )),
                    _ => {}
                }
            }
            if running.is_empty() && paused.is_empty() && fired.is_empty() {
                b.push_str("No active timers.\n");
            } else {
                for s in &running {
                    let _ = writeln!(b, "RUNNING: {s}");
                }
                for s in &paused {
                    let _ = writeln!(b, "PAUSED: {s}");
                }
                for s in &fired {
                    let _ = writeln!(b, "FIRED: {s}");
                }
            }
        }
        None => {
            b.push_str("\n[No active cooking session — user is browsing recipes.]\n");
        }
    }

    Some(b)
}

/// Remove ```json ... ``` wrappers that models love to add
fn strip_code_fence(s: &str) -> &str {
    let s = s.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop the opening fence line (possibly "```json").
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    // Drop the closing fence.
    let rest = match rest.rfind("```") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    rest.trim()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
