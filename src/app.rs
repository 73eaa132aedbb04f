//! The orchestrator wires inputs to engine mutations.
//!
//! Reads typed and voice input off their channels, parses intents,
//! and drives the engine, the agent, and the speech pipeline. This is
//! the only component that holds "which session am I in" state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::agent::{apply_actions, Agent};
use crate::domain::{
    Intent, IntentKind, IntentParser, Recipe, RecipeSource, Session, SessionStore, TimerStatus,
};
use crate::engine::Engine;
use crate::speech::{self, AudioSink, Mouth, Priority, Synthesizer};
use crate::timers::format_duration;
use crate::ui::Console;
use crate::Error;

/// Top-level application loop
pub struct App<R, S, T, P> {
    engine: Arc<Engine<R, S>>,
    parser: Arc<dyn IntentParser>,
    mouth: Option<Mouth<T, P>>,
    agent: Option<Agent>,
    ui: Console,
    shutdown_tx: watch::Sender<bool>,
    /// Current active session, if any
    session_id: Option<String>,
    /// Recipe chosen before typing 'start'
    selected_recipe: Option<String>,
}

impl<R, S, T, P> App<R, S, T, P>
where
    R: RecipeSource,
    S: SessionStore,
    T: Synthesizer,
    P: AudioSink,
{
    pub fn new(
        engine: Arc<Engine<R, S>>,
        parser: Arc<dyn IntentParser>,
        mouth: Option<Mouth<T, P>>,
        agent: Option<Agent>,
        ui: Console,
        shutdown_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            engine,
            parser,
            mouth,
            agent,
            ui,
            shutdown_tx,
            session_id: None,
            selected_recipe: None,
        }
    }

    /// Print a conversational line and queue it for speech. Raw
    /// formatting (menus, tables) goes through `ui` directly instead;
    /// that output shouldn't be spoken.
    fn say(&self, text: &str, priority: Priority) {
        self.ui.chat(text);
        if let Some(mouth) = &self.mouth {
            mouth.say(text, priority);
        }
    }

    /// Main input loop. Returns when the shutdown flag flips or every
    /// input channel closes.
    pub async fn run(
        &mut self,
        mut typed: mpsc::Receiver<String>,
        voice: Option<mpsc::Receiver<String>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        self.say(&speech::line_welcome(), Priority::Normal);
        self.ui.blank();
        self.show_recipes();

        let mut voice = voice;

        loop {
            let input = tokio::select! {
                _ = shutdown.changed() => return,
                line = typed.recv() => match line {
                    Some(line) => line,
                    None => return,
                },
                heard = recv_voice(&mut voice) => {
                    // Echo what was heard so it shows up in the log.
                    self.ui.voice(&heard);
                    heard
                }
            };

            let input = input.trim().to_string();
            if input.is_empty() {
                continue;
            }

            let intent = self.parser.parse(&input);
            tracing::debug!(intent = %intent.kind, payload = %intent.payload, "intent");

            let mut next = Some(intent);
            while let Some(i) = next.take() {
                next = self.dispatch(i).await;
            }

            if *shutdown.borrow() {
                return;
            }
        }
    }

    /// Handle one intent. Returns a follow-up intent when AI
    /// classification re-dispatches unrecognized input.
    async fn dispatch(&mut self, intent: Intent) -> Option<Intent> {
        // Action intents cut off whatever is being spoken so the
        // assistant doesn't talk over its own response.
        if !matches!(
            intent.kind,
            IntentKind::Help | IntentKind::StartTimer | IntentKind::Unknown
        ) {
            if let Some(mouth) = &self.mouth {
                mouth.interrupt();
            }
        }

        match intent.kind {
            IntentKind::Help => self.show_help(),
            IntentKind::ListRecipes => self.show_recipes(),
            IntentKind::SelectRecipe => self.select_recipe(&intent.payload),
            IntentKind::StartCooking => self.start_cooking(),
            IntentKind::Advance => self.advance(),
            IntentKind::Skip => self.skip(),
            IntentKind::Repeat => self.repeat(),
            IntentKind::RepeatLast => self.repeat_last(),
            IntentKind::Pause => self.pause(),
            IntentKind::Resume => self.resume(),
            IntentKind::Status => self.status(),
            IntentKind::Quit => self.quit().await,
            IntentKind::DismissTimer => self.dismiss_timer(&intent.payload).await,
            IntentKind::StartTimer => self.start_timer(),
            IntentKind::AskQuestion => self.ask_question(&intent.payload).await,
            IntentKind::Modify => self.modify_request(&intent.payload).await,
            IntentKind::Unknown => return self.classify(&intent).await,
        }
        None
    }

    /// Send unrecognized input to the AI for classification; the
    /// caller re-dispatches whatever comes back.
    async fn classify(&mut self, original: &Intent) -> Option<Intent> {
        let Some(agent) = &self.agent else {
            self.say(&speech::line_unknown(&original.payload), Priority::Low);
            return None;
        };

        let filler = speech::line_thinking_classify();
        self.ui.hint(&filler);
        if let Some(mouth) = &self.mouth {
            mouth.say(&filler, Priority::Critical);
        }

        let (recipe, session) = self.gather_context();
        let classified = match agent
            .classify(&original.payload, recipe.as_ref(), session.as_ref())
            .await
        {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "AI classify failed");
                self.say(&speech::line_unknown(&original.payload), Priority::Low);
                return None;
            }
        };

        if classified.kind == IntentKind::Unknown {
            self.say(&speech::line_unknown(&original.payload), Priority::Low);
            return None;
        }

        tracing::info!(input = %original.payload, intent = %classified.kind, "classified");
        Some(classified)
    }

    // ── AI handlers ──────────────────────────────────────────────

    async fn ask_question(&mut self, question: &str) {
        let Some(agent) = &self.agent else {
            self.say(&speech::line_ai_disabled(), Priority::Low);
            return;
        };

        let filler = speech::line_thinking_question();
        self.ui.hint(&filler);
        if let Some(mouth) = &self.mouth {
            mouth.say(&filler, Priority::Critical);
        }

        let (recipe, session) = self.gather_context();
        match agent
            .ask_question(question, recipe.as_ref(), session.as_ref())
            .await
        {
            Ok(answer) => self.say(&answer, Priority::High),
            Err(e) => {
                tracing::error!(error = %e, "AI question failed");
                self.say(&speech::line_ai_error(), Priority::Normal);
            }
        }
    }

    async fn modify_request(&mut self, request: &str) {
        let Some(agent) = &self.agent else {
            self.say(&speech::line_ai_disabled(), Priority::Low);
            return;
        };

        let filler = speech::line_thinking_modify();
        self.ui.hint(&filler);
        if let Some(mouth) = &self.mouth {
            mouth.say(&filler, Priority::Critical);
        }

        let (recipe, session) = self.gather_context();
        let Some(mut recipe) = recipe else {
            self.say(&speech::line_pick_recipe_first(), Priority::Normal);
            return;
        };

        let resp = match agent
            .modify(request, Some(&recipe), session.as_ref())
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = %e, "AI modify failed");
                self.say(&speech::line_ai_error(), Priority::Normal);
                return;
            }
        };

        if !resp.actions.is_empty() {
            if let Err(e) = apply_actions(&mut recipe, &resp.actions) {
                tracing::error!(error = %e, "applying modifications failed");
                self.ui.urgent(&format!("Error applying changes: {e}"));
                self.say(&speech::line_ai_error(), Priority::Normal);
                return;
            }

            if let Err(e) = self.engine.update_recipe(&recipe) {
                tracing::error!(error = %e, "persisting recipe update failed");
            }

            self.ui
                .step(&format!("{} modification(s) applied", resp.actions.len()));
            for (i, act) in resp.actions.iter().enumerate() {
                let mut line = format!("{}. {}", i + 1, act.kind.as_str());
                if !act.ingredient_name.is_empty() {
                    line.push_str(": ");
                    line.push_str(&act.ingredient_name);
                }
                if act.step_index > 0 {
                    line.push_str(&format!(" (step {})", act.step_index));
                }
                self.ui.instruction(&line);
            }
        }

        self.say(&resp.summary, Priority::High);
    }

    /// Load the current recipe and session for AI context
    fn gather_context(&self) -> (Option<Recipe>, Option<Session>) {
        let mut recipe_id = self.selected_recipe.clone();
        let mut session = None;

        if let Some(id) = &self.session_id {
            if let Ok(s) = self.engine.status(id) {
                recipe_id = Some(s.recipe_id.clone());
                session = Some(s);
            }
        }
        let recipe = recipe_id.and_then(|id| self.engine.get_recipe(&id).ok());
        (recipe, session)
    }

    // ── Recipe browsing ──────────────────────────────────────────

    fn show_recipes(&self) {
        let recipes = match self.engine.list_recipes() {
            Ok(r) => r,
            Err(e) => {
                self.ui.urgent(&format!("Error loading recipes: {e}"));
                return;
            }
        };

        self.ui.step("Available recipes:");
        self.ui.blank();
        for (i, r) in recipes.iter().enumerate() {
            self.ui.instruction(&format!("[{}] {}", i + 1, r.name));
            self.ui.hint(&r.description);
            if !r.tags.is_empty() {
                self.ui.hint(&format!("Tags: {}", r.tags.join(", ")));
            }
            self.ui.blank();
        }
        self.ui
            .chat("Pick a recipe by number, or type 'help' for commands.");
    }

    fn select_recipe(&mut self, payload: &str) {
        let recipes = match self.engine.list_recipes() {
            Ok(r) => r,
            Err(e) => {
                self.ui.urgent(&format!("Error: {e}"));
                return;
            }
        };

        let Some(idx) = payload
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|&i| i < recipes.len())
        else {
            self.say(&speech::line_invalid_selection(payload), Priority::Low);
            return;
        };

        let recipe = match self.engine.get_recipe(&recipes[idx].id) {
            Ok(r) => r,
            Err(e) => {
                self.ui.urgent(&format!("Error: {e}"));
                return;
            }
        };
        self.selected_recipe = Some(recipe.id.clone());
        self.show_recipe_detail(&recipe);

        let ingredients: Vec<String> = recipe.ingredients.iter().map(spoken_ingredient).collect();
        self.say(
            &speech::line_recipe_selected(&recipe.name, &ingredients),
            Priority::Normal,
        );

        // Warm the cache for the likely next actions.
        if let Some(mouth) = &self.mouth {
            mouth.prefetch(&[speech::line_cooking_start(&recipe.name)]);
            self.prefetch_step(&recipe.id, 0);
        }
    }

    fn show_recipe_detail(&self, recipe: &Recipe) {
        self.ui.step(&format!("=== {} ===", recipe.name));
        self.ui.instruction(&recipe.description);
        self.ui.hint(&format!("Servings: {}", recipe.servings));

        self.ui.blank();
        self.ui.step("Ingredients:");
        for ing in &recipe.ingredients {
            let opt = if ing.optional { " (optional)" } else { "" };
            self.ui
                .instruction(&format!("  - {}{opt}", spoken_ingredient(ing)));
        }
        self.ui.hint(&format!("Steps: {}", recipe.steps.len()));
    }

    // ── Cooking flow ─────────────────────────────────────────────

    fn start_cooking(&mut self) {
        let Some(recipe_id) = self.selected_recipe.clone() else {
            self.say(&speech::line_pick_recipe_first(), Priority::Normal);
            return;
        };
        if self.session_id.is_some() {
            self.say(&speech::line_already_active(), Priority::Normal);
            return;
        }

        let session = match self.engine.start_session(&recipe_id, 0) {
            Ok(s) => s,
            Err(e) => {
                self.ui.urgent(&format!("Error starting session: {e}"));
                return;
            }
        };

        self.session_id = Some(session.id.clone());
        self.say(
            &speech::line_cooking_start(&session.recipe_name),
            Priority::Normal,
        );
        self.show_current_step();

        // Prefetch step 2 while the user works on step 1.
        self.prefetch_step(&recipe_id, 1);
    }

    fn show_current_step(&mut self) {
        let Some(session_id) = self.session_id.clone() else {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        };

        let (step, _state) = match self.engine.current_step(&session_id) {
            Ok(pair) => pair,
            Err(Error::NoMoreSteps) => {
                self.say(&speech::line_session_done(), Priority::Normal);
                self.session_id = None;
                self.selected_recipe = None;
                return;
            }
            Err(e) => {
                self.ui.urgent(&format!("Error: {e}"));
                return;
            }
        };

        let Ok(session) = self.engine.status(&session_id) else {
            return;
        };
        let total = session.step_states.len();

        let mut header = format!("Step {}/{}", step.order, total);
        if !step.duration.is_zero() {
            header.push_str(&format!(" (~{})", format_duration(step.duration)));
        }
        self.ui.step(&header);
        self.ui.instruction(&step.instruction);

        for c in &step.conditions {
            self.ui.hint(&format!("→ {}", c.description));
        }
        for hint in &step.parallel_hints {
            self.ui.hint(&format!("tip: {hint}"));
        }

        if let Some(cfg) = &step.timer {
            let pending = self.engine.has_pending_timers(&session_id).unwrap_or(false);
            if pending {
                self.ui.hint(&format!(
                    "Timer ready: {} / {} — type 'timer' when you're ready to start",
                    cfg.label,
                    format_duration(cfg.duration)
                ));
            } else {
                self.ui.hint(&format!(
                    "Timer: {} / {}",
                    cfg.label,
                    format_duration(cfg.duration)
                ));
            }
        }

        if let Some(mouth) = &self.mouth {
            let conditions: Vec<String> =
                step.conditions.iter().map(|c| c.description.clone()).collect();
            let (label, duration) = step
                .timer
                .as_ref()
                .map_or((String::new(), Duration::ZERO), |cfg| {
                    (cfg.label.clone(), cfg.duration)
                });
            mouth.say(
                &speech::line_step(
                    step.order,
                    total,
                    &step.instruction,
                    &conditions,
                    &step.parallel_hints,
                    &label,
                    duration,
                ),
                Priority::Normal,
            );

            // Prefetch the next step while this one plays.
            self.prefetch_step(&session.recipe_id, session.current_step_index + 1);
        }

        // Next-step preview plus timer guidance.
        if let Ok(Some(next)) = self.engine.next_step(&session_id) {
            self.ui
                .hint(&format!("▸ Next: {}", truncate(&next.instruction, 80)));

            if let Some(cfg) = &step.timer {
                let guidance = speech::line_can_continue(&cfg.label);
                self.ui.chat(&guidance);
                if let Some(mouth) = &self.mouth {
                    mouth.say(&guidance, Priority::Low);
                }
            }
        }
    }

    fn advance(&mut self) {
        let Some(session_id) = self.session_id.clone() else {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        };

        match self.engine.advance(&session_id) {
            Ok(_) => self.show_current_step(),
            Err(Error::NoMoreSteps) => {
                self.say(&speech::line_last_step_done(), Priority::Normal);
                self.session_id = None;
                self.selected_recipe = None;
            }
            Err(Error::SessionNotActive) => {
                self.say(&speech::line_is_paused(), Priority::Normal);
            }
            Err(e) => self.ui.urgent(&format!("Error: {e}")),
        }
    }

    fn skip(&mut self) {
        let Some(session_id) = self.session_id.clone() else {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        };

        match self.engine.skip(&session_id) {
            Ok(_) => {
                self.say(&speech::line_skipped(), Priority::Low);
                self.show_current_step();
            }
            Err(Error::NoMoreSteps) => {
                self.say(&speech::line_skipped_last_step(), Priority::Normal);
                self.session_id = None;
                self.selected_recipe = None;
            }
            Err(e) => self.ui.urgent(&format!("Error: {e}")),
        }
    }

    fn repeat(&mut self) {
        if self.session_id.is_none() {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        }
        self.show_current_step();
    }

    fn repeat_last(&self) {
        let last = self
            .mouth
            .as_ref()
            .map(|m| m.last_spoken())
            .unwrap_or_default();
        if last.is_empty() {
            self.say(&speech::line_nothing_to_repeat(), Priority::Low);
            return;
        }
        self.say(&last, Priority::Normal);
    }

    fn start_timer(&self) {
        let Some(session_id) = &self.session_id else {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        };

        match self.engine.start_pending_timers(session_id) {
            Ok(0) => self.ui.hint("No pending timers to start."),
            Ok(n) => self.say(&format!("Timer started! ({n})"), Priority::Normal),
            Err(e) => self.ui.urgent(&format!("Error: {e}")),
        }
    }

    async fn dismiss_timer(&mut self, payload: &str) {
        let Some(session_id) = self.session_id.clone() else {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        };

        let active = self.engine.active_timers(&session_id).unwrap_or_default();
        if active.is_empty() {
            self.say(&speech::line_no_active_timers(), Priority::Low);
            return;
        }

        // One active timer: no ambiguity.
        if let [only] = active.as_slice() {
            match self.engine.dismiss_timer(&session_id, &only.id) {
                Ok(()) => self.say(&speech::line_timer_dismissed(&only.label), Priority::Normal),
                Err(e) => {
                    tracing::error!(error = %e, "dismiss timer");
                    self.say(&speech::line_timer_ack(), Priority::Normal);
                }
            }
            return;
        }

        // Fired timers first: a plain "ok" is obviously a reaction
        // to whatever went off.
        let fired: Vec<_> = active
            .iter()
            .filter(|t| t.status == TimerStatus::Fired)
            .collect();
        if !fired.is_empty() {
            for t in &fired {
                if let Err(e) = self.engine.dismiss_timer(&session_id, &t.id) {
                    tracing::error!(timer = %t.id, error = %e, "dismiss timer");
                }
            }
            if let [only] = fired.as_slice() {
                self.say(&speech::line_timer_dismissed(&only.label), Priority::Normal);
            } else {
                self.say(&speech::line_timer_ack(), Priority::Normal);
            }
            return;
        }

        // Multiple running timers: let the AI pick, or dismiss all
        // when it isn't available.
        let Some(agent) = &self.agent else {
            for t in &active {
                let _ = self.engine.dismiss_timer(&session_id, &t.id);
            }
            self.say(&speech::line_timer_ack(), Priority::Normal);
            return;
        };

        let (recipe, session) = self.gather_context();
        let resp = match agent
            .dismiss_timer(payload, recipe.as_ref(), session.as_ref())
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = %e, "AI dismiss timer failed");
                self.say(&speech::line_timer_ack(), Priority::Normal);
                return;
            }
        };

        if resp.timer_ids.is_empty() {
            // The AI wants clarification; speak its question.
            self.say(&resp.summary, Priority::Normal);
            return;
        }

        for tid in &resp.timer_ids {
            if let Err(e) = self.engine.dismiss_timer(&session_id, tid) {
                tracing::error!(timer = %tid, error = %e, "dismiss timer");
            }
        }
        self.say(&resp.summary, Priority::Normal);
    }

    fn pause(&self) {
        let Some(session_id) = &self.session_id else {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        };

        match self.engine.pause(session_id) {
            Ok(()) => self.say(&speech::line_paused(), Priority::Normal),
            Err(e) => self.ui.urgent(&format!("Error: {e}")),
        }
    }

    fn resume(&mut self) {
        let Some(session_id) = self.session_id.clone() else {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        };

        match self.engine.resume(&session_id) {
            Ok(_) => {
                self.say(&speech::line_resumed(), Priority::Normal);
                self.show_current_step();
            }
            Err(Error::SessionPaused) => {
                self.say(&speech::line_not_paused(), Priority::Low);
            }
            Err(e) => self.ui.urgent(&format!("Error: {e}")),
        }
    }

    fn status(&self) {
        let Some(session_id) = &self.session_id else {
            self.say(&speech::line_no_session(), Priority::Low);
            return;
        };

        let session = match self.engine.status(session_id) {
            Ok(s) => s,
            Err(e) => {
                self.ui.urgent(&format!("Error: {e}"));
                return;
            }
        };

        // Visual dump; too much data to speak.
        self.ui.step(&format!("Session: {}", &session.id[..8]));
        self.ui
            .instruction(&format!("Recipe:  {}", session.recipe_name));
        self.ui.instruction(&format!("Status:  {}", session.status));
        self.ui.instruction(&format!(
            "Step:    {}/{}",
            session.current_step_index + 1,
            session.step_states.len()
        ));
        let elapsed = (chrono::Utc::now() - session.started_at)
            .to_std()
            .unwrap_or_default();
        self.ui
            .hint(&format!("Started: {} ago", format_duration(elapsed)));

        let mut active_timers = 0;
        let mut ids: Vec<&String> = session.timer_states.keys().collect();
        ids.sort();
        for id in ids {
            let ts = &session.timer_states[id];
            match ts.status {
                TimerStatus::Running => {
                    self.ui.chat(&format!(
                        "{} — {} remaining",
                        ts.label,
                        format_duration(ts.remaining)
                    ));
                    active_timers += 1;
                }
                TimerStatus::Fired => {
                    self.ui.urgent(&format!("{} — DONE", ts.label));
                    active_timers += 1;
                }
                _ => {}
            }
        }
        if active_timers == 0 {
            self.ui.hint("Timers:  none active");
        }

        if let Some(mouth) = &self.mouth {
            mouth.say(
                &speech::line_status(
                    session.current_step_index + 1,
                    session.step_states.len(),
                    &session.recipe_name,
                    active_timers,
                ),
                Priority::Low,
            );
        }
    }

    async fn quit(&mut self) {
        if let Some(session_id) = self.session_id.take() {
            if let Err(e) = self.engine.abandon(&session_id) {
                tracing::error!(error = %e, "abandoning session");
            }
            self.say(&speech::line_abandoned(), Priority::Normal);
            self.selected_recipe = None;
        }
        self.say(&speech::line_bye(), Priority::Normal);
        // Give TTS a beat to start the goodbye line.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = self.shutdown_tx.send(true);
    }

    fn show_help(&self) {
        self.ui.step("Commands:");
        self.ui.instruction("  list / recipes   Show available recipes");
        self.ui.instruction("  1, 2, 3...       Select a recipe by number");
        self.ui.instruction("  start / go       Start cooking the selected recipe");
        self.ui.instruction("  next / done      Move to the next step");
        self.ui.instruction("  skip             Skip the current step");
        self.ui.instruction("  repeat / again   Show the current step again");
        self.ui.instruction("  repeat last      Replay the last thing the assistant said");
        self.ui.instruction("  pause / brb      Pause the session and timers");
        self.ui.instruction("  resume / back    Resume a paused session");
        self.ui.instruction("  status / where   Show session progress and timers");
        self.ui.instruction("  timer / ready    Start a pending step timer");
        self.ui.instruction("  dismiss / ok     Acknowledge a timer notification");
        self.ui.instruction("  dismiss ...      Dismiss a specific timer (e.g. \"dismiss the simmer timer\")");
        self.ui.instruction("  help             Show this message");
        self.ui.instruction("  quit / exit      Abandon session and exit");
        self.ui.blank();
        self.ui.step("AI (requires GPT_CHAT_KEY + GPT_CHAT_ENDPOINT):");
        self.ui.instruction("  how do I...?     Ask the AI a cooking question");
        self.ui.instruction("  modify ...       Ask the AI to change the recipe");
        self.ui.instruction("  change ...       (swap, replace, double, halve, adjust, substitute)");
    }

    /// Warm the TTS cache for a step at the given 0-based index
    fn prefetch_step(&self, recipe_id: &str, step_idx: usize) {
        let Some(mouth) = &self.mouth else { return };
        let Ok(recipe) = self.engine.get_recipe(recipe_id) else {
            return;
        };
        let Some(step) = recipe.steps.get(step_idx) else {
            return;
        };

        let conditions: Vec<String> =
            step.conditions.iter().map(|c| c.description.clone()).collect();
        let (label, duration) = step
            .timer
            .as_ref()
            .map_or((String::new(), Duration::ZERO), |cfg| {
                (cfg.label.clone(), cfg.duration)
            });
        let text = speech::line_step(
            step.order,
            recipe.steps.len(),
            &step.instruction,
            &conditions,
            &step.parallel_hints,
            &label,
            duration,
        );
        mouth.prefetch(&[text]);
    }

}

/// Receive from an optional voice channel; absent channels never yield
async fn recv_voice(voice: &mut Option<mpsc::Receiver<String>>) -> String {
    match voice {
        Some(rx) => match rx.recv().await {
            Some(text) => text,
            None => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

/// Ingredient as read aloud: "250 grams spaghetti", "salt"
fn spoken_ingredient(ing: &crate::domain::Ingredient) -> String {
    if ing.quantity > 0.0 {
        let qualifier = if ing.size_descriptor.is_empty() {
            &ing.unit
        } else {
            &ing.size_descriptor
        };
        format!("{:.0} {} {}", ing.quantity, qualifier, ing.name)
    } else {
        ing.name.clone()
    }
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
