//! The Ear: wake-word-gated voice input.
//!
//! Lifecycle:
//!  1. DORMANT: the energy-gated wake detector runs on the mic frames;
//!     the transcriber only runs on completed speech segments.
//!  2. LISTENING: wake word confirmed. Interrupt the Mouth, speak a
//!     filler, then capture the full command with RMS end-pointing.
//!  3. Return to dormant (or muted while the answer plays back).
//!
//! Self-echo is suppressed two ways, both required: RMS frames are
//! ignored while the Mouth is speaking, and the last spoken utterance
//! is substring-stripped out of the transcription.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regex::Regex;
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::Instant;

use crate::wakeword::{rms, Detector};
use crate::Result;

use super::capture::AudioCapture;
use super::mouth::{AudioSink, Mouth, Synthesizer};
use super::stt::SttEngine;
use super::{line_listening, Priority, CAPTURE_SAMPLE_RATE};

/// Wake phrases that may also bleed into the whisper transcription if
/// the tail of the wake utterance overlaps the start of recording.
/// Used for both detection and cleanup.
const WAKE_WORDS: &[&str] = &[
    "hey otto",
    "otto",
    "hey chef",
    "otto cook",
    "ottocook",
    "hey, chef",
    "hey shef",
];

/// The Ear's listening mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarState {
    /// Waiting for the wake detector to fire
    Dormant,
    /// Wake word confirmed, actively capturing the command
    Listening,
    /// Asleep while the mouth speaks
    Muted,
}

/// Ear tuning knobs
#[derive(Debug, Clone)]
pub struct EarConfig {
    /// Max active listening window before giving up
    pub listen_timeout: Duration,
    /// Trailing silence after speech that ends the utterance
    pub silence_duration: Duration,
    /// Max wait for any speech at all before giving up
    pub grace_duration: Duration,
    /// RMS below this is silence (~ -42 dB)
    pub rms_threshold: f32,
    /// Seconds of audio per whisper invocation
    pub chunk_secs: u64,
}

impl Default for EarConfig {
    fn default() -> Self {
        Self {
            listen_timeout: Duration::from_secs(15),
            silence_duration: Duration::from_secs(4),
            grace_duration: Duration::from_secs(10),
            rms_threshold: 0.008,
            chunk_secs: 2,
        }
    }
}

/// Wake-word-triggered speech-to-text input
pub struct Ear<T, P, S> {
    mouth: Option<Mouth<T, P>>,
    stt: S,
    detector: Detector,
    config: EarConfig,
    muted: AtomicBool,
    state: Mutex<EarState>,
    text_tx: mpsc::Sender<String>,
    text_rx: Mutex<Option<mpsc::Receiver<String>>>,
    cancel: Notify,
    env_annotation: Regex,
}

impl<T: Synthesizer, P: AudioSink, S: SttEngine> Ear<T, P, S> {
    /// Create a voice input listener
    ///
    /// # Panics
    ///
    /// Panics if the built-in annotation pattern fails to compile.
    #[must_use]
    pub fn new(mouth: Option<Mouth<T, P>>, stt: S, config: EarConfig) -> Self {
        let (text_tx, text_rx) = mpsc::channel(8);
        Self {
            mouth,
            stt,
            detector: Detector::new(WAKE_WORDS),
            config,
            muted: AtomicBool::new(false),
            state: Mutex::new(EarState::Dormant),
            text_tx,
            text_rx: Mutex::new(Some(text_rx)),
            cancel: Notify::new(),
            env_annotation: Regex::new(r"[\(\[][a-zA-Z][a-zA-Z\s]*[\)\]]").expect("annotation pattern"),
        }
    }

    /// The channel recognized utterances are delivered on. Take once.
    ///
    /// # Panics
    ///
    /// Panics if called twice.
    #[must_use]
    pub fn text_channel(&self) -> mpsc::Receiver<String> {
        self.text_rx
            .lock()
            .expect("ear receiver poisoned")
            .take()
            .expect("ear text channel already taken")
    }

    /// Current listening mode
    #[must_use]
    pub fn state(&self) -> EarState {
        *self.state.lock().expect("ear state poisoned")
    }

    fn set_state(&self, state: EarState) {
        *self.state.lock().expect("ear state poisoned") = state;
    }

    /// Disable listening while TTS plays. Pauses the wake detector but
    /// never clobbers an in-progress LISTENING session; the filler's
    /// own speaking event would otherwise reset the state from under
    /// the active-listen routine.
    pub fn mute(&self) {
        self.muted.store(true, Ordering::SeqCst);
        self.detector.pause();
        let current = self.state();
        if current != EarState::Listening {
            self.set_state(EarState::Muted);
        }
        tracing::debug!(state = ?current, "ear: muted");
    }

    /// Re-enable listening. Resumes the detector only when no active
    /// listen is in flight.
    pub fn unmute(&self) {
        self.muted.store(false, Ordering::SeqCst);
        let current = self.state();
        if current != EarState::Listening {
            self.detector.resume();
            self.set_state(EarState::Dormant);
        }
        tracing::debug!(state = ?current, "ear: unmuted");
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Abort an in-progress listening session, if any
    pub fn cancel_listening(&self) {
        if self.state() == EarState::Listening {
            self.cancel.notify_one();
            tracing::debug!("ear: listening cancelled by user");
        }
    }

    /// Run the ear until shutdown. Owns the microphone: dormant frames
    /// feed the wake detector, listening frames feed the end-pointer
    /// and the transcriber.
    ///
    /// # Errors
    ///
    /// Returns `Audio` if the capture device can't be opened.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        tracing::info!(timeout = ?self.config.listen_timeout, "ear started");
        let capture = AudioCapture::start()?;

        // 80 ms frames, the detector's native cadence.
        let mut frames = tokio::time::interval(Duration::from_millis(80));
        frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = frames.tick() => {}
                _ = shutdown.changed() => {
                    tracing::info!("ear stopped");
                    return Ok(());
                }
            }

            let samples = capture.take();
            if self.is_muted() || self.detector.is_paused() {
                continue;
            }
            if !self.detector.process(&samples) {
                continue;
            }

            // A speech segment is complete; check it for the wake word.
            let segment = self.detector.take_segment();
            let transcript = match self.stt.transcribe(&segment).await {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(error = %e, "ear: segment transcription failed");
                    continue;
                }
            };
            if !self.detector.matches_wake_word(&transcript) {
                continue;
            }

            self.on_wake_word(&capture, &mut shutdown).await;
        }
    }

    /// Wake word confirmed: cut the mouth off and capture a command
    async fn on_wake_word(&self, capture: &AudioCapture, shutdown: &mut watch::Receiver<bool>) {
        tracing::info!("ear: wake word detected!");

        if let Some(mouth) = &self.mouth {
            mouth.interrupt();
        }

        // Pause the detector while we listen; it must not fight over
        // the mic or re-trigger on echoed audio.
        self.detector.pause();

        // Mark LISTENING before the filler, so the mute/unmute driven
        // by the filler's speaking events cannot clobber this state.
        self.set_state(EarState::Listening);

        if let Some(mouth) = &self.mouth {
            let filler = line_listening();
            mouth.say(&filler, Priority::Critical);
            tracing::debug!(filler = %filler, "ear: acknowledged wake word");
        }

        let sent = self.active_listen(capture, shutdown).await;

        if sent && self.mouth.is_some() {
            // Text went out, an answer is coming back through the
            // Mouth. Stay quiet; the mouth-stopped event unmutes us.
            self.mute();
        } else {
            if !self.is_muted() {
                self.detector.resume();
            }
            self.set_state(EarState::Dormant);
        }
    }

    /// Capture one command with RMS end-pointing. Returns true if
    /// cleaned text was delivered on the text channel.
    async fn active_listen(
        &self,
        capture: &AudioCapture,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        tracing::info!("ear: listening...");

        // Let the filler finish and give the user a beat to start.
        self.wait_for_mouth(shutdown).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        capture.clear();

        let mut recording: Vec<f32> = Vec::new();
        let mut heard_speech = false;
        let mut last_loud = Instant::now();
        let deadline = Instant::now() + self.config.listen_timeout;

        let mut frames = tokio::time::interval(Duration::from_millis(80));
        frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = frames.tick() => {}
                _ = self.cancel.notified() => {
                    tracing::debug!("ear: listening cancelled");
                    break;
                }
                _ = shutdown.changed() => break,
            }

            if Instant::now() >= deadline {
                tracing::debug!("ear: listen timeout reached");
                break;
            }

            let samples = capture.take();
            recording.extend_from_slice(&samples);

            // TTS playback bleeding into the mic must not count as the
            // user talking.
            if self.mouth.as_ref().is_some_and(|m| m.is_speaking()) {
                continue;
            }

            let level = rms(&samples);
            if level >= self.config.rms_threshold {
                last_loud = Instant::now();
                if !heard_speech {
                    heard_speech = true;
                    tracing::debug!(rms = level, "ear: speech detected");
                }
            }

            if heard_speech && last_loud.elapsed() >= self.config.silence_duration {
                tracing::debug!(
                    silence = ?self.config.silence_duration,
                    "ear: silence after speech — done listening"
                );
                break;
            }
            if !heard_speech && last_loud.elapsed() >= self.config.grace_duration {
                tracing::debug!("ear: no speech within grace period");
                break;
            }
        }

        self.set_state(EarState::Dormant);

        let raw = self.transcribe_chunked(&recording).await;
        let combined = self.clean(&raw);

        if combined.is_empty() {
            tracing::debug!("ear: listening ended with no input");
            return false;
        }

        tracing::info!(command = %combined, "ear: heard command");
        self.text_tx.send(combined).await.is_ok()
    }

    /// Transcribe the recording in chunk_secs pieces, joining the text
    async fn transcribe_chunked(&self, samples: &[f32]) -> String {
        if samples.is_empty() {
            return String::new();
        }
        let chunk_len = (self.config.chunk_secs.max(1) as usize) * CAPTURE_SAMPLE_RATE as usize;
        let mut out = String::new();
        for chunk in samples.chunks(chunk_len) {
            match self.stt.transcribe(chunk).await {
                Ok(text) if !text.is_empty() => {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(&text);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "ear: chunk transcription failed"),
            }
        }
        out
    }

    /// Block until the mouth is idle so the mic doesn't pick it up
    async fn wait_for_mouth(&self, shutdown: &mut watch::Receiver<bool>) {
        let Some(mouth) = &self.mouth else { return };
        while mouth.is_speaking() || mouth.queue_len() > 0 {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_millis(100)) => {}
                _ = shutdown.changed() => return,
            }
        }
    }

    /// Full transcription cleanup: artifacts, wake-word fragments,
    /// mouth echo
    fn clean(&self, raw: &str) -> String {
        let cleaned = clean_transcription(raw, &self.env_annotation);
        let cleaned = strip_wake_word_text(&cleaned);
        let last = self
            .mouth
            .as_ref()
            .map(|m| m.last_spoken())
            .unwrap_or_default();
        let cleaned = strip_echo(&cleaned, &last);
        cleaned.trim().to_string()
    }
}

/// Remove any substring matching the mouth's last utterance so TTS
/// output never feeds back in as a command
fn strip_echo(text: &str, last_spoken: &str) -> String {
    if last_spoken.is_empty() {
        return text.to_string();
    }
    let lower = text.to_lowercase();
    let last_lower = last_spoken.to_lowercase();
    if lower.contains(&last_lower) {
        tracing::debug!("ear: stripped mouth echo from transcription");
        return lower.replace(&last_lower, "").trim().to_string();
    }
    text.to_string()
}

/// Remove wake-word fragments that bled into the transcription
fn strip_wake_word_text(text: &str) -> String {
    let mut lower = text.to_lowercase();
    for word in WAKE_WORDS {
        lower = lower.replace(word, "");
    }
    lower.trim().to_string()
}

/// Junk annotations whisper sprinkles into transcripts
const JUNK_PATTERNS: &[&str] = &[
    "[BLANK_AUDIO]",
    "[BLANK AUDIO]",
    "(silence)",
    "[silence]",
    "(no speech)",
    "[no speech]",
    "[Music]",
    "(music)",
    "(keyboard clicking)",
    "(keyboard clacking)",
    "(typing)",
    "(clicking)",
    "(mouse clicking)",
    "(breathing)",
    "(sighing)",
    "(coughing)",
    "(laughing)",
    "(clapping)",
    "(footsteps)",
    "(door closing)",
    "(door opening)",
    "(knocking)",
    "(phone ringing)",
    "(birds chirping)",
    "(dog barking)",
    "(baby crying)",
    "(water running)",
    "(wind blowing)",
    "(rain)",
    "(thunder)",
    "(static)",
    "(background noise)",
    "(inaudible)",
    "(unintelligible)",
    "(applause)",
    "(cheering)",
    "(buzzing)",
    "(beeping)",
];

/// Whole-string outputs whisper hallucinates on silence
const HALLUCINATIONS: &[&str] = &[
    "...",
    "you",
    "Thank you.",
    "Thanks for watching!",
    "Thank you for watching.",
    "Bye.",
    "Bye!",
    "The end.",
    "Sous-titres réalisés para la communauté d'Amara.org",
];

/// Strip whitespace, whisper artifacts, and environmental annotations
fn clean_transcription(raw: &str, env_annotation: &Regex) -> String {
    let mut s = raw.replace("\r\n", " ").replace(['\n', '\r'], " ");
    s = s.trim().to_string();

    for junk in JUNK_PATTERNS {
        s = s.replace(junk, "");
        s = s.replace(&junk.to_lowercase(), "");
        s = s.replace(&junk.to_uppercase(), "");
    }
    s = collapse_spaces(&s);

    // Catch-all for any remaining (parenthesized) or [bracketed]
    // annotation.
    s = env_annotation.replace_all(&s, "").to_string();
    s = collapse_spaces(&s);

    // A bare hallucination is discarded outright.
    let lower = s.to_lowercase();
    if HALLUCINATIONS.iter().any(|h| h.to_lowercase() == lower) {
        return String::new();
    }

    // Strip a leading "[00:00:00.000 --> 00:00:05.000]" timestamp.
    if s.starts_with('[') {
        if let Some(idx) = s.find(']') {
            if idx < 40 {
                let rest = s[idx + 1..].trim();
                if !rest.is_empty() {
                    return rest.to_string();
                }
            }
        }
    }

    s
}

fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = false;
    for c in s.chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::MouthConfig;

    struct NullSynth;
    impl Synthesizer for NullSynth {
        fn voice(&self) -> &str {
            "test"
        }
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    struct NullSink;
    impl AudioSink for NullSink {
        async fn play(&self, _wav: &[u8]) -> Result<()> {
            Ok(())
        }
        fn stop(&self) {}
    }

    struct NullStt;
    impl SttEngine for NullStt {
        async fn transcribe(&self, _samples: &[f32]) -> Result<String> {
            Ok(String::new())
        }
    }

    fn ear() -> Ear<NullSynth, NullSink, NullStt> {
        let mouth = Mouth::new(NullSynth, NullSink, MouthConfig::default());
        Ear::new(Some(mouth), NullStt, EarConfig::default())
    }

    fn annotation_regex() -> Regex {
        Regex::new(r"[\(\[][a-zA-Z][a-zA-Z\s]*[\)\]]").unwrap()
    }

    #[test]
    fn junk_annotations_are_stripped() {
        let re = annotation_regex();
        assert_eq!(
            clean_transcription("next step (keyboard clicking) please", &re),
            "next step please"
        );
        assert_eq!(clean_transcription("[BLANK_AUDIO]", &re), "");
        assert_eq!(
            clean_transcription("pause (dog barking) the timer", &re),
            "pause the timer"
        );
    }

    #[test]
    fn unknown_annotations_hit_the_catch_all() {
        let re = annotation_regex();
        assert_eq!(
            clean_transcription("skip (distant thunder rumbling) this", &re),
            "skip this"
        );
    }

    #[test]
    fn hallucinations_are_discarded() {
        let re = annotation_regex();
        assert_eq!(clean_transcription("Thank you.", &re), "");
        assert_eq!(clean_transcription("you", &re), "");
        assert_eq!(clean_transcription("...", &re), "");
        // Real content containing "you" survives.
        assert_eq!(
            clean_transcription("can you repeat that", &re),
            "can you repeat that"
        );
    }

    #[test]
    fn newlines_collapse_to_spaces() {
        let re = annotation_regex();
        assert_eq!(
            clean_transcription("next\nstep\r\nplease", &re),
            "next step please"
        );
    }

    #[test]
    fn timestamp_prefix_is_stripped() {
        let re = annotation_regex();
        assert_eq!(
            clean_transcription("[00:00:00.000 --> 00:00:05.000] next step", &re),
            "next step"
        );
    }

    #[test]
    fn wake_word_fragments_are_removed() {
        assert_eq!(strip_wake_word_text("hey otto next step"), "next step");
        assert_eq!(strip_wake_word_text("Hey Chef, pause"), ", pause");
        assert_eq!(strip_wake_word_text("just words"), "just words");
    }

    #[test]
    fn echo_is_substring_stripped() {
        assert_eq!(
            strip_echo("Step 2 of 8. Season the chicken. next please", "Step 2 of 8. Season the chicken."),
            "next please"
        );
        assert_eq!(strip_echo("next please", ""), "next please");
        assert_eq!(strip_echo("next please", "something unrelated"), "next please");
    }

    #[test]
    fn mute_does_not_clobber_listening() {
        let ear = ear();
        ear.set_state(EarState::Listening);

        ear.mute();
        // The filler-driven mute arrives while we're actively
        // listening; the state must survive it.
        assert_eq!(ear.state(), EarState::Listening);
        assert!(ear.is_muted());

        ear.unmute();
        assert_eq!(ear.state(), EarState::Listening);
    }

    #[test]
    fn mute_from_dormant_goes_muted() {
        let ear = ear();
        assert_eq!(ear.state(), EarState::Dormant);

        ear.mute();
        assert_eq!(ear.state(), EarState::Muted);

        ear.unmute();
        assert_eq!(ear.state(), EarState::Dormant);
    }

    #[test]
    fn text_channel_can_only_be_taken_once() {
        let ear = ear();
        let _rx = ear.text_channel();
        assert!(std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = ear.text_channel();
        }))
        .is_err());
    }
}
