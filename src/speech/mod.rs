//! Speech input/output
//!
//! The Mouth serializes all spoken output through one pipeline:
//! queue -> chunk -> synthesize (parallel) -> play (sequential). The
//! Ear is the wake-word-gated voice listener feeding the same input
//! channel as the keyboard.

mod cache;
mod capture;
mod ear;
mod lines;
mod mouth;
mod notifier;
mod player;
mod stt;
mod tts;

pub use cache::AudioCache;
pub use capture::{samples_to_wav, AudioCapture};
pub use ear::{Ear, EarConfig, EarState};
pub use lines::*;
pub use mouth::{AudioSink, Mouth, MouthConfig, Synthesizer};
pub use notifier::SpeakingNotifier;
pub use player::CpalPlayer;
pub use stt::{SttEngine, Transcriber, TranscriberConfig};
pub use tts::AzureClient;

use std::time::Instant;

/// Default Azure voice. One constant to switch voices.
pub const DEFAULT_VOICE: &str = "en-US-AvaNeural";

/// Audio format requested from Azure and expected by the player
pub const DEFAULT_AUDIO_FORMAT: &str = "riff-24khz-16bit-mono-pcm";

/// Playback parameters matching the default format
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Capture sample rate for the microphone (speech models want 16 kHz)
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Env var names for the Azure Speech credentials
pub const ENV_AZURE_SPEECH_KEY: &str = "AZURE_SPEECH_KEY";
pub const ENV_AZURE_SPEECH_REGION: &str = "AZURE_SPEECH_REGION";

/// Priority levels for speech requests. Higher speaks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Watcher comments, idle chatter
    Low,
    /// Step instructions, info
    Normal,
    /// Timer notifications
    High,
    /// Urgent alerts, fillers that must cut the line
    Critical,
}

/// A queued item waiting to be spoken
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub priority: Priority,
    pub queued_at: Instant,
}

/// Shorten a string for logging
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
