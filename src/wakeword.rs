//! Wake-word detection
//!
//! Hybrid approach: a local energy gate accumulates speech segments,
//! and completed segments are verified against the transcriber output
//! containing a wake phrase. Zero STT cost while the kitchen is quiet.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Minimum RMS energy to consider a frame speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech length to bother transcribing (0.3 s @ 16 kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends a segment (0.5 s @ 16 kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Detector phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech energy
    Idle,
    /// Accumulating a potential wake utterance
    Gathering,
}

struct Pipeline {
    state: DetectorState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
    needs_reset: bool,
}

/// Energy-gated wake-word detector
///
/// Feed it microphone frames with `process`; when it returns true, a
/// speech segment is complete. Transcribe it and confirm with
/// `matches_wake_word`.
pub struct Detector {
    wake_words: Vec<String>,
    paused: AtomicBool,
    pipeline: Mutex<Pipeline>,
}

impl Detector {
    /// Create a detector for the given wake phrases
    #[must_use]
    pub fn new(wake_words: &[&str]) -> Self {
        let normalized: Vec<String> = wake_words
            .iter()
            .map(|w| w.to_lowercase().trim().to_string())
            .collect();
        tracing::debug!(wake_words = ?normalized, "wake word detector initialized");
        Self {
            wake_words: normalized,
            paused: AtomicBool::new(false),
            pipeline: Mutex::new(Pipeline {
                state: DetectorState::Idle,
                speech_buffer: Vec::new(),
                silence_counter: 0,
                needs_reset: false,
            }),
        }
    }

    /// Stop detecting (e.g. while TTS is playing so we don't trigger
    /// on speaker output)
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Re-enable detection. Stale pipeline state is flushed before the
    /// next frame so pre-pause audio can't pollute scoring.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.pipeline
            .lock()
            .expect("detector pipeline poisoned")
            .needs_reset = true;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Current phase
    #[must_use]
    pub fn state(&self) -> DetectorState {
        self.pipeline
            .lock()
            .expect("detector pipeline poisoned")
            .state
    }

    /// The configured wake phrases
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }

    /// Process a frame of samples. Returns true when a complete speech
    /// segment is ready for verification. Frames are dropped while
    /// paused.
    pub fn process(&self, samples: &[f32]) -> bool {
        if samples.is_empty() || self.is_paused() {
            return false;
        }

        let mut p = self.pipeline.lock().expect("detector pipeline poisoned");
        if p.needs_reset {
            p.speech_buffer.clear();
            p.silence_counter = 0;
            p.state = DetectorState::Idle;
            p.needs_reset = false;
            tracing::debug!("wake detector: pipeline flushed after resume");
        }

        let energy = rms(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match p.state {
            DetectorState::Idle => {
                if is_speech {
                    p.state = DetectorState::Gathering;
                    p.speech_buffer.clear();
                    p.speech_buffer.extend_from_slice(samples);
                    p.silence_counter = 0;
                    tracing::trace!(energy, "wake detector: speech detected");
                }
            }
            DetectorState::Gathering => {
                p.speech_buffer.extend_from_slice(samples);
                if is_speech {
                    p.silence_counter = 0;
                } else {
                    p.silence_counter += samples.len();
                }

                if p.silence_counter > SILENCE_SAMPLES
                    && p.speech_buffer.len() > MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(
                        samples = p.speech_buffer.len(),
                        "wake detector: speech segment complete"
                    );
                    return true;
                }

                // Too much silence without enough speech: give up.
                if p.silence_counter > SILENCE_SAMPLES * 2 {
                    p.state = DetectorState::Idle;
                    p.speech_buffer.clear();
                    p.silence_counter = 0;
                }
            }
        }
        false
    }

    /// Take the accumulated segment and return to idle
    #[must_use]
    pub fn take_segment(&self) -> Vec<f32> {
        let mut p = self.pipeline.lock().expect("detector pipeline poisoned");
        p.state = DetectorState::Idle;
        p.silence_counter = 0;
        std::mem::take(&mut p.speech_buffer)
    }

    /// True if the transcript contains one of the wake phrases
    #[must_use]
    pub fn matches_wake_word(&self, transcript: &str) -> bool {
        let normalized = transcript.to_lowercase();
        for word in &self.wake_words {
            if normalized.contains(word.as_str()) {
                tracing::info!(wake_word = %word, transcript = %transcript, "wake word detected");
                return true;
            }
        }
        false
    }

    /// Drop everything and return to idle
    pub fn reset(&self) {
        let mut p = self.pipeline.lock().expect("detector pipeline poisoned");
        p.state = DetectorState::Idle;
        p.speech_buffer.clear();
        p.silence_counter = 0;
    }
}

/// RMS energy of a frame
#[must_use]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud(n: usize) -> Vec<f32> {
        vec![0.5; n]
    }

    fn silence(n: usize) -> Vec<f32> {
        vec![0.0; n]
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert!(rms(&silence(100)) < 0.001);
        assert!(rms(&loud(100)) > 0.4);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn wake_words_are_normalized() {
        let d = Detector::new(&["  Hey OTTO  ", "CHEF"]);
        assert_eq!(d.wake_words(), &["hey otto", "chef"]);
    }

    #[test]
    fn segment_completes_after_speech_then_silence() {
        let d = Detector::new(&["hey otto"]);

        assert!(!d.process(&silence(1280)));
        assert_eq!(d.state(), DetectorState::Idle);

        // Half a second of speech starts gathering.
        assert!(!d.process(&loud(8000)));
        assert_eq!(d.state(), DetectorState::Gathering);

        // Well over the silence threshold completes the segment.
        assert!(d.process(&silence(9000)));

        let segment = d.take_segment();
        assert!(segment.len() > MIN_SPEECH_SAMPLES);
        assert_eq!(d.state(), DetectorState::Idle);
    }

    #[test]
    fn insufficient_trailing_silence_keeps_gathering() {
        let d = Detector::new(&["hey otto"]);
        d.process(&loud(1600));
        assert_eq!(d.state(), DetectorState::Gathering);

        // Half the silence window: the user may just be pausing.
        assert!(!d.process(&silence(4000)));
        assert_eq!(d.state(), DetectorState::Gathering);

        // Fresh speech resets the silence counter.
        assert!(!d.process(&loud(1280)));
        assert!(!d.process(&silence(4000)));
    }

    #[test]
    fn reset_returns_to_idle_and_drops_audio() {
        let d = Detector::new(&["hey otto"]);
        d.process(&loud(8000));
        assert_eq!(d.state(), DetectorState::Gathering);

        d.reset();
        assert_eq!(d.state(), DetectorState::Idle);
        assert!(d.take_segment().is_empty());
    }

    #[test]
    fn paused_detector_ignores_frames() {
        let d = Detector::new(&["hey otto"]);
        d.pause();
        assert!(!d.process(&loud(8000)));
        assert_eq!(d.state(), DetectorState::Idle);

        d.resume();
        d.process(&loud(8000));
        assert_eq!(d.state(), DetectorState::Gathering);
    }

    #[test]
    fn resume_flushes_stale_buffers() {
        let d = Detector::new(&["hey otto"]);
        d.process(&loud(8000));
        d.pause();
        d.resume();
        // The pre-pause speech must not survive the flush.
        d.process(&silence(1280));
        assert_eq!(d.state(), DetectorState::Idle);
        assert!(d.take_segment().is_empty());
    }

    #[test]
    fn transcript_matching_is_case_insensitive() {
        let d = Detector::new(&["hey otto", "hey chef"]);
        assert!(d.matches_wake_word("Hey Otto, what's next?"));
        assert!(d.matches_wake_word("HEY CHEF"));
        assert!(!d.matches_wake_word("hello world"));
    }
}
