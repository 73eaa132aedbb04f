//! Mouth behavior tests with mock synthesis and playback
//!
//! The mock synthesizer returns the chunk text as bytes, so the mock
//! sink records exactly what "played" and in what order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ottocook::speech::{AudioSink, Mouth, MouthConfig, Priority, Synthesizer};
use ottocook::Result;

#[derive(Clone, Default)]
struct EchoSynth {
    calls: Arc<AtomicUsize>,
}

impl Synthesizer for EchoSynth {
    fn voice(&self) -> &str {
        "test-voice"
    }
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // A beat of latency, like a real backend.
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(text.as_bytes().to_vec())
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    played: Arc<Mutex<Vec<String>>>,
    delay_ms: u64,
}

impl AudioSink for RecordingSink {
    async fn play(&self, wav: &[u8]) -> Result<()> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.played
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(wav).into_owned());
        Ok(())
    }
    fn stop(&self) {}
}

struct FailingSynth;
impl Synthesizer for FailingSynth {
    fn voice(&self) -> &str {
        "test-voice"
    }
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.contains("poison") {
            return Err(ottocook::Error::Tts("synthetic failure".to_string()));
        }
        Ok(text.as_bytes().to_vec())
    }
}

async fn wait_idle<T: Synthesizer, P: AudioSink>(mouth: &Mouth<T, P>) {
    for _ in 0..400 {
        if !mouth.is_speaking() && mouth.queue_len() == 0 {
            // One more beat so the worker finishes its bookkeeping.
            tokio::time::sleep(Duration::from_millis(10)).await;
            if !mouth.is_speaking() && mouth.queue_len() == 0 {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("mouth never went idle");
}

fn shutdown() -> (
    tokio::sync::watch::Sender<bool>,
    tokio::sync::watch::Receiver<bool>,
) {
    tokio::sync::watch::channel(false)
}

#[tokio::test]
async fn equal_priority_plays_in_fifo_order() {
    let sink = RecordingSink::default();
    let mouth = Mouth::new(EchoSynth::default(), sink.clone(), MouthConfig::default());

    // Queue before starting the worker so ordering is deterministic.
    mouth.say("first.", Priority::Normal);
    mouth.say("second.", Priority::Normal);
    mouth.say("third.", Priority::Normal);
    let (_shutdown_tx, shutdown_rx) = shutdown();
    mouth.start(shutdown_rx);

    wait_idle(&mouth).await;
    assert_eq!(
        *sink.played.lock().unwrap(),
        vec!["first.", "second.", "third."]
    );
}

#[tokio::test]
async fn higher_priority_jumps_the_queue() {
    let sink = RecordingSink::default();
    let mouth = Mouth::new(EchoSynth::default(), sink.clone(), MouthConfig::default());

    mouth.say("normal item.", Priority::Normal);
    mouth.say("high item.", Priority::High);
    mouth.say("critical item.", Priority::Critical);
    let (_shutdown_tx, shutdown_rx) = shutdown();
    mouth.start(shutdown_rx);

    wait_idle(&mouth).await;
    assert_eq!(
        *sink.played.lock().unwrap(),
        vec!["critical item.", "high item.", "normal item."]
    );
}

#[tokio::test]
async fn normal_say_purges_queued_low_items() {
    let sink = RecordingSink::default();
    let mouth = Mouth::new(EchoSynth::default(), sink.clone(), MouthConfig::default());

    mouth.say("idle chatter one.", Priority::Low);
    mouth.say("idle chatter two.", Priority::Low);
    assert_eq!(mouth.queue_len(), 2);

    mouth.say("the real thing.", Priority::Normal);
    assert_eq!(mouth.queue_len(), 1);

    let (_shutdown_tx, shutdown_rx) = shutdown();
    mouth.start(shutdown_rx);
    wait_idle(&mouth).await;
    assert_eq!(*sink.played.lock().unwrap(), vec!["the real thing."]);
}

#[tokio::test]
async fn low_say_does_not_purge() {
    let mouth = Mouth::new(
        EchoSynth::default(),
        RecordingSink::default(),
        MouthConfig::default(),
    );
    mouth.say("one.", Priority::Low);
    mouth.say("two.", Priority::Low);
    assert_eq!(mouth.queue_len(), 2);
}

#[tokio::test]
async fn interrupt_aborts_multichunk_playback() {
    let sink = RecordingSink {
        played: Arc::default(),
        delay_ms: 40,
    };
    let mouth = Mouth::new(
        EchoSynth::default(),
        sink.clone(),
        MouthConfig {
            chunk_size: 30,
            ..MouthConfig::default()
        },
    );
    let (_shutdown_tx, shutdown_rx) = shutdown();
    mouth.start(shutdown_rx);

    // Five sentences, each its own chunk at this chunk size.
    let text = "Sentence number one is here. Sentence number two is here. \
                Sentence number three is here. Sentence number four is here. \
                Sentence number five is here.";
    mouth.say(text, Priority::Normal);

    // Let the first chunk start playing, then cut it off.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(mouth.is_speaking());
    mouth.interrupt();

    wait_idle(&mouth).await;
    let played = sink.played.lock().unwrap().len();
    assert!(played < 5, "expected interruption to skip chunks, played {played}");
    assert_eq!(mouth.queue_len(), 0);
    assert!(!mouth.is_speaking());
}

#[tokio::test]
async fn synthesis_failures_skip_the_chunk_and_continue() {
    let sink = RecordingSink::default();
    let mouth = Mouth::new(
        FailingSynth,
        sink.clone(),
        MouthConfig {
            chunk_size: 30,
            ..MouthConfig::default()
        },
    );
    let (_shutdown_tx, shutdown_rx) = shutdown();
    mouth.start(shutdown_rx);

    mouth.say(
        "The first chunk works fine here. This poison chunk fails loudly. The last chunk still plays.",
        Priority::Normal,
    );
    wait_idle(&mouth).await;

    let played = sink.played.lock().unwrap();
    assert_eq!(played.len(), 2);
    assert!(played[0].contains("first chunk"));
    assert!(played[1].contains("last chunk"));
}

#[tokio::test]
async fn repeated_text_hits_the_cache() {
    let synth = EchoSynth::default();
    let sink = RecordingSink::default();
    let mouth = Mouth::new(synth.clone(), sink.clone(), MouthConfig::default());
    let (_shutdown_tx, shutdown_rx) = shutdown();
    mouth.start(shutdown_rx);

    mouth.say("a cached line.", Priority::Normal);
    wait_idle(&mouth).await;
    mouth.say("a cached line.", Priority::Normal);
    wait_idle(&mouth).await;

    assert_eq!(sink.played.lock().unwrap().len(), 2);
    assert_eq!(synth.calls.load(Ordering::SeqCst), 1);

    let (hits, misses) = mouth.cache().stats();
    assert_eq!(hits, 1);
    assert_eq!(misses, 1);
}

#[tokio::test]
async fn prefetch_warms_the_cache_without_playing() {
    let synth = EchoSynth::default();
    let sink = RecordingSink::default();
    let mouth = Mouth::new(synth.clone(), sink.clone(), MouthConfig::default());
    let (_shutdown_tx, shutdown_rx) = shutdown();
    mouth.start(shutdown_rx);

    mouth.prefetch(&["a prefetched line.".to_string()]);
    // Give the prefetch task a moment.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(mouth.cache().has("a prefetched line."));
    assert!(sink.played.lock().unwrap().is_empty());

    // Saying it now plays from cache with no new synthesis.
    let calls_before = synth.calls.load(Ordering::SeqCst);
    mouth.say("a prefetched line.", Priority::Normal);
    wait_idle(&mouth).await;
    assert_eq!(synth.calls.load(Ordering::SeqCst), calls_before);
    assert_eq!(sink.played.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn long_utterances_update_last_spoken_fillers_do_not() {
    let mouth = Mouth::new(
        EchoSynth::default(),
        RecordingSink::default(),
        MouthConfig::default(),
    );
    let (_shutdown_tx, shutdown_rx) = shutdown();
    mouth.start(shutdown_rx);

    mouth.say("Yes chef?", Priority::Critical);
    wait_idle(&mouth).await;
    assert_eq!(mouth.last_spoken(), "");

    mouth.say("Step 1 of 8. Bring the water to a boil.", Priority::Normal);
    wait_idle(&mouth).await;
    assert_eq!(
        mouth.last_spoken(),
        "Step 1 of 8. Bring the water to a boil."
    );
}
