//! The Mouth: central speech dispatcher.
//!
//! Serializes all speech through a single pipeline: queue -> chunk ->
//! synthesize (parallel, cached) -> play (sequential). Exactly one
//! utterance plays at a time; higher priority items are spoken first,
//! and `interrupt` aborts whatever is in flight.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::watch;

use crate::Result;

use super::cache::AudioCache;
use super::{truncate, Priority, SpeechRequest};

/// Text-to-speech backend
pub trait Synthesizer: Send + Sync + 'static {
    /// Voice name baked into cache keys
    fn voice(&self) -> &str;

    /// Synthesize text into WAV bytes
    fn synthesize(&self, text: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Audio playback backend
pub trait AudioSink: Send + Sync + 'static {
    /// Play WAV bytes to completion (or until `stop`)
    fn play(&self, wav: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Interrupt the in-flight playback, if any
    fn stop(&self);
}

/// Mouth tuning knobs
#[derive(Debug, Clone)]
pub struct MouthConfig {
    /// Approximate max characters per TTS chunk; text longer than this
    /// is split at sentence boundaries and synthesized in parallel.
    /// Zero disables chunking.
    pub chunk_size: usize,
    /// Capacity of the internal wake-up channel
    pub queue_signal_capacity: usize,
    /// Filesystem directory for the persistent audio cache; `None`
    /// disables the disk layer
    pub cache_dir: Option<PathBuf>,
    /// Whether new cache entries are written to disk. Existing entries
    /// are read either way.
    pub disk_write: bool,
}

impl Default for MouthConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            queue_signal_capacity: 32,
            cache_dir: None,
            disk_write: true,
        }
    }
}

struct Inner<T, P> {
    tts: T,
    player: P,
    cache: AudioCache,
    chunk_size: usize,
    queue: Mutex<Vec<SpeechRequest>>,
    notify: mpsc::Sender<()>,
    speaking: AtomicBool,
    speaking_tx: watch::Sender<bool>,
    interrupted: AtomicBool,
    last_spoken: Mutex<String>,
}

impl<T, P> Inner<T, P> {
    fn set_speaking(&self, value: bool) {
        self.speaking.store(value, Ordering::SeqCst);
        let _ = self.speaking_tx.send(value);
    }
}

/// Cheap-clone handle to the speech dispatcher
pub struct Mouth<T, P> {
    inner: Arc<Inner<T, P>>,
    notify_rx: Mutex<Option<mpsc::Receiver<()>>>,
}

impl<T, P> Clone for Mouth<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            notify_rx: Mutex::new(None),
        }
    }
}

impl<T: Synthesizer, P: AudioSink> Mouth<T, P> {
    /// Create a speech dispatcher. Call `start` to spawn its worker.
    #[must_use]
    pub fn new(tts: T, player: P, config: MouthConfig) -> Self {
        let (notify, notify_rx) = mpsc::channel(config.queue_signal_capacity.max(1));
        let (speaking_tx, _) = watch::channel(false);
        let cache = AudioCache::new(tts.voice(), config.cache_dir.clone(), config.disk_write);
        Self {
            inner: Arc::new(Inner {
                tts,
                player,
                cache,
                chunk_size: config.chunk_size,
                queue: Mutex::new(Vec::new()),
                notify,
                speaking: AtomicBool::new(false),
                speaking_tx,
                interrupted: AtomicBool::new(false),
                last_spoken: Mutex::new(String::new()),
            }),
            notify_rx: Mutex::new(Some(notify_rx)),
        }
    }

    /// Spawn the processing worker. The worker drains the queue in
    /// priority order and exits when the shutdown flag flips.
    ///
    /// # Panics
    ///
    /// Panics if called twice on the same handle.
    pub fn start(&self, mut shutdown: watch::Receiver<bool>) {
        let mut rx = self
            .notify_rx
            .lock()
            .expect("mouth receiver poisoned")
            .take()
            .expect("mouth already started");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tracing::info!("mouth started");
            loop {
                tokio::select! {
                    signal = rx.recv() => {
                        if signal.is_none() {
                            return;
                        }
                        drain(&inner).await;
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("mouth stopped");
                        return;
                    }
                }
            }
        });
    }

    /// Queue text to be spoken. Non-blocking. Queuing at normal
    /// priority or above flushes stale low-priority items.
    pub fn say(&self, text: &str, priority: Priority) {
        let queue_len = {
            let mut queue = self.inner.queue.lock().expect("mouth queue poisoned");
            if priority >= Priority::Normal {
                let before = queue.len();
                queue.retain(|item| item.priority > Priority::Low);
                let dropped = before - queue.len();
                if dropped > 0 {
                    tracing::debug!(dropped, "mouth: flushed low-priority items");
                }
            }
            queue.push(SpeechRequest {
                text: text.to_string(),
                priority,
                queued_at: Instant::now(),
            });
            queue.len()
        };

        tracing::debug!(
            priority = ?priority,
            queue_len,
            text = %truncate(text, 60),
            "mouth: queued"
        );

        // Signal the worker; a full channel means it's already awake.
        let _ = self.inner.notify.try_send(());
    }

    /// Stop the current playback, clear the queue, and abort any
    /// in-progress multi-chunk utterance.
    pub fn interrupt(&self) {
        self.inner
            .queue
            .lock()
            .expect("mouth queue poisoned")
            .clear();
        self.inner.interrupted.store(true, Ordering::SeqCst);
        self.inner.player.stop();
        tracing::debug!("mouth: interrupted — queue cleared, playback stopped");
    }

    /// True while synthesizing or playing audio
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.inner.speaking.load(Ordering::SeqCst)
    }

    /// Watch channel that flips with the speaking state. Used to mute
    /// the Ear while audio plays and unmute it after.
    #[must_use]
    pub fn speaking_changes(&self) -> watch::Receiver<bool> {
        self.inner.speaking_tx.subscribe()
    }

    /// Number of pending speech requests
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().expect("mouth queue poisoned").len()
    }

    /// The most recently spoken non-filler text
    #[must_use]
    pub fn last_spoken(&self) -> String {
        self.inner
            .last_spoken
            .lock()
            .expect("mouth last-spoken poisoned")
            .clone()
    }

    /// The audio cache behind this mouth, for stats and logging
    #[must_use]
    pub fn cache(&self) -> &AudioCache {
        &self.inner.cache
    }

    /// Pre-synthesize texts into the cache so playback starts
    /// instantly when `say` is called. Skips cached chunks; launches
    /// one task per missing chunk and returns immediately.
    pub fn prefetch(&self, texts: &[String]) {
        for text in texts {
            if text.is_empty() {
                continue;
            }
            for chunk in split_chunks(text, self.inner.chunk_size) {
                if self.inner.cache.has(&chunk) {
                    tracing::debug!(text = %truncate(&chunk, 50), "prefetch: already cached");
                    continue;
                }
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    tracing::debug!(text = %truncate(&chunk, 50), "prefetch: synthesizing");
                    match inner.tts.synthesize(&chunk).await {
                        Ok(audio) => {
                            tracing::debug!(
                                bytes = audio.len(),
                                text = %truncate(&chunk, 50),
                                "prefetch: cached"
                            );
                            inner.cache.put(&chunk, audio);
                        }
                        Err(e) => tracing::error!(error = %e, "prefetch: synthesis failed"),
                    }
                });
            }
        }
    }
}

/// Process queued items until the queue runs dry
async fn drain<T: Synthesizer, P: AudioSink>(inner: &Arc<Inner<T, P>>) {
    loop {
        // Clear the interrupted flag so items queued after an
        // interrupt get processed.
        inner.interrupted.store(false, Ordering::SeqCst);

        let Some(item) = dequeue(inner) else { return };

        inner.set_speaking(true);
        process(inner, &item).await;

        // Track the last spoken text, skipping fillers and short acks.
        if item.text.len() > 20 {
            *inner
                .last_spoken
                .lock()
                .expect("mouth last-spoken poisoned") = item.text.clone();
        }

        inner.set_speaking(false);
    }
}

/// Remove and return the highest-priority item; FIFO among equals
fn dequeue<T, P>(inner: &Inner<T, P>) -> Option<SpeechRequest> {
    let mut queue = inner.queue.lock().expect("mouth queue poisoned");
    if queue.is_empty() {
        return None;
    }
    let mut best = 0;
    for (i, item) in queue.iter().enumerate() {
        let current = &queue[best];
        if item.priority > current.priority
            || (item.priority == current.priority && item.queued_at < current.queued_at)
        {
            best = i;
        }
    }
    Some(queue.remove(best))
}

/// Synthesize and play one request, chunking long text
async fn process<T: Synthesizer, P: AudioSink>(inner: &Arc<Inner<T, P>>, req: &SpeechRequest) {
    let waited = req.queued_at.elapsed();
    tracing::debug!(
        priority = ?req.priority,
        waited = ?waited,
        text = %truncate(&req.text, 60),
        "mouth: speaking"
    );

    let chunks = split_chunks(&req.text, inner.chunk_size);
    if chunks.len() <= 1 {
        // Short text: single request, no fan-out overhead.
        match synthesize_cached(inner, &req.text).await {
            Ok(audio) => {
                if let Err(e) = inner.player.play(&audio).await {
                    tracing::error!(error = %e, "mouth: playback failed");
                }
            }
            Err(e) => tracing::error!(error = %e, "mouth: synthesis failed"),
        }
        return;
    }

    tracing::debug!(chunks = chunks.len(), "mouth: split for parallel synthesis");

    // Fire all chunk syntheses at once; results keep their slots so
    // playback order matches text order.
    let synth_jobs = chunks
        .iter()
        .map(|chunk| synthesize_cached(inner, chunk))
        .collect::<Vec<_>>();
    let results = futures::future::join_all(synth_jobs).await;

    for (i, result) in results.into_iter().enumerate() {
        let audio = match result {
            Ok(audio) => audio,
            Err(e) => {
                tracing::error!(chunk = i, error = %e, "mouth: chunk synthesis failed, skipping");
                continue;
            }
        };
        if inner.interrupted.load(Ordering::SeqCst) {
            tracing::debug!("mouth: aborting chunk playback (interrupted)");
            return;
        }
        if let Err(e) = inner.player.play(&audio).await {
            tracing::error!(chunk = i, error = %e, "mouth: chunk playback failed");
        }
    }
}

/// Check the cache, otherwise call the backend and store the result
async fn synthesize_cached<T: Synthesizer, P>(
    inner: &Inner<T, P>,
    text: &str,
) -> Result<Vec<u8>> {
    if let Some(audio) = inner.cache.get(text) {
        return Ok(audio);
    }
    let audio = inner.tts.synthesize(text).await?;
    inner.cache.put(text, audio.clone());
    Ok(audio)
}

/// Break text into sentence-boundary chunks of roughly `chunk_size`
/// characters. Short text (or chunking disabled) comes back whole.
fn split_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    if chunk_size == 0 || text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let sentences = split_sentences(text);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        if !current.is_empty() && current.len() + sentence.len() > chunk_size {
            chunks.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(&sentence);
    }
    if !current.is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks.retain(|c| !c.is_empty());
    chunks
}

/// Split at sentence boundaries (. ! ?), keeping the punctuation and
/// trailing whitespace attached to the preceding sentence
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                current.push(chars.next().expect("peeked"));
            }
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_chunks("Hello there.", 200);
        assert_eq!(chunks, vec!["Hello there."]);
    }

    #[test]
    fn long_text_splits_at_sentence_boundaries() {
        let text = "First sentence here. Second sentence here. Third sentence here.";
        let chunks = split_chunks(text, 25);
        assert!(chunks.len() > 1);
        // No sentence is cut mid-way.
        for chunk in &chunks {
            assert!(chunk.ends_with('.'));
        }
        // Re-joining loses only inter-chunk whitespace.
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined.replace("  ", " "), text);
    }

    #[test]
    fn zero_chunk_size_disables_chunking() {
        let text = "One. Two. Three.";
        assert_eq!(split_chunks(text, 0), vec![text.to_string()]);
    }

    #[test]
    fn sentences_keep_punctuation() {
        let parts = split_sentences("Wait! Really? Yes.");
        assert_eq!(parts, vec!["Wait! ", "Really? ", "Yes."]);
    }
}
