//! Audio playback to speakers
//!
//! Plays RIFF WAV data (as returned by the TTS endpoint) on the
//! default output device. Playback runs on the blocking pool; `stop`
//! flips a flag the playback loop checks so interruption is prompt.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

use super::mouth::AudioSink;
use super::PLAYBACK_SAMPLE_RATE;

/// Plays WAV audio on the default output device
pub struct CpalPlayer {
    config: StreamConfig,
    stop: Arc<AtomicBool>,
}

impl CpalPlayer {
    /// Create a playback instance
    ///
    /// # Errors
    ///
    /// Returns `Audio` if no output device or suitable config exists.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: stereo.
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio player initialized"
        );

        Ok(Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl AudioSink for CpalPlayer {
    async fn play(&self, wav: &[u8]) -> Result<()> {
        let samples = decode_wav(wav)?;
        if samples.is_empty() {
            return Ok(());
        }

        self.stop.store(false, Ordering::SeqCst);
        let stop = Arc::clone(&self.stop);
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || play_blocking(&config, samples, &stop))
            .await
            .map_err(|e| Error::Audio(format!("playback task: {e}")))?
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        tracing::debug!("audio player: interrupted");
    }
}

/// Build an output stream and block until the samples drain, the stop
/// flag flips, or a safety timeout passes.
fn play_blocking(config: &StreamConfig, samples: Vec<f32>, stop: &AtomicBool) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let channels = config.channels as usize;
    let sample_count = samples.len();

    let position = Arc::new(Mutex::new(0usize));
    let finished = Arc::new(AtomicBool::new(false));

    let samples = Arc::new(samples);
    let samples_cb = Arc::clone(&samples);
    let position_cb = Arc::clone(&position);
    let finished_cb = Arc::clone(&finished);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = position_cb.lock().expect("playback position poisoned");
                for frame in data.chunks_mut(channels) {
                    let sample = if *pos < samples_cb.len() {
                        let s = samples_cb[*pos];
                        *pos += 1;
                        s
                    } else {
                        finished_cb.store(true, Ordering::SeqCst);
                        0.0
                    };
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(duration_ms + 500);

    while !finished.load(Ordering::SeqCst) && !stop.load(Ordering::SeqCst) {
        if std::time::Instant::now() > deadline {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    drop(stream);
    tracing::debug!(samples = sample_count, "playback done");
    Ok(())
}

/// Decode RIFF WAV bytes into f32 samples, downmixing stereo
fn decode_wav(wav: &[u8]) -> Result<Vec<f32>> {
    let reader =
        hound::WavReader::new(Cursor::new(wav)).map_err(|e| Error::Audio(format!("wav: {e}")))?;
    let spec = reader.spec();

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / 32768.0))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(format!("wav: {e}")))?,
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(format!("wav: {e}")))?,
    };

    if spec.channels == 2 {
        Ok(raw
            .chunks(2)
            .map(|c| (c[0] + c.get(1).copied().unwrap_or(c[0])) / 2.0)
            .collect())
    } else {
        Ok(raw)
    }
}
