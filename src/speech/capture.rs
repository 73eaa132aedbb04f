//! Microphone capture
//!
//! Owns the cpal input stream on a dedicated thread so handles stay
//! `Send`; callers drain the sample buffer at their own cadence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

use super::CAPTURE_SAMPLE_RATE;

struct Shared {
    buffer: Mutex<Vec<f32>>,
    shutdown: AtomicBool,
}

/// Captures 16 kHz mono f32 samples from the default input device
pub struct AudioCapture {
    shared: Arc<Shared>,
}

impl AudioCapture {
    /// Open the default input device and start capturing
    ///
    /// # Errors
    ///
    /// Returns `Audio` if no input device or suitable config exists.
    pub fn start() -> Result<Self> {
        let shared = Arc::new(Shared {
            buffer: Mutex::new(Vec::new()),
            shutdown: AtomicBool::new(false),
        });

        let thread_shared = Arc::clone(&shared);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        std::thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || capture_thread(&thread_shared, &ready_tx))
            .map_err(|e| Error::Audio(format!("capture thread: {e}")))?;

        ready_rx
            .recv()
            .map_err(|_| Error::Audio("capture thread died during startup".to_string()))??;

        Ok(Self { shared })
    }

    /// Samples captured since the last call
    #[must_use]
    pub fn take(&self) -> Vec<f32> {
        std::mem::take(&mut *self.shared.buffer.lock().expect("capture buffer poisoned"))
    }

    /// Drop anything buffered so far
    pub fn clear(&self) {
        self.shared
            .buffer
            .lock()
            .expect("capture buffer poisoned")
            .clear();
    }

    /// Sample rate of the captured audio
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        CAPTURE_SAMPLE_RATE
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
    }
}

fn capture_thread(shared: &Arc<Shared>, ready: &mpsc::Sender<Result<()>>) {
    let stream = match build_stream(shared) {
        Ok(s) => {
            let _ = ready.send(Ok(()));
            s
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        tracing::error!(error = %e, "audio capture start failed");
        return;
    }
    tracing::debug!(sample_rate = CAPTURE_SAMPLE_RATE, "audio capture started");

    while !shared.shutdown.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }
    drop(stream);
    tracing::debug!("audio capture stopped");
}

fn build_stream(shared: &Arc<Shared>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

    let supported = device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(CAPTURE_SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(CAPTURE_SAMPLE_RATE)
        })
        .ok_or_else(|| Error::Audio("no suitable input config found".to_string()))?;

    let config: StreamConfig = supported
        .with_sample_rate(SampleRate(CAPTURE_SAMPLE_RATE))
        .config();

    tracing::debug!(
        device = device.name().unwrap_or_default(),
        channels = config.channels,
        "audio capture initialized"
    );

    let buffer = Arc::clone(shared);
    device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = buffer.buffer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            |err| {
                tracing::error!(error = %err, "audio capture error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))
}

/// Encode f32 samples as 16-bit mono WAV bytes
///
/// # Errors
///
/// Returns `Audio` if WAV encoding fails.
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Audio(e.to_string()))?;
        for &sample in samples {
            let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(value)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::Audio(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_encoding_round_trips() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let wav = samples_to_wav(&samples, CAPTURE_SAMPLE_RATE).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, CAPTURE_SAMPLE_RATE);

        let decoded: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(decoded.len(), 5);
        assert_eq!(decoded[0], 0);
        assert!((f32::from(decoded[1]) / 32767.0 - 0.5).abs() < 0.001);
        assert_eq!(decoded[3], 32767);
    }
}
