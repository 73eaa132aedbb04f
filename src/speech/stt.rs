//! Speech-to-text via the whisper.cpp CLI
//!
//! Samples are written to a temp WAV and handed to the `whisper-cli`
//! binary; its stdout is the transcript. Chunked transcription keeps
//! per-invocation latency bounded during long utterances.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use rand::RngCore;

use crate::{Error, Result};

use super::capture::samples_to_wav;
use super::CAPTURE_SAMPLE_RATE;

/// Speech-to-text backend
pub trait SttEngine: Send + Sync + 'static {
    /// Transcribe 16 kHz mono samples into text
    fn transcribe(&self, samples: &[f32]) -> impl Future<Output = Result<String>> + Send;
}

/// Transcriber configuration
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    /// Path to the whisper-cpp CLI binary
    pub whisper_bin: String,
    /// Path to the GGML model file
    pub model_path: PathBuf,
    /// Directory for temporary WAV files
    pub temp_dir: PathBuf,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            whisper_bin: "whisper-cli".to_string(),
            model_path: PathBuf::from("bin/ggml-small.bin"),
            temp_dir: PathBuf::from(".otto-stt"),
        }
    }
}

/// Shells out to whisper-cli for transcription
pub struct Transcriber {
    config: TranscriberConfig,
}

impl Transcriber {
    /// Create a transcriber, ensuring the temp directory exists
    ///
    /// # Errors
    ///
    /// Returns `Stt` when the model file is missing or the temp dir
    /// can't be created.
    pub fn new(config: TranscriberConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(Error::Stt(format!(
                "whisper model not found at {}",
                config.model_path.display()
            )));
        }
        std::fs::create_dir_all(&config.temp_dir)
            .map_err(|e| Error::Stt(format!("temp dir: {e}")))?;
        Ok(Self { config })
    }

    fn temp_wav_path(&self) -> PathBuf {
        let mut bytes = [0u8; 6];
        rand::thread_rng().fill_bytes(&mut bytes);
        let name: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        self.config.temp_dir.join(format!("otto-{name}.wav"))
    }
}

impl SttEngine for Transcriber {
    async fn transcribe(&self, samples: &[f32]) -> Result<String> {
        if samples.is_empty() {
            return Ok(String::new());
        }

        let wav = samples_to_wav(samples, CAPTURE_SAMPLE_RATE)?;
        let path = self.temp_wav_path();
        tokio::fs::write(&path, &wav)
            .await
            .map_err(|e| Error::Stt(format!("writing {}: {e}", path.display())))?;

        let output = tokio::process::Command::new(&self.config.whisper_bin)
            .arg("-m")
            .arg(&self.config.model_path)
            .arg("-f")
            .arg(&path)
            .arg("--no-prints")
            .arg("--no-timestamps")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        // Best effort cleanup either way.
        let _ = tokio::fs::remove_file(&path).await;

        let output = output.map_err(|e| {
            Error::Stt(format!("running {}: {e}", self.config.whisper_bin))
        })?;

        if !output.status.success() {
            return Err(Error::Stt(format!(
                "{} exited with {}",
                self.config.whisper_bin, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(chars = text.len(), "transcribed chunk");
        Ok(text)
    }
}
