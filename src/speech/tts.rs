//! Azure Cognitive Services TTS client

use std::time::Duration;

use crate::{Error, Result};

use super::mouth::Synthesizer;
use super::{DEFAULT_AUDIO_FORMAT, DEFAULT_VOICE};

/// Synthesizes speech via the Azure TTS REST endpoint.
/// Returns RIFF WAV bytes (24 kHz mono 16-bit PCM by default).
pub struct AzureClient {
    subscription_key: String,
    region: String,
    voice: String,
    format: String,
    http: reqwest::Client,
}

impl AzureClient {
    /// Create an Azure TTS client with the given credentials
    #[must_use]
    pub fn new(key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            subscription_key: key.into(),
            region: region.into(),
            voice: DEFAULT_VOICE.to_string(),
            format: DEFAULT_AUDIO_FORMAT.to_string(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Override the TTS voice
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Override the audio output format
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    fn build_ssml(&self, text: &str) -> String {
        format!(
            "<speak version='1.0' xml:lang='en-US'><voice xml:lang='en-US' name='{}'>{}</voice></speak>",
            self.voice, text
        )
    }
}

impl Synthesizer for AzureClient {
    fn voice(&self) -> &str {
        &self.voice
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        );
        let ssml = self.build_ssml(text);
        tracing::debug!(chars = text.len(), voice = %self.voice, "azure tts: synthesizing");

        let response = self
            .http
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.format)
            .header("User-Agent", "OttoCook/1.0")
            .body(ssml)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("azure tts {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(bytes = audio.len(), "azure tts: got audio");
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssml_embeds_voice_and_text() {
        let client = AzureClient::new("key", "westus2").with_voice("en-US-GuyNeural");
        let ssml = client.build_ssml("Chop the onions.");
        assert!(ssml.contains("name='en-US-GuyNeural'"));
        assert!(ssml.contains("Chop the onions."));
        assert!(ssml.starts_with("<speak"));
    }
}
