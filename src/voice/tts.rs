//! Text-to-speech adapter (ElevenLabs)

use async_trait::async_trait;

use crate::{Error, Result};

/// Default synthesis endpoint; the voice id is appended per request
const SYNTHESIS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Voice-stability parameters, fixed for the session
const STABILITY: f32 = 0.75;
const SIMILARITY_BOOST: f32 = 0.75;

#[derive(serde::Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(serde::Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

/// Capability interface for speech synthesis, substitutable in tests
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Turn reply text into an in-memory MPEG audio stream
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Synthesizes speech from text via a voice-specific endpoint
pub struct TextToSpeech {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice_id: String,
}

impl TextToSpeech {
    /// Create a new TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, voice_id: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: SYNTHESIS_URL.to_string(),
            api_key,
            voice_id,
        })
    }

    /// Override the synthesis endpoint (used to point tests at a local server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Synthesizer for TextToSpeech {
    /// Synthesize text to MPEG audio bytes
    ///
    /// The stream is returned in memory; persisting it is the caller's
    /// choice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tts`] with the remote status and body on a non-200
    /// response
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        tracing::debug!(chars = text.len(), voice = %self.voice_id, "starting synthesis");

        let request = SynthesisRequest {
            text,
            voice_settings: VoiceSettings {
                stability: STABILITY,
                similarity_boost: SIMILARITY_BOOST,
            },
        };

        let url = format!("{}/{}", self.base_url, self.voice_id);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "synthesis API error");
            return Err(Error::Tts {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}
