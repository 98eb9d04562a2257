//! Speech-to-text adapter (remote Whisper transcription)

use async_trait::async_trait;

use crate::{Error, Result};

/// Default transcription endpoint
const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Size of a WAV container with no sample data
const EMPTY_WAV_LEN: usize = 44;

/// Verbose transcription response with ordered segments
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<TranscriptionSegment>,
}

#[derive(serde::Deserialize)]
struct TranscriptionSegment {
    text: String,
}

/// Capability interface for transcription, substitutable in tests
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Turn a bounded WAV capture into text
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Transcribes speech to text via the Whisper API
pub struct SpeechToText {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SpeechToText {
    /// Create a new STT instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: TRANSCRIPTIONS_URL.to_string(),
            api_key,
            model,
        })
    }

    /// Override the transcription endpoint (used to point tests at a local server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    /// Transcribe WAV audio to text
    ///
    /// Segments are concatenated in emission order with no separator. A
    /// capture with no sample data yields an empty transcript without a
    /// network round-trip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stt`] if the request or decoding fails
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        if audio.len() <= EMPTY_WAV_LEN {
            return Ok(String::new());
        }

        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Stt(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!(
                "transcription API error {status}: {body}"
            )));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Stt(e.to_string()))?;

        let transcript = if result.segments.is_empty() {
            result.text
        } else {
            result
                .segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<String>()
        };

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}
