//! Configuration management
//!
//! Everything the agent needs is assembled here and passed explicitly into
//! constructors — credentials, model choices, and voice settings are never
//! read from ambient globals after startup. Precedence: env > toml > default.

pub mod file;

use std::time::Duration;

use crate::persona::Persona;
use crate::Result;

/// Default completion model
const DEFAULT_MODEL: &str = "llama-3.1-sonar-small-128k-online";

/// Default ElevenLabs voice
const DEFAULT_VOICE_ID: &str = "jsCqWAovK2LkecY7zXl4";

/// Ember agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Persona portrayed this session
    pub persona: Persona,

    /// API keys for external services
    pub api_keys: ApiKeys,

    /// Completion service configuration
    pub completion: CompletionConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Writing sample used to derive the style guide, if configured
    pub style_sample: Option<String>,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Perplexity API key (chat completions)
    pub perplexity: Option<String>,

    /// `OpenAI` API key (Whisper transcription)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (speech synthesis)
    pub elevenlabs: Option<String>,
}

/// Completion service configuration
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model identifier
    pub model: String,

    /// Token budget per reply
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f64,

    /// Nucleus sampling cutoff
    pub top_p: f64,

    /// Search domain allowlist
    pub search_domain_filter: Vec<String>,

    /// Search recency filter
    pub search_recency_filter: String,

    /// Max continuation calls for a truncated reply
    pub max_continuation_depth: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 150,
            temperature: 0.7,
            top_p: 0.9,
            search_domain_filter: vec!["perplexity.ai".to_string()],
            search_recency_filter: "month".to_string(),
            max_continuation_depth: 2,
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input/output
    pub enabled: bool,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// `ElevenLabs` voice identifier
    pub voice_id: String,

    /// Capture window per turn, in seconds
    pub capture_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: "whisper-1".to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            capture_secs: 5,
        }
    }
}

impl VoiceConfig {
    /// Capture window as a duration
    #[must_use]
    pub const fn capture_window(&self) -> Duration {
        Duration::from_secs(self.capture_secs)
    }
}

impl Config {
    /// Load configuration
    ///
    /// # Errors
    ///
    /// Reserved for future validation; loading itself is infallible and
    /// missing keys surface when the corresponding client is constructed
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// See [`Config::load`]
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();

        let persona = fc.persona.unwrap_or_default();

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            perplexity: std::env::var("PERPLEXITY_API_KEY")
                .ok()
                .or(fc.api_keys.perplexity),
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .or(fc.api_keys.elevenlabs),
        };

        let defaults = CompletionConfig::default();
        let completion = CompletionConfig {
            model: std::env::var("EMBER_MODEL")
                .ok()
                .or(fc.completion.model)
                .unwrap_or(defaults.model),
            max_tokens: fc.completion.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: fc.completion.temperature.unwrap_or(defaults.temperature),
            top_p: fc.completion.top_p.unwrap_or(defaults.top_p),
            search_domain_filter: fc
                .completion
                .search_domain_filter
                .unwrap_or(defaults.search_domain_filter),
            search_recency_filter: fc
                .completion
                .search_recency_filter
                .unwrap_or(defaults.search_recency_filter),
            max_continuation_depth: fc
                .completion
                .max_continuation_depth
                .unwrap_or(defaults.max_continuation_depth),
        };

        let voice_defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            enabled: if disable_voice {
                false
            } else {
                fc.voice.enabled.unwrap_or(true)
            },
            stt_model: std::env::var("EMBER_STT_MODEL")
                .ok()
                .or(fc.voice.stt_model)
                .unwrap_or(voice_defaults.stt_model),
            voice_id: std::env::var("EMBER_VOICE_ID")
                .ok()
                .or(fc.voice.voice_id)
                .unwrap_or(voice_defaults.voice_id),
            capture_secs: fc.voice.capture_secs.unwrap_or(voice_defaults.capture_secs),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled");
        }

        // Inline sample wins over a sample file
        let style_sample = fc.style.sample.or_else(|| {
            fc.style.sample_file.and_then(|path| {
                std::fs::read_to_string(&path)
                    .map_err(|e| {
                        tracing::warn!(path = %path.display(), error = %e, "could not read style sample file");
                        e
                    })
                    .ok()
            })
        });

        Ok(Self {
            persona,
            api_keys,
            completion,
            voice,
            style_sample,
        })
    }
}
