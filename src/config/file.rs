//! TOML configuration file loading
//!
//! Supports `~/.config/ember/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::persona::Persona;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct EmberConfigFile {
    /// Persona overrides (name, age, personality, interests)
    #[serde(default)]
    pub persona: Option<Persona>,

    /// Completion service configuration
    #[serde(default)]
    pub completion: CompletionFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Style-guide seeding
    #[serde(default)]
    pub style: StyleFileConfig,
}

/// Completion-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct CompletionFileConfig {
    /// Model identifier
    pub model: Option<String>,

    /// Token budget per reply
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f64>,

    /// Nucleus sampling cutoff
    pub top_p: Option<f64>,

    /// Search recency filter (e.g. "month")
    pub search_recency_filter: Option<String>,

    /// Search domain allowlist
    pub search_domain_filter: Option<Vec<String>>,

    /// Max continuation calls for a truncated reply
    pub max_continuation_depth: Option<u32>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// ElevenLabs voice identifier
    pub voice_id: Option<String>,

    /// Capture window per turn, in seconds
    pub capture_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub perplexity: Option<String>,
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Style-guide seeding configuration
#[derive(Debug, Default, Deserialize)]
pub struct StyleFileConfig {
    /// Inline writing sample
    pub sample: Option<String>,

    /// Path to a file containing the writing sample
    pub sample_file: Option<PathBuf>,
}

/// Path of the config file, if a home directory can be resolved
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("ember").join("config.toml"))
}

/// Load the optional config file; missing or unparsable files fall back to
/// defaults (a parse failure is logged, not fatal)
#[must_use]
pub fn load_config_file() -> EmberConfigFile {
    let Some(path) = config_file_path() else {
        return EmberConfigFile::default();
    };

    let Ok(contents) = std::fs::read_to_string(&path) else {
        return EmberConfigFile::default();
    };

    match toml::from_str(&contents) {
        Ok(parsed) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            parsed
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
            EmberConfigFile::default()
        }
    }
}
