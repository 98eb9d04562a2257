//! Voice processing module
//!
//! Handles audio capture and playback, plus the remote STT and TTS adapters.

mod capture;
mod playback;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use playback::AudioPlayback;
pub use stt::{SpeechToText, Transcriber};
pub use tts::{Synthesizer, TextToSpeech};
