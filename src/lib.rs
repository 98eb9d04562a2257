//! Ember - voice-first conversational companion
//!
//! This library provides the core conversation pipeline:
//! - Turn-taking loop (capture, transcribe, complete, synthesize, play)
//! - Conversation state (persona, style guide, windowed history)
//! - Truncation-aware chat completion client
//! - Remote STT/TTS adapters behind substitutable capability traits
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Interfaces                         │
//! │        CLI (voice loop / chat)  │  server layer      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  VoiceAgent                          │
//! │   ConversationState  │  capture  │  playback        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Remote services                        │
//! │   Completion  │  Whisper STT  │  ElevenLabs TTS     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod persona;
pub mod voice;

pub use agent::{APOLOGY, AgentState, AudioTurn, TurnOutcome, VoiceAgent};
pub use completion::{CONTINUATION_PROMPT, CompletionClient, CompletionEngine, Message};
pub use config::Config;
pub use conversation::{ConversationState, HISTORY_WINDOW, Turn};
pub use error::{Error, Result};
pub use persona::Persona;
