//! Shared test utilities: scriptable engine mocks
//!
//! Counters and captured requests are handed out as `Arc` handles so tests
//! can keep observing after the agent takes ownership of a mock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ember_agent::completion::{CompletionEngine, Message};
use ember_agent::conversation::ConversationState;
use ember_agent::voice::{Synthesizer, Transcriber};
use ember_agent::{Error, Persona, Result};

/// A conversation with the style guide already set
#[must_use]
pub fn ready_conversation() -> ConversationState {
    let mut state = ConversationState::new(Persona::default());
    state.set_style_guide("Keep it short and warm.".to_string());
    state
}

/// Completion engine that returns scripted replies in order
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Vec<Message>>>>,
}

impl ScriptedCompletion {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to the number of `complete` calls made so far
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Handle to the most recent message sequence received
    pub fn last_request(&self) -> Arc<Mutex<Option<Vec<Message>>>> {
        Arc::clone(&self.last_request)
    }
}

#[async_trait]
impl CompletionEngine for ScriptedCompletion {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Completion("mock script exhausted".to_string()))
    }
}

/// Completion engine that always fails
pub struct FailingCompletion {
    calls: Arc<AtomicUsize>,
}

impl FailingCompletion {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl CompletionEngine for FailingCompletion {
    async fn complete(&self, _messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Completion("service unreachable".to_string()))
    }
}

/// Transcriber that returns a fixed transcript
pub struct StaticTranscriber {
    transcript: String,
}

impl StaticTranscriber {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

#[async_trait]
impl Transcriber for StaticTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        Ok(self.transcript.clone())
    }
}

/// Synthesizer that returns fixed bytes and counts calls
pub struct StaticSynthesizer {
    audio: Vec<u8>,
    calls: Arc<AtomicUsize>,
}

impl StaticSynthesizer {
    pub fn new(audio: Vec<u8>) -> Self {
        Self {
            audio,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Synthesizer for StaticSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.audio.clone())
    }
}

/// Synthesizer that always fails
pub struct FailingSynthesizer;

#[async_trait]
impl Synthesizer for FailingSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Err(Error::Tts {
            status: 500,
            body: "voice model unavailable".to_string(),
        })
    }
}
