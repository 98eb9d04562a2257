//! The turn-taking conversation loop
//!
//! Orchestrates capture, transcription, completion, synthesis, and playback
//! for one session. Strictly half-duplex: each stage blocks until complete,
//! and the next capture never starts before the prior turn's audio finishes.

use std::time::Duration;

use crate::completion::{CompletionEngine, Message};
use crate::conversation::{ConversationState, style_analysis_prompt};
use crate::voice::{AudioCapture, AudioPlayback, SAMPLE_RATE, Synthesizer, Transcriber, samples_to_wav};
use crate::{Error, Result};

/// Fixed reply delivered when the completion service is unavailable
pub const APOLOGY: &str = "I'm sorry, I'm having trouble responding right now.";

/// Keywords that end the conversation
const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// No style guide yet; the loop may not run
    AwaitingStyle,
    /// Style guide set; turns may be taken
    Ready,
    /// User ended the conversation
    Terminated,
}

/// Outcome of a single conversation turn
#[derive(Debug)]
pub enum TurnOutcome {
    /// The user asked to end the conversation
    Exit,
    /// A completed exchange; `audio` is `None` when synthesis failed
    Reply {
        /// Reply text (the fixed apology when completion was unavailable)
        text: String,
        /// Synthesized MPEG audio for the reply
        audio: Option<Vec<u8>>,
    },
}

/// One voice exchange as returned to an external (server-layer) caller
#[derive(Debug)]
pub struct AudioTurn {
    /// What the transcription adapter heard
    pub transcript: String,
    /// The persona-styled reply text
    pub reply: String,
    /// Synthesized reply audio; `None` when synthesis failed
    pub reply_audio: Option<Vec<u8>>,
}

/// Whether a transcript is an exit request
fn is_exit(transcript: &str) -> bool {
    let trimmed = transcript.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&trimmed.as_str())
}

/// Drives one conversation session over a set of engine adapters
///
/// Generic over the three capability interfaces so alternate engines or
/// mocks can be substituted without touching the loop.
pub struct VoiceAgent<C, T, S> {
    conversation: ConversationState,
    completion: C,
    transcriber: T,
    synthesizer: S,
    state: AgentState,
    capture_window: Duration,
}

impl<C, T, S> VoiceAgent<C, T, S>
where
    C: CompletionEngine,
    T: Transcriber,
    S: Synthesizer,
{
    /// Create an agent for one session
    pub fn new(
        conversation: ConversationState,
        completion: C,
        transcriber: T,
        synthesizer: S,
        capture_window: Duration,
    ) -> Self {
        let state = if conversation.is_ready() {
            AgentState::Ready
        } else {
            AgentState::AwaitingStyle
        };

        Self {
            conversation,
            completion,
            transcriber,
            synthesizer,
            state,
            capture_window,
        }
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// The conversation this agent drives
    #[must_use]
    pub const fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    /// Derive and store the persona style guide from a writing sample
    ///
    /// The one-shot setup call that seeds the loop's system context; the
    /// only transition out of [`AgentState::AwaitingStyle`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::StyleNotSet`] if the analysis request fails; the
    /// guide remains unset.
    pub async fn set_persona_style(&mut self, sample_text: &str) -> Result<()> {
        let request = vec![Message::user(style_analysis_prompt(sample_text))];

        match self.completion.complete(&request).await {
            Ok(guide) => {
                self.conversation.set_style_guide(guide);
                if self.state == AgentState::AwaitingStyle {
                    self.state = AgentState::Ready;
                }
                tracing::info!("persona style guide set");
                Ok(())
            }
            Err(e) => Err(Error::StyleNotSet(e.to_string())),
        }
    }

    /// Text-only turn: complete, record, return the reply
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersonaNotReady`] before style setup, or
    /// [`Error::Completion`] when the remote service fails; nothing is
    /// recorded on error.
    pub async fn submit_text(&mut self, text: &str) -> Result<String> {
        let request = self.conversation.build_request(text)?;
        let reply = self.completion.complete(&request).await?;
        self.conversation.record_turn(text, &reply);
        Ok(reply)
    }

    /// Voice turn without local playback, for an external server layer
    ///
    /// The audio side is best-effort: a synthesis failure still returns the
    /// reply text, with `reply_audio` unset.
    ///
    /// # Errors
    ///
    /// Returns error if transcription, request building, or completion fails
    pub async fn submit_audio(&mut self, wav: &[u8]) -> Result<AudioTurn> {
        let transcript = self.transcriber.transcribe(wav).await?;
        let reply = self.submit_text(&transcript).await?;

        let reply_audio = match self.synthesizer.synthesize(&reply).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!(error = %e, "synthesis failed, returning text only");
                None
            }
        };

        Ok(AudioTurn {
            transcript,
            reply,
            reply_audio,
        })
    }

    /// Drive one turn from an already-transcribed utterance
    ///
    /// Exit keywords terminate the session without touching the completion
    /// or synthesis engines. A completion failure degrades to the fixed
    /// apology and the turn is not recorded; a synthesis failure keeps the
    /// recorded reply and just skips the audio.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersonaNotReady`] before style setup
    pub async fn take_turn(&mut self, transcript: &str) -> Result<TurnOutcome> {
        if is_exit(transcript) {
            self.state = AgentState::Terminated;
            return Ok(TurnOutcome::Exit);
        }

        let request = self.conversation.build_request(transcript)?;

        let text = match self.completion.complete(&request).await {
            Ok(reply) => {
                self.conversation.record_turn(transcript, &reply);
                reply
            }
            Err(e) => {
                tracing::warn!(error = %e, "completion unavailable, degrading to apology");
                APOLOGY.to_string()
            }
        };

        let audio = match self.synthesizer.synthesize(&text).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!(error = %e, "synthesis failed, skipping playback");
                None
            }
        };

        Ok(TurnOutcome::Reply { text, audio })
    }

    /// Run the voice conversation loop until the user exits
    ///
    /// The capture stream is acquired up front and released when the loop
    /// ends, on the error path included. A failed turn is reported in place
    /// of the expected reply and the loop resumes listening.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersonaNotReady`] if called before style setup, or
    /// an audio error if the capture device cannot be acquired
    pub async fn run(
        &mut self,
        capture: &mut AudioCapture,
        playback: &mut AudioPlayback,
    ) -> Result<()> {
        if self.state != AgentState::Ready {
            return Err(Error::PersonaNotReady);
        }

        capture.start()?;
        let result = self.run_inner(capture, playback).await;
        capture.stop();
        result
    }

    async fn run_inner(
        &mut self,
        capture: &mut AudioCapture,
        playback: &mut AudioPlayback,
    ) -> Result<()> {
        let name = self.conversation.persona().name.clone();
        tracing::info!(persona = %name, "conversation started");
        println!("You're now chatting with {name}. Say 'exit' or 'quit' to end the conversation.");

        loop {
            println!("Listening...");
            let samples = capture.capture_for(self.capture_window).await?;
            let wav = samples_to_wav(&samples, SAMPLE_RATE)?;

            let transcript = match self.transcriber.transcribe(&wav).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "transcription failed, listening again");
                    println!("Sorry, I didn't catch that.");
                    continue;
                }
            };
            tracing::debug!(transcript = %transcript, "utterance transcribed");

            match self.take_turn(&transcript).await? {
                TurnOutcome::Exit => {
                    println!("Ending the conversation. Goodbye!");
                    break;
                }
                TurnOutcome::Reply { text, audio } => {
                    println!("{name}: {text}");
                    if let Some(mp3) = audio {
                        if let Err(e) = playback.play_mp3(&mp3).await {
                            tracing::warn!(error = %e, "playback failed");
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_keywords_are_case_insensitive() {
        assert!(is_exit("exit"));
        assert!(is_exit("EXIT"));
        assert!(is_exit("Quit"));
        assert!(is_exit("  quit  "));
        assert!(!is_exit("exits"));
        assert!(!is_exit("please exit"));
        assert!(!is_exit(""));
    }
}
