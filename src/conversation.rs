//! Conversation state: persona, style guide, and turn history
//!
//! Owns everything that persists across turns in one session. History only
//! ever grows; the model-facing window is applied at read time in
//! [`ConversationState::build_request`].

use crate::completion::Message;
use crate::persona::Persona;
use crate::{Error, Result};

/// Number of most-recent turns expanded into each model request
pub const HISTORY_WINDOW: usize = 5;

/// One exchange: user utterance and agent reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// What the user said
    pub user: String,
    /// What the agent replied
    pub reply: String,
}

/// Per-session conversation state
#[derive(Debug)]
pub struct ConversationState {
    persona: Persona,
    style_guide: Option<String>,
    history: Vec<Turn>,
}

impl ConversationState {
    /// Create a fresh conversation for a persona
    #[must_use]
    pub const fn new(persona: Persona) -> Self {
        Self {
            persona,
            style_guide: None,
            history: Vec::new(),
        }
    }

    /// The persona this conversation portrays
    #[must_use]
    pub const fn persona(&self) -> &Persona {
        &self.persona
    }

    /// The derived style guide, if set
    #[must_use]
    pub fn style_guide(&self) -> Option<&str> {
        self.style_guide.as_deref()
    }

    /// Store the style guide; set exactly once before the loop runs
    pub fn set_style_guide(&mut self, guide: String) {
        self.style_guide = Some(guide);
    }

    /// Whether the conversation can start
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.style_guide.is_some()
    }

    /// Full recorded history, oldest first
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Append a completed turn; existing turns are never removed or reordered
    pub fn record_turn(&mut self, user: impl Into<String>, reply: impl Into<String>) {
        self.history.push(Turn {
            user: user.into(),
            reply: reply.into(),
        });
    }

    /// Build the ordered message sequence for one turn
    ///
    /// Layout: one system message (persona facts + style guide), then the
    /// most recent [`HISTORY_WINDOW`] turns as alternating user/assistant
    /// pairs oldest-first, then the new user message. Pure: no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersonaNotReady`] if no style guide has been set.
    pub fn build_request(&self, user_utterance: &str) -> Result<Vec<Message>> {
        let guide = self.style_guide.as_deref().ok_or(Error::PersonaNotReady)?;

        let mut messages = Vec::with_capacity(2 + HISTORY_WINDOW * 2);
        messages.push(Message::system(self.system_prompt(guide)));

        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        for turn in &self.history[start..] {
            messages.push(Message::user(&turn.user));
            messages.push(Message::assistant(&turn.reply));
        }

        messages.push(Message::user(user_utterance));
        Ok(messages)
    }

    /// Synthesize the system message for the current turn
    fn system_prompt(&self, guide: &str) -> String {
        format!(
            "You are {name}, a {age}-year-old virtual date. \
             You are {personality} and interested in {interests}. \
             Engage in a flirtatious yet respectful conversation.\n\n\
             Adhere to the following style guide in all your responses:\n{guide}",
            name = self.persona.name,
            age = self.persona.age,
            personality = self.persona.personality,
            interests = self.persona.interests_line(),
        )
    }
}

/// Build the one-shot style-analysis prompt for a writing sample
#[must_use]
pub fn style_analysis_prompt(sample_text: &str) -> String {
    format!(
        "Analyze the following text and use it to create a comprehensive style guide \
         for an AI persona. The guide should cover tone, vocabulary, sentence structure, \
         and any unique characteristics of the writing style. This style guide will be \
         used to shape all future responses of the AI persona.\n\n\
         Text to analyze: {sample_text}\n\n\
         Create a detailed style guide based on this analysis."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_state() -> ConversationState {
        let mut state = ConversationState::new(Persona::default());
        state.set_style_guide("Keep it breezy.".to_string());
        state
    }

    #[test]
    fn build_request_without_style_guide_fails() {
        let state = ConversationState::new(Persona::default());
        assert!(matches!(
            state.build_request("hi"),
            Err(Error::PersonaNotReady)
        ));
    }

    #[test]
    fn request_layout_for_empty_history() {
        let state = ready_state();
        let messages = state.build_request("hello").unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Alex"));
        assert!(messages[0].content.contains("Keep it breezy."));
        assert_eq!(messages[1], Message::user("hello"));
    }

    #[test]
    fn window_caps_at_five_most_recent_turns_in_order() {
        let mut state = ready_state();
        for i in 0..8 {
            state.record_turn(format!("q{i}"), format!("a{i}"));
        }

        let messages = state.build_request("next").unwrap();
        // system + 5 pairs + new user message
        assert_eq!(messages.len(), 1 + HISTORY_WINDOW * 2 + 1);

        // Oldest turn inside the window is q3; order preserved
        assert_eq!(messages[1], Message::user("q3"));
        assert_eq!(messages[2], Message::assistant("a3"));
        assert_eq!(messages[9], Message::user("q7"));
        assert_eq!(messages[10], Message::assistant("a7"));
        assert_eq!(messages[11], Message::user("next"));
    }

    #[test]
    fn full_history_is_retained_beyond_the_window() {
        let mut state = ready_state();
        for i in 0..8 {
            state.record_turn(format!("q{i}"), format!("a{i}"));
        }
        assert_eq!(state.history().len(), 8);
        assert_eq!(state.history()[0].user, "q0");
    }

    #[test]
    fn build_request_is_idempotent() {
        let mut state = ready_state();
        state.record_turn("hi", "hey there!");

        let first = state.build_request("how are you?").unwrap();
        let second = state.build_request("how are you?").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn style_prompt_embeds_the_sample() {
        let prompt = style_analysis_prompt("short dry sentences");
        assert!(prompt.contains("Text to analyze: short dry sentences"));
        assert!(prompt.contains("style guide"));
    }
}
