//! Persona configuration
//!
//! A persona is the fixed character profile the agent portrays for the
//! lifetime of a session. The free-text style guide that shapes its voice is
//! derived separately at session start and lives in
//! [`crate::conversation::ConversationState`].

use serde::{Deserialize, Serialize};

/// The character profile the agent portrays
///
/// Immutable once a session starts. Loadable from the `[persona]` section of
/// the config file; missing fields fall back to the defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Persona {
    /// Display name
    pub name: String,

    /// Age in years
    pub age: u8,

    /// Short personality description (e.g. "friendly and outgoing")
    pub personality: String,

    /// Interests woven into the system prompt
    pub interests: Vec<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Alex".to_string(),
            age: 28,
            personality: "friendly and outgoing".to_string(),
            interests: vec![
                "hiking".to_string(),
                "cooking".to_string(),
                "movies".to_string(),
            ],
        }
    }
}

impl Persona {
    /// Interests joined for prompt interpolation
    #[must_use]
    pub fn interests_line(&self) -> String {
        self.interests.join(", ")
    }
}
