//! Chat completion client
//!
//! Wraps the Perplexity chat-completions API and papers over token-budget
//! truncation: a reply that stops mid-sentence is extended with bounded
//! follow-up calls until it ends in terminal punctuation or the continuation
//! budget runs out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;
use crate::{Error, Result};

/// Default completions endpoint
const COMPLETIONS_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Fixed user message sent when asking the model to finish a truncated reply
pub const CONTINUATION_PROMPT: &str = "Please continue your previous response.";

/// A role-tagged message submitted to the completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// One of `system`, `user`, `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request payload for the completions endpoint
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    return_citations: bool,
    return_images: bool,
    return_related_questions: bool,
    search_domain_filter: &'a [String],
    search_recency_filter: &'a str,
    stream: bool,
    presence_penalty: f64,
    frequency_penalty: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Capability interface for chat completion, substitutable in tests
#[async_trait]
pub trait CompletionEngine: Send + Sync {
    /// Turn an ordered message sequence into a reply
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// Client for the remote chat-completion service
#[derive(Debug)]
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Create a new completion client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, config: CompletionConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Perplexity API key required for completions".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: COMPLETIONS_URL.to_string(),
            api_key,
            config,
        })
    }

    /// Override the completions endpoint (used to point tests at a local server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Issue a single completion call
    async fn request(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            top_k: 0,
            return_citations: true,
            return_images: false,
            return_related_questions: false,
            search_domain_filter: &self.config.search_domain_filter,
            search_recency_filter: &self.config.search_recency_filter,
            stream: false,
            presence_penalty: 0.0,
            frequency_penalty: 1.0,
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Completion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "completion API error");
            return Err(Error::Completion(format!(
                "completion API error {status}: {body}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Completion(e.to_string()))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Completion("completion response had no choices".to_string()))
    }
}

/// Whether a reply ends on a sentence boundary
fn is_sentence_complete(reply: &str) -> bool {
    reply.ends_with(['.', '!', '?'])
}

#[async_trait]
impl CompletionEngine for CompletionClient {
    /// Complete with truncation-aware continuation
    ///
    /// The opening call must succeed; each continuation call reuses the same
    /// system-plus-history prefix with the final user message swapped for
    /// [`CONTINUATION_PROMPT`], and its fragment is joined with a single
    /// space. Running out of budget (or a continuation-call failure) returns
    /// the best-effort concatenation rather than an error.
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let mut reply = self.request(messages).await?;
        let mut budget = self.config.max_continuation_depth;

        while budget > 0 && !is_sentence_complete(&reply) {
            budget -= 1;
            tracing::debug!(remaining = budget, "reply truncated, requesting continuation");

            let mut follow: Vec<Message> =
                messages[..messages.len().saturating_sub(1)].to_vec();
            follow.push(Message::user(CONTINUATION_PROMPT));

            match self.request(&follow).await {
                Ok(fragment) => {
                    reply.push(' ');
                    reply.push_str(&fragment);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "continuation call failed, keeping partial reply");
                    break;
                }
            }
        }

        if !is_sentence_complete(&reply) {
            tracing::debug!("continuation budget exhausted, returning best-effort reply");
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_completion_detection() {
        assert!(is_sentence_complete("Hello."));
        assert!(is_sentence_complete("Really?"));
        assert!(is_sentence_complete("Wow!"));
        assert!(!is_sentence_complete("Hello there"));
        assert!(!is_sentence_complete("trailing comma,"));
        assert!(!is_sentence_complete(""));
    }

    #[test]
    fn message_constructors() {
        assert_eq!(Message::system("a").role, "system");
        assert_eq!(Message::user("b").role, "user");
        assert_eq!(Message::assistant("c").role, "assistant");
        assert_eq!(Message::user("b").content, "b");
    }
}
