//! pagelens Model Provider Layer
//!
//! Everything that talks to a language-model provider lives here:
//!
//! - [`EmbeddingModel`]: batch text embeddings, bound to a model id
//! - [`ChatModel`]: chat completions (text and image content)
//! - [`VisionEnricher`]: best-effort image → text + description
//! - [`synthesize_answer`]: grounded answer over retrieved hits
//!
//! # Providers
//!
//! - `OpenAiClient`: any OpenAI-compatible HTTP endpoint
//! - `MockProvider`: deterministic chat responses for tests
//! - `HashEmbedder`: deterministic offline embeddings
//!
//! # Examples
//!
//! ```
//! use pagelens_llm::{ChatMessage, ChatModel, MockProvider};
//!
//! # async fn example() -> Result<(), pagelens_llm::LlmError> {
//! let provider = MockProvider::new("Hello from LLM!");
//! let reply = provider.complete(&[ChatMessage::user("hi")]).await?;
//! assert_eq!(reply, "Hello from LLM!");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod answer;
pub mod embedding;
pub mod message;
pub mod openai;
pub mod vision;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use answer::{build_context, synthesize_answer};
pub use embedding::{cosine_similarity, HashEmbedder};
pub use message::{ChatMessage, ContentPart, MessageContent, Role};
pub use openai::{OpenAiChat, OpenAiClient, OpenAiConfig, OpenAiEmbedder};
pub use vision::{VisionEnricher, VisionOutcome, VisionStatus};

/// Errors that can occur during provider operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// Response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Client misconfiguration (missing key, bad URL)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Chat-completion capable model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Name of the model requests are sent to
    fn model_name(&self) -> &str;

    /// Run one completion and return the assistant text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// Text embedding model
///
/// The id returned by [`EmbeddingModel::model_id`] is persisted next to a
/// collection; vectors produced by different ids are not comparable.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Stable identifier of the model producing the vectors
    fn model_id(&self) -> &str;

    /// Embed a batch of texts. The output has one vector per input, in order,
    /// and every vector has the same length.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Mock chat provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. A
/// response is looked up by the text of the last message; unknown prompts
/// get the default response.
///
/// # Examples
///
/// ```
/// use pagelens_llm::{ChatMessage, ChatModel, MockProvider};
///
/// # async fn example() {
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// let reply = provider.complete(&[ChatMessage::user("prompt1")]).await.unwrap();
/// assert_eq!(reply, "response1");
/// assert_eq!(provider.call_count(), 1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    call_count: Arc<Mutex<usize>>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    fail_all: bool,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            fail_all: false,
        }
    }

    /// Create a provider whose every call fails
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), response.into());
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), "ERROR".to_string());
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Messages received by every call so far
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl ChatModel for MockProvider {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        *self.call_count.lock().unwrap() += 1;
        self.requests.lock().unwrap().push(messages.to_vec());

        if self.fail_all {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        let prompt = messages.last().map(ChatMessage::text).unwrap_or_default();
        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(&prompt) {
            if response == "ERROR" {
                return Err(LlmError::Other("Mock error".to_string()));
            }
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }
}
