//! OpenAI-compatible Provider
//!
//! One HTTP client shared by the embedding, vision and chat roles. The client
//! is cheap to clone (the underlying connection pool is reference counted), so
//! it is built once per process and handed to each component.
//!
//! # Examples
//!
//! ```no_run
//! use pagelens_llm::{OpenAiClient, OpenAiConfig};
//!
//! let client = OpenAiClient::new(OpenAiConfig::new("sk-...")).unwrap();
//! let embedder = client.embedder("text-embedding-3-large");
//! let chat = client.chat("gpt-5-mini");
//! ```

use crate::message::ChatMessage;
use crate::{ChatModel, EmbeddingModel, LlmError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for a single request (5 minutes; vision calls are slow)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";

/// Default vision model
pub const DEFAULT_VISION_MODEL: &str = "gpt-5-mini";

/// Default chat model for answer synthesis
pub const DEFAULT_CHAT_MODEL: &str = "gpt-5-mini";

/// Maximum inputs sent in one embeddings request
pub const DEFAULT_EMBEDDING_BATCH: usize = 256;

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token
    pub api_key: String,
    /// API root, without trailing `/`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum inputs per embeddings request
    pub embedding_batch_size: usize,
}

impl OpenAiConfig {
    /// Settings for the public API with the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH,
        }
    }

    /// Point at another OpenAI-compatible server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the embeddings batch size (minimum 1)
    pub fn with_embedding_batch_size(mut self, size: usize) -> Self {
        self.embedding_batch_size = size.max(1);
        self
    }
}

/// HTTP client for the chat-completions and embeddings endpoints
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiClient {
    /// Build a client. Fails when the key is empty or not a valid header value.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration("API key must not be empty".into()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| LlmError::Configuration("invalid API key".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Chat role bound to `model`
    pub fn chat(&self, model: impl Into<String>) -> OpenAiChat {
        OpenAiChat {
            client: self.clone(),
            model: model.into(),
        }
    }

    /// Embedding role bound to `model`
    pub fn embedder(&self, model: impl Into<String>) -> OpenAiEmbedder {
        OpenAiEmbedder {
            client: self.clone(),
            model: model.into(),
        }
    }

    /// Run one chat completion and return the first choice's text
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!(model, messages = messages.len(), "chat completion request");

        let response = self
            .http
            .post(&url)
            .json(&ChatRequest { model, messages })
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let response = check_status(response, model).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".into()))
    }

    /// Embed `inputs` with `model`, splitting into batches as configured
    pub async fn embeddings(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let url = format!("{}/embeddings", self.config.base_url);
        let mut vectors = Vec::with_capacity(inputs.len());

        for batch in inputs.chunks(self.config.embedding_batch_size) {
            debug!(model, inputs = batch.len(), "embeddings request");

            let response = self
                .http
                .post(&url)
                .json(&EmbeddingRequest { model, input: batch })
                .send()
                .await
                .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

            let response = check_status(response, model).await?;
            let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
                LlmError::InvalidResponse(format!("Failed to parse embedding response: {}", e))
            })?;

            if parsed.data.len() != batch.len() {
                return Err(LlmError::InvalidResponse(format!(
                    "provider returned {} embeddings for {} inputs",
                    parsed.data.len(),
                    batch.len()
                )));
            }

            parsed.data.sort_by_key(|entry| entry.index);
            vectors.extend(parsed.data.into_iter().map(|entry| entry.embedding));
        }

        Ok(vectors)
    }
}

async fn check_status(response: reqwest::Response, model: &str) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimitExceeded);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(LlmError::ModelNotAvailable(model.to_string()));
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(LlmError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Chat role of an [`OpenAiClient`]
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: OpenAiClient,
    model: String,
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.client.chat_completion(&self.model, messages).await
    }
}

/// Embedding role of an [`OpenAiClient`]
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.client.embeddings(&self.model, texts).await
    }
}
