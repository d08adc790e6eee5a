//! Command implementations.

pub mod ingest;
pub mod inspect;
pub mod query;

pub use self::ingest::execute_ingest;
pub use self::inspect::execute_inspect;
pub use self::query::execute_query;

use crate::config::Config;
use crate::error::Result;
use pagelens_llm::{ChatModel, EmbeddingModel, HashEmbedder, OpenAiClient, OpenAiConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Models a command runs with
pub struct Providers {
    /// Embeds entries and queries
    pub embedder: Arc<dyn EmbeddingModel>,
    /// Describes images during ingest
    pub vision: Option<Arc<dyn ChatModel>>,
    /// Answers questions from query hits
    pub chat: Option<Arc<dyn ChatModel>>,
}

impl Providers {
    /// Build the providers for a command.
    ///
    /// Offline mode uses the hashing embedder and no chat models. Otherwise
    /// one OpenAI client backs all three and the API key is required.
    pub fn resolve(config: &Config, offline: bool) -> Result<Self> {
        if offline {
            debug!("Offline mode: hashing embedder, no vision or chat model");
            return Ok(Self {
                embedder: Arc::new(HashEmbedder::default()),
                vision: None,
                chat: None,
            });
        }

        let key = config.require_api_key()?;
        let client = OpenAiClient::new(
            OpenAiConfig::new(key)
                .with_base_url(&config.models.base_url)
                .with_timeout(Duration::from_secs(config.models.timeout_secs)),
        )?;
        debug!(
            base_url = client.base_url(),
            embedding = %config.models.embedding,
            vision = %config.models.vision,
            chat = %config.models.chat,
            "Using OpenAI-compatible provider"
        );

        Ok(Self {
            embedder: Arc::new(client.embedder(&config.models.embedding)),
            vision: Some(Arc::new(client.chat(&config.models.vision))),
            chat: Some(Arc::new(client.chat(&config.models.chat))),
        })
    }
}
