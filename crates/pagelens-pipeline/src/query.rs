//! Similarity search with optional answer synthesis

use crate::PipelineError;
use pagelens_domain::QueryHit;
use pagelens_llm::{synthesize_answer, ChatModel};
use pagelens_store::VectorStore;
use std::sync::Arc;
use tracing::{info, warn};

/// What happened to the answer part of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerStatus {
    /// No answer was asked for
    NotRequested,
    /// The chat model's answer
    Answered(String),
    /// An answer was asked for but no chat model is configured
    MissingCredential,
}

/// Result of one query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Query text
    pub query: String,
    /// Nearest entries, closest first
    pub hits: Vec<QueryHit>,
    /// Answer, if any
    pub answer: AnswerStatus,
}

/// Search a store and optionally answer from the hits
pub struct QueryPipeline {
    store: VectorStore,
    chat: Option<Arc<dyn ChatModel>>,
}

impl QueryPipeline {
    /// Create a pipeline. `chat` is only needed for answers.
    pub fn new(store: VectorStore, chat: Option<Arc<dyn ChatModel>>) -> Self {
        Self { store, chat }
    }

    /// Store being searched
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Return the `top_k` nearest entries to `query`, then answer from them
    /// when `want_answer` is set
    ///
    /// A missing chat model is not an error: hits are still returned and the
    /// answer reads [`AnswerStatus::MissingCredential`].
    pub async fn run(&self, query: &str, top_k: usize, want_answer: bool) -> Result<QueryOutcome, PipelineError> {
        let hits = self.store.query(query, top_k).await?;
        info!(query, hits = hits.len(), "Query complete");

        let answer = match (want_answer, &self.chat) {
            (false, _) => AnswerStatus::NotRequested,
            (true, None) => {
                warn!("Answer requested but no chat model is configured");
                AnswerStatus::MissingCredential
            }
            (true, Some(chat)) => AnswerStatus::Answered(synthesize_answer(chat.as_ref(), query, &hits).await?),
        };

        Ok(QueryOutcome {
            query: query.to_string(),
            hits,
            answer,
        })
    }
}
