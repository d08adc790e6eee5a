//! pagelens Pipelines
//!
//! Wires the extractor, the vision enricher and the store together.
//!
//! ```text
//! ingest:  PDFs → PdfExtractor → VisionEnricher → VectorStore::upsert
//! query:   text → VectorStore::query → (synthesize_answer)
//! ```
//!
//! Everything runs sequentially: one PDF at a time, one image at a time,
//! every provider call awaited before the next one starts.

#![warn(missing_docs)]

pub mod ingest;
pub mod query;

use pagelens_extractor::ExtractorError;
use pagelens_llm::LlmError;
use pagelens_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

pub use ingest::{list_pdfs, IngestPipeline, IngestReport};
pub use query::{AnswerStatus, QueryOutcome, QueryPipeline};

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The PDF directory could not be listed
    #[error("Cannot read PDF directory '{path}': {source}")]
    PdfDirectory {
        /// Directory given
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// A PDF could not be extracted
    #[error("Extraction failed: {0}")]
    Extractor(#[from] ExtractorError),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Answer synthesis failure
    #[error("Answer synthesis failed: {0}")]
    Llm(#[from] LlmError),
}
