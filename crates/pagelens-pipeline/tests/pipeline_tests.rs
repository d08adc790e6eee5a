//! End-to-end pipeline tests
//!
//! PDFs are served by the in-memory engine, the vision and chat models are
//! mocks, and embeddings come from the hashing embedder, so no network or
//! PDFium library is needed.

use pagelens_domain::ContentType;
use pagelens_extractor::{ExtractorConfig, MemoryBackend, MemoryDocument, MemoryPage, PdfExtractor, PdfRect};
use pagelens_llm::{ChatModel, EmbeddingModel, HashEmbedder, MockProvider, VisionEnricher};
use pagelens_pipeline::{AnswerStatus, IngestPipeline, PipelineError, QueryPipeline};
use pagelens_store::{VectorStore, DEFAULT_COLLECTION};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn embedder() -> Arc<dyn EmbeddingModel> {
    Arc::new(HashEmbedder::new(256))
}

fn invoice_backend() -> MemoryBackend {
    MemoryBackend::new().with_document(
        "invoice.pdf",
        MemoryDocument::new().with_page(
            MemoryPage::new(612.0, 792.0)
                .with_text("Invoice", PdfRect::new(72.0, 700.0, 120.0, 712.0))
                .with_text("#42", PdfRect::new(124.0, 700.0, 150.0, 712.0)),
        ),
    )
}

struct Workspace {
    _root: TempDir,
    pdfs: std::path::PathBuf,
    store: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let root = TempDir::new().unwrap();
    let pdfs = root.path().join("pdfs");
    let store = root.path().join("vector_store");
    fs::create_dir_all(&pdfs).unwrap();
    Workspace {
        _root: root,
        pdfs,
        store,
    }
}

fn ingest_pipeline(ws: &Workspace, backend: MemoryBackend, vision: Option<Arc<dyn ChatModel>>) -> IngestPipeline {
    let mut config = ExtractorConfig::new(&ws.store);
    config.dpi = 72;
    let extractor = PdfExtractor::new(Box::new(backend), config).unwrap();
    let store = VectorStore::open(&ws.store, DEFAULT_COLLECTION, embedder()).unwrap();
    IngestPipeline::new(extractor, vision.map(VisionEnricher::new), store)
}

#[tokio::test]
async fn test_ingest_then_query_finds_invoice_text() {
    let ws = workspace();
    fs::write(ws.pdfs.join("invoice.pdf"), b"").unwrap();

    let vision: Arc<dyn ChatModel> = Arc::new(MockProvider::new("A scanned page with a logo."));
    let mut pipeline = ingest_pipeline(&ws, invoice_backend(), Some(vision));
    let before = pipeline.store().count().unwrap();

    let report = pipeline.run(&ws.pdfs).await.unwrap();

    assert_eq!(report.documents, 1);
    assert_eq!(report.records_extracted, 2);
    assert_eq!(report.records_stored, 2);
    assert_eq!(report.raw_fallbacks, 1);
    assert_eq!(report.vision_failures, 0);
    assert_eq!(pipeline.store().count().unwrap(), before + 2);
    assert!(ws.store.join("images/invoice-page-1.png").is_file());
    drop(pipeline);

    let store = VectorStore::open(&ws.store, DEFAULT_COLLECTION, embedder()).unwrap();
    let query = QueryPipeline::new(store, None);
    let outcome = query.run("invoice number", 5, false).await.unwrap();

    assert_eq!(outcome.hits.len(), 2);
    let top = &outcome.hits[0];
    assert_eq!(top.content_type(), Some(ContentType::Text));
    assert_eq!(top.content, "Invoice #42");
    assert_eq!(top.page(), Some(1));
    assert!(top.source().ends_with("invoice.pdf"));
    assert_eq!(outcome.answer, AnswerStatus::NotRequested);
}

#[tokio::test]
async fn test_empty_directory_writes_nothing() {
    let ws = workspace();
    fs::write(ws.pdfs.join("notes.txt"), b"not a pdf").unwrap();

    let mut pipeline = ingest_pipeline(&ws, invoice_backend(), None);
    let report = pipeline.run(&ws.pdfs).await.unwrap();

    assert_eq!(report.documents, 0);
    assert_eq!(report.records_stored, 0);
    assert_eq!(pipeline.store().count().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_directory_is_fatal() {
    let ws = workspace();
    let mut pipeline = ingest_pipeline(&ws, invoice_backend(), None);

    let result = pipeline.run(&ws.pdfs.join("absent")).await;
    assert!(matches!(result, Err(PipelineError::PdfDirectory { .. })));
}

#[tokio::test]
async fn test_without_vision_images_are_dropped() {
    let ws = workspace();
    fs::write(ws.pdfs.join("invoice.pdf"), b"").unwrap();

    let mut pipeline = ingest_pipeline(&ws, invoice_backend(), None);
    let report = pipeline.run(&ws.pdfs).await.unwrap();

    assert_eq!(report.records_extracted, 2);
    assert_eq!(report.records_stored, 1);
    assert_eq!(report.enriched + report.raw_fallbacks + report.vision_failures, 0);
}

#[tokio::test]
async fn test_vision_failure_is_counted_and_skipped() {
    let ws = workspace();
    fs::write(ws.pdfs.join("invoice.pdf"), b"").unwrap();

    let vision: Arc<dyn ChatModel> = Arc::new(MockProvider::failing());
    let mut pipeline = ingest_pipeline(&ws, invoice_backend(), Some(vision));
    let report = pipeline.run(&ws.pdfs).await.unwrap();

    assert_eq!(report.vision_failures, 1);
    assert_eq!(report.records_stored, 1);
    assert_eq!(pipeline.store().count().unwrap(), 1);
}

#[tokio::test]
async fn test_parsed_vision_reply_is_searchable() {
    let ws = workspace();
    fs::write(ws.pdfs.join("invoice.pdf"), b"").unwrap();

    let reply = r#"{"extracted_text": "Total due 1200 EUR", "description": "A table of totals."}"#;
    let vision: Arc<dyn ChatModel> = Arc::new(MockProvider::new(reply));
    let mut pipeline = ingest_pipeline(&ws, invoice_backend(), Some(vision));
    let report = pipeline.run(&ws.pdfs).await.unwrap();
    assert_eq!(report.enriched, 1);
    drop(pipeline);

    let store = VectorStore::open(&ws.store, DEFAULT_COLLECTION, embedder()).unwrap();
    let outcome = QueryPipeline::new(store, None).run("total due", 1, false).await.unwrap();

    assert_eq!(outcome.hits.len(), 1);
    assert_eq!(outcome.hits[0].content_type(), Some(ContentType::PageImage));
    assert_eq!(outcome.hits[0].content, "Total due 1200 EUR");
}

#[tokio::test]
async fn test_answer_without_chat_model_reports_missing_credential() {
    let ws = workspace();
    fs::write(ws.pdfs.join("invoice.pdf"), b"").unwrap();
    ingest_pipeline(&ws, invoice_backend(), None).run(&ws.pdfs).await.unwrap();

    let store = VectorStore::open(&ws.store, DEFAULT_COLLECTION, embedder()).unwrap();
    let outcome = QueryPipeline::new(store, None).run("invoice", 3, true).await.unwrap();

    assert_eq!(outcome.hits.len(), 1);
    assert_eq!(outcome.answer, AnswerStatus::MissingCredential);
}

#[tokio::test]
async fn test_answer_uses_retrieved_context() {
    let ws = workspace();
    fs::write(ws.pdfs.join("invoice.pdf"), b"").unwrap();
    ingest_pipeline(&ws, invoice_backend(), None).run(&ws.pdfs).await.unwrap();

    let chat = Arc::new(MockProvider::new("  The invoice number is 42.  "));
    let store = VectorStore::open(&ws.store, DEFAULT_COLLECTION, embedder()).unwrap();
    let pipeline = QueryPipeline::new(store, Some(chat.clone() as Arc<dyn ChatModel>));
    let outcome = pipeline.run("invoice number", 3, true).await.unwrap();

    assert_eq!(outcome.answer, AnswerStatus::Answered("The invoice number is 42.".to_string()));
    assert_eq!(chat.call_count(), 1);
    let prompt = chat.requests()[0].last().unwrap().text();
    assert!(prompt.contains("Invoice #42"));
    assert!(prompt.contains("page=1"));
}

#[tokio::test]
async fn test_report_serializes_counters() {
    let ws = workspace();
    fs::write(ws.pdfs.join("invoice.pdf"), b"").unwrap();

    let report = ingest_pipeline(&ws, invoice_backend(), None).run(&ws.pdfs).await.unwrap();
    let json = serde_json::to_value(report).unwrap();

    assert_eq!(json["documents"], 1);
    assert_eq!(json["records_stored"], 1);
    assert_eq!(json["vision_failures"], 0);
}
