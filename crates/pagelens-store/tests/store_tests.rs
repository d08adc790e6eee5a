//! Integration tests for pagelens-store
//!
//! These tests exercise a real on-disk store in a temporary directory.

use async_trait::async_trait;
use pagelens_domain::{BoundingBox, ContentType, Enrichment, MetadataValue, Record, RegionBounds};
use pagelens_llm::{EmbeddingModel, HashEmbedder, LlmError};
use pagelens_store::{StoreError, VectorStore, DB_FILE, DEFAULT_COLLECTION};
use std::sync::Arc;
use tempfile::TempDir;

fn embedder() -> Arc<dyn EmbeddingModel> {
    Arc::new(HashEmbedder::new(256))
}

fn text(page: u32, body: &str) -> Record {
    Record::text(page, BoundingBox::new(10.0, 20.0, 110.0, 40.0), body, "/pdfs/a.pdf")
}

/// Claims one model id but returns vectors of a configurable length
struct FixedEmbedder {
    dimension: usize,
}

#[async_trait]
impl EmbeddingModel for FixedEmbedder {
    fn model_id(&self) -> &str {
        "fixed"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts.iter().map(|_| vec![1.0; self.dimension]).collect())
    }
}

#[test]
fn test_open_creates_directory_and_database() {
    let dir = TempDir::new().unwrap();
    let store_dir = dir.path().join("nested/store");

    let store = VectorStore::open(&store_dir, DEFAULT_COLLECTION, embedder()).unwrap();

    assert!(store_dir.join(DB_FILE).exists());
    assert_eq!(store.collection(), "pdf_openai");
    assert_eq!(store.embedding_model(), "hash-256");
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.dimension(), None);
}

#[tokio::test]
async fn test_query_empty_collection() {
    let dir = TempDir::new().unwrap();
    let store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();

    let hits = store.query("anything", 10).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_upsert_assigns_sequential_ids() {
    let dir = TempDir::new().unwrap();
    let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();

    let first = store.upsert(&[text(1, "alpha"), text(1, "beta")]).await.unwrap();
    assert_eq!(first.stored, 2);
    assert_eq!(first.first_id, Some(0));

    let second = store.upsert(&[text(2, "gamma")]).await.unwrap();
    assert_eq!(second.first_id, Some(2));
    assert_eq!(store.count().unwrap(), 3);

    let ids: Vec<String> = store.peek(10).unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["0", "1", "2"]);
}

#[tokio::test]
async fn test_duplicate_upsert_appends() {
    let dir = TempDir::new().unwrap();
    let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();

    let record = text(3, "Invoice #42");
    store.upsert(std::slice::from_ref(&record)).await.unwrap();
    store.upsert(std::slice::from_ref(&record)).await.unwrap();

    let entries = store.peek(10).unwrap();
    assert_eq!(entries.len(), 2);
    assert_ne!(entries[0].id, entries[1].id);
    assert_eq!(entries[0].content, entries[1].content);
    assert_eq!(entries[0].metadata, entries[1].metadata);
}

#[tokio::test]
async fn test_empty_content_dropped() {
    let dir = TempDir::new().unwrap();
    let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();

    let unenriched = Record::image(
        ContentType::PageImage,
        1,
        BoundingBox::page(612.0, 792.0),
        "/store/images/a-page-1.png",
        "/pdfs/a.pdf",
    );
    let report = store.upsert(&[unenriched.clone(), text(1, "   ")]).await.unwrap();
    assert_eq!(report.stored, 0);
    assert_eq!(report.skipped_empty, 2);
    assert_eq!(report.first_id, None);

    let report = store.upsert(&[]).await.unwrap();
    assert_eq!(report.submitted, 0);
    assert_eq!(store.count().unwrap(), 0);

    let mut enriched = unenriched;
    enriched.enrich(Enrichment::new("", "A scanned page."));
    let report = store.upsert(&[enriched, text(1, "body")]).await.unwrap();
    assert_eq!(report.stored, 2);
}

#[tokio::test]
async fn test_query_returns_closest_first_with_metadata() {
    let dir = TempDir::new().unwrap();
    let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();

    let mut page = Record::image(
        ContentType::PageImage,
        2,
        BoundingBox::page(612.0, 792.0),
        "/store/images/a-page-2.png",
        "/pdfs/a.pdf",
    );
    page.enrich(Enrichment::new("", "A chart of rainfall by month."));

    store
        .upsert(&[text(1, "Invoice #42"), page, text(3, "Terms and conditions apply")])
        .await
        .unwrap();

    let hits = store.query("invoice number", 3).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].content, "Invoice #42");
    assert_eq!(hits[0].content_type(), Some(ContentType::Text));
    assert_eq!(hits[0].page(), Some(1));
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

    let image_hit = hits.iter().find(|h| h.content_type() == Some(ContentType::PageImage)).unwrap();
    assert_eq!(image_hit.image_path(), "/store/images/a-page-2.png");

    let one = store.query("invoice number", 1).await.unwrap();
    assert_eq!(one.len(), 1);
    assert!(store.query("invoice number", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bbox_round_trip_through_store() {
    let dir = TempDir::new().unwrap();
    let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();

    let mut irregular = text(5, "odd shape");
    irregular.bbox = Some(RegionBounds::Irregular(vec![1.0, 2.0]));
    store.upsert(&[text(4, "boxed"), irregular]).await.unwrap();

    let entries = store.peek(2).unwrap();
    assert_eq!(entries[0].metadata["bbox_y1"], MetadataValue::Float(40.0));
    assert_eq!(entries[0].metadata["page"], MetadataValue::Int(4));
    assert_eq!(entries[1].metadata["bbox_str"], MetadataValue::from("[1, 2]"));
    assert!(!entries[1].metadata.contains_key("bbox_x0"));
}

#[tokio::test]
async fn test_reopen_keeps_entries_and_index() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();
        store.upsert(&[text(1, "Invoice #42"), text(2, "weather")]).await.unwrap();
    }

    let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(store.dimension(), Some(256));

    let hits = store.query("invoice", 1).await.unwrap();
    assert_eq!(hits[0].content, "Invoice #42");

    let report = store.upsert(&[text(3, "more")]).await.unwrap();
    assert_eq!(report.first_id, Some(2));
}

#[tokio::test]
async fn test_embedding_mismatch_fails_fast() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();
        store.upsert(&[text(1, "x")]).await.unwrap();
    }

    let result = VectorStore::open(dir.path(), DEFAULT_COLLECTION, Arc::new(HashEmbedder::new(128)));
    match result {
        Err(StoreError::EmbeddingMismatch { stored, requested, .. }) => {
            assert_eq!(stored, "hash-256");
            assert_eq!(requested, "hash-128");
        }
        other => panic!("expected mismatch, got {:?}", other.err()),
    }

    // Other collections are independent
    assert!(VectorStore::open(dir.path(), "other", Arc::new(HashEmbedder::new(128))).is_ok());
}

#[tokio::test]
async fn test_dimension_mismatch() {
    let dir = TempDir::new().unwrap();
    {
        let mut store =
            VectorStore::open(dir.path(), DEFAULT_COLLECTION, Arc::new(FixedEmbedder { dimension: 4 })).unwrap();
        store.upsert(&[text(1, "x")]).await.unwrap();
    }

    let mut store =
        VectorStore::open(dir.path(), DEFAULT_COLLECTION, Arc::new(FixedEmbedder { dimension: 8 })).unwrap();
    let err = store.upsert(&[text(1, "y")]).await.unwrap_err();
    assert!(matches!(err, StoreError::DimensionMismatch { expected: 4, actual: 8 }));

    let err = store.query("y", 1).await.unwrap_err();
    assert!(matches!(err, StoreError::DimensionMismatch { .. }));
}

#[tokio::test]
async fn test_unbound_store_reads_only() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = VectorStore::open(dir.path(), DEFAULT_COLLECTION, embedder()).unwrap();
        store.upsert(&[text(1, "a"), text(1, "b"), text(1, "c"), text(1, "d")]).await.unwrap();
    }

    let mut store = VectorStore::open_unbound(dir.path(), DEFAULT_COLLECTION).unwrap();
    assert_eq!(store.count().unwrap(), 4);
    assert_eq!(store.peek(3).unwrap().len(), 3);
    assert_eq!(store.embedding_model(), "hash-256");
    assert!(matches!(store.upsert(&[text(1, "e")]).await, Err(StoreError::NotBound(_))));

    let missing = VectorStore::open_unbound(dir.path(), "missing").unwrap();
    assert_eq!(missing.count().unwrap(), 0);
    assert_eq!(missing.embedding_model(), "");
}
