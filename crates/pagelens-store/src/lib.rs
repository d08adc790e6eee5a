//! pagelens Storage Layer
//!
//! A persistent, named collection of embedded entries.
//!
//! # Architecture
//!
//! - SQLite (`<store>/pagelens.sqlite3`) holds entries, their metadata and
//!   their vectors
//! - An in-memory HNSW index answers similarity queries and is rebuilt from
//!   SQLite on open
//! - Each collection is bound to one embedding model; reopening it with
//!   another model fails
//!
//! Ids are sequential integers (as strings) assigned from the collection size
//! at upsert time. They are not content-addressed, so upserting the same
//! records twice stores them twice. A single writer is assumed; two
//! concurrent writers may pick the same ids, in which case the later row
//! replaces the earlier one.
//!
//! # Examples
//!
//! ```no_run
//! use pagelens_llm::HashEmbedder;
//! use pagelens_store::VectorStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), pagelens_store::StoreError> {
//! let mut store = VectorStore::open("./vector_store", "pdf_openai", Arc::new(HashEmbedder::new(384)))?;
//! let hits = store.query("invoice number", 5).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod vector_index;

use pagelens_domain::{Metadata, MetadataValue, NormalizedEntry, QueryHit, Record};
use pagelens_llm::{EmbeddingModel, LlmError};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};
use vector_index::{VectorIndex, VectorIndexError};

/// Database file name inside a store directory
pub const DB_FILE: &str = "pagelens.sqlite3";

/// Collection used when none is given
pub const DEFAULT_COLLECTION: &str = "pdf_openai";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider failure
    #[error("Embedding failed: {0}")]
    Embedding(#[from] LlmError),

    /// Collection was created with another embedding model
    #[error(
        "Collection '{collection}' was built with embedding model '{stored}', \
         but '{requested}' is configured; use another collection or the original model"
    )]
    EmbeddingMismatch {
        /// Collection name
        collection: String,
        /// Model recorded with the collection
        stored: String,
        /// Model of the current embedder
        requested: String,
    },

    /// Vector length differs from the collection's
    #[error("Embedding dimension mismatch: collection has {expected}, got {actual}")]
    DimensionMismatch {
        /// Stored dimension
        expected: usize,
        /// Dimension received
        actual: usize,
    },

    /// Store was opened without an embedder
    #[error("Collection '{0}' is open read-only; no embedding model is bound")]
    NotBound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<VectorIndexError> for StoreError {
    fn from(err: VectorIndexError) -> Self {
        match err {
            VectorIndexError::DimensionMismatch { expected, actual } => {
                StoreError::DimensionMismatch { expected, actual }
            }
        }
    }
}

/// Outcome of one [`VectorStore::upsert`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Records passed in
    pub submitted: usize,
    /// Records written
    pub stored: usize,
    /// Records dropped for having no content
    pub skipped_empty: usize,
    /// Id of the first written entry
    pub first_id: Option<u64>,
}

/// A persisted entry, as returned by [`VectorStore::peek`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    /// Entry id
    pub id: String,
    /// Embedded content
    pub content: String,
    /// Flat metadata
    pub metadata: Metadata,
}

/// SQLite + HNSW collection store
///
/// SQLite connections are not thread-safe; use one store per thread.
pub struct VectorStore {
    conn: Connection,
    path: PathBuf,
    collection: String,
    embedding_model: String,
    embedder: Option<Arc<dyn EmbeddingModel>>,
    dimension: Option<usize>,
    index: Option<VectorIndex>,
}

impl VectorStore {
    /// Open (or create) `collection` under `dir`, bound to `embedder`
    ///
    /// Fails with [`StoreError::EmbeddingMismatch`] when the collection exists
    /// and was built with another model.
    pub fn open(
        dir: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, StoreError> {
        let (conn, path) = Self::connect(dir.as_ref())?;
        let requested = embedder.model_id().to_string();

        let existing: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT embedding_model, dimension FROM collections WHERE name = ?1",
                params![collection],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let dimension = match existing {
            Some((stored, _)) if stored != requested => {
                return Err(StoreError::EmbeddingMismatch {
                    collection: collection.to_string(),
                    stored,
                    requested,
                });
            }
            Some((_, dimension)) => dimension.map(|d| d as usize),
            None => {
                conn.execute(
                    "INSERT INTO collections (name, embedding_model, dimension, created_at)
                     VALUES (?1, ?2, NULL, ?3)",
                    params![collection, requested, now_secs()],
                )?;
                info!(collection, model = %requested, "Created collection");
                None
            }
        };

        let mut store = Self {
            conn,
            path,
            collection: collection.to_string(),
            embedding_model: requested,
            embedder: Some(embedder),
            dimension,
            index: None,
        };
        store.rebuild_index()?;
        Ok(store)
    }

    /// Open `collection` for reading only (`count`, `peek`)
    ///
    /// No embedding model is needed; a missing collection reads as empty.
    pub fn open_unbound(dir: impl AsRef<Path>, collection: &str) -> Result<Self, StoreError> {
        let (conn, path) = Self::connect(dir.as_ref())?;
        let existing: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT embedding_model, dimension FROM collections WHERE name = ?1",
                params![collection],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (embedding_model, dimension) = existing
            .map(|(model, dim)| (model, dim.map(|d| d as usize)))
            .unwrap_or_default();

        Ok(Self {
            conn,
            path,
            collection: collection.to_string(),
            embedding_model,
            embedder: None,
            dimension,
            index: None,
        })
    }

    fn connect(dir: &Path) -> Result<(Connection, PathBuf), StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(DB_FILE);
        let conn = Connection::open(&path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok((conn, path))
    }

    /// Collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embedding model the collection is bound to (empty if it does not exist yet)
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Vector length, once the first entry has been written
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Database file
    pub fn db_path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the collection
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// First `limit` entries, in insertion order
    pub fn peek(&self, limit: usize) -> Result<Vec<StoredEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, metadata FROM entries
             WHERE collection = ?1 ORDER BY seq LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![self.collection, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, content, metadata) = row?;
            entries.push(StoredEntry {
                id,
                content,
                metadata: metadata_from_json(&metadata)?,
            });
        }
        Ok(entries)
    }

    /// Embed and persist `records`
    ///
    /// Records without content are dropped. The rest get ids
    /// `count()..count()+n`, are embedded in one batch and written in a
    /// single transaction.
    pub async fn upsert(&mut self, records: &[Record]) -> Result<UpsertReport, StoreError> {
        let embedder = self.bound_embedder()?;

        let mut report = UpsertReport {
            submitted: records.len(),
            ..UpsertReport::default()
        };
        if records.is_empty() {
            info!(collection = %self.collection, "No records passed to upsert");
            return Ok(report);
        }

        let entries: Vec<NormalizedEntry> = records.iter().filter_map(NormalizedEntry::from_record).collect();
        report.skipped_empty = records.len() - entries.len();
        if entries.is_empty() {
            info!(
                collection = %self.collection,
                "All records were empty after normalization; nothing to upsert"
            );
            return Ok(report);
        }

        let start = self.count()? as u64;
        let contents: Vec<String> = entries.iter().map(|e| e.content.clone()).collect();
        let embeddings = embedder.embed(&contents).await?;
        if embeddings.len() != entries.len() {
            return Err(StoreError::InvalidData(format!(
                "embedder returned {} vectors for {} entries",
                embeddings.len(),
                entries.len()
            )));
        }

        let dimension = self.dimension.unwrap_or_else(|| embeddings[0].len());
        if let Some(bad) = embeddings.iter().find(|v| v.len() != dimension) {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let ids: Vec<String> = (0..entries.len() as u64).map(|i| (start + i).to_string()).collect();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO entries (collection, id, seq, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for ((id, entry), embedding) in ids.iter().zip(&entries).zip(&embeddings) {
                let seq: i64 = id
                    .parse()
                    .map_err(|_| StoreError::InvalidData(format!("non-numeric id {}", id)))?;
                stmt.execute(params![
                    self.collection,
                    id,
                    seq,
                    entry.content,
                    metadata_to_json(&entry.metadata),
                    embedding_to_json(embedding),
                ])?;
            }
        }
        tx.execute(
            "UPDATE collections SET dimension = ?1 WHERE name = ?2",
            params![dimension as i64, self.collection],
        )?;
        tx.commit()?;

        self.dimension = Some(dimension);
        let index = self.index.get_or_insert_with(|| VectorIndex::new(dimension));
        for (id, embedding) in ids.iter().zip(&embeddings) {
            index.add(id, embedding)?;
        }

        report.stored = entries.len();
        report.first_id = Some(start);
        info!(
            collection = %self.collection,
            stored = report.stored,
            total = start + report.stored as u64,
            "Upserted records"
        );
        Ok(report)
    }

    /// The `top_k` entries closest to `text`, closest first
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryHit>, StoreError> {
        let embedder = self.bound_embedder()?;
        let index = match &self.index {
            Some(index) if top_k > 0 && !index.is_empty() => index,
            _ => {
                debug!(collection = %self.collection, top_k, "Nothing to search");
                return Ok(Vec::new());
            }
        };

        let vectors = embedder.embed(&[text.to_string()]).await?;
        let query = vectors
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidData("embedder returned no vector for query".into()))?;

        let neighbours = index.search(&query, top_k)?;
        let mut stmt = self
            .conn
            .prepare("SELECT content, metadata FROM entries WHERE collection = ?1 AND id = ?2")?;

        let mut hits = Vec::with_capacity(neighbours.len());
        for (id, distance) in neighbours {
            let row: Option<(String, String)> = stmt
                .query_row(params![self.collection, id], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;
            if let Some((content, metadata)) = row {
                hits.push(QueryHit {
                    id,
                    content,
                    metadata: metadata_from_json(&metadata)?,
                    distance,
                });
            }
        }

        debug!(collection = %self.collection, hits = hits.len(), "Query complete");
        Ok(hits)
    }

    fn bound_embedder(&self) -> Result<Arc<dyn EmbeddingModel>, StoreError> {
        self.embedder
            .clone()
            .ok_or_else(|| StoreError::NotBound(self.collection.clone()))
    }

    fn rebuild_index(&mut self) -> Result<(), StoreError> {
        let Some(dimension) = self.dimension else {
            return Ok(());
        };

        let mut index = VectorIndex::new(dimension);
        let mut stmt = self
            .conn
            .prepare("SELECT id, embedding FROM entries WHERE collection = ?1 ORDER BY seq")?;
        let rows = stmt.query_map(params![self.collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (id, embedding) = row?;
            index.add(&id, &embedding_from_json(&embedding)?)?;
        }
        drop(stmt);

        debug!(collection = %self.collection, entries = index.len(), "Rebuilt vector index");
        self.index = Some(index);
        Ok(())
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn metadata_to_json(metadata: &Metadata) -> String {
    let map: Map<String, Value> = metadata
        .iter()
        .map(|(key, value)| {
            let json = match value {
                MetadataValue::Str(s) => Value::String(s.clone()),
                MetadataValue::Int(i) => Value::from(*i),
                MetadataValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            };
            (key.clone(), json)
        })
        .collect();
    Value::Object(map).to_string()
}

fn metadata_from_json(raw: &str) -> Result<Metadata, StoreError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| StoreError::InvalidData(format!("metadata is not JSON: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(StoreError::InvalidData("metadata is not a JSON object".into()));
    };

    let mut metadata = Metadata::new();
    for (key, value) in map {
        let converted = match value {
            Value::String(s) => MetadataValue::Str(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) if !n.is_f64() => MetadataValue::Int(i),
                _ => MetadataValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::Null => continue,
            other => MetadataValue::Str(other.to_string()),
        };
        metadata.insert(key, converted);
    }
    Ok(metadata)
}

fn embedding_to_json(embedding: &[f32]) -> String {
    Value::from(embedding.to_vec()).to_string()
}

fn embedding_from_json(raw: &str) -> Result<Vec<f32>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::InvalidData(format!("bad embedding column: {}", e)))
}
