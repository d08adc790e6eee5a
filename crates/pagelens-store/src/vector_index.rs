//! HNSW Vector Index
//!
//! In-memory nearest-neighbour index over entry embeddings. SQLite is the
//! source of truth: the index is rebuilt from the `entries` table every time
//! a store is opened, and only grows afterwards.
//!
//! # HNSW Parameters
//!
//! - **M**: bi-directional links per node (16)
//! - **efConstruction**: candidate list size while building (200)
//! - **efSearch**: candidate list size while searching, at least `k`

use hnsw_rs::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 1_000_000;

/// Minimum search breadth
pub const DEFAULT_EF_SEARCH: usize = 64;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },
}

/// Cosine-distance HNSW index keyed by entry id
pub struct VectorIndex {
    dimension: usize,
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// Internal HNSW ids to entry ids
    id_map: HashMap<usize, String>,
    next_id: usize,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension` values
    pub fn new(dimension: usize) -> Self {
        let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            DEFAULT_M,
            DEFAULT_MAX_ELEMENTS,
            nb_layer,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );

        Self {
            dimension,
            hnsw,
            id_map: HashMap::new(),
            next_id: 0,
        }
    }

    /// Vector length this index accepts
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add an entry embedding
    pub fn add(&mut self, entry_id: &str, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;

        let internal_id = self.next_id;
        self.next_id += 1;
        self.id_map.insert(internal_id, entry_id.to_string());

        let embedding_vec = embedding.to_vec();
        self.hnsw.insert((&embedding_vec, internal_id));
        Ok(())
    }

    /// The `k` nearest entries to `query` as `(entry_id, cosine_distance)`,
    /// closest first. An entry id appears at most once.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        // Replaced ids leave stale nodes behind, so over-fetch before dedup
        let fetch = (k + self.stale_count()).min(self.len());
        let ef_search = DEFAULT_EF_SEARCH.max(fetch);
        let mut neighbours = self.hnsw.search(query, fetch, ef_search);
        neighbours.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let mut seen = std::collections::HashSet::new();
        let results = neighbours
            .into_iter()
            .filter_map(|n| self.id_map.get(&n.d_id).map(|id| (id.clone(), n.distance)))
            .filter(|(id, _)| seen.insert(id.clone()))
            .take(k)
            .collect();

        Ok(results)
    }

    /// Number of vectors in the index
    pub fn len(&self) -> usize {
        self.id_map.len()
    }

    /// True when nothing has been added
    pub fn is_empty(&self) -> bool {
        self.id_map.is_empty()
    }

    fn stale_count(&self) -> usize {
        let distinct: std::collections::HashSet<&String> = self.id_map.values().collect();
        self.id_map.len() - distinct.len()
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_index_creation() {
        let index = VectorIndex::new(384);
        assert_eq!(index.dimension(), 384);
        assert!(index.is_empty());
    }

    #[test]
    fn test_add_and_search() {
        let mut index = VectorIndex::new(384);

        let embedding1: Vec<f32> = (0..384).map(|i| (i as f32) / 384.0).collect();
        index.add("0", &embedding1).unwrap();

        let mut embedding2: Vec<f32> = (0..384).map(|i| (i as f32) / 384.0).collect();
        embedding2[0] = 0.5;
        embedding2[1] = -0.5;
        index.add("1", &embedding2).unwrap();

        assert_eq!(index.len(), 2);

        let results = index.search(&embedding1, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "0");
        assert!(results[0].1 < 0.01);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = VectorIndex::new(384);
        let result = index.add("0", &[0.1; 128]);
        assert!(matches!(result, Err(VectorIndexError::DimensionMismatch { .. })));
        assert!(index.search(&[0.1; 3], 1).is_err());
    }

    #[test]
    fn test_search_empty_and_zero_k() {
        let mut index = VectorIndex::new(3);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());

        index.add("0", &[1.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_cosine_ordering() {
        let mut index = VectorIndex::new(3);
        index.add("x", &[1.0, 0.0, 0.0]).unwrap();
        index.add("y", &[0.0, 1.0, 0.0]).unwrap();
        index.add("xy", &[0.7071, 0.7071, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["x", "xy", "y"]);

        assert!(results[0].1 < 0.01);
        assert!((results[1].1 - 0.2929).abs() < 0.01);
        assert!((results[2].1 - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_replaced_id_returned_once() {
        let mut index = VectorIndex::new(3);
        index.add("0", &[1.0, 0.0, 0.0]).unwrap();
        index.add("0", &[0.9, 0.1, 0.0]).unwrap();
        index.add("1", &[0.0, 1.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1"]);
    }
}
