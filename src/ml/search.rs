//! Nearest-neighbor vector stores
//!
//! The index talks to its vectors through [`VectorStore`]: append, k-nearest
//! query and a flat row-major export used for persistence. [`FlatL2Store`] scans
//! every vector; [`HnswStore`] answers from an instant-distance HNSW graph.
//!
//! Distances are squared Euclidean (L2²). Equal distances are ordered by
//! insertion position.

use crate::config::StoreKind;
use crate::error::{AssistantError, Result};
use crate::ml::embedding::Embedding;
use instant_distance::{Builder, HnswMap, Point, Search};
use rayon::prelude::*;
use std::cmp::Ordering;

/// One hit returned by a store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Squared Euclidean distance to the query
    pub distance: f32,
    /// Insertion position of the vector
    pub position: usize,
}

impl Neighbor {
    fn ordering(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.position.cmp(&other.position))
    }
}

/// Capability set every search structure provides
pub trait VectorStore: Send {
    /// Structure kind, recorded in snapshots
    fn kind(&self) -> StoreKind;

    /// Vector dimension
    fn dimension(&self) -> usize;

    /// Number of stored vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors after the existing ones
    fn add(&mut self, vectors: &[Embedding]) -> Result<()>;

    /// Up to `k` nearest vectors, ascending by distance
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// All vectors, row-major
    fn raw_vectors(&self) -> &[f32];
}

/// Create an empty store of the given kind
pub fn new_store(kind: StoreKind, dimension: usize) -> Box<dyn VectorStore> {
    match kind {
        StoreKind::Flat => Box::new(FlatL2Store::new(dimension)),
        StoreKind::Hnsw => Box::new(HnswStore::new(dimension)),
    }
}

/// Rebuild a store from its row-major export
pub fn restore_store(kind: StoreKind, dimension: usize, data: Vec<f32>) -> Result<Box<dyn VectorStore>> {
    if dimension == 0 || data.len() % dimension != 0 {
        return Err(AssistantError::CorruptState(format!(
            "{} floats cannot form vectors of dimension {}",
            data.len(),
            dimension
        )));
    }
    let rows: Vec<Embedding> = data.chunks_exact(dimension).map(<[f32]>::to_vec).collect();
    let mut store = new_store(kind, dimension);
    store.add(&rows)?;
    Ok(store)
}

fn check_dimension(expected: usize, actual: usize, what: &str) -> Result<()> {
    if expected != actual {
        return Err(AssistantError::Embedding(format!(
            "{} dimension {} doesn't match index dimension {}",
            what, actual, expected
        )));
    }
    Ok(())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn exhaustive_search(data: &[f32], dimension: usize, query: &[f32], k: usize) -> Vec<Neighbor> {
    let mut neighbors: Vec<Neighbor> = data
        .par_chunks_exact(dimension)
        .enumerate()
        .map(|(position, row)| Neighbor {
            distance: squared_l2(query, row),
            position,
        })
        .collect();

    neighbors.sort_by(Neighbor::ordering);
    neighbors.truncate(k);
    neighbors
}

/// Exhaustive squared-L2 store
#[derive(Debug, Clone)]
pub struct FlatL2Store {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Store {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }
}

impl VectorStore for FlatL2Store {
    fn kind(&self) -> StoreKind {
        StoreKind::Flat
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn add(&mut self, vectors: &[Embedding]) -> Result<()> {
        for vector in vectors {
            check_dimension(self.dimension, vector.len(), "Vector")?;
        }
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        check_dimension(self.dimension, query.len(), "Query")?;
        Ok(exhaustive_search(&self.data, self.dimension, query, k))
    }

    fn raw_vectors(&self) -> &[f32] {
        &self.data
    }
}

/// Euclidean point for the HNSW graph
#[derive(Clone, Debug)]
struct EuclideanPoint(Vec<f32>);

impl Point for EuclideanPoint {
    fn distance(&self, other: &Self) -> f32 {
        squared_l2(&self.0, &other.0).sqrt()
    }
}

/// Approximate store backed by an instant-distance HNSW graph
///
/// The graph is immutable once built, so every append rebuilds it. The graph
/// yields at most `ef_search` candidates, so larger requests scan every vector.
pub struct HnswStore {
    dimension: usize,
    data: Vec<f32>,
    ef_search: usize,
    graph: Option<HnswMap<EuclideanPoint, usize>>,
}

impl HnswStore {
    pub fn new(dimension: usize) -> Self {
        Self::with_ef_search(dimension, 100)
    }

    pub fn with_ef_search(dimension: usize, ef_search: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
            ef_search: ef_search.max(1),
            graph: None,
        }
    }

    fn rebuild(&mut self) {
        if self.data.is_empty() {
            self.graph = None;
            return;
        }
        let points: Vec<EuclideanPoint> = self
            .data
            .chunks_exact(self.dimension)
            .map(|row| EuclideanPoint(row.to_vec()))
            .collect();
        let positions: Vec<usize> = (0..points.len()).collect();
        log::debug!("Building HNSW graph over {} vectors", points.len());
        self.graph = Some(
            Builder::default()
                .ef_search(self.ef_search)
                .seed(42)
                .build(points, positions),
        );
    }
}

impl VectorStore for HnswStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Hnsw
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn add(&mut self, vectors: &[Embedding]) -> Result<()> {
        for vector in vectors {
            check_dimension(self.dimension, vector.len(), "Vector")?;
        }
        if vectors.is_empty() {
            return Ok(());
        }
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        self.rebuild();
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        check_dimension(self.dimension, query.len(), "Query")?;
        let Some(graph) = &self.graph else {
            return Ok(Vec::new());
        };
        if k >= self.ef_search || k >= self.len() {
            return Ok(exhaustive_search(&self.data, self.dimension, query, k));
        }

        let point = EuclideanPoint(query.to_vec());
        let mut search = Search::default();
        let mut neighbors: Vec<Neighbor> = graph
            .search(&point, &mut search)
            .take(k)
            .map(|item| {
                let position = *item.value;
                let start = position * self.dimension;
                Neighbor {
                    distance: squared_l2(query, &self.data[start..start + self.dimension]),
                    position,
                }
            })
            .collect();

        neighbors.sort_by(Neighbor::ordering);
        Ok(neighbors)
    }

    fn raw_vectors(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_vectors() -> Vec<Embedding> {
        vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![3.0, 3.0],
        ]
    }

    #[test]
    fn test_flat_search_orders_by_distance() {
        let mut store = FlatL2Store::new(2);
        store.add(&sample_vectors()).unwrap();

        let hits = store.search(&[0.9, 0.1], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 0, 2]);
        assert_relative_eq!(hits[0].distance, 0.02, epsilon = 1e-6);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_flat_ties_follow_insertion_order() {
        let mut store = FlatL2Store::new(1);
        store.add(&[vec![1.0], vec![-1.0], vec![1.0]]).unwrap();
        let hits = store.search(&[0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_flat_k_larger_than_corpus() {
        let mut store = FlatL2Store::new(2);
        store.add(&sample_vectors()).unwrap();
        assert_eq!(store.search(&[0.0, 0.0], 50).unwrap().len(), 4);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut store = FlatL2Store::new(3);
        assert!(store.add(&[vec![1.0, 2.0]]).is_err());
        assert!(store.search(&[1.0], 1).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_preserves_positions() {
        let mut store = FlatL2Store::new(2);
        store.add(&sample_vectors()[..2]).unwrap();
        store.add(&sample_vectors()[2..]).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(&store.raw_vectors()[4..6], &[0.0, 2.0]);
    }

    #[test]
    fn test_hnsw_finds_exact_match() {
        let mut store = HnswStore::new(2);
        store.add(&sample_vectors()).unwrap();
        let hits = store.search(&[3.0, 3.0], 2).unwrap();
        assert_eq!(hits[0].position, 3);
        assert_eq!(hits[0].distance, 0.0);
        assert!(hits.len() <= 2);
    }

    #[test]
    fn test_hnsw_k_larger_than_candidate_list() {
        let vectors: Vec<Embedding> = (0..150).map(|i| vec![i as f32, (i % 7) as f32]).collect();
        let mut store = HnswStore::new(2);
        store.add(&vectors).unwrap();

        let hits = store.search(&[0.0, 0.0], 200).unwrap();
        assert_eq!(hits.len(), 150);
        assert_eq!(hits[0].position, 0);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

        let mut narrow = HnswStore::with_ef_search(2, 4);
        narrow.add(&vectors[..10]).unwrap();
        assert_eq!(narrow.search(&[0.0, 0.0], 6).unwrap().len(), 6);
    }

    #[test]
    fn test_hnsw_empty_store() {
        let store = HnswStore::new(4);
        assert!(store.search(&[0.0; 4], 3).unwrap().is_empty());
    }

    #[test]
    fn test_restore_round_trip() {
        let mut store = FlatL2Store::new(2);
        store.add(&sample_vectors()).unwrap();
        let restored = restore_store(StoreKind::Hnsw, 2, store.raw_vectors().to_vec()).unwrap();
        assert_eq!(restored.kind(), StoreKind::Hnsw);
        assert_eq!(restored.raw_vectors(), store.raw_vectors());
    }

    #[test]
    fn test_restore_rejects_ragged_data() {
        let err = restore_store(StoreKind::Flat, 3, vec![1.0; 7]).err().unwrap();
        assert!(matches!(err, AssistantError::CorruptState(_)));
    }
}
