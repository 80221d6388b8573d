//! Brute-force cosine index held in memory.

use super::{cosine_similarity, IndexedChunk, SearchResult};
use crate::chunking::Chunk;

/// Ephemeral nearest-neighbour index over embedded chunks.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<IndexedChunk>,
}

impl SearchIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from chunks and their embeddings, paired by position.
    pub fn from_embedded(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Self {
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `limit` most similar chunks, best first.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        results
    }
}
