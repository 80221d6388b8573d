//! Context retrieval for answering.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchIndex, SearchResult};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of chunks retrieved when nothing else is configured.
pub const DEFAULT_TOP_K: usize = 4;

/// Finds the chunks most similar to a query.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the number of chunks to return.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Return up to `top_k` chunks, most similar first. No score threshold is applied.
    #[instrument(skip(self, index), fields(indexed = index.len()))]
    pub async fn retrieve(&self, index: &SearchIndex, query: &str) -> Result<Vec<SearchResult>> {
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = index.search(&query_embedding, self.top_k);

        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}

/// Format retrieved chunks for the prompt: contents separated by blank lines.
pub fn format_context_for_prompt(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
