//! Index construction: embed every chunk and store it in a fresh index.

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{EnkelError, Result};
use crate::vector_store::SearchIndex;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Builds a [`SearchIndex`] from chunks.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed `chunks` and index them.
    ///
    /// No chunks gives an empty index without contacting the embedding service.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<SearchIndex> {
        if chunks.is_empty() {
            debug!("No chunks to index");
            return Ok(SearchIndex::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(EnkelError::external(
                "embedding",
                format!("{} chunks but {} embeddings", chunks.len(), embeddings.len()),
                false,
            ));
        }

        let index = SearchIndex::from_embedded(chunks, embeddings);
        info!("Indexed {} chunks", index.len());
        Ok(index)
    }
}
