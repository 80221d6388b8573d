//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::Settings;
use crate::error::{EnkelError, Result};
use crate::openai::{create_client, map_error};
use crate::retry::RetryPolicy;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI limits how many inputs one embedding request may carry.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl OpenAIEmbedder {
    /// Create an embedder from application settings.
    pub fn with_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.openai)?,
            model: settings.embedding.model.clone(),
            dimensions: settings.embedding.dimensions as usize,
            retry: settings.retry_policy(),
        })
    }

    async fn embed_one_batch(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(input))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| EnkelError::InvalidInput(format!("Failed to build embedding request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| map_error("embedding", e))?;

        // Sort by index to ensure correct order
        let mut data = response.data;
        data.sort_by_key(|e| e.index);

        if data.len() != expected {
            return Err(EnkelError::external(
                "embedding",
                format!("expected {} vectors, received {}", expected, data.len()),
                false,
            ));
        }

        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EnkelError::external("embedding", "empty embedding response", false))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            let embeddings = self
                .retry
                .run("embedding request", move || self.embed_one_batch(batch.to_vec()))
                .await?;
            all_embeddings.extend(embeddings);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
