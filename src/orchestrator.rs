//! Pipeline orchestrator for Enkel.
//!
//! Coordinates one question from text acquisition to the answer. Every call
//! builds a fresh index; nothing is cached between questions.

use crate::chunking::{create_chunker, Chunk, ChunkingConfig, ChunkingStrategy};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{EnkelError, Result};
use crate::rag::{AnswerResult, Answerer, ChatModel, Indexer, OpenAIChatModel, Retriever};
use crate::source::{
    load_pages, require_single, DataSource, DocumentSource, Encyclopedia, QueryRequest, TextUnit,
    WikipediaClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// The main orchestrator for the Enkel pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    encyclopedia: Arc<dyn Encyclopedia>,
    deadline: Duration,
}

impl Orchestrator {
    /// Create an orchestrator backed by the hosted services.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_settings(&settings)?);
        let chat: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::with_settings(&settings)?);
        let encyclopedia: Arc<dyn Encyclopedia> = Arc::new(WikipediaClient::with_settings(
            &settings.wikipedia,
            settings.retry_policy(),
        )?);

        info!(
            "Using {} for embeddings and {} for answers",
            settings.embedding.model, settings.answer.model
        );

        Ok(Self::with_components(settings, prompts, embedder, chat, encyclopedia))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        encyclopedia: Arc<dyn Encyclopedia>,
    ) -> Self {
        let deadline = settings.pipeline_deadline();
        Self {
            settings,
            prompts,
            embedder,
            chat,
            encyclopedia,
            deadline,
        }
    }

    /// Override the deadline for a whole pipeline run.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Answer a question from the requested source.
    ///
    /// A document attached to the request is used in place of `documents`.
    #[instrument(skip(self, request, documents), fields(source = %request.source))]
    pub async fn get_answer(
        &self,
        request: &QueryRequest,
        documents: &dyn DocumentSource,
    ) -> Result<AnswerResult> {
        match tokio::time::timeout(self.deadline, self.run(request, documents)).await {
            Ok(result) => result,
            Err(_) => Err(EnkelError::DeadlineExceeded(format!(
                "no answer within {}s",
                self.deadline.as_secs_f64()
            ))),
        }
    }

    async fn run(&self, request: &QueryRequest, documents: &dyn DocumentSource) -> Result<AnswerResult> {
        let chunks = self.acquire(request, documents).await?;

        let index = Indexer::new(self.embedder.clone()).build(chunks).await?;

        let context = Retriever::new(self.embedder.clone())
            .with_top_k(self.settings.retrieval.top_k)
            .retrieve(&index, &request.question)
            .await?;

        Answerer::new(self.chat.clone())
            .with_prompts(self.prompts.clone())
            .answer(context, &request.question)
            .await
    }

    /// Fetch the source text for a request and split it into chunks.
    #[instrument(skip(self, request, documents), fields(source = %request.source))]
    pub async fn acquire(
        &self,
        request: &QueryRequest,
        documents: &dyn DocumentSource,
    ) -> Result<Vec<Chunk>> {
        let config = ChunkingConfig::from(&self.settings.chunking);

        let (units, strategy) = match request.source {
            DataSource::Document => {
                let document = match &request.document {
                    Some(attached) => require_single(attached).await?,
                    None => require_single(documents).await?,
                };
                info!("Loading {}", document.filename);

                let units = tokio::task::spawn_blocking(move || load_pages(&document))
                    .await
                    .map_err(|e| EnkelError::Pdf(format!("PDF parsing task failed: {}", e)))??;
                (units, ChunkingStrategy::Recursive)
            }
            DataSource::Wikipedia => {
                let text = self.encyclopedia.search(&request.question).await?;
                (
                    vec![TextUnit::wikipedia(text)],
                    self.settings.chunking.wikipedia_strategy,
                )
            }
        };

        let chunks = create_chunker(strategy, config).split(&units);
        debug!("{} units became {} chunks ({})", units.len(), chunks.len(), strategy);
        Ok(chunks)
    }
}
