//! Enkel - Retrieval-augmented question answering over a PDF or Wikipedia
//!
//! A small CLI and web tool that answers one question at a time from a single
//! uploaded PDF or from a live Wikipedia search.
//!
//! The name "Enkel" is the Norwegian/Scandinavian word for "simple."
//!
//! # Overview
//!
//! For every question Enkel:
//! - Acquires source text (PDF pages or Wikipedia summaries)
//! - Splits it into chunks
//! - Embeds the chunks into a fresh in-memory index
//! - Retrieves the chunks most similar to the question
//! - Asks a chat model to answer from those chunks
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `source` - Data sources, uploads, PDF loading and Wikipedia search
//! - `chunking` - Recursive and line-based splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity index
//! - `rag` - Indexing, retrieval and answering
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use enkel::config::Settings;
//! use enkel::orchestrator::Orchestrator;
//! use enkel::source::{QueryRequest, UploadDirectory};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let uploads = UploadDirectory::new(settings.upload_dir());
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let request = QueryRequest::parse("wikipedia", "Who designed Python?")?;
//!     let result = orchestrator.get_answer(&request, &uploads).await?;
//!     println!("{}", result.answer_or_default());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retry;
pub mod source;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{EnkelError, Result};
