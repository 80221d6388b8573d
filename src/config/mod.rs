//! Configuration module for Enkel.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    AnswerSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings, OpenAISettings,
    PipelineSettings, PromptSettings, RetrievalSettings, RetrySettings, ServerSettings, Settings,
    WikipediaSettings,
};
