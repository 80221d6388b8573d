//! Answer generation from retrieved context.

use super::chat::{ChatMessage, ChatModel, TokenUsage};
use super::context::format_context_for_prompt;
use crate::config::Prompts;
use crate::error::Result;
use crate::vector_store::SearchResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Shown when the model produced no answer text.
pub const NO_ANSWER: &str = "No answer available";

/// Composes an answer to a question from context chunks.
pub struct Answerer {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl Answerer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Build the system and human turns for a question.
    pub fn build_prompt(&self, context: &[SearchResult], question: &str) -> Vec<ChatMessage> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(context));
        vars.insert("question".to_string(), question.to_string());
        // `input` is accepted as an alias in custom templates.
        vars.insert("input".to_string(), question.to_string());

        vec![
            ChatMessage::system(self.prompts.render_with_custom(&self.prompts.answer.system, &vars)),
            ChatMessage::human(self.prompts.render_with_custom(&self.prompts.answer.human, &vars)),
        ]
    }

    /// Ask the model to answer `question` from `context`.
    ///
    /// With no context the model is not called and the result carries no answer.
    #[instrument(skip(self, context), fields(chunks = context.len()))]
    pub async fn answer(&self, context: Vec<SearchResult>, question: &str) -> Result<AnswerResult> {
        if context.is_empty() {
            info!("No context retrieved; skipping answer generation");
            return Ok(AnswerResult::unanswered(question));
        }

        let messages = self.build_prompt(&context, question);
        let completion = self.model.complete(&messages).await?;

        let answer = completion.content.filter(|a| !a.trim().is_empty());
        debug!("Answer present: {}", answer.is_some());

        Ok(AnswerResult {
            input: question.to_string(),
            context,
            answer,
            model: completion.model,
            usage: completion.usage,
        })
    }
}

/// The outcome of one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// The question as asked.
    pub input: String,
    /// Chunks the answer was grounded in, most similar first.
    pub context: Vec<SearchResult>,
    /// Generated answer, absent if the model returned none.
    pub answer: Option<String>,
    /// Model that produced the answer.
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl AnswerResult {
    fn unanswered(question: &str) -> Self {
        Self {
            input: question.to_string(),
            context: Vec::new(),
            answer: None,
            model: None,
            usage: None,
        }
    }

    /// The answer, or `fallback` if there is none.
    pub fn answer_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.answer.as_deref().unwrap_or(fallback)
    }

    /// The answer, or [`NO_ANSWER`].
    pub fn answer_or_default(&self) -> &str {
        self.answer_or(NO_ANSWER)
    }
}
