//! RAG (Retrieval-Augmented Generation) stages: index, retrieve, answer.

pub mod chat;
pub mod context;
mod indexer;
mod response;

pub use chat::{ChatMessage, ChatModel, Completion, OpenAIChatModel, Role, TokenUsage};
pub use context::Retriever;
pub use indexer::Indexer;
pub use response::{AnswerResult, Answerer, NO_ANSWER};
