//! Chunking strategies for breaking source text into retrievable segments.

mod lines;
mod recursive;

pub use lines::LineSplitter;
pub use recursive::RecursiveCharacterSplitter;

use crate::source::TextUnit;
use serde::{Deserialize, Serialize};

/// A bounded segment of source text used as a unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub content: String,
    /// Where the text came from (file name or "wikipedia").
    pub source: Option<String>,
    /// Page number within the source document (1-based).
    pub page: Option<u32>,
}

impl Chunk {
    /// Create a chunk that inherits the provenance of its text unit.
    pub fn from_unit(unit: &TextUnit, content: String) -> Self {
        Self {
            content,
            source: unit.source.clone(),
            page: unit.page,
        }
    }

    /// Short provenance label, e.g. "report.pdf p. 3".
    pub fn label(&self) -> String {
        match (&self.source, self.page) {
            (Some(source), Some(page)) => format!("{} p. {}", source, page),
            (Some(source), None) => source.clone(),
            (None, Some(page)) => format!("p. {}", page),
            (None, None) => "unknown".to_string(),
        }
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// One chunk per non-blank line.
    Lines,
    /// Size-bounded recursive splitting with overlap.
    Recursive,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lines" | "line" => Ok(ChunkingStrategy::Lines),
            "recursive" => Ok(ChunkingStrategy::Recursive),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkingStrategy::Lines => write!(f, "lines"),
            ChunkingStrategy::Recursive => write!(f, "recursive"),
        }
    }
}

/// Configuration for size-bounded chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Trait for chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split text units into chunks. Chunks never span two units.
    fn split(&self, units: &[TextUnit]) -> Vec<Chunk>;
}

/// Create a chunker based on the strategy.
pub fn create_chunker(strategy: ChunkingStrategy, config: ChunkingConfig) -> Box<dyn Chunker> {
    match strategy {
        ChunkingStrategy::Lines => Box::new(LineSplitter),
        ChunkingStrategy::Recursive => Box::new(RecursiveCharacterSplitter::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!("lines".parse::<ChunkingStrategy>(), Ok(ChunkingStrategy::Lines));
        assert_eq!("Recursive".parse::<ChunkingStrategy>(), Ok(ChunkingStrategy::Recursive));
        assert!("semantic".parse::<ChunkingStrategy>().is_err());
    }

    #[test]
    fn test_chunk_label() {
        let unit = TextUnit::page("paper.pdf", 2, "text");
        let chunk = Chunk::from_unit(&unit, "text".to_string());
        assert_eq!(chunk.label(), "paper.pdf p. 2");
    }

    #[test]
    fn test_create_chunker_dispatch() {
        let units = vec![TextUnit::new("first line\nsecond line")];

        let lines = create_chunker(ChunkingStrategy::Lines, ChunkingConfig::default());
        assert_eq!(lines.split(&units).len(), 2);

        let recursive = create_chunker(ChunkingStrategy::Recursive, ChunkingConfig::default());
        assert_eq!(recursive.split(&units).len(), 1);
    }
}
