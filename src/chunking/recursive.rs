//! Recursive character splitting.
//!
//! Text is cut at the coarsest separator present (paragraph, line, word) and
//! pieces still too long are split again with the next separator, down to
//! single characters. Adjacent pieces are then merged back into chunks of at
//! most `chunk_size` characters, each new chunk starting with up to
//! `chunk_overlap` characters from the end of the previous one.

use super::{Chunk, Chunker, ChunkingConfig};
use crate::source::TextUnit;
use std::collections::VecDeque;
use tracing::debug;

const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Size-bounded splitter that prefers natural boundaries.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    config: ChunkingConfig,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            config,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split one text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, finer) = pick_separator(text, separators);
        let mut chunks = Vec::new();
        let mut small: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.config.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }

            if finer.is_empty() {
                let piece = piece.trim();
                if !piece.is_empty() {
                    chunks.push(piece.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }

        chunks
    }

    /// Merge small pieces into chunks, carrying an overlap between neighbours.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > size && !window.is_empty() {
                if total > size {
                    debug!("Created a chunk of {} characters, longer than {}", total, size);
                }
                if let Some(chunk) = join(&window) {
                    merged.push(chunk);
                }

                while total > overlap || (total + len > size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece.as_str());
            total += len;
        }

        if let Some(chunk) = join(&window) {
            merged.push(chunk);
        }

        merged
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl Chunker for RecursiveCharacterSplitter {
    fn split(&self, units: &[TextUnit]) -> Vec<Chunk> {
        units
            .iter()
            .flat_map(|unit| {
                self.split_text(&unit.content)
                    .into_iter()
                    .map(move |content| Chunk::from_unit(unit, content))
            })
            .collect()
    }
}

/// First separator present in `text`, plus the finer separators after it.
fn pick_separator<'a, 'b>(text: &str, separators: &'b [&'a str]) -> (&'a str, &'b [&'a str]) {
    for (i, &separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (separator, &[]);
        }
        if text.contains(separator) {
            return (separator, &separators[i + 1..]);
        }
    }
    (separators.last().copied().unwrap_or(""), &[])
}

/// Split on `separator`, keeping it at the start of the following piece.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    pieces.extend(parts.map(|part| format!("{}{}", separator, part)));
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

fn join(window: &VecDeque<&str>) -> Option<String> {
    let text: String = window.iter().copied().collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
