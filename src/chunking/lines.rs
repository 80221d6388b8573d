//! Line-based splitting.

use super::{Chunk, Chunker};
use crate::source::TextUnit;

/// Emits every non-blank line of a text unit as its own chunk, verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSplitter;

impl Chunker for LineSplitter {
    fn split(&self, units: &[TextUnit]) -> Vec<Chunk> {
        units
            .iter()
            .flat_map(|unit| {
                unit.content
                    .split('\n')
                    .map(|line| line.trim_end_matches('\r'))
                    .filter(|line| !line.trim().is_empty())
                    .map(move |line| Chunk::from_unit(unit, line.to_string()))
            })
            .collect()
    }
}
