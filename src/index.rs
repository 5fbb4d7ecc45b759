//! Inverted indices for candidate lookup
//!
//! The matcher only needs to look at nodes whose POS equals the pattern's
//! root POS. Indexing a sentence graph once by POS avoids scanning every
//! node for every check.

use crate::graph::SentenceGraph;
use crate::tree::{Position, ROOT};
use rustc_hash::FxHashMap;

/// Inverted index for the token nodes of one sentence graph
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    /// Index by POS tag
    by_pos: FxHashMap<String, Vec<Position>>,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a graph; postings are in position order
    pub fn build(graph: &SentenceGraph) -> Self {
        let mut index = Self::new();

        for node in graph.nodes().iter().filter(|n| n.id != ROOT) {
            index.by_pos.entry(node.pos.clone()).or_default().push(node.id);
        }

        index
    }

    /// Nodes with the given POS tag
    pub fn get_by_pos(&self, pos: &str) -> &[Position] {
        self.by_pos.get(pos).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
