//! Per-sentence dependency graphs
//!
//! A [`SentenceGraph`] is a node table (slot 0 is the synthetic root, slot
//! `i` is token position `i`) plus an edge list with one `head -> dependent`
//! edge per token. Children of each node are kept in position order, which
//! is what the matcher relies on for ordering its output.

use crate::tree::{Document, Position, ROOT, Sentence};
use thiserror::Error;

/// POS label carried by the synthetic root node
pub const ROOT_LABEL: &str = "ROOT";

/// Reasons a sentence cannot be turned into a dependency tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSentence {
    #[error("token {found} out of sequence, expected position {expected}")]
    BadPosition { expected: Position, found: Position },

    #[error("token {token} has head {head}, outside 0..={len}")]
    HeadOutOfRange { token: Position, head: Position, len: usize },

    #[error("token {0} is its own head")]
    SelfLoop(Position),

    #[error("token {0} does not reach the root (head cycle)")]
    Cycle(Position),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: Position,
    pub pos: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub head: Position,
    pub dependent: Position,
    pub deprel: String,
}

/// Dependency graph for one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<Edge>,
    /// Edge indices leaving each node, in dependent position order
    out_edges: Vec<Vec<usize>>,
}

impl SentenceGraph {
    /// Build the graph for a sentence, checking that its heads form a tree
    pub fn build(sentence: &Sentence) -> Result<Self, MalformedSentence> {
        let len = sentence.len();
        let mut nodes = Vec::with_capacity(len + 1);
        nodes.push(GraphNode {
            id: ROOT,
            pos: ROOT_LABEL.to_string(),
        });

        for (idx, token) in sentence.tokens.iter().enumerate() {
            let expected = idx + 1;
            if token.position != expected {
                return Err(MalformedSentence::BadPosition {
                    expected,
                    found: token.position,
                });
            }
            if token.head > len {
                return Err(MalformedSentence::HeadOutOfRange {
                    token: token.position,
                    head: token.head,
                    len,
                });
            }
            if token.head == token.position {
                return Err(MalformedSentence::SelfLoop(token.position));
            }
            nodes.push(GraphNode {
                id: token.position,
                pos: token.upos.clone(),
            });
        }

        check_acyclic(sentence)?;

        let mut edges = Vec::with_capacity(len);
        let mut out_edges = vec![Vec::new(); len + 1];
        for token in &sentence.tokens {
            out_edges[token.head].push(edges.len());
            edges.push(Edge {
                head: token.head,
                dependent: token.position,
                deprel: token.deprel.clone(),
            });
        }

        Ok(Self {
            nodes,
            edges,
            out_edges,
        })
    }

    /// Number of token nodes, not counting the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All nodes including the root, in position order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: Position) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Outgoing edges of `id` paired with their dependent nodes
    pub fn children(&self, id: Position) -> impl Iterator<Item = (&Edge, &GraphNode)> {
        self.out_edges
            .get(id)
            .into_iter()
            .flatten()
            .map(|&e| {
                let edge = &self.edges[e];
                (edge, &self.nodes[edge.dependent])
            })
    }

    /// Number of edges entering `id`
    pub fn in_degree(&self, id: Position) -> usize {
        self.edges.iter().filter(|e| e.dependent == id).count()
    }
}

/// Every token must reach the root by following heads
fn check_acyclic(sentence: &Sentence) -> Result<(), MalformedSentence> {
    let len = sentence.len();
    // 0 = unvisited, 1 = on the current walk, 2 = known to reach the root
    let mut state = vec![0u8; len + 1];
    state[ROOT] = 2;

    for start in 1..=len {
        let mut walk = Vec::new();
        let mut current = start;
        while state[current] == 0 {
            state[current] = 1;
            walk.push(current);
            current = sentence.tokens[current - 1].head;
        }
        if state[current] == 1 {
            return Err(MalformedSentence::Cycle(start));
        }
        for node in walk {
            state[node] = 2;
        }
    }
    Ok(())
}

/// Lazy per-sentence graph construction over a document
///
/// Yields `(sentence_index, result)` in document order. A malformed sentence
/// yields its error and iteration moves on to the next one.
pub struct SentenceGraphs<'a> {
    sentences: std::iter::Enumerate<std::slice::Iter<'a, Sentence>>,
}

impl<'a> Iterator for SentenceGraphs<'a> {
    type Item = (usize, Result<SentenceGraph, MalformedSentence>);

    fn next(&mut self) -> Option<Self::Item> {
        self.sentences
            .next()
            .map(|(idx, sentence)| (idx, SentenceGraph::build(sentence)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.sentences.size_hint()
    }
}

/// Build graphs for every sentence of a document
pub fn make_graphs(doc: &Document) -> SentenceGraphs<'_> {
    SentenceGraphs {
        sentences: doc.sentences.iter().enumerate(),
    }
}
