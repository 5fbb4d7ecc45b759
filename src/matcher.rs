//! Syntactic pattern search over sentence graphs
//!
//! A pattern is a (root POS, relation, child POS) triple. A match is a node
//! with the root POS that has at least one direct dependent with the child
//! POS, reached through an edge carrying the relation when one is given.
//!
//! Each qualifying root yields exactly one [`TreeNode`] with all of its
//! qualifying children attached, so match trees are always two levels deep.
//! Roots come out in token position order and so do the children under
//! each root.

use crate::graph::SentenceGraph;
use crate::index::GraphIndex;
use crate::tree::Position;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Matches per sentence index; sentences without matches have no entry
pub type SentenceMatches = BTreeMap<usize, Vec<TreeNode>>;

/// Middle-slot values meaning "any relation"
const ANY_RELATION: [&str; 3] = ["", "_", "*"];

/// Universal POS tags; dependency relations never collide with these
const UPOS_TAGS: [&str; 17] = [
    "ADJ", "ADP", "ADV", "AUX", "CCONJ", "DET", "INTJ", "NOUN", "NUM", "PART", "PRON", "PROPN", "PUNCT", "SCONJ",
    "SYM", "VERB", "X",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must have 2 or 3 comma-separated parts, found {0}")]
    Arity(usize),

    #[error("pattern part {0} is empty")]
    EmptyPart(usize),

    #[error("middle slot {0} is a part-of-speech tag; expected a dependency relation such as obj or nsubj")]
    PosInRelationSlot(String),
}

/// A middle slot naming a POS tag other than the child POS
fn is_misplaced_pos(relation: &str, child_pos: &str) -> bool {
    relation != child_pos && UPOS_TAGS.contains(&relation)
}

/// The (root POS, relation, child POS) triple searched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    root_pos: String,
    relation: Option<String>,
    child_pos: String,
}

impl PatternSpec {
    /// Create a pattern from its three slots
    ///
    /// The middle slot constrains the edge relation unless it is empty,
    /// `_`, `*`, the child POS, or any other POS tag, in which case any
    /// relation is accepted.
    /// Parsing with [`FromStr`] rejects a POS tag there instead, unless it
    /// repeats the child POS.
    pub fn new(root_pos: &str, relation: &str, child_pos: &str) -> Self {
        if is_misplaced_pos(relation, child_pos) {
            warn!(relation, "Middle slot is a POS tag, accepting any relation");
        }
        let constrains =
            !ANY_RELATION.contains(&relation) && relation != child_pos && !UPOS_TAGS.contains(&relation);
        let relation = constrains.then(|| relation.to_string());
        Self {
            root_pos: root_pos.to_string(),
            relation,
            child_pos: child_pos.to_string(),
        }
    }

    /// Pattern with no relation constraint
    pub fn pair(root_pos: &str, child_pos: &str) -> Self {
        Self::new(root_pos, "_", child_pos)
    }

    pub fn root_pos(&self) -> &str {
        &self.root_pos
    }

    pub fn relation(&self) -> Option<&str> {
        self.relation.as_deref()
    }

    pub fn child_pos(&self) -> &str {
        &self.child_pos
    }
}

impl FromStr for PatternSpec {
    type Err = PatternError;

    /// Parse `ROOT,CHILD` or `ROOT,REL,CHILD`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let (root, relation, child) = match parts.as_slice() {
            [root, child] => (*root, "_", *child),
            [root, relation, child] => (*root, *relation, *child),
            _ => return Err(PatternError::Arity(parts.len())),
        };
        if root.is_empty() {
            return Err(PatternError::EmptyPart(1));
        }
        if child.is_empty() {
            return Err(PatternError::EmptyPart(parts.len()));
        }
        if is_misplaced_pos(relation, child) {
            return Err(PatternError::PosInRelationSlot(relation.to_string()));
        }
        Ok(Self::new(root, relation, child))
    }
}

impl fmt::Display for PatternSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}]-> {}",
            self.root_pos,
            self.relation.as_deref().unwrap_or("*"),
            self.child_pos
        )
    }
}

/// A node of a reconstructed match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub node_id: Position,
    pub payload: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(node_id: Position, payload: &str) -> Self {
        Self {
            node_id,
            payload: payload.to_string(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: TreeNode) {
        self.children.push(child);
    }
}

/// Find every match of `pattern` in one sentence graph
pub fn match_graph(pattern: &PatternSpec, graph: &SentenceGraph) -> Vec<TreeNode> {
    let index = GraphIndex::build(graph);
    let mut matches = Vec::new();

    for &root_id in index.get_by_pos(&pattern.root_pos) {
        let Some(root) = graph.node(root_id) else {
            continue;
        };
        let mut tree = TreeNode::new(root.id, &root.pos);
        for (edge, child) in graph.children(root_id) {
            let relation_ok = pattern.relation.as_ref().is_none_or(|rel| *rel == edge.deprel);
            if relation_ok && child.pos == pattern.child_pos {
                tree.add_child(TreeNode::new(child.id, &child.pos));
            }
        }
        if !tree.children.is_empty() {
            matches.push(tree);
        }
    }

    matches
}

/// Search a sequence of `(sentence_index, graph)` pairs
///
/// Sentence indices are taken from the input, so skipped sentences keep
/// their gap.
pub fn find_pattern<'a, I>(pattern: &PatternSpec, graphs: I) -> SentenceMatches
where
    I: IntoIterator<Item = (usize, &'a SentenceGraph)>,
{
    graphs
        .into_iter()
        .filter_map(|(idx, graph)| {
            let matches = match_graph(pattern, graph);
            (!matches.is_empty()).then_some((idx, matches))
        })
        .collect()
}
