//! Depsearch: syntactic pattern search over a news article corpus
//!
//! Loads a validated directory of scraped articles, annotates them with an
//! external tagger, and searches each sentence's dependency tree for a
//! (root POS, relation, child POS) pattern.

pub mod analyzer; // Annotator trait and implementations
pub mod article; // Articles and their on-disk artifacts
pub mod conllu; // CoNLL-U reading and writing
pub mod corpus; // Corpus validation and loading
pub mod graph; // Per-sentence dependency graphs
pub mod index; // POS index for candidate lookup
pub mod matcher; // Pattern search and match trees
pub mod pipeline; // Text processing, POS frequency and pattern search runs
pub mod tree; // Annotated document data structures
pub mod writer; // JSON output for matches

// Re-exports for convenience
pub use analyzer::{Analyzer, AnalyzerError, CommandAnalyzer, ConlluAnalyzer};
pub use article::{Article, ArticleId};
pub use conllu::{CoNLLUReader, ParseError};
pub use corpus::{CorpusError, CorpusManager};
pub use graph::{MalformedSentence, SentenceGraph, make_graphs};
pub use matcher::{PatternSpec, SentenceMatches, TreeNode, find_pattern};
pub use pipeline::{
    PatternSearchPipeline, PipelineError, PosFrequencyPipeline, RunReport, TextProcessingPipeline,
};
pub use tree::{Document, Sentence, Token};
