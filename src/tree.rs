//! Annotated document data structures
//!
//! A document is an ordered list of sentences, each an ordered list of
//! tokens carrying a head pointer. This is what an annotator hands back and
//! what the CoNLL-U reader produces. Nothing here checks that the head
//! pointers form a tree; that is the graph builder's job.

use rustc_hash::FxHashMap;

/// 1-based token position within a sentence
pub type Position = usize;

/// Head value marking the root of a sentence
pub const ROOT: Position = 0;

/// A single annotated token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub position: Position,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: Option<String>,
    pub feats: Option<String>,
    pub head: Position,
    pub deprel: String,
    pub misc: Option<String>,
}

impl Token {
    /// Create a token with the fields the pattern search cares about
    pub fn new(position: Position, form: &str, lemma: &str, upos: &str, head: Position, deprel: &str) -> Self {
        Self {
            position,
            form: form.to_string(),
            lemma: lemma.to_string(),
            upos: upos.to_string(),
            xpos: None,
            feats: None,
            head,
            deprel: deprel.to_string(),
            misc: None,
        }
    }
}

/// A sentence: tokens in position order plus comment metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sentence {
    pub tokens: Vec<Token>,
    pub text: Option<String>,
    pub metadata: FxHashMap<String, String>,
}

impl Sentence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sentence carrying `# text` and other comment metadata
    pub fn with_metadata(text: Option<String>, metadata: FxHashMap<String, String>) -> Self {
        Self {
            tokens: Vec::new(),
            text,
            metadata,
        }
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Look up a token by its 1-based position
    pub fn get(&self, position: Position) -> Option<&Token> {
        self.tokens.iter().find(|t| t.position == position)
    }
}

/// An annotated document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub sentences: Vec<Sentence>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sentences(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    pub fn push(&mut self, sentence: Sentence) {
        self.sentences.push(sentence);
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// All tokens in document order
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }
}
