//! CoNLL-U reading and writing
//!
//! Parses CoNLL-U text into [`Sentence`]s and renders a [`Document`] back.
//! Multiword token lines and empty nodes are skipped. HEAD values are kept
//! as written, so a head pointing outside the sentence survives parsing and
//! is caught later by the graph builder.
//!
//! CoNLL-U format: https://universaldependencies.org/format.html

use crate::tree::{Document, Position, Sentence, Token};
use flate2::read::MultiGzDecoder;
use rustc_hash::FxHashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Lines};
use std::path::Path;
use thiserror::Error;

/// Error during CoNLL-U parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parse error at line {line_num}: {message}")]
    Syntax { line_num: usize, message: String },

    #[error("IO error at line {line_num}: {source}")]
    Io {
        line_num: usize,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    fn syntax(line_num: usize, message: String) -> Self {
        ParseError::Syntax { line_num, message }
    }
}

/// Token ID column: a word, a multiword range, or an empty node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenId {
    Single(usize),
    Range(usize, usize),
    Decimal(usize, usize),
}

/// CoNLL-U reader that iterates over sentences
pub struct CoNLLUReader<R: BufRead> {
    lines: Lines<R>,
    line_num: usize,
}

impl CoNLLUReader<Box<dyn BufRead>> {
    /// Create a reader from a file path; `.gz` files are decompressed
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl CoNLLUReader<Cursor<String>> {
    /// Create a reader from a string
    pub fn from_string(text: &str) -> Self {
        Self::new(Cursor::new(text.to_string()))
    }
}

impl<R: BufRead> CoNLLUReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }
}

impl<R: BufRead> Iterator for CoNLLUReader<R> {
    type Item = Result<Sentence, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut token_lines = Vec::new();
        let mut metadata = FxHashMap::default();
        let mut sentence_text = None;

        // Read lines until we hit a blank line (sentence boundary) or EOF
        loop {
            match self.lines.next() {
                None => {
                    if token_lines.is_empty() {
                        return None;
                    }
                    // Last sentence without trailing blank line
                    break;
                }
                Some(Err(source)) => {
                    self.line_num += 1;
                    return Some(Err(ParseError::Io {
                        line_num: self.line_num,
                        source,
                    }));
                }
                Some(Ok(line)) => {
                    self.line_num += 1;
                    let line = line.trim();

                    if line.is_empty() {
                        if !token_lines.is_empty() {
                            break;
                        }
                        continue;
                    }

                    if let Some(comment) = line.strip_prefix('#') {
                        parse_comment(comment, &mut metadata, &mut sentence_text);
                        continue;
                    }

                    token_lines.push((self.line_num, line.to_string()));
                }
            }
        }

        Some(parse_sentence(token_lines, sentence_text, metadata))
    }
}

/// Parse a whole CoNLL-U string into a document
pub fn read_document(text: &str) -> Result<Document, ParseError> {
    CoNLLUReader::from_string(text)
        .collect::<Result<Vec<_>, _>>()
        .map(Document::from_sentences)
}

/// Parse a CoNLL-U file (optionally gzipped) into a document
pub fn read_document_file(path: &Path) -> Result<Document, ParseError> {
    let reader = CoNLLUReader::from_file(path).map_err(|source| ParseError::Io { line_num: 0, source })?;
    reader.collect::<Result<Vec<_>, _>>().map(Document::from_sentences)
}

/// Render a document as CoNLL-U text
///
/// Every sentence is followed by a blank line, as the format requires.
pub fn write_document(doc: &Document) -> String {
    let mut out = String::new();
    for (idx, sentence) in doc.sentences.iter().enumerate() {
        let mut keys: Vec<_> = sentence.metadata.keys().collect();
        keys.sort();
        if !sentence.metadata.contains_key("sent_id") {
            let _ = writeln!(out, "# sent_id = {}", idx + 1);
        }
        for key in keys {
            let _ = writeln!(out, "# {} = {}", key, sentence.metadata[key]);
        }
        if let Some(text) = &sentence.text {
            let _ = writeln!(out, "# text = {}", text);
        }
        for token in &sentence.tokens {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t_\t{}",
                token.position,
                or_blank(&token.form),
                or_blank(&token.lemma),
                or_blank(&token.upos),
                token.xpos.as_deref().unwrap_or("_"),
                token.feats.as_deref().unwrap_or("_"),
                token.head,
                or_blank(&token.deprel),
                token.misc.as_deref().unwrap_or("_"),
            );
        }
        out.push('\n');
    }
    out
}

fn or_blank(s: &str) -> &str {
    if s.is_empty() { "_" } else { s }
}

/// Parse a comment line (starts with #)
fn parse_comment(comment: &str, metadata: &mut FxHashMap<String, String>, sentence_text: &mut Option<String>) {
    if let Some((key, value)) = comment.split_once('=') {
        let key = key.trim();
        let value = value.trim();

        if key == "text" {
            *sentence_text = Some(value.to_string());
        } else {
            metadata.insert(key.to_string(), value.to_string());
        }
    }
}

/// Parse accumulated lines into a Sentence
fn parse_sentence(
    lines: Vec<(usize, String)>,
    sentence_text: Option<String>,
    metadata: FxHashMap<String, String>,
) -> Result<Sentence, ParseError> {
    let mut sentence = Sentence::with_metadata(sentence_text, metadata);

    for (line_num, line) in lines {
        if let Some(token) = parse_line(&line, line_num)? {
            sentence.add_token(token);
        }
    }

    Ok(sentence)
}

/// Split a token line on tabs; CoNLL-U requires exactly 10 columns
fn split_fields(line: &str) -> Option<[&str; 10]> {
    let bytes = line.as_bytes();
    let mut fields = [""; 10];
    let mut start = 0;
    let mut n = 0;
    for tab in memchr::memchr_iter(b'\t', bytes) {
        if n == 9 {
            return None;
        }
        fields[n] = &line[start..tab];
        start = tab + 1;
        n += 1;
    }
    if n != 9 {
        return None;
    }
    fields[9] = &line[start..];
    Some(fields)
}

/// Parse a single CoNLL-U line into a Token
/// Returns None for multiword tokens and empty nodes
fn parse_line(line: &str, line_num: usize) -> Result<Option<Token>, ParseError> {
    let Some(fields) = split_fields(line) else {
        let found = memchr::memchr_iter(b'\t', line.as_bytes()).count() + 1;
        return Err(ParseError::syntax(line_num, format!("Expected 10 fields, found {}", found)));
    };

    let position = match parse_id(fields[0], line_num)? {
        TokenId::Single(id) => id,
        TokenId::Range(_, _) | TokenId::Decimal(_, _) => return Ok(None),
    };
    if position == 0 {
        return Err(ParseError::syntax(line_num, "Token ID must be positive".to_string()));
    }

    let form = fields[1].to_string();
    let lemma = if fields[2] == "_" { form.clone() } else { fields[2].to_string() };

    Ok(Some(Token {
        position,
        form,
        lemma,
        upos: fields[3].to_string(),
        xpos: optional(fields[4]),
        feats: optional(fields[5]),
        head: parse_head(fields[6], line_num)?,
        deprel: fields[7].to_string(),
        misc: optional(fields[9]),
    }))
}

fn optional(field: &str) -> Option<String> {
    if field == "_" { None } else { Some(field.to_string()) }
}

/// Parse ID field (can be integer, range, or decimal)
fn parse_id(s: &str, line_num: usize) -> Result<TokenId, ParseError> {
    let number = |part: &str| {
        part.parse::<usize>()
            .map_err(|_| ParseError::syntax(line_num, format!("Invalid ID: {}", s)))
    };

    if let Some((start, end)) = s.split_once('-') {
        Ok(TokenId::Range(number(start)?, number(end)?))
    } else if let Some((main, sub)) = s.split_once('.') {
        Ok(TokenId::Decimal(number(main)?, number(sub)?))
    } else {
        Ok(TokenId::Single(number(s)?))
    }
}

/// Parse HEAD field; `_` is treated as the root
fn parse_head(s: &str, line_num: usize) -> Result<Position, ParseError> {
    if s == "_" {
        return Ok(0);
    }
    s.parse()
        .map_err(|_| ParseError::syntax(line_num, format!("Invalid HEAD: {}", s)))
}
