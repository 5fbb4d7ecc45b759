//! Articles and their on-disk artifacts
//!
//! Every article lives in the corpus directory as a family of files sharing
//! its numeric ID: `<id>_raw.txt` is the scraped text, the rest are written
//! by the pipelines.

use crate::conllu::{self, ParseError};
use crate::tree::Document;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Positive integer identifying an article within a corpus
pub type ArticleId = usize;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"));

/// Files that make up an article on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Raw,
    Cleaned,
    Conllu,
    Meta,
    Pattern,
}

impl Artifact {
    pub fn suffix(self) -> &'static str {
        match self {
            Artifact::Raw => "_raw.txt",
            Artifact::Cleaned => "_cleaned.txt",
            Artifact::Conllu => "_udpipe_conllu.conllu",
            Artifact::Meta => "_meta.json",
            Artifact::Pattern => "_pattern.json",
        }
    }

    /// Path of this artifact for article `id` inside `dir`
    pub fn path(self, dir: &Path, id: ArticleId) -> PathBuf {
        dir.join(format!("{}{}", id, self.suffix()))
    }
}

/// Extract the article ID embedded in a file name (`12_raw.txt` -> 12)
///
/// The ID is the run of digits before the first underscore. Returns None
/// when the file name has no such prefix or the ID is zero.
pub fn article_id_from_path(path: &Path) -> Option<ArticleId> {
    let name = path.file_name()?.to_str()?;
    let (prefix, _) = name.split_once('_')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok().filter(|&id| id > 0)
}

/// A news article: raw text plus, once annotated, its parsed document
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    id: ArticleId,
    raw_text: String,
    document: Option<Document>,
}

impl Article {
    pub fn new(id: ArticleId, raw_text: String) -> Self {
        Self {
            id,
            raw_text,
            document: None,
        }
    }

    pub fn id(&self) -> ArticleId {
        self.id
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn set_document(&mut self, document: Document) {
        self.document = Some(document);
    }

    /// Lowercased text with punctuation stripped and whitespace collapsed
    pub fn cleaned_text(&self) -> String {
        let lowered = self.raw_text.to_lowercase();
        let stripped = PUNCTUATION.replace_all(&lowered, " ");
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Load the raw text of article `id` from `path`
pub fn read_raw(path: &Path, id: ArticleId) -> io::Result<Article> {
    Ok(Article::new(id, fs::read_to_string(path)?))
}

pub fn write_cleaned(dir: &Path, article: &Article) -> io::Result<PathBuf> {
    let path = Artifact::Cleaned.path(dir, article.id());
    fs::write(&path, article.cleaned_text())?;
    Ok(path)
}

/// Write the article's parsed document as CoNLL-U
///
/// Articles without a document produce no file and return None.
pub fn write_conllu(dir: &Path, article: &Article) -> io::Result<Option<PathBuf>> {
    let Some(document) = article.document() else {
        return Ok(None);
    };
    let path = Artifact::Conllu.path(dir, article.id());
    fs::write(&path, conllu::write_document(document))?;
    Ok(Some(path))
}

/// Read a previously stored CoNLL-U file for article `id`, if there is one
pub fn read_conllu(dir: &Path, id: ArticleId) -> Result<Option<Document>, ParseError> {
    let path = Artifact::Conllu.path(dir, id);
    if !path.is_file() {
        return Ok(None);
    }
    conllu::read_document_file(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Sentence, Token};

    #[test]
    fn test_article_id_from_path() {
        assert_eq!(article_id_from_path(Path::new("/data/12_raw.txt")), Some(12));
        assert_eq!(article_id_from_path(Path::new("1_raw.txt")), Some(1));
        assert_eq!(article_id_from_path(Path::new("0_raw.txt")), None);
        assert_eq!(article_id_from_path(Path::new("abc_raw.txt")), None);
        assert_eq!(article_id_from_path(Path::new("12raw.txt")), None);
    }

    #[test]
    fn test_cleaned_text() {
        let article = Article::new(1, "Hello, World!\n  It's   2024.".to_string());
        assert_eq!(article.cleaned_text(), "hello world it s 2024");
    }

    #[test]
    fn test_artifact_paths() {
        let dir = Path::new("/tmp/corpus");
        assert_eq!(Artifact::Raw.path(dir, 3), dir.join("3_raw.txt"));
        assert_eq!(Artifact::Pattern.path(dir, 3), dir.join("3_pattern.json"));
    }

    #[test]
    fn test_conllu_artifact_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut article = Article::new(2, "Dogs bark.".to_string());

        assert_eq!(write_conllu(dir.path(), &article).unwrap(), None);
        assert_eq!(read_conllu(dir.path(), 2).unwrap(), None);

        article.set_document(Document::from_sentences(vec![Sentence::from_tokens(vec![
            Token::new(1, "Dogs", "dog", "NOUN", 2, "nsubj"),
            Token::new(2, "bark", "bark", "VERB", 0, "root"),
        ])]));
        write_conllu(dir.path(), &article).unwrap();

        let stored = read_conllu(dir.path(), 2).unwrap().unwrap();
        assert_eq!(stored.sentences[0].tokens, article.document().unwrap().sentences[0].tokens);
    }
}
