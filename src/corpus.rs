//! Corpus loading and validation
//!
//! A corpus is a directory of `<id>_raw.txt` files whose IDs run `1..N`
//! without gaps or duplicates, none of them empty. The whole directory is
//! validated before a single article is loaded; on any violation the corpus
//! is rejected outright.

use crate::article::{self, Article, ArticleId, Artifact};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Dataset integrity failures; all of them are fatal
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus directory {0} does not exist")]
    DirectoryNotFound(PathBuf),

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("corpus path {0} is not valid UTF-8")]
    NonUtf8Path(PathBuf),

    #[error("no *_raw.txt files in {0}")]
    EmptyDirectory(PathBuf),

    #[error("inconsistent dataset: {0}")]
    InconsistentDataset(String),

    #[error("invalid corpus path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Validated, fully loaded corpus of articles keyed by ID
#[derive(Debug)]
pub struct CorpusManager {
    path: PathBuf,
    articles: BTreeMap<ArticleId, Article>,
}

impl CorpusManager {
    /// Validate the directory at `path` and load every article in it
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref().to_path_buf();
        let raw_files = validate_dataset(&path)?;

        let mut articles = BTreeMap::new();
        for (id, file) in raw_files {
            let article = article::read_raw(&file, id).map_err(|source| CorpusError::Io { path: file, source })?;
            articles.insert(id, article);
        }

        info!(path = %path.display(), articles = articles.len(), "Corpus loaded");
        Ok(Self { path, articles })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn articles(&self) -> &BTreeMap<ArticleId, Article> {
        &self.articles
    }

    pub fn get(&self, id: ArticleId) -> Option<&Article> {
        self.articles.get(&id)
    }

    /// Mutable access, used to attach annotations
    pub fn get_mut(&mut self, id: ArticleId) -> Option<&mut Article> {
        self.articles.get_mut(&id)
    }

    /// Articles in ID order
    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Article> {
        self.articles.values_mut()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Check the corpus directory and return its raw files sorted by ID
fn validate_dataset(path: &Path) -> Result<Vec<(ArticleId, PathBuf)>, CorpusError> {
    if !path.exists() {
        return Err(CorpusError::DirectoryNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(CorpusError::NotADirectory(path.to_path_buf()));
    }

    let dir = path
        .to_str()
        .ok_or_else(|| CorpusError::NonUtf8Path(path.to_path_buf()))?;
    let pattern = format!("{}/*{}", glob::Pattern::escape(dir), Artifact::Raw.suffix());
    let mut raw_files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let file = entry.map_err(|e| CorpusError::Io {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        let id = article::article_id_from_path(&file).ok_or_else(|| {
            CorpusError::InconsistentDataset(format!("{} has no article ID", display_name(&file)))
        })?;
        raw_files.push((id, file));
    }

    if raw_files.is_empty() {
        return Err(CorpusError::EmptyDirectory(path.to_path_buf()));
    }

    raw_files.sort();
    check_ids(&raw_files.iter().map(|(id, _)| *id).collect::<Vec<_>>())?;

    for (_, file) in &raw_files {
        let meta = fs::metadata(file).map_err(|source| CorpusError::Io {
            path: file.clone(),
            source,
        })?;
        if meta.len() == 0 {
            return Err(CorpusError::InconsistentDataset(format!(
                "file {} is empty",
                display_name(file)
            )));
        }
    }

    debug!(files = raw_files.len(), "Corpus directory validated");
    Ok(raw_files)
}

/// Sorted IDs must be exactly `1..=N`
fn check_ids(ids: &[ArticleId]) -> Result<(), CorpusError> {
    if let Some(dup) = ids.windows(2).find(|w| w[0] == w[1]) {
        return Err(CorpusError::InconsistentDataset(format!("duplicate ID {}", dup[0])));
    }

    if let Some((expected, _)) = ids
        .iter()
        .enumerate()
        .map(|(idx, &id)| (idx + 1, id))
        .find(|&(expected, id)| expected != id)
    {
        let found = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        return Err(CorpusError::InconsistentDataset(format!(
            "ID {} missing, found {}",
            expected, found
        )));
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
