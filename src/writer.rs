//! JSON output for pattern matches
//!
//! One file per article, keyed by sentence index:
//!
//! ```json
//! { "0": [ { "root_id": 2, "root_pos": "VERB", "children": [ { "id": 4, "pos": "NOUN" } ] } ] }
//! ```
//!
//! The file is written to a temporary sibling and renamed into place, so a
//! failed write never leaves a truncated result behind.

use crate::article::{ArticleId, Artifact};
use crate::matcher::{SentenceMatches, TreeNode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("article {article_id}: failed to serialize matches: {source}")]
    Serialize {
        article_id: ArticleId,
        #[source]
        source: serde_json::Error,
    },

    #[error("article {article_id}: failed to write {path}: {source}")]
    Io {
        article_id: ArticleId,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    pub fn article_id(&self) -> ArticleId {
        match self {
            WriteError::Serialize { article_id, .. } | WriteError::Io { article_id, .. } => *article_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildRecord {
    pub id: usize,
    pub pos: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub root_id: usize,
    pub root_pos: String,
    pub children: Vec<ChildRecord>,
}

impl From<&TreeNode> for MatchRecord {
    fn from(tree: &TreeNode) -> Self {
        Self {
            root_id: tree.node_id,
            root_pos: tree.payload.clone(),
            children: tree
                .children
                .iter()
                .map(|c| ChildRecord {
                    id: c.node_id,
                    pos: c.payload.clone(),
                })
                .collect(),
        }
    }
}

/// Convert matches to their serializable shape
pub fn to_records(matches: &SentenceMatches) -> BTreeMap<usize, Vec<MatchRecord>> {
    matches
        .iter()
        .map(|(&idx, trees)| (idx, trees.iter().map(MatchRecord::from).collect()))
        .collect()
}

/// Render one article's matches as pretty-printed JSON
pub fn render(article_id: ArticleId, matches: &SentenceMatches) -> Result<Vec<u8>, WriteError> {
    serde_json::to_vec_pretty(&to_records(matches))
        .map_err(|source| WriteError::Serialize { article_id, source })
}

/// Write `<id>_pattern.json` into `dir`, all or nothing
pub fn write_matches(dir: &Path, article_id: ArticleId, matches: &SentenceMatches) -> Result<PathBuf, WriteError> {
    let bytes = render(article_id, matches)?;
    let path = Artifact::Pattern.path(dir, article_id);
    let io_err = |source: io::Error| WriteError::Io {
        article_id,
        path: path.clone(),
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(&bytes).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(&path).map_err(|e| io_err(e.error))?;

    Ok(path)
}
