//! Corpus pipelines
//!
//! Three passes over a loaded [`CorpusManager`]:
//!
//! 1. [`TextProcessingPipeline`] writes cleaned text, annotates every
//!    article and stores the CoNLL-U next to the raw file
//! 2. [`PosFrequencyPipeline`] counts UPOS tags per article into
//!    `<id>_meta.json`
//! 3. [`PatternSearchPipeline`] builds sentence graphs, runs the matcher
//!    and writes `<id>_pattern.json`
//!
//! Articles are processed one at a time in ID order. A bad sentence or a
//! failed article is recorded in the [`RunReport`] and the run carries on.

use crate::analyzer::Analyzer;
use crate::article::{self, Article, ArticleId, Artifact};
use crate::corpus::CorpusManager;
use crate::graph::{MalformedSentence, make_graphs};
use crate::matcher::{PatternSpec, SentenceMatches, find_pattern};
use crate::tree::Document;
use crate::writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Failures that stop a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("annotator {analyzer} returned {got} documents for {expected} texts")]
    AnalyzerContract {
        analyzer: String,
        expected: usize,
        got: usize,
    },

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSentence {
    pub article_id: ArticleId,
    pub sentence_index: usize,
    pub reason: MalformedSentence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedArticle {
    pub article_id: ArticleId,
    pub reason: String,
}

/// What happened during a run, unit by unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed: Vec<ArticleId>,
    pub skipped_sentences: Vec<SkippedSentence>,
    pub failed_articles: Vec<FailedArticle>,
    pub matches: usize,
}

impl RunReport {
    /// True when every article and sentence went through
    pub fn is_clean(&self) -> bool {
        self.skipped_sentences.is_empty() && self.failed_articles.is_empty()
    }

    fn fail(&mut self, article_id: ArticleId, reason: impl ToString) {
        let reason = reason.to_string();
        warn!(article_id, %reason, "Article failed");
        self.failed_articles.push(FailedArticle { article_id, reason });
    }
}

/// Outcome of searching one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSearch {
    pub matches: SentenceMatches,
    pub skipped: Vec<(usize, MalformedSentence)>,
}

impl DocumentSearch {
    pub fn match_count(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }
}

/// Build graphs for `doc` and search them, setting malformed sentences aside
pub fn search_document(pattern: &PatternSpec, doc: &Document) -> DocumentSearch {
    let mut graphs = Vec::with_capacity(doc.len());
    let mut skipped = Vec::new();
    for (idx, result) in make_graphs(doc) {
        match result {
            Ok(graph) => graphs.push((idx, graph)),
            Err(reason) => skipped.push((idx, reason)),
        }
    }

    let matches = find_pattern(pattern, graphs.iter().map(|(idx, g)| (*idx, g)));
    DocumentSearch { matches, skipped }
}

fn ensure_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|source| PipelineError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Annotate `articles` in one batch, checking the one-result-per-text contract
fn annotate(analyzer: &dyn Analyzer, articles: &[&Article]) -> Result<Vec<Result<Document, String>>, PipelineError> {
    let texts: Vec<&str> = articles.iter().map(|a| a.raw_text()).collect();
    let results = analyzer.analyze(&texts);
    if results.len() != texts.len() {
        return Err(PipelineError::AnalyzerContract {
            analyzer: analyzer.name().to_string(),
            expected: texts.len(),
            got: results.len(),
        });
    }
    Ok(results.into_iter().map(|r| r.map_err(|e| e.to_string())).collect())
}

/// Cleans and annotates the corpus, storing results beside the raw files
pub struct TextProcessingPipeline<'a> {
    corpus: &'a mut CorpusManager,
    analyzer: Option<&'a dyn Analyzer>,
    output_dir: PathBuf,
}

impl<'a> TextProcessingPipeline<'a> {
    pub fn new(corpus: &'a mut CorpusManager, analyzer: Option<&'a dyn Analyzer>) -> Self {
        let output_dir = corpus.path().to_path_buf();
        Self {
            corpus,
            analyzer,
            output_dir,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[instrument(skip(self), fields(articles = self.corpus.len()))]
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        ensure_dir(&self.output_dir)?;
        let mut report = RunReport::default();

        let documents: Vec<Option<Result<Document, String>>> = match self.analyzer {
            Some(analyzer) => {
                let articles: Vec<&Article> = self.corpus.iter().collect();
                info!(analyzer = analyzer.name(), texts = articles.len(), "Annotating corpus");
                annotate(analyzer, &articles)?.into_iter().map(Some).collect()
            }
            None => vec![None; self.corpus.len()],
        };

        for (article, document) in self.corpus.iter_mut().zip(documents) {
            let id = article.id();
            if let Err(e) = article::write_cleaned(&self.output_dir, article) {
                report.fail(id, e);
                continue;
            }

            match document {
                Some(Ok(doc)) => {
                    article.set_document(doc);
                    if let Err(e) = article::write_conllu(&self.output_dir, article) {
                        report.fail(id, e);
                        continue;
                    }
                }
                Some(Err(reason)) => {
                    report.fail(id, reason);
                    continue;
                }
                None => {}
            }

            debug!(article_id = id, "Article processed");
            report.processed.push(id);
        }

        info!(
            processed = report.processed.len(),
            failed = report.failed_articles.len(),
            "Text processing finished"
        );
        Ok(report)
    }
}

#[derive(Debug, Serialize)]
struct ArticleMeta<'a> {
    id: ArticleId,
    pos_frequencies: &'a BTreeMap<String, usize>,
}

/// Count UPOS tags over every token of a document
pub fn count_frequencies(doc: &Document) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for token in doc.tokens() {
        *counts.entry(token.upos.clone()).or_insert(0) += 1;
    }
    counts
}

/// Counts part-of-speech frequencies and records them in `<id>_meta.json`
///
/// Uses the document attached to each article, falling back to the stored
/// CoNLL-U file and finally to the annotator.
pub struct PosFrequencyPipeline<'a> {
    corpus: &'a CorpusManager,
    analyzer: &'a dyn Analyzer,
    output_dir: PathBuf,
}

impl<'a> PosFrequencyPipeline<'a> {
    pub fn new(corpus: &'a CorpusManager, analyzer: &'a dyn Analyzer) -> Self {
        Self {
            corpus,
            analyzer,
            output_dir: corpus.path().to_path_buf(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[instrument(skip(self), fields(articles = self.corpus.len()))]
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        ensure_dir(&self.output_dir)?;
        let mut report = RunReport::default();

        for (id, document) in load_documents(self.corpus, self.analyzer, &self.output_dir)? {
            let doc = match document {
                Ok(doc) => doc,
                Err(reason) => {
                    report.fail(id, reason);
                    continue;
                }
            };

            let frequencies = count_frequencies(&doc);
            let meta = ArticleMeta {
                id,
                pos_frequencies: &frequencies,
            };
            let written = serde_json::to_vec_pretty(&meta)
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    fs::write(Artifact::Meta.path(&self.output_dir, id), bytes).map_err(|e| e.to_string())
                });
            match written {
                Ok(()) => report.processed.push(id),
                Err(reason) => report.fail(id, reason),
            }
        }

        info!(processed = report.processed.len(), "POS frequencies written");
        Ok(report)
    }
}

/// Searches every article for a syntactic pattern
pub struct PatternSearchPipeline<'a> {
    corpus: &'a CorpusManager,
    analyzer: &'a dyn Analyzer,
    pattern: PatternSpec,
    output_dir: PathBuf,
}

impl<'a> PatternSearchPipeline<'a> {
    pub fn new(corpus: &'a CorpusManager, analyzer: &'a dyn Analyzer, pattern: PatternSpec) -> Self {
        Self {
            corpus,
            analyzer,
            pattern,
            output_dir: corpus.path().to_path_buf(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[instrument(skip(self), fields(pattern = %self.pattern, articles = self.corpus.len()))]
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        ensure_dir(&self.output_dir)?;
        let mut report = RunReport::default();

        for (id, document) in load_documents(self.corpus, self.analyzer, &self.output_dir)? {
            let doc = match document {
                Ok(doc) => doc,
                Err(reason) => {
                    report.fail(id, reason);
                    continue;
                }
            };

            let search = search_document(&self.pattern, &doc);
            for (sentence_index, reason) in search.skipped.iter().cloned() {
                warn!(article_id = id, sentence_index, %reason, "Skipping malformed sentence");
                report.skipped_sentences.push(SkippedSentence {
                    article_id: id,
                    sentence_index,
                    reason,
                });
            }

            match writer::write_matches(&self.output_dir, id, &search.matches) {
                Ok(path) => {
                    debug!(article_id = id, matches = search.match_count(), path = %path.display(), "Matches written");
                    report.matches += search.match_count();
                    report.processed.push(id);
                }
                Err(e) => report.fail(e.article_id(), e),
            }
        }

        info!(
            processed = report.processed.len(),
            matches = report.matches,
            skipped_sentences = report.skipped_sentences.len(),
            failed = report.failed_articles.len(),
            "Pattern search finished"
        );
        Ok(report)
    }
}

/// Resolve a document for every article, in ID order
///
/// Attached documents win, then CoNLL-U stored in `dir`; whatever is left is
/// sent to the annotator in a single batch.
fn load_documents(
    corpus: &CorpusManager,
    analyzer: &dyn Analyzer,
    dir: &Path,
) -> Result<Vec<(ArticleId, Result<Document, String>)>, PipelineError> {
    let mut resolved: BTreeMap<ArticleId, Result<Document, String>> = BTreeMap::new();
    let mut pending = Vec::new();

    for article in corpus.iter() {
        if let Some(doc) = article.document() {
            resolved.insert(article.id(), Ok(doc.clone()));
            continue;
        }
        match article::read_conllu(dir, article.id()) {
            Ok(Some(doc)) => {
                resolved.insert(article.id(), Ok(doc));
            }
            Ok(None) => pending.push(article),
            Err(e) => {
                resolved.insert(article.id(), Err(format!("stored CoNLL-U unreadable: {}", e)));
            }
        }
    }

    if !pending.is_empty() {
        info!(analyzer = analyzer.name(), texts = pending.len(), "Annotating articles without stored CoNLL-U");
        let results = annotate(analyzer, &pending)?;
        for (article, result) in pending.iter().zip(results) {
            resolved.insert(article.id(), result);
        }
    }

    Ok(resolved.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AnalyzerError, ConlluAnalyzer};
    use crate::tree::{Sentence, Token};
    use tempfile::{TempDir, tempdir};

    const GOOD: &str = "1\teat\teat\tVERB\t_\t_\t0\troot\t_\t_\n\
                        2\tapples\tapple\tNOUN\t_\t_\t1\tobj\t_\t_\n\n\
                        1\tHello\thello\tINTJ\t_\t_\t0\troot\t_\t_\n\n\
                        1\tsaw\tsee\tVERB\t_\t_\t0\troot\t_\t_\n\
                        2\tcats\tcat\tNOUN\t_\t_\t1\tobj\t_\t_\n\
                        3\tdogs\tdog\tNOUN\t_\t_\t1\tobj\t_\t_\n";

    const BROKEN_HEAD: &str = "1\tbark\tbark\tVERB\t_\t_\t0\troot\t_\t_\n\
                               2\tdogs\tdog\tNOUN\t_\t_\t9\tnsubj\t_\t_\n\n\
                               1\tsee\tsee\tVERB\t_\t_\t0\troot\t_\t_\n\
                               2\tbirds\tbird\tNOUN\t_\t_\t1\tobj\t_\t_\n";

    fn create_corpus(texts: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        for (i, text) in texts.iter().enumerate() {
            fs::write(dir.path().join(format!("{}_raw.txt", i + 1)), text).unwrap();
        }
        dir
    }

    /// Annotator that always returns the wrong number of documents
    struct ShortAnalyzer;

    impl Analyzer for ShortAnalyzer {
        fn name(&self) -> &str {
            "short"
        }

        fn analyze(&self, _texts: &[&str]) -> Vec<Result<Document, AnalyzerError>> {
            Vec::new()
        }
    }

    #[test]
    fn test_search_document_single_match() {
        let doc = Document::from_sentences(vec![Sentence::from_tokens(vec![
            Token::new(1, "eat", "eat", "VERB", 0, "root"),
            Token::new(2, "apples", "apple", "NOUN", 1, "obj"),
        ])]);

        let search = search_document(&PatternSpec::pair("VERB", "NOUN"), &doc);
        assert_eq!(search.match_count(), 1);
        assert!(search.skipped.is_empty());
        let tree = &search.matches[&0][0];
        assert_eq!((tree.node_id, tree.payload.as_str()), (1, "VERB"));
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].node_id, 2);
    }

    #[test]
    fn test_search_document_skips_malformed_sentence() {
        let doc = crate::conllu::read_document(BROKEN_HEAD).unwrap();
        let search = search_document(&PatternSpec::pair("VERB", "NOUN"), &doc);

        assert_eq!(search.skipped.len(), 1);
        assert_eq!(search.skipped[0].0, 0);
        assert_eq!(search.matches.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_text_processing_writes_artifacts() {
        let dir = create_corpus(&[GOOD, "garbage"]);
        let mut corpus = CorpusManager::new(dir.path()).unwrap();

        let report = TextProcessingPipeline::new(&mut corpus, Some(&ConlluAnalyzer))
            .run()
            .unwrap();

        assert_eq!(report.processed, vec![1]);
        assert_eq!(report.failed_articles.len(), 1);
        assert_eq!(report.failed_articles[0].article_id, 2);
        assert!(dir.path().join("1_cleaned.txt").is_file());
        assert!(dir.path().join("1_udpipe_conllu.conllu").is_file());
        assert!(!dir.path().join("2_udpipe_conllu.conllu").exists());
        assert_eq!(corpus.get(1).unwrap().document().unwrap().len(), 3);
    }

    #[test]
    fn test_text_processing_without_analyzer_only_cleans() {
        let dir = create_corpus(&["Hello, World!"]);
        let mut corpus = CorpusManager::new(dir.path()).unwrap();

        let report = TextProcessingPipeline::new(&mut corpus, None).run().unwrap();

        assert!(report.is_clean());
        assert_eq!(fs::read_to_string(dir.path().join("1_cleaned.txt")).unwrap(), "hello world");
    }

    #[test]
    fn test_pattern_search_writes_results() {
        let dir = create_corpus(&[GOOD, BROKEN_HEAD]);
        let corpus = CorpusManager::new(dir.path()).unwrap();
        let out = tempdir().unwrap();

        let report = PatternSearchPipeline::new(&corpus, &ConlluAnalyzer, PatternSpec::pair("VERB", "NOUN"))
            .with_output_dir(out.path())
            .run()
            .unwrap();

        assert_eq!(report.processed, vec![1, 2]);
        assert_eq!(report.matches, 3);
        assert_eq!(report.skipped_sentences.len(), 1);
        assert_eq!(report.skipped_sentences[0].article_id, 2);
        assert_eq!(report.skipped_sentences[0].sentence_index, 0);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.path().join("1_pattern.json")).unwrap()).unwrap();
        assert_eq!(json.as_object().unwrap().keys().collect::<Vec<_>>(), vec!["0", "2"]);
        assert_eq!(json["2"][0]["children"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_pattern_search_prefers_stored_conllu() {
        let dir = create_corpus(&["not conllu at all"]);
        fs::write(dir.path().join("1_udpipe_conllu.conllu"), GOOD).unwrap();
        let corpus = CorpusManager::new(dir.path()).unwrap();

        let report = PatternSearchPipeline::new(&corpus, &ConlluAnalyzer, PatternSpec::pair("VERB", "NOUN"))
            .run()
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.matches, 2);
    }

    #[test]
    fn test_zero_matches_is_success() {
        let dir = create_corpus(&[GOOD]);
        let corpus = CorpusManager::new(dir.path()).unwrap();

        let report = PatternSearchPipeline::new(&corpus, &ConlluAnalyzer, PatternSpec::pair("ADJ", "ADV"))
            .run()
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.matches, 0);
        assert_eq!(fs::read_to_string(dir.path().join("1_pattern.json")).unwrap(), "{}");
    }

    #[test]
    fn test_analyzer_contract_violation() {
        let dir = create_corpus(&[GOOD]);
        let corpus = CorpusManager::new(dir.path()).unwrap();

        let err = PatternSearchPipeline::new(&corpus, &ShortAnalyzer, PatternSpec::pair("VERB", "NOUN"))
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::AnalyzerContract { expected: 1, got: 0, .. }));
    }

    #[test]
    fn test_pos_frequencies() {
        let dir = create_corpus(&[GOOD]);
        let corpus = CorpusManager::new(dir.path()).unwrap();

        let report = PosFrequencyPipeline::new(&corpus, &ConlluAnalyzer).run().unwrap();
        assert!(report.is_clean());

        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("1_meta.json")).unwrap()).unwrap();
        assert_eq!(meta["id"], 1);
        assert_eq!(meta["pos_frequencies"]["VERB"], 2);
        assert_eq!(meta["pos_frequencies"]["NOUN"], 3);
        assert_eq!(meta["pos_frequencies"]["INTJ"], 1);
    }
}
