//! # depsearch
//!
//! Command-line driver for the corpus pipelines:
//!
//! 1. **Load**: validate the corpus directory (IDs `1..N`, no empty files)
//! 2. **Process**: write cleaned text and annotate articles into CoNLL-U
//! 3. **Frequencies**: count part-of-speech tags per article
//! 4. **Search**: match a (root POS, relation, child POS) pattern per sentence
//!
//! A corpus that fails validation stops the run before anything is written.
//! Sentence- and article-level failures are logged, listed at the end, and
//! turn the exit status non-zero without discarding the other results.

use clap::Parser;
use depsearch::{
    Analyzer, CommandAnalyzer, ConlluAnalyzer, CorpusManager, PatternSearchPipeline, PatternSpec,
    PosFrequencyPipeline, RunReport, TextProcessingPipeline,
};
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{AnalyzerKind, Cli, Task};

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let analyzer: Box<dyn Analyzer> = match args.analyzer {
        AnalyzerKind::Conllu => Box::new(ConlluAnalyzer),
        AnalyzerKind::Command => {
            let program = args.command.clone().ok_or("--command is required with --analyzer command")?;
            Box::new(CommandAnalyzer::new(program, args.args.clone()))
        }
    };

    let mut corpus = match CorpusManager::new(&args.corpus) {
        Ok(corpus) => corpus,
        Err(e) => {
            error!(error = %e, "Corpus rejected");
            return Err(e.into());
        }
    };
    let output = args.output.clone().unwrap_or_else(|| corpus.path().to_path_buf());

    let mut reports = Vec::new();
    match &args.task {
        Task::Process => reports.push(("process", process(&mut corpus, analyzer.as_ref(), &output)?)),
        Task::Frequencies => reports.push(("frequencies", frequencies(&corpus, analyzer.as_ref(), &output)?)),
        Task::Search { pattern } => {
            reports.push(("search", search(&corpus, analyzer.as_ref(), pattern, &output)?));
        }
        Task::All { pattern } => {
            reports.push(("process", process(&mut corpus, analyzer.as_ref(), &output)?));
            reports.push(("frequencies", frequencies(&corpus, analyzer.as_ref(), &output)?));
            reports.push(("search", search(&corpus, analyzer.as_ref(), pattern, &output)?));
        }
    }

    let mut clean = true;
    for (stage, report) in &reports {
        clean &= summarize(stage, report);
    }
    Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn process(
    corpus: &mut CorpusManager,
    analyzer: &dyn Analyzer,
    output: &std::path::Path,
) -> Result<RunReport, Box<dyn Error>> {
    Ok(TextProcessingPipeline::new(corpus, Some(analyzer))
        .with_output_dir(output)
        .run()?)
}

fn frequencies(
    corpus: &CorpusManager,
    analyzer: &dyn Analyzer,
    output: &std::path::Path,
) -> Result<RunReport, Box<dyn Error>> {
    Ok(PosFrequencyPipeline::new(corpus, analyzer)
        .with_output_dir(output)
        .run()?)
}

fn search(
    corpus: &CorpusManager,
    analyzer: &dyn Analyzer,
    pattern: &PatternSpec,
    output: &std::path::Path,
) -> Result<RunReport, Box<dyn Error>> {
    Ok(PatternSearchPipeline::new(corpus, analyzer, pattern.clone())
        .with_output_dir(output)
        .run()?)
}

/// Log what a stage did; returns whether it was clean
fn summarize(stage: &str, report: &RunReport) -> bool {
    info!(
        stage,
        processed = report.processed.len(),
        matches = report.matches,
        "Stage complete"
    );
    for skipped in &report.skipped_sentences {
        warn!(
            stage,
            article_id = skipped.article_id,
            sentence_index = skipped.sentence_index,
            reason = %skipped.reason,
            "Skipped sentence"
        );
    }
    for failed in &report.failed_articles {
        warn!(stage, article_id = failed.article_id, reason = %failed.reason, "Failed article");
    }
    report.is_clean()
}
