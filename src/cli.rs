//! Command-line interface for the `depsearch` binary.
//!
//! Every option can also be set through an environment variable.

use clap::{Parser, Subcommand, ValueEnum};
use depsearch::PatternSpec;
use std::path::PathBuf;

/// Validate a news corpus, annotate it and search it for syntactic patterns.
///
/// # Examples
///
/// ```sh
/// # Store cleaned text and CoNLL-U produced by an external tagger
/// depsearch -c ./assets --analyzer command --command udpipe \
///     --arg=--tokenize --arg=--tag --arg=--parse --arg=model.udpipe process
///
/// # Search the stored CoNLL-U for verbs with a nominal object
/// depsearch -c ./assets search --pattern VERB,obj,NOUN
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the `<id>_raw.txt` files
    #[arg(short, long, env = "DEPSEARCH_CORPUS")]
    pub corpus: PathBuf,

    /// Where to write artifacts; defaults to the corpus directory
    #[arg(short, long, env = "DEPSEARCH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Annotator used for articles without stored CoNLL-U
    #[arg(long, value_enum, env = "DEPSEARCH_ANALYZER", default_value_t = AnalyzerKind::Conllu)]
    pub analyzer: AnalyzerKind,

    /// Tagger program for `--analyzer command`
    #[arg(long, env = "DEPSEARCH_COMMAND", required_if_eq("analyzer", "command"))]
    pub command: Option<String>,

    /// Argument passed to the tagger program (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,

    #[command(subcommand)]
    pub task: Task,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyzerKind {
    /// Articles are already CoNLL-U
    Conllu,
    /// Pipe each article through an external tagger
    Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Task {
    /// Write cleaned text and CoNLL-U for every article
    Process,
    /// Write POS frequencies to `<id>_meta.json`
    Frequencies,
    /// Search for a pattern and write `<id>_pattern.json`
    Search {
        /// `ROOT,CHILD` or `ROOT,REL,CHILD`, e.g. `VERB,obj,NOUN`
        #[arg(short, long, env = "DEPSEARCH_PATTERN")]
        pattern: PatternSpec,
    },
    /// Process, count frequencies, then search
    All {
        #[arg(short, long, env = "DEPSEARCH_PATTERN")]
        pattern: PatternSpec,
    },
}
