//! Annotators
//!
//! The pipelines only see the [`Analyzer`] trait: texts in, one parsed
//! document (or a failure) per text out, in input order. Two variants ship
//! with the crate:
//!
//! * [`ConlluAnalyzer`] for corpora whose articles are already CoNLL-U
//! * [`CommandAnalyzer`] which pipes each text through an external tagger
//!   (a UDPipe or Stanza command line) that prints CoNLL-U on stdout

use crate::conllu::{self, ParseError};
use crate::tree::Document;
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("annotator output is not valid CoNLL-U: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("annotator produced no sentences")]
    Empty,
}

/// Something that turns plain texts into annotated documents
pub trait Analyzer {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Annotate every text; the result has one entry per input, in order
    fn analyze(&self, texts: &[&str]) -> Vec<Result<Document, AnalyzerError>>;
}

/// Treats each text as CoNLL-U and parses it
#[derive(Debug, Clone, Copy, Default)]
pub struct ConlluAnalyzer;

impl Analyzer for ConlluAnalyzer {
    fn name(&self) -> &str {
        "conllu"
    }

    fn analyze(&self, texts: &[&str]) -> Vec<Result<Document, AnalyzerError>> {
        texts.iter().map(|text| parse_output(text)).collect()
    }
}

/// Runs an external tagger once per text
///
/// The text goes to the program's stdin and CoNLL-U is expected on stdout,
/// e.g. `udpipe --tokenize --tag --parse model.udpipe`.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn run(&self, text: &str) -> Result<Document, AnalyzerError> {
        let spawn_err = |source: io::Error| AnalyzerError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // Feed stdin from another thread so a chatty child can't deadlock us
        let stdin = child.stdin.take();
        let output = std::thread::scope(|s| {
            s.spawn(move || {
                if let Some(mut stdin) = stdin {
                    // A child that exits early closes the pipe; its status tells the story
                    let _ = stdin.write_all(text.as_bytes());
                }
            });
            child.wait_with_output()
        })
        .map_err(spawn_err)?;

        if !output.status.success() {
            return Err(AnalyzerError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(program = %self.program, bytes = output.stdout.len(), "Annotator finished");
        parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Analyzer for CommandAnalyzer {
    fn name(&self) -> &str {
        &self.program
    }

    fn analyze(&self, texts: &[&str]) -> Vec<Result<Document, AnalyzerError>> {
        texts.iter().map(|text| self.run(text)).collect()
    }
}

fn parse_output(text: &str) -> Result<Document, AnalyzerError> {
    let doc = conllu::read_document(text)?;
    if doc.is_empty() {
        return Err(AnalyzerError::Empty);
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONLLU: &str = "1\tDogs\tdog\tNOUN\t_\t_\t2\tnsubj\t_\t_\n\
                          2\tbark\tbark\tVERB\t_\t_\t0\troot\t_\t_\n";

    #[test]
    fn test_conllu_analyzer_keeps_order_and_failures() {
        let results = ConlluAnalyzer.analyze(&[CONLLU, "not conllu", ""]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().sentences[0].len(), 2);
        assert!(matches!(results[1], Err(AnalyzerError::Parse(_))));
        assert!(matches!(results[2], Err(AnalyzerError::Empty)));
    }

    #[test]
    fn test_analyzer_as_trait_object() {
        let analyzers: Vec<Box<dyn Analyzer>> = vec![
            Box::new(ConlluAnalyzer),
            Box::new(CommandAnalyzer::new("cat", Vec::new())),
        ];
        assert_eq!(analyzers[0].name(), "conllu");
        assert_eq!(analyzers[1].name(), "cat");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_analyzer_pipes_text() {
        let results = CommandAnalyzer::new("cat", Vec::new()).analyze(&[CONLLU]);
        assert_eq!(results[0].as_ref().unwrap().sentences[0].tokens[1].form, "bark");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_analyzer_failures() {
        let missing = CommandAnalyzer::new("/nonexistent/tagger", Vec::new()).analyze(&["text"]);
        assert!(matches!(missing[0], Err(AnalyzerError::Spawn { .. })));

        let failing = CommandAnalyzer::new("false", Vec::new()).analyze(&["text"]);
        assert!(matches!(failing[0], Err(AnalyzerError::Failed { .. })));
    }
}
