use depsearch::{
    CommandAnalyzer, ConlluAnalyzer, CorpusError, CorpusManager, PatternSearchPipeline, PatternSpec,
    PosFrequencyPipeline, TextProcessingPipeline,
};
use std::fs;
use tempfile::{TempDir, tempdir};

const ARTICLE_1: &str = r#"# text = The committee approved the budget.
1	The	the	DET	DT	_	2	det	_	_
2	committee	committee	NOUN	NN	_	3	nsubj	_	_
3	approved	approve	VERB	VBD	_	0	root	_	_
4	the	the	DET	DT	_	5	det	_	_
5	budget	budget	NOUN	NN	_	3	obj	_	SpaceAfter=No
6	.	.	PUNCT	.	_	3	punct	_	_

# text = Officials declined.
1	Officials	official	NOUN	NNS	_	2	nsubj	_	_
2	declined	decline	VERB	VBD	_	0	root	_	SpaceAfter=No
3	.	.	PUNCT	.	_	2	punct	_	_

"#;

const ARTICLE_2: &str = r#"# text = Rain fell.
1	Rain	rain	NOUN	NN	_	2	nsubj	_	_
2	fell	fall	VERB	VBD	_	0	root	_	SpaceAfter=No
3	.	.	PUNCT	.	_	12	punct	_	_

# text = Markets gave investors gains.
1	Markets	market	NOUN	NNS	_	2	nsubj	_	_
2	gave	give	VERB	VBD	_	0	root	_	_
3	investors	investor	NOUN	NNS	_	2	iobj	_	_
4	gains	gain	NOUN	NNS	_	2	obj	_	SpaceAfter=No
5	.	.	PUNCT	.	_	2	punct	_	_

"#;

fn create_corpus(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

#[test]
fn test_full_run() {
    let dir = create_corpus(&[("1_raw.txt", ARTICLE_1), ("2_raw.txt", ARTICLE_2)]);
    let mut corpus = CorpusManager::new(dir.path()).unwrap();
    assert_eq!(corpus.len(), 2);

    let processed = TextProcessingPipeline::new(&mut corpus, Some(&ConlluAnalyzer))
        .run()
        .unwrap();
    assert!(processed.is_clean());

    let frequencies = PosFrequencyPipeline::new(&corpus, &ConlluAnalyzer).run().unwrap();
    assert_eq!(frequencies.processed, vec![1, 2]);

    let report = PatternSearchPipeline::new(&corpus, &ConlluAnalyzer, PatternSpec::pair("VERB", "NOUN"))
        .run()
        .unwrap();

    // "fell ." points its punctuation at token 12
    assert_eq!(report.skipped_sentences.len(), 1);
    assert_eq!(report.skipped_sentences[0].article_id, 2);
    assert_eq!(report.skipped_sentences[0].sentence_index, 0);
    assert!(report.failed_articles.is_empty());
    assert_eq!(report.matches, 3);

    let first: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("1_pattern.json")).unwrap()).unwrap();
    assert_eq!(
        first,
        serde_json::json!({
            "0": [{"root_id": 3, "root_pos": "VERB", "children": [
                {"id": 2, "pos": "NOUN"}, {"id": 5, "pos": "NOUN"}
            ]}],
            "1": [{"root_id": 2, "root_pos": "VERB", "children": [{"id": 1, "pos": "NOUN"}]}]
        })
    );

    let second: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("2_pattern.json")).unwrap()).unwrap();
    assert_eq!(second.as_object().unwrap().len(), 1);
    assert_eq!(second["1"][0]["children"].as_array().unwrap().len(), 3);
}

#[test]
fn test_relation_pattern() {
    let dir = create_corpus(&[("1_raw.txt", ARTICLE_1), ("2_raw.txt", ARTICLE_2)]);
    let corpus = CorpusManager::new(dir.path()).unwrap();
    let out = tempdir().unwrap();

    let report = PatternSearchPipeline::new(&corpus, &ConlluAnalyzer, "VERB,iobj,NOUN".parse().unwrap())
        .with_output_dir(out.path())
        .run()
        .unwrap();

    assert_eq!(report.matches, 1);
    let first = fs::read_to_string(out.path().join("1_pattern.json")).unwrap();
    assert_eq!(first, "{}");
    let second: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("2_pattern.json")).unwrap()).unwrap();
    assert_eq!(second["1"][0]["children"], serde_json::json!([{"id": 3, "pos": "NOUN"}]));
}

#[test]
fn test_inconsistent_corpus_produces_nothing() {
    let dir = create_corpus(&[("1_raw.txt", ARTICLE_1), ("2_raw.txt", ARTICLE_2), ("4_raw.txt", ARTICLE_1)]);

    let err = CorpusManager::new(dir.path()).unwrap_err();
    assert!(matches!(err, CorpusError::InconsistentDataset(_)));
    assert!(err.to_string().contains("ID 3 missing, found 1,2,4"));

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
}

#[cfg(unix)]
#[test]
fn test_command_analyzer_end_to_end() {
    let dir = create_corpus(&[("1_raw.txt", ARTICLE_1)]);
    let mut corpus = CorpusManager::new(dir.path()).unwrap();
    let tagger = CommandAnalyzer::new("cat", Vec::new());

    let report = TextProcessingPipeline::new(&mut corpus, Some(&tagger)).run().unwrap();
    assert_eq!(report.processed, vec![1]);

    let stored = fs::read_to_string(dir.path().join("1_udpipe_conllu.conllu")).unwrap();
    assert!(stored.contains("5\tbudget\tbudget\tNOUN\tNN\t_\t3\tobj\t_\tSpaceAfter=No"));
}
