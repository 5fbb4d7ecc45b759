//! Complete end-to-end example: CoNLL-U → sentence graphs → pattern matches
//!
//! This example demonstrates the search half of the pipeline:
//! 1. Parse CoNLL-U text into a Document
//! 2. Build one dependency graph per sentence
//! 3. Search for a (root POS, relation, child POS) pattern
//! 4. Print the JSON that would be written for the article
//!
//! Run with: cargo run --example end_to_end

use depsearch::pipeline::search_document;
use depsearch::{PatternSpec, conllu, writer};

fn main() {
    println!("=== depsearch: End-to-End Example ===\n");

    let conllu_text = r#"# sent_id = example-001
# text = The big dog chased two cats and a bird.
1	The	the	DET	DT	_	3	det	_	_
2	big	big	ADJ	JJ	Degree=Pos	3	amod	_	_
3	dog	dog	NOUN	NN	Number=Sing	4	nsubj	_	_
4	chased	chase	VERB	VBD	Mood=Ind|Tense=Past	0	root	_	_
5	two	two	NUM	CD	_	6	nummod	_	_
6	cats	cat	NOUN	NNS	Number=Plur	4	obj	_	_
7	and	and	CCONJ	CC	_	9	cc	_	_
8	a	a	DET	DT	_	9	det	_	_
9	bird	bird	NOUN	NN	Number=Sing	6	conj	_	SpaceAfter=No
10	.	.	PUNCT	.	_	4	punct	_	_

# sent_id = example-002
# text = Nothing here.
1	Nothing	nothing	PRON	NN	_	0	root	_	_
2	here	here	ADV	RB	_	1	advmod	_	SpaceAfter=No
3	.	.	PUNCT	.	_	1	punct	_	_

"#;

    let doc = match conllu::read_document(conllu_text) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            return;
        }
    };
    println!("Parsed {} sentences", doc.len());

    for pattern in ["VERB,NOUN", "VERB,obj,NOUN", "NOUN,conj,NOUN"] {
        let pattern: PatternSpec = match pattern.parse() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Bad pattern {}: {}", pattern, e);
                continue;
            }
        };

        let search = search_document(&pattern, &doc);
        println!("\nPattern {} -> {} match(es)", pattern, search.match_count());
        match writer::render(1, &search.matches) {
            Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
            Err(e) => eprintln!("{}", e),
        }
    }
}
